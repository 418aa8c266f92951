use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::profile::{Role, SubscriptionTier};

//
// ─── SESSION TYPES ─────────────────────────────────────────────────────────────
//

/// Identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl AuthUser {
    /// Name used in greetings, falling back to "Learner".
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Learner")
    }
}

/// An authenticated session issued by the identity service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    EmailPassword { email: String, password: String },
    OAuth {
        provider: OAuthProvider,
        redirect_to: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .finish_non_exhaustive(),
            Credentials::OAuth {
                provider,
                redirect_to,
            } => f
                .debug_struct("OAuth")
                .field("provider", provider)
                .field("redirect_to", redirect_to)
                .finish(),
        }
    }
}

/// What a sign-in attempt produced. OAuth hands back a URL to open instead
/// of a session; the session arrives later through a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Session(AuthSession),
    Redirect { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A push notification from the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<AuthSession>,
}

//
// ─── DERIVED SNAPSHOTS ─────────────────────────────────────────────────────────
//

/// What the rest of the app knows about the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_loading: bool,
    pub user: Option<AuthUser>,
    pub role: Option<Role>,
}

impl AuthSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            user: None,
            role: None,
        }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            is_loading: false,
            user: None,
            role: None,
        }
    }

    #[must_use]
    pub fn signed_in(user: AuthUser, role: Role) -> Self {
        Self {
            is_loading: false,
            user: Some(user),
            role: Some(role),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Caller's plan, `tier = None` while unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub is_loading: bool,
    pub tier: Option<SubscriptionTier>,
}

impl SubscriptionSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            tier: None,
        }
    }

    #[must_use]
    pub fn no_user() -> Self {
        Self {
            is_loading: false,
            tier: None,
        }
    }

    #[must_use]
    pub fn known(tier: SubscriptionTier) -> Self {
        Self {
            is_loading: false,
            tier: Some(tier),
        }
    }
}

//
// ─── SIGN-UP FORM ──────────────────────────────────────────────────────────────
//

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormError {
    #[error("Full name is required")]
    FullNameRequired,
    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Please confirm your password")]
    ConfirmationRequired,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// Returns every problem with the form, in field order. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<FormError> {
        let mut errors = Vec::new();

        if self.full_name.trim().is_empty() {
            errors.push(FormError::FullNameRequired);
        }

        if self.email.trim().is_empty() {
            errors.push(FormError::EmailRequired);
        } else if !looks_like_email(&self.email) {
            errors.push(FormError::EmailInvalid);
        }

        if self.password.is_empty() {
            errors.push(FormError::PasswordRequired);
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FormError::PasswordTooShort);
        }

        if self.confirm_password.is_empty() {
            errors.push(FormError::ConfirmationRequired);
        } else if self.confirm_password != self.password {
            errors.push(FormError::PasswordMismatch);
        }

        errors
    }
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Loose `something@something.something` check.
#[must_use]
pub fn looks_like_email(value: &str) -> bool {
    value.split_whitespace().any(|token| {
        token.char_indices().any(|(at, c)| {
            if c != '@' || at == 0 {
                return false;
            }
            let domain = &token[at + 1..];
            domain
                .char_indices()
                .any(|(dot, d)| d == '.' && dot > 0 && dot + 1 < domain.len())
        })
    })
}
