//! Seams to the hosted identity and profile services.
//!
//! Both traits are object safe so the app can hold `Arc<dyn AuthBackend>` and
//! swap the real HTTP client for the in-memory fake.

use async_trait::async_trait;
use tokio::sync::broadcast;

use lingo_core::model::{
    AuthChange, AuthSession, AuthUser, NewProfile, OAuthProvider, Profile, UserId,
};

use crate::error::{AuthError, ProfileLookupError, ProfileWriteError};

mod hosted;
mod memory;
mod pkce;

pub use hosted::{ANON_KEY_VAR, BACKEND_URL_VAR, BackendConfig, HostedBackend};
pub use memory::{Faults, InMemoryBackend, ProfileFault};

/// Capacity of the change-notification channel.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// What the identity service returned for a sign-up.
///
/// Services that require email confirmation create the user but issue no
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// The session the service currently considers active.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if the service cannot be reached.
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email/password pair.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Begin a third-party sign-in and return the URL the user must visit.
    ///
    /// After consent the provider redirects to `redirect_to` with a `code`
    /// query parameter, which [`AuthBackend::exchange_oauth_code`] turns into
    /// a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderRejected` if the provider is not enabled.
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, AuthError>;

    /// Finish the pending third-party sign-in and announce the new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderRejected` when no sign-in is pending or the
    /// code was refused, and `AuthError::InvalidCredentials` for an unknown code.
    async fn exchange_oauth_code(&self, auth_code: &str) -> Result<AuthSession, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::ProviderRejected` if the email is already registered.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, AuthError>;

    /// End the active session. A no-op when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if the service cannot be reached.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribe to session changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `ProfileLookupError::Missing` when no row exists for `user_id`.
    async fn fetch_profile(&self, user_id: UserId) -> Result<Profile, ProfileLookupError>;

    /// # Errors
    ///
    /// Returns `ProfileWriteError::Conflict` if a row already exists.
    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), ProfileWriteError>;
}
