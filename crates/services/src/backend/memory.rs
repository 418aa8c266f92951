use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use lingo_core::model::{
    AuthChange, AuthEvent, AuthSession, AuthUser, NewProfile, OAuthProvider, Profile, Role,
    SubscriptionTier, UserId,
};

use super::{AuthBackend, CHANGE_CHANNEL_CAPACITY, ProfileStore, SignUpOutcome};
use crate::error::{AuthError, ProfileLookupError, ProfileWriteError};

/// How a profile lookup should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFault {
    Missing,
    Network,
}

/// Failure injection switches for [`InMemoryBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    /// Every identity call fails with `NetworkFailure`.
    pub network_down: bool,
    /// OAuth sign-in is rejected by the provider.
    pub reject_oauth: bool,
    pub profile_lookup: Option<ProfileFault>,
    /// `get_session` answers with the session it saw *before* this delay.
    pub session_fetch_delay: Option<Duration>,
    pub profile_fetch_delay: Option<Duration>,
}

#[derive(Clone)]
struct Account {
    password: String,
    user: AuthUser,
}

struct State {
    accounts: HashMap<String, Account>,
    profiles: HashMap<UserId, Profile>,
    session: Option<AuthSession>,
    faults: Faults,
    /// Account that consents on the simulated provider page.
    oauth_account: Option<String>,
    /// Issued authorization codes and the account each one signs in.
    oauth_codes: HashMap<String, Option<String>>,
}

/// Identity and profile service kept entirely in memory.
///
/// Used by tests and by `--demo` runs. Clones share state.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
    changes: broadcast::Sender<AuthChange>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(State {
                accounts: HashMap::new(),
                profiles: HashMap::new(),
                session: None,
                faults: Faults::default(),
                oauth_account: None,
                oauth_codes: HashMap::new(),
            })),
            changes,
        }
    }

    /// Backend seeded with a free learner and an admin, for `--demo` runs.
    #[must_use]
    pub fn demo() -> Self {
        let backend = Self::new();
        backend.add_account(
            "learner@example.com",
            "password123",
            "Juan dela Cruz",
            Role::User,
            SubscriptionTier::Free,
        );
        backend.add_account(
            "admin@example.com",
            "password123",
            "Maria Santos",
            Role::Admin,
            SubscriptionTier::Premium,
        );
        backend.set_oauth_account("learner@example.com");
        backend
    }

    /// Register an account together with its profile row.
    pub fn add_account(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
        tier: SubscriptionTier,
    ) -> UserId {
        let id = UserId::random();
        let user = AuthUser {
            id,
            email: email.to_string(),
            full_name: Some(full_name.to_string()),
        };
        let mut state = self.lock();
        state.accounts.insert(
            normalize_email(email),
            Account {
                password: password.to_string(),
                user,
            },
        );
        state.profiles.insert(
            id,
            Profile {
                id,
                full_name: Some(full_name.to_string()),
                email: email.to_string(),
                role,
                subscription_tier: tier,
            },
        );
        id
    }

    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    #[must_use]
    pub fn faults(&self) -> Faults {
        self.lock().faults
    }

    /// Drop a profile row, leaving the account in place.
    pub fn remove_profile(&self, user_id: UserId) {
        self.lock().profiles.remove(&user_id);
    }

    #[must_use]
    pub fn profile(&self, user_id: UserId) -> Option<Profile> {
        self.lock().profiles.get(&user_id).cloned()
    }

    /// Sign `email` in whenever a third-party sign-in is approved.
    pub fn set_oauth_account(&self, email: &str) {
        self.lock().oauth_account = Some(normalize_email(email));
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State stays consistent even if a holder panicked mid-test.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_network(&self) -> Result<Faults, AuthError> {
        let faults = self.faults();
        if faults.network_down {
            return Err(AuthError::NetworkFailure("connection refused".into()));
        }
        Ok(faults)
    }

    fn start_session(&self, user: AuthUser) -> AuthSession {
        let session = AuthSession {
            access_token: format!("mem-{}", Uuid::new_v4()),
            refresh_token: None,
            expires_at: None,
            user,
        };
        self.lock().session = Some(session.clone());
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        session
    }

    fn emit(&self, event: AuthEvent, session: Option<AuthSession>) {
        // No receivers is fine; nobody is listening yet.
        let _ = self.changes.send(AuthChange { event, session });
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend").finish_non_exhaustive()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthBackend for InMemoryBackend {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let faults = self.check_network()?;
        let snapshot = self.lock().session.clone();
        if let Some(delay) = faults.session_fetch_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        self.check_network()?;
        let account = self.lock().accounts.get(&normalize_email(email)).cloned();
        match account {
            Some(account) if account.password == password => Ok(self.start_session(account.user)),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, AuthError> {
        let faults = self.check_network()?;
        if faults.reject_oauth {
            return Err(AuthError::ProviderRejected(format!(
                "{} sign-in is not enabled",
                provider.as_str()
            )));
        }
        // The simulated provider approves at once and sends the browser
        // straight back with a code.
        let code = format!("mem-code-{}", Uuid::new_v4());
        {
            let mut state = self.lock();
            let account = state.oauth_account.clone();
            state.oauth_codes.insert(code.clone(), account);
        }
        let separator = if redirect_to.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{redirect_to}{separator}code={code}&provider={}",
            provider.as_str()
        ))
    }

    async fn exchange_oauth_code(&self, auth_code: &str) -> Result<AuthSession, AuthError> {
        self.check_network()?;
        let user = {
            let mut state = self.lock();
            let Some(account) = state.oauth_codes.remove(auth_code) else {
                return Err(AuthError::InvalidCredentials);
            };
            account
                .and_then(|email| state.accounts.get(&email))
                .map(|account| account.user.clone())
                .ok_or_else(|| {
                    AuthError::ProviderRejected("no account is linked to this provider".into())
                })?
        };
        Ok(self.start_session(user))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        self.check_network()?;
        let key = normalize_email(email);
        let user = {
            let mut state = self.lock();
            if state.accounts.contains_key(&key) {
                return Err(AuthError::ProviderRejected("User already registered".into()));
            }
            let user = AuthUser {
                id: UserId::random(),
                email: email.trim().to_string(),
                full_name: Some(full_name.to_string()),
            };
            state.accounts.insert(
                key,
                Account {
                    password: password.to_string(),
                    user: user.clone(),
                },
            );
            user
        };
        let session = self.start_session(user.clone());
        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.check_network()?;
        let previous = self.lock().session.take();
        if previous.is_some() {
            self.emit(AuthEvent::SignedOut, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl ProfileStore for InMemoryBackend {
    async fn fetch_profile(&self, user_id: UserId) -> Result<Profile, ProfileLookupError> {
        let faults = self.faults();
        if let Some(delay) = faults.profile_fetch_delay {
            tokio::time::sleep(delay).await;
        }
        match faults.profile_lookup {
            Some(ProfileFault::Network) => {
                return Err(ProfileLookupError::NetworkFailure("connection reset".into()));
            }
            Some(ProfileFault::Missing) => return Err(ProfileLookupError::Missing),
            None => {}
        }
        self.lock()
            .profiles
            .get(&user_id)
            .cloned()
            .ok_or(ProfileLookupError::Missing)
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), ProfileWriteError> {
        if self.faults().network_down {
            return Err(ProfileWriteError::NetworkFailure("connection refused".into()));
        }
        let mut state = self.lock();
        if state.profiles.contains_key(&profile.id) {
            return Err(ProfileWriteError::Conflict);
        }
        state.profiles.insert(profile.id, profile.clone().into_profile());
        Ok(())
    }
}
