//! App-wide owner of the signed-in session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use lingo_core::model::{AuthSession, Credentials, OAuthProvider, SignInOutcome};

use crate::backend::AuthBackend;
use crate::error::AuthError;
use crate::mount::MountGuard;
use crate::oauth_callback::OAuthCallback;

/// What the provider currently knows about the session.
///
/// `resolved` flips to `true` once the initial fetch (or a notification that
/// superseded it) has landed, and never flips back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub resolved: bool,
    pub session: Option<AuthSession>,
}

impl SessionState {
    fn resolved(session: Option<AuthSession>) -> Self {
        Self {
            resolved: true,
            session,
        }
    }
}

/// Holds the current session and keeps it in sync with the identity
/// service's change notifications.
pub struct SessionProvider {
    backend: Arc<dyn AuthBackend>,
    state: watch::Receiver<SessionState>,
    _mount: MountGuard,
}

impl SessionProvider {
    /// Subscribe to change notifications, then fetch the initial session.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn mount(backend: Arc<dyn AuthBackend>) -> Self {
        let (tx, state) = watch::channel(SessionState::default());
        // Subscribe first so nothing emitted during the fetch is lost.
        let mut changes = backend.subscribe();
        let listener = Arc::clone(&backend);

        let mount = MountGuard::spawn(move |alive| async move {
            let fetched = match listener.get_session().await {
                Ok(session) => session,
                Err(err) => {
                    warn!(error = %err, "initial session fetch failed; treating as signed out");
                    None
                }
            };

            let mut latest = fetched;
            loop {
                match changes.try_recv() {
                    Ok(change) => {
                        debug!(event = ?change.event, "notification superseded initial fetch");
                        latest = change.session;
                    }
                    Err(TryRecvError::Lagged(_)) => {}
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
            if !alive.is_alive() {
                return;
            }
            tx.send_replace(SessionState::resolved(latest));

            loop {
                let session = match changes.recv().await {
                    Ok(change) => {
                        debug!(event = ?change.event, "auth state changed");
                        change.session
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        match refetch_after_lag(listener.as_ref(), skipped).await {
                            Some(session) => session,
                            None => continue,
                        }
                    }
                    Err(RecvError::Closed) => return,
                };
                if !alive.is_alive() {
                    return;
                }
                tx.send_replace(SessionState::resolved(session));
            }
        });

        Self {
            backend,
            state,
            _mount: mount,
        }
    }

    /// The last session this provider observed, `None` while unresolved.
    #[must_use]
    pub fn current_session(&self) -> Option<AuthSession> {
        self.state.borrow().session.clone()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.borrow().resolved
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Start a sign-in. The provider's own state changes only through the
    /// backend's notification.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a bad email/password pair,
    /// `AuthError::NetworkFailure` when the service is unreachable, and
    /// `AuthError::ProviderRejected` when an OAuth provider refuses.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SignInOutcome, AuthError> {
        match credentials {
            Credentials::EmailPassword { email, password } => {
                let session = self
                    .backend
                    .sign_in_with_password(&email, &password)
                    .await
                    .inspect_err(|err| warn!(error = %err, "password sign-in failed"))?;
                info!(user_id = %session.user_id(), "signed in");
                Ok(SignInOutcome::Session(session))
            }
            Credentials::OAuth {
                provider,
                redirect_to,
            } => {
                let url = self
                    .backend
                    .sign_in_with_oauth(provider, &redirect_to)
                    .await?;
                info!(provider = provider.as_str(), "oauth sign-in started");
                Ok(SignInOutcome::Redirect { url })
            }
        }
    }

    /// Trade the code from a third-party redirect for a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderRejected` when no OAuth sign-in is in
    /// progress or the code is refused.
    pub async fn finish_oauth(&self, auth_code: &str) -> Result<AuthSession, AuthError> {
        let session = self
            .backend
            .exchange_oauth_code(auth_code)
            .await
            .inspect_err(|err| warn!(error = %err, "oauth code exchange failed"))?;
        info!(user_id = %session.user_id(), "signed in with oauth");
        Ok(session)
    }

    /// Run a full third-party sign-in through the system browser.
    ///
    /// A loopback listener receives the provider's redirect; `open` is handed
    /// the authorize URL and is expected to show it to the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TimedOut` if the browser never comes back within
    /// `timeout`, plus any error from starting or finishing the sign-in.
    pub async fn sign_in_with_browser(
        &self,
        provider: OAuthProvider,
        open: impl FnOnce(&str),
        timeout: Duration,
    ) -> Result<AuthSession, AuthError> {
        let callback = OAuthCallback::bind().await?;
        let outcome = self
            .sign_in(Credentials::OAuth {
                provider,
                redirect_to: callback.redirect_uri().to_string(),
            })
            .await?;
        let SignInOutcome::Redirect { url } = outcome else {
            return Err(AuthError::ProviderRejected(
                "provider did not return a sign-in page".into(),
            ));
        };
        open(&url);
        let code = callback.wait_for_code(timeout).await?;
        self.finish_oauth(&code).await
    }

    /// End the session. Signing out while signed out succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` when the service is unreachable.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let had_session = self.current_session().is_some();
        self.backend.sign_out().await?;
        if had_session {
            info!("signed out");
        }
        Ok(())
    }

    /// Stop listening. Equivalent to dropping the provider.
    pub fn unmount(self) {
        drop(self);
    }
}

/// The session to publish after missed notifications, or `None` to keep the
/// one already published when the refetch fails.
async fn refetch_after_lag(
    backend: &dyn AuthBackend,
    skipped: u64,
) -> Option<Option<AuthSession>> {
    warn!(skipped, "missed auth notifications; refetching session");
    match backend.get_session().await {
        Ok(session) => Some(session),
        Err(err) => {
            warn!(error = %err, "session refetch failed; keeping the last known session");
            None
        }
    }
}
