use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use lingo_core::model::{AuthSession, AuthSnapshot, Role};

use crate::backend::ProfileStore;
use crate::mount::{MountGuard, follow_sessions};
use crate::session_provider::SessionProvider;

/// Derive the caller's identity and role from a session.
///
/// A failed role lookup degrades to [`Role::User`]; the caller stays signed in
/// with least privilege.
pub async fn resolve_auth_snapshot(
    session: Option<&AuthSession>,
    profiles: &dyn ProfileStore,
) -> AuthSnapshot {
    let Some(session) = session else {
        return AuthSnapshot::signed_out();
    };
    let role = match profiles.fetch_profile(session.user_id()).await {
        Ok(profile) => profile.role,
        Err(err) => {
            warn!(user_id = %session.user_id(), error = %err, "role lookup failed; using default role");
            Role::User
        }
    };
    AuthSnapshot::signed_in(session.user.clone(), role)
}

/// Keeps an [`AuthSnapshot`] current for every session the provider reports.
pub struct AuthStateHook {
    snapshot: watch::Receiver<AuthSnapshot>,
    _mount: MountGuard,
}

impl AuthStateHook {
    #[must_use]
    pub fn mount(provider: &SessionProvider, profiles: Arc<dyn ProfileStore>) -> Self {
        let (snapshot, mount) =
            follow_sessions(provider.watch(), AuthSnapshot::loading(), move |session| {
                let profiles = Arc::clone(&profiles);
                async move { resolve_auth_snapshot(session.as_ref(), profiles.as_ref()).await }
            });
        Self {
            snapshot,
            _mount: mount,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthBackend, Faults, InMemoryBackend, ProfileFault};
    use lingo_core::model::SubscriptionTier;
    use std::time::Duration;

    async fn signed_in_backend(role: Role) -> (InMemoryBackend, AuthSession) {
        let backend = InMemoryBackend::new();
        backend.add_account(
            "ana@example.com",
            "secret-pass",
            "Ana",
            role,
            SubscriptionTier::Free,
        );
        let session = backend
            .sign_in_with_password("ana@example.com", "secret-pass")
            .await
            .unwrap();
        (backend, session)
    }

    async fn settled(hook: &AuthStateHook) -> AuthSnapshot {
        hook.watch()
            .wait_for(|snapshot| !snapshot.is_loading)
            .await
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn no_session_is_signed_out() {
        let backend = InMemoryBackend::new();
        let snapshot = resolve_auth_snapshot(None, &backend).await;
        assert_eq!(snapshot, AuthSnapshot::signed_out());
    }

    #[tokio::test]
    async fn admin_role_is_read_from_profile() {
        let (backend, session) = signed_in_backend(Role::Admin).await;
        let snapshot = resolve_auth_snapshot(Some(&session), &backend).await;
        assert_eq!(snapshot.role, Some(Role::Admin));
        assert!(snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn lookup_failure_falls_back_to_user() {
        let (backend, session) = signed_in_backend(Role::Admin).await;
        backend.set_faults(Faults {
            profile_lookup: Some(ProfileFault::Network),
            ..Faults::default()
        });
        let snapshot = resolve_auth_snapshot(Some(&session), &backend).await;
        assert!(snapshot.is_authenticated());
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.role, Some(Role::User));
    }

    #[tokio::test]
    async fn missing_profile_falls_back_to_user() {
        let (backend, session) = signed_in_backend(Role::Admin).await;
        backend.remove_profile(session.user_id());
        let snapshot = resolve_auth_snapshot(Some(&session), &backend).await;
        assert_eq!(snapshot.role, Some(Role::User));
    }

    #[tokio::test]
    async fn hook_starts_loading_then_settles() {
        let (backend, session) = signed_in_backend(Role::Admin).await;
        let backend = Arc::new(backend);
        let provider = SessionProvider::mount(backend.clone());
        let hook = AuthStateHook::mount(&provider, backend);
        assert!(hook.snapshot().is_loading);
        assert_eq!(hook.snapshot().role, None);

        let snapshot = settled(&hook).await;
        assert_eq!(snapshot.user, Some(session.user));
        assert_eq!(snapshot.role, Some(Role::Admin));
    }

    #[tokio::test]
    async fn hook_follows_sign_out() {
        let (backend, _) = signed_in_backend(Role::User).await;
        let backend = Arc::new(backend);
        let provider = SessionProvider::mount(backend.clone());
        let hook = AuthStateHook::mount(&provider, backend);
        assert!(settled(&hook).await.is_authenticated());

        provider.sign_out().await.unwrap();
        let snapshot = hook
            .watch()
            .wait_for(|snapshot| !snapshot.is_loading && !snapshot.is_authenticated())
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot, AuthSnapshot::signed_out());
    }

    #[tokio::test]
    async fn superseded_lookup_is_discarded() {
        let (backend, _) = signed_in_backend(Role::Admin).await;
        backend.set_faults(Faults {
            profile_fetch_delay: Some(Duration::from_millis(50)),
            ..Faults::default()
        });
        let backend = Arc::new(backend);
        let provider = SessionProvider::mount(backend.clone());
        let hook = AuthStateHook::mount(&provider, backend.clone());

        provider.watch().wait_for(|s| s.resolved).await.unwrap();
        // The admin lookup is now in flight.
        tokio::time::sleep(Duration::from_millis(10)).await;
        backend.sign_out().await.unwrap();

        let snapshot = settled(&hook).await;
        assert_eq!(snapshot, AuthSnapshot::signed_out());
    }

    #[tokio::test]
    async fn hung_lookup_yields_to_newer_session() {
        let (backend, _) = signed_in_backend(Role::Admin).await;
        backend.set_faults(Faults {
            profile_fetch_delay: Some(Duration::from_secs(60)),
            ..Faults::default()
        });
        let backend = Arc::new(backend);
        let provider = SessionProvider::mount(backend.clone());
        let hook = AuthStateHook::mount(&provider, backend.clone());

        provider.watch().wait_for(|s| s.resolved).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(hook.snapshot().is_loading);
        backend.sign_out().await.unwrap();

        let snapshot = tokio::time::timeout(Duration::from_secs(2), settled(&hook))
            .await
            .expect("sign-out applied while the lookup hangs");
        assert_eq!(snapshot, AuthSnapshot::signed_out());
    }
}
