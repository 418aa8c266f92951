use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use lingo_core::model::{AuthSession, SubscriptionSnapshot, SubscriptionTier};

use crate::backend::ProfileStore;
use crate::mount::{MountGuard, follow_sessions};
use crate::session_provider::SessionProvider;

/// Look up the plan for a session's user. Any lookup failure reads as
/// [`SubscriptionTier::Free`].
pub async fn resolve_subscription(
    session: Option<&AuthSession>,
    profiles: &dyn ProfileStore,
) -> SubscriptionSnapshot {
    let Some(session) = session else {
        return SubscriptionSnapshot::no_user();
    };
    match profiles.fetch_profile(session.user_id()).await {
        Ok(profile) => SubscriptionSnapshot::known(profile.subscription_tier),
        Err(err) => {
            warn!(user_id = %session.user_id(), error = %err, "tier lookup failed; using free tier");
            SubscriptionSnapshot::known(SubscriptionTier::Free)
        }
    }
}

pub struct SubscriptionHook {
    snapshot: watch::Receiver<SubscriptionSnapshot>,
    _mount: MountGuard,
}

impl SubscriptionHook {
    #[must_use]
    pub fn mount(provider: &SessionProvider, profiles: Arc<dyn ProfileStore>) -> Self {
        let (snapshot, mount) = follow_sessions(
            provider.watch(),
            SubscriptionSnapshot::loading(),
            move |session| {
                let profiles = Arc::clone(&profiles);
                async move { resolve_subscription(session.as_ref(), profiles.as_ref()).await }
            },
        );
        Self {
            snapshot,
            _mount: mount,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SubscriptionSnapshot {
        *self.snapshot.borrow()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SubscriptionSnapshot> {
        self.snapshot.clone()
    }
}
