use std::sync::Arc;

use dioxus::prelude::*;
use tokio::sync::watch;

use lingo_core::model::{AuthSnapshot, SubscriptionSnapshot};
use services::{AccountService, LessonService, SessionHandles, SessionProvider};

use crate::platform::LinkOpenerRef;

pub trait UiApp: Send + Sync {
    fn lessons(&self) -> Arc<LessonService>;
    fn accounts(&self) -> Arc<AccountService>;
    /// Handles of the already-mounted session hooks.
    fn session(&self) -> SessionHandles;
    fn link_opener(&self) -> LinkOpenerRef;
}

#[derive(Clone)]
pub struct AppContext {
    lessons: Arc<LessonService>,
    accounts: Arc<AccountService>,
    session: SessionHandles,
    links: LinkOpenerRef,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            lessons: app.lessons(),
            accounts: app.accounts(),
            session: app.session(),
            links: app.link_opener(),
        }
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn provider(&self) -> Arc<SessionProvider> {
        Arc::clone(&self.session.session)
    }

    #[must_use]
    pub fn links(&self) -> LinkOpenerRef {
        Arc::clone(&self.links)
    }

    #[must_use]
    pub fn auth_watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.session.auth.watch()
    }

    #[must_use]
    pub fn subscription_watch(&self) -> watch::Receiver<SubscriptionSnapshot> {
        self.session.subscription.watch()
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

/// Auth and subscription snapshots mirrored into signals so components
/// re-render when they change.
#[derive(Clone, Copy)]
pub struct SessionSignals {
    pub auth: Signal<AuthSnapshot>,
    pub subscription: Signal<SubscriptionSnapshot>,
}

/// Install [`SessionSignals`] for the subtree. Call once near the root.
pub fn provide_session_signals() -> SessionSignals {
    let ctx = use_context::<AppContext>();
    let auth = use_watched(ctx.auth_watch());
    let subscription = use_watched(ctx.subscription_watch());
    use_context_provider(|| SessionSignals { auth, subscription })
}

#[must_use]
pub fn use_auth() -> Signal<AuthSnapshot> {
    use_context::<SessionSignals>().auth
}

#[must_use]
pub fn use_subscription() -> Signal<SubscriptionSnapshot> {
    use_context::<SessionSignals>().subscription
}

fn use_watched<T>(source: watch::Receiver<T>) -> Signal<T>
where
    T: Clone + 'static,
{
    let mut value = use_signal(|| source.borrow().clone());
    use_future(move || {
        let mut rx = source.clone();
        async move {
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                value.set(next);
            }
        }
    });
    value
}
