//! Lifetime of background listener tasks.
//!
//! Each provider or hook owns one [`MountGuard`]. Dropping it clears the
//! liveness flag and aborts the task; the task checks the flag before every
//! publish, so nothing is written after the owner is gone.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use lingo_core::model::AuthSession;

use crate::session_provider::SessionState;

/// Shared "still mounted" flag handed to the task.
#[derive(Clone, Debug)]
pub(crate) struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub(crate) fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub(crate) struct MountGuard {
    alive: Liveness,
    task: JoinHandle<()>,
}

impl MountGuard {
    /// Spawn `task` on the current tokio runtime.
    pub(crate) fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(Liveness) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let alive = Liveness(Arc::new(AtomicBool::new(true)));
        let task = tokio::spawn(task(alive.clone()));
        Self { alive, task }
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.alive.0.store(false, Ordering::Release);
        self.task.abort();
    }
}

/// Derive a value from every resolved session, publishing `loading` while the
/// provider is unresolved or `resolve` is running.
///
/// A newer session cancels the running resolution and starts over, so a hung
/// lookup never holds back a later sign-in or sign-out.
pub(crate) fn follow_sessions<T, F, Fut>(
    mut sessions: watch::Receiver<SessionState>,
    loading: T,
    resolve: F,
) -> (watch::Receiver<T>, MountGuard)
where
    T: Clone + Send + Sync + 'static,
    F: Fn(Option<AuthSession>) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let (tx, rx) = watch::channel(loading.clone());
    let guard = MountGuard::spawn(move |alive| async move {
        loop {
            let state = sessions.borrow_and_update().clone();
            if !alive.is_alive() {
                return;
            }
            tx.send_replace(loading.clone());

            if state.resolved {
                let resolved = tokio::select! {
                    biased;
                    changed = sessions.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        None
                    }
                    value = resolve(state.session) => Some(value),
                };
                let Some(value) = resolved else {
                    continue;
                };
                if !alive.is_alive() {
                    return;
                }
                tx.send_replace(value);
            }

            if sessions.changed().await.is_err() {
                return;
            }
        }
    });
    (rx, guard)
}
