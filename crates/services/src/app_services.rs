use std::sync::Arc;

use lingo_core::Clock;
use storage::repository::Storage;

use crate::account::AccountService;
use crate::auth_state::AuthStateHook;
use crate::backend::{AuthBackend, BackendConfig, HostedBackend, InMemoryBackend, ProfileStore};
use crate::catalog::LessonCatalog;
use crate::error::AppServicesError;
use crate::lesson_service::LessonService;
use crate::session_provider::SessionProvider;
use crate::subscription::SubscriptionHook;

/// Which identity/profile service to talk to.
#[derive(Debug, Clone)]
pub enum BackendChoice {
    Hosted(BackendConfig),
    InMemory(InMemoryBackend),
}

/// Mounted session provider and the hooks derived from it.
#[derive(Clone)]
pub struct SessionHandles {
    pub session: Arc<SessionProvider>,
    pub auth: Arc<AuthStateHook>,
    pub subscription: Arc<SubscriptionHook>,
}

/// Assembles app-facing services around one injected backend.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<dyn AuthBackend>,
    profiles: Arc<dyn ProfileStore>,
    lessons: Arc<LessonService>,
    accounts: Arc<AccountService>,
}

impl AppServices {
    /// Build services backed by `SQLite` progress storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        backend: BackendChoice,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::assemble(clock, &storage, backend)
    }

    /// Build services with in-memory progress storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog cannot be loaded.
    pub fn in_memory(clock: Clock, backend: BackendChoice) -> Result<Self, AppServicesError> {
        Self::assemble(clock, &Storage::in_memory(), backend)
    }

    fn assemble(
        clock: Clock,
        storage: &Storage,
        backend: BackendChoice,
    ) -> Result<Self, AppServicesError> {
        let (auth, profiles): (Arc<dyn AuthBackend>, Arc<dyn ProfileStore>) = match backend {
            BackendChoice::Hosted(config) => {
                let hosted = Arc::new(HostedBackend::new(config));
                (hosted.clone(), hosted)
            }
            BackendChoice::InMemory(memory) => {
                let memory = Arc::new(memory);
                (memory.clone(), memory)
            }
        };

        let catalog = Arc::new(LessonCatalog::builtin()?);
        let lessons = Arc::new(LessonService::new(
            clock,
            catalog,
            Arc::clone(&storage.progress),
        ));
        let accounts = Arc::new(AccountService::new(
            Arc::clone(&auth),
            Arc::clone(&profiles),
        ));

        Ok(Self {
            auth,
            profiles,
            lessons,
            accounts,
        })
    }

    /// Mount the session provider and its hooks. Must run inside a tokio
    /// runtime; dropping every handle stops the listeners.
    #[must_use]
    pub fn mount_session(&self) -> SessionHandles {
        let session = SessionProvider::mount(Arc::clone(&self.auth));
        let auth = AuthStateHook::mount(&session, Arc::clone(&self.profiles));
        let subscription = SubscriptionHook::mount(&session, Arc::clone(&self.profiles));
        SessionHandles {
            session: Arc::new(session),
            auth: Arc::new(auth),
            subscription: Arc::new(subscription),
        }
    }

    #[must_use]
    pub fn auth_backend(&self) -> Arc<dyn AuthBackend> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }
}
