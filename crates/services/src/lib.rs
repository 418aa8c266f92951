#![forbid(unsafe_code)]

pub mod account;
pub mod app_services;
pub mod auth_state;
pub mod backend;
pub mod catalog;
pub mod error;
pub mod lesson_service;
mod mount;
pub mod oauth_callback;
pub mod session_provider;
pub mod subscription;

pub use lingo_core::Clock;

pub use account::AccountService;
pub use app_services::{AppServices, BackendChoice, SessionHandles};
pub use auth_state::{AuthStateHook, resolve_auth_snapshot};
pub use backend::{
    ANON_KEY_VAR, AuthBackend, BACKEND_URL_VAR, BackendConfig, Faults, HostedBackend,
    InMemoryBackend, ProfileFault, ProfileStore, SignUpOutcome,
};
pub use catalog::LessonCatalog;
pub use error::{
    AppServicesError, AuthError, BackendConfigError, CatalogError, LessonServiceError,
    ProfileLookupError, ProfileWriteError, RegistrationError,
};
pub use oauth_callback::OAuthCallback;
pub use lesson_service::{
    DashboardOverview, LessonService, LessonStatus, NextLesson, UnitCard, UnitOverview,
    XP_PER_LEVEL,
};
pub use session_provider::{SessionProvider, SessionState};
pub use subscription::{SubscriptionHook, resolve_subscription};
