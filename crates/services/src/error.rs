//! Shared error types for the services crate.

use thiserror::Error;

use lingo_core::model::{FormError, LessonId, UnitId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Failures talking to the identity service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("could not reach the identity service: {0}")]
    NetworkFailure(String),
    #[error("{0}")]
    ProviderRejected(String),
    #[error("identity service is misconfigured: {0}")]
    Misconfigured(String),
    #[error("sign-in timed out")]
    TimedOut,
}

/// Failures reading a profile row.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileLookupError {
    #[error("profile not found")]
    Missing,
    #[error("could not reach the profile store: {0}")]
    NetworkFailure(String),
    #[error("profile store rejected the request: {0}")]
    Rejected(String),
}

/// Failures inserting a profile row.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileWriteError {
    #[error("a profile already exists for this user")]
    Conflict,
    #[error("could not reach the profile store: {0}")]
    NetworkFailure(String),
    #[error("profile store rejected the request: {0}")]
    Rejected(String),
}

/// Invalid backend endpoint/key configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

/// Errors emitted by `LessonCatalog`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
    #[error("lesson {0} has no playable content yet")]
    ContentUnavailable(LessonId),
    #[error("unit {0} is listed more than once")]
    DuplicateUnit(UnitId),
    #[error("lesson {0} is listed more than once")]
    DuplicateLesson(LessonId),
    #[error("content for lesson {0} is not listed in any unit")]
    OrphanContent(LessonId),
    #[error("lesson {lesson} is listed in unit {listed} but its content says unit {content}")]
    UnitMismatch {
        lesson: LessonId,
        listed: UnitId,
        content: UnitId,
    },
    #[error("catalog data is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error("lesson {0} requires a Basic or Premium plan")]
    Locked(LessonId),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AccountService::register`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("{}", join_form_errors(.0))]
    Invalid(Vec<FormError>),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Profile(#[from] ProfileWriteError),
}

fn join_form_errors(errors: &[FormError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] BackendConfigError),
}
