use dioxus::prelude::*;

use services::{CatalogError, LessonServiceError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    NotFound,
    Locked,
    ComingSoon,
    SignedOut,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::NotFound => "We couldn't find that lesson.",
            ViewError::Locked => "This lesson is part of the Basic and Premium plans.",
            ViewError::ComingSoon => "This lesson is coming soon.",
            ViewError::SignedOut => "Please sign in to continue.",
            ViewError::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl From<&LessonServiceError> for ViewError {
    fn from(err: &LessonServiceError) -> Self {
        match err {
            LessonServiceError::Locked(_) => ViewError::Locked,
            LessonServiceError::Catalog(CatalogError::ContentUnavailable(_)) => {
                ViewError::ComingSoon
            }
            LessonServiceError::Catalog(
                CatalogError::LessonNotFound(_) | CatalogError::UnitNotFound(_),
            ) => ViewError::NotFound,
            _ => ViewError::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::model::LessonId;

    #[test]
    fn lesson_errors_map_to_messages() {
        let locked = LessonServiceError::Locked(LessonId::new(5));
        assert_eq!(ViewError::from(&locked), ViewError::Locked);

        let soon = LessonServiceError::Catalog(CatalogError::ContentUnavailable(LessonId::new(23)));
        assert_eq!(ViewError::from(&soon), ViewError::ComingSoon);

        let missing = LessonServiceError::Catalog(CatalogError::LessonNotFound(LessonId::new(99)));
        assert_eq!(ViewError::from(&missing).message(), "We couldn't find that lesson.");
    }
}
