//! Route access decisions.
//!
//! The guard is a pure function of the current [`AuthSnapshot`]; the UI calls
//! it on every render of a protected route, so there is no stored state and
//! no terminal outcome.

use crate::model::{AuthSnapshot, Role};

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    InsufficientRole,
    Authorized,
}

/// Where a refused navigation should be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// The sign-in entry point.
    SignIn,
    /// Default landing page for signed-in users.
    Landing,
}

impl GuardState {
    #[must_use]
    pub fn redirect(self) -> Option<Redirect> {
        match self {
            GuardState::Unauthenticated => Some(Redirect::SignIn),
            GuardState::InsufficientRole => Some(Redirect::Landing),
            GuardState::Loading | GuardState::Authorized => None,
        }
    }

    #[must_use]
    pub fn renders_content(self) -> bool {
        matches!(self, GuardState::Authorized)
    }
}

#[must_use]
pub fn evaluate(auth: &AuthSnapshot, access: Access) -> GuardState {
    if auth.is_loading {
        return GuardState::Loading;
    }
    if !auth.is_authenticated() {
        return GuardState::Unauthenticated;
    }
    match access {
        Access::Authenticated => GuardState::Authorized,
        Access::Role(required) if auth.role == Some(required) => GuardState::Authorized,
        Access::Role(_) => GuardState::InsufficientRole,
    }
}
