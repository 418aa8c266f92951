use dioxus::prelude::*;
use dioxus_router::use_navigator;

use lingo_core::guard::{Access, GuardState, evaluate};

use crate::context::use_auth;
use crate::routes::route_for;

/// Renders `children` only once the caller satisfies `access`.
///
/// While auth is still resolving a spinner is shown and no redirect happens.
/// Refusals replace the current history entry so "back" does not loop.
#[component]
pub fn Protected(access: Access, children: Element) -> Element {
    let auth = use_auth();
    let navigator = use_navigator();

    use_effect(move || {
        if let Some(redirect) = evaluate(&auth.read(), access).redirect() {
            let _ = navigator.replace(route_for(redirect));
        }
    });

    match evaluate(&auth.read(), access) {
        GuardState::Loading => rsx! {
            div { class: "guard-loading",
                div { class: "spinner" }
                p { "Loading..." }
            }
        },
        GuardState::Authorized => children,
        GuardState::Unauthenticated | GuardState::InsufficientRole => rsx! {},
    }
}
