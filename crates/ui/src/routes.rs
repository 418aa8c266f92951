use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable, use_navigator};

use lingo_core::guard::{Access, Redirect};
use lingo_core::model::{Role, SubscriptionTier};

use crate::context::{AppContext, use_auth, use_subscription};
use crate::views::{
    AdminTabView, AdminView, DashboardView, LessonView, LoginView, NotFoundView, Protected,
    SignupView, SubscribeView, UnitView,
};

#[derive(Clone, Debug, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[route("/login", LoginView)] Login {},
    #[route("/signup", SignupView)] Signup {},
    #[layout(Shell)]
        #[route("/", DashboardView)] Home {},
        #[route("/dashboard", DashboardView)] Dashboard {},
        #[route("/unit/:unit_id", UnitView)] Unit { unit_id: u64 },
        #[route("/lesson/:lesson_id", LessonView)] Lesson { lesson_id: u64 },
        #[route("/subscribe", SubscribeView)] Subscribe {},
        #[nest("/admin")]
            #[layout(AdminShell)]
                #[route("/", AdminView)] Admin {},
                #[route("/:tab", AdminTabView)] AdminTab { tab: String },
            #[end_layout]
        #[end_nest]
    #[end_layout]
    #[route("/:..segments", NotFoundView)] NotFound { segments: Vec<String> },
}

/// Destination for a refused navigation.
#[must_use]
pub fn route_for(redirect: Redirect) -> Route {
    match redirect {
        Redirect::SignIn => Route::Login {},
        Redirect::Landing => Route::Dashboard {},
    }
}

#[component]
fn Shell() -> Element {
    rsx! {
        Protected { access: Access::Authenticated,
            div { class: "app",
                Header {}
                div { class: "app-body",
                    Sidebar {}
                    main { class: "content",
                        Outlet::<Route> {}
                    }
                }
            }
        }
    }
}

#[component]
fn AdminShell() -> Element {
    rsx! {
        Protected { access: Access::Role(Role::Admin),
            Outlet::<Route> {}
        }
    }
}

#[component]
fn Header() -> Element {
    let auth = use_auth();
    let subscription = use_subscription();

    let name = auth
        .read()
        .user
        .as_ref()
        .map(|user| user.display_name().to_string())
        .unwrap_or_default();
    let plan_badge = subscription
        .read()
        .tier
        .filter(|tier| *tier != SubscriptionTier::Free)
        .map(|tier| format!("{} Plan", tier.display_name()));

    rsx! {
        header { class: "app-header",
            Link { class: "brand", to: Route::Dashboard {}, "Tagalog Learn" }
            div { class: "header-right",
                if let Some(badge) = plan_badge {
                    span { class: "plan-badge", "{badge}" }
                }
                span { class: "user-name", "{name}" }
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let auth = use_auth();
    let navigator = use_navigator();
    let is_admin = auth.read().role == Some(Role::Admin);

    let sign_out = move |_: MouseEvent| {
        let provider = ctx.provider();
        spawn(async move {
            // A failed sign-out keeps the session; the guard stays put.
            if provider.sign_out().await.is_ok() {
                let _ = navigator.push(Route::Login {});
            }
        });
    };

    rsx! {
        nav { class: "sidebar",
            ul {
                li { Link { to: Route::Dashboard {}, "Dashboard" } }
                li { Link { to: Route::Unit { unit_id: 1 }, "Units" } }
                li { Link { to: Route::Subscribe {}, "Subscribe" } }
                if is_admin {
                    li { Link { to: Route::Admin {}, "Admin" } }
                }
            }
            div { class: "sidebar-account",
                button { class: "sign-out", onclick: sign_out, "Sign out" }
            }
        }
    }
}
