use dioxus::prelude::*;
use dioxus_router::Router;

use crate::context::provide_session_signals;
use crate::routes::Route;

#[component]
pub fn App() -> Element {
    // Session signals must exist before any routed view reads them.
    provide_session_signals();

    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }

        document::Title { "Tagalog Learn" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| rsx! {
                    div { class: "fatal",
                        h1 { "Something went wrong" }
                        pre { "{errors:?}" }
                    }
                },
                Router::<Route> {}
            }
        }
    }
}
