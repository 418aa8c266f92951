use dioxus::prelude::*;
use dioxus_router::Link;

use crate::routes::Route;

#[component]
pub fn NotFoundView(segments: Vec<String>) -> Element {
    let path = format!("/{}", segments.join("/"));
    rsx! {
        div { class: "page not-found",
            span { class: "code", "404" }
            h1 { "Page Not Found" }
            p {
                "Oops! The page you are looking for ({path}) might have been removed, had its name changed, or is temporarily unavailable."
            }
            Link { class: "btn-primary", to: Route::Home {}, "Back to Home" }
        }
    }
}
