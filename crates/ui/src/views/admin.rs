use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::vm::{AdminTab, AdminVm, CatalogStats, map_admin};

#[component]
pub fn AdminView() -> Element {
    rsx! {
        AdminPanel { tab: AdminTab::Lessons }
    }
}

#[component]
pub fn AdminTabView(tab: String) -> Element {
    match AdminTab::from_slug(&tab) {
        Some(tab) => rsx! {
            AdminPanel { tab }
        },
        None => rsx! {
            div { class: "page admin",
                p { class: "error", "Unknown admin section \"{tab}\"." }
                Link { to: Route::Admin {}, "Back to Admin" }
            }
        },
    }
}

#[component]
fn AdminPanel(tab: AdminTab) -> Element {
    let ctx = use_context::<AppContext>();
    // The catalog is immutable for the life of the app.
    let vm = use_hook(|| map_admin(ctx.lessons().catalog()));

    rsx! {
        div { class: "page admin",
            h1 { "Admin Dashboard" }
            nav { class: "tabs",
                for candidate in AdminTab::ALL {
                    Link {
                        key: "{candidate.slug()}",
                        class: tab_class(candidate == tab),
                        to: Route::AdminTab { tab: candidate.slug().to_string() },
                        "{candidate.label()}"
                    }
                }
            }
            section { class: "card tab-body",
                match tab {
                    AdminTab::Lessons => rsx! { LessonsTable { vm: vm.clone() } },
                    AdminTab::Units => rsx! { UnitsTable { vm: vm.clone() } },
                    AdminTab::Analytics => rsx! { Analytics { stats: vm.stats } },
                    AdminTab::Settings => rsx! {
                        h2 { "Settings" }
                        p { "Accounts, roles and plans are managed in the hosted backend's console." }
                    },
                }
            }
        }
    }
}

fn tab_class(active: bool) -> &'static str {
    if active { "tab active" } else { "tab" }
}

#[component]
fn LessonsTable(vm: AdminVm) -> Element {
    rsx! {
        h2 { "Manage Lessons" }
        table {
            thead {
                tr {
                    th { "ID" }
                    th { "Title" }
                    th { "Unit" }
                    th { "Type" }
                    th { "Access" }
                    th { "Status" }
                }
            }
            tbody {
                for row in vm.lessons {
                    tr { key: "{row.id}",
                        td { "{row.id}" }
                        td { "{row.title}" }
                        td { "{row.unit}" }
                        td { span { class: "badge", "{row.category}" } }
                        td { "{row.access}" }
                        td { span { class: "status {row.status}", "{row.status}" } }
                    }
                }
            }
        }
    }
}

#[component]
fn UnitsTable(vm: AdminVm) -> Element {
    rsx! {
        h2 { "Manage Units" }
        table {
            thead {
                tr {
                    th { "ID" }
                    th { "Title" }
                    th { "Lessons" }
                    th { "Premium" }
                }
            }
            tbody {
                for row in vm.units {
                    tr { key: "{row.id}",
                        td { "{row.id}" }
                        td { "{row.title}" }
                        td { "{row.lessons}" }
                        td { "{row.premium}" }
                    }
                }
            }
        }
    }
}

#[component]
fn Analytics(stats: CatalogStats) -> Element {
    rsx! {
        h2 { "Analytics" }
        dl { class: "stats",
            dt { "Units" }
            dd { "{stats.units}" }
            dt { "Lessons" }
            dd { "{stats.lessons}" }
            dt { "Premium lessons" }
            dd { "{stats.premium}" }
            dt { "Published lessons" }
            dd { "{stats.published}" }
        }
    }
}
