use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::{AppContext, use_auth, use_subscription};
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{DashboardVm, UnitCardVm, map_dashboard};

#[component]
pub fn DashboardView() -> Element {
    let ctx = use_context::<AppContext>();
    let lessons = ctx.lessons();
    let auth = use_auth();
    let subscription = use_subscription();

    let resource = use_resource(move || {
        let lessons = lessons.clone();
        let user_id = auth.read().user.as_ref().map(|user| user.id);
        let tier = subscription.read().tier;
        async move {
            let user_id = user_id.ok_or(ViewError::SignedOut)?;
            let overview = lessons
                .dashboard(user_id, tier)
                .await
                .map_err(|err| ViewError::from(&err))?;
            Ok::<_, ViewError>(map_dashboard(&overview))
        }
    });

    let state = view_state_from_resource(&resource);
    let name = auth
        .read()
        .user
        .as_ref()
        .map(|user| user.display_name().to_string())
        .unwrap_or_default();

    rsx! {
        div { class: "page dashboard",
            h1 { "Maligayang pagbabalik, {name}!" }
            p { class: "subtitle", "Welcome back. Ready to keep learning?" }

            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(vm) => rsx! {
                    DashboardBody { vm }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
            }
        }
    }
}

#[component]
fn DashboardBody(vm: DashboardVm) -> Element {
    let lessons_percent = vm.lessons_percent;
    let level_percent = vm.level_percent;

    rsx! {
        section { class: "stats",
            div { class: "card stat",
                p { class: "stat-label", "Lessons Completed" }
                h3 { "{vm.lessons_label}" }
                ProgressBar { percent: lessons_percent }
            }
            div { class: "card stat",
                p { class: "stat-label", "Total XP" }
                h3 { "{vm.total_xp}" }
                p { "Keep earning points to unlock rewards!" }
            }
            div { class: "card stat",
                p { class: "stat-label", "Current Level" }
                h3 { "{vm.level}" }
                ProgressBar { percent: level_percent }
                p { "{vm.xp_to_next_level} XP to next level" }
            }
            div { class: "card stat",
                p { class: "stat-label", "Current Streak" }
                h3 { "{vm.streak_label}" }
                p { "Finish a lesson every day to keep it going." }
            }
        }

        if let Some((unit_id, unit_title)) = vm.next_unit.clone() {
            section { class: "continue",
                div { class: "section-head",
                    h2 { "Continue Learning" }
                    Link { to: Route::Unit { unit_id }, "View All Units" }
                }
                div { class: "card",
                    span { class: "badge", "Unit {unit_id}" }
                    h3 { "{unit_title}" }
                    if let Some(lesson_id) = vm.next_lesson {
                        Link { class: "btn-primary", to: Route::Lesson { lesson_id },
                            "Continue to Lesson {lesson_id}"
                        }
                    } else {
                        Link { class: "btn-secondary", to: Route::Unit { unit_id },
                            "Open Unit"
                        }
                    }
                }
            }
        }

        section { class: "path",
            h2 { "Your Learning Path" }
            div { class: "unit-grid",
                for unit in vm.units.clone() {
                    UnitCard { key: "{unit.id}", unit }
                }
            }
        }
    }
}

#[component]
fn UnitCard(unit: UnitCardVm) -> Element {
    let finished = unit.percent >= 100.0;
    rsx! {
        div { class: "card unit-card",
            div { class: "badges",
                span { class: "badge", "Unit {unit.id}" }
                if finished {
                    span { class: "badge done", "Completed" }
                }
            }
            h3 { "{unit.title}" }
            p { "{unit.label}" }
            ProgressBar { percent: unit.percent }
            Link { to: Route::Unit { unit_id: unit.id },
                if finished { "Review Unit →" } else { "Continue Unit →" }
            }
        }
    }
}

#[component]
pub(crate) fn ProgressBar(percent: f64) -> Element {
    let width = percent.clamp(0.0, 100.0);
    rsx! {
        div { class: "progress",
            div { class: "progress-fill", style: "width: {width:.0}%" }
        }
    }
}
