use dioxus::prelude::*;
use dioxus_router::Link;

use lingo_core::model::UnitId;

use crate::context::{AppContext, use_auth, use_subscription};
use crate::routes::Route;
use crate::views::dashboard::ProgressBar;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{LessonRowState, LessonRowVm, UnitVm, map_unit};

#[component]
pub fn UnitView(unit_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let lessons = ctx.lessons();
    let auth = use_auth();
    let subscription = use_subscription();

    let resource = use_resource(use_reactive!(|unit_id| {
        let lessons = lessons.clone();
        let user_id = auth.read().user.as_ref().map(|user| user.id);
        let tier = subscription.read().tier;
        async move {
            let user_id = user_id.ok_or(ViewError::SignedOut)?;
            let overview = lessons
                .unit_overview(user_id, UnitId::new(unit_id), tier)
                .await
                .map_err(|err| ViewError::from(&err))?;
            Ok::<_, ViewError>(map_unit(&overview))
        }
    }));

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page unit",
            Link { class: "back-link", to: Route::Dashboard {}, "← Back to Dashboard" }

            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(vm) => rsx! {
                    UnitBody { unit_id, vm }
                },
                ViewState::Error(ViewError::NotFound) => rsx! {
                    p { class: "error", "We couldn't find that unit." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
            }
        }
    }
}

#[component]
fn UnitBody(unit_id: u64, vm: UnitVm) -> Element {
    rsx! {
        header { class: "unit-header",
            span { class: "badge", "Unit {unit_id}" }
            h1 { "{vm.title}" }
            p { "{vm.description}" }
        }

        div { class: "card unit-progress",
            h3 { "Your Progress" }
            p { "{vm.label}" }
            ProgressBar { percent: vm.percent }
        }

        ul { class: "lesson-list",
            for row in vm.lessons.clone() {
                LessonRow { key: "{row.id}", row }
            }
        }
    }
}

#[component]
fn LessonRow(row: LessonRowVm) -> Element {
    let state_class = match row.state {
        LessonRowState::Completed => "lesson-row completed",
        LessonRowState::Available => "lesson-row",
        LessonRowState::Locked => "lesson-row locked",
        LessonRowState::ComingSoon => "lesson-row soon",
    };

    rsx! {
        li { class: state_class,
            span { class: "lesson-number",
                if row.state == LessonRowState::Completed { "✓" } else { "{row.number}" }
            }
            div { class: "lesson-info",
                h4 { "{row.title}" }
                span { class: "category", "{row.category}" }
                if row.premium {
                    span { class: "badge premium", "Premium" }
                }
            }
            match row.state {
                LessonRowState::Completed => rsx! {
                    Link { class: "btn-secondary", to: Route::Lesson { lesson_id: row.id }, "Review" }
                },
                LessonRowState::Available => rsx! {
                    Link { class: "btn-primary", to: Route::Lesson { lesson_id: row.id }, "Start" }
                },
                LessonRowState::Locked => rsx! {
                    Link { class: "locked-link", to: Route::Subscribe {}, "Upgrade to unlock" }
                },
                LessonRowState::ComingSoon => rsx! {
                    span { class: "muted", "Coming soon" }
                },
            }
        }
    }
}
