use dioxus::prelude::*;
use dioxus_router::Link;

use lingo_core::model::LessonId;
use lingo_core::player::LessonCompletion;

use crate::context::{AppContext, use_auth, use_subscription};
use crate::routes::Route;
use crate::views::ViewError;
use crate::views::dashboard::ProgressBar;
use crate::vm::{LessonIntent, LessonOutcome, LessonVm, OptionMark, QuizOptionVm, StepVm, start_lesson};

#[derive(Clone, Debug, PartialEq, Eq)]
enum SaveState {
    Saving,
    Saved,
    Failed(String),
}

/// Each lesson id gets a fresh player.
#[component]
pub fn LessonView(lesson_id: u64) -> Element {
    rsx! {
        LessonPlayerView { key: "{lesson_id}", lesson_id }
    }
}

#[component]
fn LessonPlayerView(lesson_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let auth = use_auth();
    let subscription = use_subscription();

    let mut vm = use_signal(|| None::<Result<LessonVm, ViewError>>);
    let mut finished = use_signal(|| None::<(LessonCompletion, SaveState)>);

    // Start once the plan is known; later plan changes do not restart a lesson.
    let lessons_for_start = ctx.lessons();
    use_effect(move || {
        let snapshot = subscription();
        if snapshot.is_loading || vm.peek().is_some() {
            return;
        }
        vm.set(Some(start_lesson(
            &lessons_for_start,
            LessonId::new(lesson_id),
            snapshot.tier,
        )));
    });

    let dispatch = use_callback(move |intent: LessonIntent| {
        let outcome = {
            let mut guard = vm.write();
            match guard.as_mut() {
                Some(Ok(player)) => player.apply(intent),
                _ => return,
            }
        };
        let LessonOutcome::Completed(completion) = outcome else {
            return;
        };
        let Some(user_id) = auth.peek().user.as_ref().map(|user| user.id) else {
            finished.set(Some((
                completion,
                SaveState::Failed(ViewError::SignedOut.message().into()),
            )));
            return;
        };

        finished.set(Some((completion.clone(), SaveState::Saving)));
        let lessons = ctx.lessons();
        spawn(async move {
            let state = match lessons.record_completion(user_id, &completion).await {
                Ok(_) => SaveState::Saved,
                Err(err) => SaveState::Failed(err.to_string()),
            };
            finished.set(Some((completion, state)));
        });
    });

    if let Some((completion, save)) = finished() {
        let title = vm
            .read()
            .as_ref()
            .and_then(|result| result.as_ref().ok())
            .map(|player| player.title().to_string())
            .unwrap_or_default();
        return rsx! {
            Celebration { title, completion, save }
        };
    }

    let guard = vm.read();
    let Some(result) = guard.as_ref() else {
        return rsx! {
            div { class: "page lesson", p { "Loading..." } }
        };
    };
    let player = match result {
        Ok(player) => player,
        Err(err) => {
            let message = err.message();
            let locked = *err == ViewError::Locked;
            return rsx! {
                div { class: "page lesson",
                    p { class: "error", "{message}" }
                    if locked {
                        Link { class: "btn-primary", to: Route::Subscribe {}, "See plans" }
                    }
                    Link { class: "btn-secondary", to: Route::Dashboard {}, "Back to Dashboard" }
                }
            };
        }
    };

    let unit_id = player.unit_id().value();
    let step = player.step();
    let shows_check = player.shows_check();
    let can_check = player.can_check();
    let can_back = player.can_go_back();
    let can_continue = player.can_continue();
    let continue_label = player.continue_label();
    let step_label = player.step_label();
    let progress = player.progress_percent();
    let title = player.title().to_string();
    drop(guard);

    rsx! {
        div { class: "page lesson",
            header { class: "lesson-header",
                Link { class: "back-link", to: Route::Unit { unit_id }, "← Back to Unit {unit_id}" }
                h2 { "{title}" }
                span { class: "step-label", "{step_label}" }
                ProgressBar { percent: progress }
            }

            section { class: "step",
                StepBody { step, on_select: move |index: usize| dispatch.call(LessonIntent::Select(index)) }
            }

            nav { class: "lesson-nav",
                button {
                    class: "btn-secondary",
                    disabled: !can_back,
                    onclick: move |_| dispatch.call(LessonIntent::Back),
                    "Previous"
                }
                if shows_check {
                    button {
                        class: "btn-primary",
                        disabled: !can_check,
                        onclick: move |_| dispatch.call(LessonIntent::Check),
                        "Check Answer"
                    }
                } else {
                    button {
                        class: "btn-primary",
                        disabled: !can_continue,
                        onclick: move |_| dispatch.call(LessonIntent::Continue),
                        "{continue_label}"
                    }
                }
            }
        }
    }
}

#[component]
fn StepBody(step: StepVm, on_select: EventHandler<usize>) -> Element {
    match step {
        StepVm::Introduction { title, body } => rsx! {
            h1 { "{title}" }
            p { class: "lead", "{body}" }
        },
        StepVm::Vocabulary { title, entries } => rsx! {
            h2 { "{title}" }
            ul { class: "vocabulary",
                for entry in entries {
                    li { class: "card vocab-entry",
                        span { class: "term", "{entry.term}" }
                        span { class: "translation", "{entry.translation}" }
                    }
                }
            }
            div { class: "tip",
                p { class: "tip-title", "Remember:" }
                p { "Practice makes perfect! Try using these in your daily conversations." }
            }
        },
        StepVm::Quiz { question, options, feedback } => {
            let correct_text = options
                .iter()
                .find(|option| option.mark == OptionMark::Correct)
                .map(|option| option.text.clone())
                .unwrap_or_default();
            rsx! {
                h2 { "Quiz Time!" }
                p { class: "question", "{question}" }
                div { class: "options",
                    for option in options {
                        OptionButton { key: "{option.index}", option, on_select }
                    }
                }
                match feedback {
                    Some(true) => rsx! {
                        p { class: "feedback correct", "Correct! Great job!" }
                    },
                    Some(false) => rsx! {
                        p { class: "feedback incorrect",
                            "Incorrect. The correct answer is \"{correct_text}\"."
                        }
                    },
                    None => rsx! {},
                }
            }
        }
        StepVm::Completion { title, message } => rsx! {
            h1 { "{title}" }
            p { class: "lead", "{message}" }
        },
    }
}

#[component]
fn OptionButton(option: QuizOptionVm, on_select: EventHandler<usize>) -> Element {
    let class = match option.mark {
        OptionMark::Neutral => "option",
        OptionMark::Selected => "option selected",
        OptionMark::Correct => "option correct",
        OptionMark::Incorrect => "option incorrect",
    };
    let index = option.index;
    rsx! {
        button { class, onclick: move |_| on_select.call(index), "{option.text}" }
    }
}

#[component]
fn Celebration(title: String, completion: LessonCompletion, save: SaveState) -> Element {
    let unit_id = completion.unit_id.value();
    rsx! {
        div { class: "page celebration",
            h1 { "Congratulations!" }
            p { "You've completed the {title} lesson and earned {completion.xp} XP! Keep up the great work." }
            if completion.quiz_count > 0 {
                p { class: "score",
                    "Quiz score: {completion.correct_answers} of {completion.quiz_count}"
                }
            }
            match save {
                SaveState::Saving => rsx! {
                    p { class: "muted", "Saving your progress..." }
                },
                SaveState::Saved => rsx! {},
                SaveState::Failed(message) => rsx! {
                    p { class: "error", "Your progress could not be saved: {message}" }
                },
            }
            div { class: "actions",
                Link { class: "btn-secondary", to: Route::Unit { unit_id }, "Back to Unit" }
                Link { class: "btn-primary", to: Route::Dashboard {}, "Dashboard" }
            }
        }
    }
}
