use lingo_core::model::{LessonId, Step, SubscriptionTier, UnitId, VocabularyEntry};
use lingo_core::player::{Advance, AnswerState, LessonCompletion, LessonPlayer};
use services::LessonService;

use crate::views::ViewError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonIntent {
    Back,
    Continue,
    Select(usize),
    Check,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LessonOutcome {
    Continue,
    Completed(LessonCompletion),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Selected,
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizOptionVm {
    pub index: usize,
    pub text: String,
    pub mark: OptionMark,
}

/// Render-ready view of the current step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepVm {
    Introduction {
        title: String,
        body: String,
    },
    Vocabulary {
        title: String,
        entries: Vec<VocabularyEntry>,
    },
    Quiz {
        question: String,
        options: Vec<QuizOptionVm>,
        feedback: Option<bool>,
    },
    Completion {
        title: String,
        message: String,
    },
}

pub struct LessonVm {
    player: LessonPlayer,
}

impl LessonVm {
    #[must_use]
    pub fn new(player: LessonPlayer) -> Self {
        Self { player }
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.player.lesson().id()
    }

    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.player.lesson().unit_id()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.player.lesson().title()
    }

    #[must_use]
    pub fn step_label(&self) -> String {
        let position = self.player.position();
        format!("Step {} of {}", position.number, position.total)
    }

    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        self.player.progress_percent()
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.player.can_retreat()
    }

    #[must_use]
    pub fn can_continue(&self) -> bool {
        self.player.can_advance()
    }

    #[must_use]
    pub fn can_check(&self) -> bool {
        self.player.can_evaluate()
    }

    /// Quizzes show "Check Answer" until evaluated.
    #[must_use]
    pub fn shows_check(&self) -> bool {
        self.player.current_step().is_quiz() && !self.player.state().answer().is_evaluated()
    }

    #[must_use]
    pub fn continue_label(&self) -> &'static str {
        if self.player.is_last_step() {
            "Finish Lesson"
        } else {
            "Continue"
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.player.is_complete()
    }

    #[must_use]
    pub fn step(&self) -> StepVm {
        match self.player.current_step() {
            Step::Introduction { title, body } => StepVm::Introduction {
                title: title.clone(),
                body: body.clone(),
            },
            Step::Vocabulary { title, entries } => StepVm::Vocabulary {
                title: title.clone(),
                entries: entries.clone(),
            },
            Step::Quiz {
                question, options, ..
            } => {
                let state = self.player.state();
                let revealed = self.player.revealed_answer();
                let feedback = match state.answer() {
                    AnswerState::Evaluated { correct } => Some(correct),
                    AnswerState::Unanswered => None,
                };
                let options = options
                    .iter()
                    .enumerate()
                    .map(|(index, text)| {
                        let selected = state.selected_option() == Some(index);
                        let mark = match (revealed, feedback) {
                            (Some(answer), Some(_)) if answer == index => OptionMark::Correct,
                            (Some(_), Some(false)) if selected => OptionMark::Incorrect,
                            _ if selected => OptionMark::Selected,
                            _ => OptionMark::Neutral,
                        };
                        QuizOptionVm {
                            index,
                            text: text.clone(),
                            mark,
                        }
                    })
                    .collect();
                StepVm::Quiz {
                    question: question.clone(),
                    options,
                    feedback,
                }
            }
            Step::Completion { title, message } => StepVm::Completion {
                title: title.clone(),
                message: message.clone(),
            },
        }
    }

    /// Apply a user intent. Refused intents leave the lesson unchanged.
    pub fn apply(&mut self, intent: LessonIntent) -> LessonOutcome {
        match intent {
            LessonIntent::Back => {
                let _ = self.player.retreat();
            }
            LessonIntent::Select(index) => {
                let _ = self.player.select_option(index);
            }
            LessonIntent::Check => {
                let _ = self.player.evaluate();
            }
            LessonIntent::Continue => {
                if let Advance::Completed(completion) = self.player.advance() {
                    return LessonOutcome::Completed(completion);
                }
            }
        }
        LessonOutcome::Continue
    }
}

/// # Errors
///
/// Returns `ViewError::Locked` for premium lessons outside the learner's plan,
/// `ViewError::ComingSoon` for lessons without content, and
/// `ViewError::NotFound` for unknown ids.
pub fn start_lesson(
    lessons: &LessonService,
    lesson_id: LessonId,
    tier: Option<SubscriptionTier>,
) -> Result<LessonVm, ViewError> {
    lessons
        .start_lesson(lesson_id, tier)
        .map(LessonVm::new)
        .map_err(|err| ViewError::from(&err))
}
