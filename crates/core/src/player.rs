//! Lesson step engine.
//!
//! A [`LessonPlayer`] walks one learner through a lesson's fixed sequence of
//! steps. It owns the [`PlaybackState`] for that session and is the only
//! thing allowed to change it. Invalid requests never panic and never return
//! an `Err`: the state is left untouched and the returned outcome carries the
//! [`EngineViolation`] so the UI can tell why nothing happened. The UI is
//! expected to consult `can_*` before enabling an affordance.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Lesson, LessonId, Step, UnitId};
use crate::time::Clock;

/// XP awarded for finishing a lesson.
pub const LESSON_XP: u32 = 25;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Outcome of checking a quiz answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    Unanswered,
    Evaluated { correct: bool },
}

impl AnswerState {
    #[must_use]
    pub fn is_evaluated(self) -> bool {
        matches!(self, AnswerState::Evaluated { .. })
    }
}

/// Cursor and answer state for one in-progress lesson session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackState {
    current_index: usize,
    selected_option: Option<usize>,
    answer: AnswerState,
    complete: bool,
}

impl PlaybackState {
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    #[must_use]
    pub fn answer(&self) -> AnswerState {
        self.answer
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn clear_answer(&mut self) {
        self.selected_option = None;
        self.answer = AnswerState::Unanswered;
    }
}

/// 1-based "Step 2 of 6".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub number: usize,
    pub total: usize,
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Why the engine refused a request.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineViolation {
    #[error("the current quiz has not been answered")]
    QuizUnanswered,
    #[error("the lesson is already complete")]
    AlreadyComplete,
    #[error("already at the first step")]
    AtFirstStep,
    #[error("the current step is not a quiz")]
    NotAQuiz,
    #[error("the answer has already been checked")]
    AlreadyEvaluated,
    #[error("no option is selected")]
    NoSelection,
    #[error("option {index} does not exist (quiz has {len})")]
    OptionOutOfRange { index: usize, len: usize },
}

/// Result of `retreat` and `select_option`.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Rejected(EngineViolation),
}

impl Transition {
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Transition::Applied)
    }
}

/// Result of `advance`.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { index: usize },
    /// The completion signal. Produced once per session.
    Completed(LessonCompletion),
    Rejected(EngineViolation),
}

/// Result of `evaluate`.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Evaluated { correct: bool },
    AlreadyEvaluated { correct: bool },
    Rejected(EngineViolation),
}

/// Payload handed to whoever records progress and rewards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonCompletion {
    pub lesson_id: LessonId,
    pub unit_id: UnitId,
    pub xp: u32,
    pub correct_answers: usize,
    pub quiz_count: usize,
    pub completed_at: DateTime<Utc>,
}

//
// ─── PLAYER ────────────────────────────────────────────────────────────────────
//

pub struct LessonPlayer {
    lesson: Arc<Lesson>,
    state: PlaybackState,
    clock: Clock,
    // Latest checked outcome per quiz step, for the completion tally.
    quiz_results: BTreeMap<usize, bool>,
}

impl LessonPlayer {
    /// Start a fresh session at the first step.
    #[must_use]
    pub fn new(lesson: Arc<Lesson>, clock: Clock) -> Self {
        Self {
            lesson,
            state: PlaybackState::default(),
            clock,
            quiz_results: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn current_step(&self) -> &Step {
        // current_index < len is maintained by every transition
        &self.lesson.steps()[self.state.current_index]
    }

    #[must_use]
    pub fn position(&self) -> StepPosition {
        StepPosition {
            number: self.state.current_index + 1,
            total: self.lesson.len(),
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        let position = self.position();
        position.number as f64 * 100.0 / position.total as f64
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.state.current_index == self.lesson.last_index()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        !self.state.complete
            && (!self.current_step().is_quiz() || self.state.answer.is_evaluated())
    }

    #[must_use]
    pub fn can_retreat(&self) -> bool {
        !self.state.complete && self.state.current_index > 0
    }

    #[must_use]
    pub fn can_select(&self) -> bool {
        !self.state.complete
            && self.current_step().is_quiz()
            && !self.state.answer.is_evaluated()
    }

    #[must_use]
    pub fn can_evaluate(&self) -> bool {
        self.can_select() && self.state.selected_option.is_some()
    }

    /// Index of the right answer, only once the current quiz was checked.
    #[must_use]
    pub fn revealed_answer(&self) -> Option<usize> {
        match (self.current_step(), self.state.answer) {
            (Step::Quiz { correct_option, .. }, AnswerState::Evaluated { .. }) => {
                Some(*correct_option)
            }
            _ => None,
        }
    }

    pub fn advance(&mut self) -> Advance {
        if self.state.complete {
            return Advance::Rejected(EngineViolation::AlreadyComplete);
        }
        if self.current_step().is_quiz() && !self.state.answer.is_evaluated() {
            return Advance::Rejected(EngineViolation::QuizUnanswered);
        }

        if self.is_last_step() {
            self.state.complete = true;
            return Advance::Completed(self.completion());
        }

        self.state.current_index += 1;
        self.state.clear_answer();
        Advance::Moved {
            index: self.state.current_index,
        }
    }

    /// Step back one. Any answer on the step being left is discarded.
    pub fn retreat(&mut self) -> Transition {
        if self.state.complete {
            return Transition::Rejected(EngineViolation::AlreadyComplete);
        }
        if self.state.current_index == 0 {
            return Transition::Rejected(EngineViolation::AtFirstStep);
        }

        self.state.current_index -= 1;
        self.state.clear_answer();
        Transition::Applied
    }

    pub fn select_option(&mut self, index: usize) -> Transition {
        if let Err(violation) = self.check_open_quiz() {
            return Transition::Rejected(violation);
        }
        let len = self.current_step().option_count();
        if index >= len {
            return Transition::Rejected(EngineViolation::OptionOutOfRange { index, len });
        }

        self.state.selected_option = Some(index);
        Transition::Applied
    }

    /// Check the selected option against the correct one, by index.
    pub fn evaluate(&mut self) -> Evaluation {
        if self.state.complete {
            return Evaluation::Rejected(EngineViolation::AlreadyComplete);
        }
        let Step::Quiz { correct_option, .. } = self.current_step() else {
            return Evaluation::Rejected(EngineViolation::NotAQuiz);
        };
        let correct_option = *correct_option;
        if let AnswerState::Evaluated { correct } = self.state.answer {
            return Evaluation::AlreadyEvaluated { correct };
        }
        let Some(selected) = self.state.selected_option else {
            return Evaluation::Rejected(EngineViolation::NoSelection);
        };

        let correct = selected == correct_option;
        self.state.answer = AnswerState::Evaluated { correct };
        self.quiz_results.insert(self.state.current_index, correct);
        Evaluation::Evaluated { correct }
    }

    fn check_open_quiz(&self) -> Result<(), EngineViolation> {
        if self.state.complete {
            return Err(EngineViolation::AlreadyComplete);
        }
        if !self.current_step().is_quiz() {
            return Err(EngineViolation::NotAQuiz);
        }
        if self.state.answer.is_evaluated() {
            return Err(EngineViolation::AlreadyEvaluated);
        }
        Ok(())
    }

    fn completion(&self) -> LessonCompletion {
        LessonCompletion {
            lesson_id: self.lesson.id(),
            unit_id: self.lesson.unit_id(),
            xp: LESSON_XP,
            correct_answers: self.quiz_results.values().filter(|ok| **ok).count(),
            quiz_count: self.lesson.quiz_count(),
            completed_at: self.clock.now(),
        }
    }
}

impl std::fmt::Debug for LessonPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonPlayer")
            .field("lesson_id", &self.lesson.id())
            .field("steps", &self.lesson.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VocabularyEntry;
    use crate::time::{fixed_clock, fixed_now};

    fn intro() -> Step {
        Step::Introduction {
            title: "Welcome".into(),
            body: "Common greetings".into(),
        }
    }

    fn quiz(options: &[&str], correct_option: usize) -> Step {
        Step::Quiz {
            question: "Which one?".into(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
            correct_option,
        }
    }

    fn vocab() -> Step {
        Step::Vocabulary {
            title: "Words".into(),
            entries: vec![VocabularyEntry::new("Salamat", "Thank you")],
        }
    }

    fn done() -> Step {
        Step::Completion {
            title: "Lesson Complete!".into(),
            message: "Great job".into(),
        }
    }

    fn player(steps: Vec<Step>) -> LessonPlayer {
        let lesson = Lesson::new(LessonId::new(1), UnitId::new(1), "Basic Greetings", steps).unwrap();
        LessonPlayer::new(Arc::new(lesson), fixed_clock())
    }

    fn scenario() -> LessonPlayer {
        player(vec![intro(), quiz(&["A", "B", "C"], 1), done()])
    }

    /// Walks to the end, answering every quiz with option 0.
    fn run_to_end(p: &mut LessonPlayer) -> Vec<Advance> {
        let mut outcomes = Vec::new();
        loop {
            if p.current_step().is_quiz() {
                assert!(p.select_option(0).is_applied());
                assert!(matches!(p.evaluate(), Evaluation::Evaluated { .. }));
            }
            let outcome = p.advance();
            let finished = matches!(outcome, Advance::Completed(_));
            outcomes.push(outcome);
            if finished {
                return outcomes;
            }
        }
    }

    #[test]
    fn fresh_session_starts_at_first_step() {
        let p = scenario();
        assert_eq!(p.state(), &PlaybackState::default());
        assert_eq!(p.position(), StepPosition { number: 1, total: 3 });
        assert!(!p.can_retreat());
        assert!(p.can_advance());
    }

    #[test]
    fn correct_answer_scenario() {
        let mut p = scenario();
        assert_eq!(p.advance(), Advance::Moved { index: 1 });
        assert!(p.select_option(1).is_applied());
        assert_eq!(p.state().selected_option(), Some(1));
        assert_eq!(p.evaluate(), Evaluation::Evaluated { correct: true });
        assert_eq!(p.state().answer(), AnswerState::Evaluated { correct: true });
        assert_eq!(p.revealed_answer(), Some(1));
        assert_eq!(p.advance(), Advance::Moved { index: 2 });

        let Advance::Completed(completion) = p.advance() else {
            panic!("expected completion");
        };
        assert!(p.state().is_complete());
        assert_eq!(completion.lesson_id, LessonId::new(1));
        assert_eq!(completion.xp, LESSON_XP);
        assert_eq!(completion.correct_answers, 1);
        assert_eq!(completion.quiz_count, 1);
        assert_eq!(completion.completed_at, fixed_now());
    }

    #[test]
    fn incorrect_answer_locks_selection() {
        let mut p = scenario();
        let _ = p.advance();
        assert!(p.select_option(0).is_applied());
        assert_eq!(p.evaluate(), Evaluation::Evaluated { correct: false });

        assert_eq!(
            p.select_option(2),
            Transition::Rejected(EngineViolation::AlreadyEvaluated)
        );
        assert_eq!(p.state().selected_option(), Some(0));
        assert_eq!(p.state().answer(), AnswerState::Evaluated { correct: false });
    }

    #[test]
    fn advance_on_unanswered_quiz_is_a_no_op() {
        let mut p = scenario();
        let _ = p.advance();
        let before = p.state().clone();
        assert!(!p.can_advance());
        assert_eq!(p.advance(), Advance::Rejected(EngineViolation::QuizUnanswered));
        assert_eq!(p.state(), &before);

        // selecting without checking is still not enough
        let _ = p.select_option(2);
        let before = p.state().clone();
        assert_eq!(p.advance(), Advance::Rejected(EngineViolation::QuizUnanswered));
        assert_eq!(p.state(), &before);
    }

    #[test]
    fn evaluate_is_idempotent() {
        let mut p = scenario();
        let _ = p.advance();
        let _ = p.select_option(2);
        assert_eq!(p.evaluate(), Evaluation::Evaluated { correct: false });
        let after_first = p.state().clone();
        for _ in 0..3 {
            assert_eq!(p.evaluate(), Evaluation::AlreadyEvaluated { correct: false });
            assert_eq!(p.state(), &after_first);
        }
    }

    #[test]
    fn evaluate_requires_a_selection_and_a_quiz() {
        let mut p = scenario();
        assert_eq!(p.evaluate(), Evaluation::Rejected(EngineViolation::NotAQuiz));
        let _ = p.advance();
        assert!(!p.can_evaluate());
        assert_eq!(p.evaluate(), Evaluation::Rejected(EngineViolation::NoSelection));
        assert_eq!(p.state().answer(), AnswerState::Unanswered);
    }

    #[test]
    fn select_rejects_non_quiz_and_out_of_range() {
        let mut p = scenario();
        assert_eq!(p.select_option(0), Transition::Rejected(EngineViolation::NotAQuiz));
        let _ = p.advance();
        assert_eq!(
            p.select_option(3),
            Transition::Rejected(EngineViolation::OptionOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(p.state().selected_option(), None);
    }

    #[test]
    fn selection_can_change_before_checking() {
        let mut p = scenario();
        let _ = p.advance();
        let _ = p.select_option(0);
        let _ = p.select_option(1);
        assert_eq!(p.state().selected_option(), Some(1));
        assert_eq!(p.evaluate(), Evaluation::Evaluated { correct: true });
    }

    #[test]
    fn retreat_at_first_step_is_a_no_op() {
        let mut p = scenario();
        assert_eq!(p.retreat(), Transition::Rejected(EngineViolation::AtFirstStep));
        assert_eq!(p.state(), &PlaybackState::default());
    }

    #[test]
    fn retreat_always_clears_answer_state() {
        let mut p = player(vec![intro(), quiz(&["x", "y"], 0), quiz(&["x", "y"], 1), done()]);
        let _ = p.advance();
        let _ = p.select_option(0);
        let _ = p.evaluate();
        let _ = p.advance();
        // second quiz: selected but not evaluated
        let _ = p.select_option(1);

        assert!(p.retreat().is_applied());
        assert_eq!(p.state().current_index(), 1);
        assert_eq!(p.state().selected_option(), None);
        assert_eq!(p.state().answer(), AnswerState::Unanswered);

        // the first quiz must be answered again before moving on
        assert_eq!(p.advance(), Advance::Rejected(EngineViolation::QuizUnanswered));

        assert!(p.retreat().is_applied());
        assert_eq!(p.state().current_index(), 0);
        assert_eq!(p.state().selected_option(), None);
        assert_eq!(p.state().answer(), AnswerState::Unanswered);
    }

    #[test]
    fn retreat_from_evaluated_quiz_clears_it() {
        let mut p = player(vec![intro(), quiz(&["x", "y"], 0), done()]);
        let _ = p.advance();
        let _ = p.select_option(1);
        let _ = p.evaluate();
        assert!(p.retreat().is_applied());
        assert_eq!(p.state().selected_option(), None);
        assert_eq!(p.state().answer(), AnswerState::Unanswered);
    }

    #[test]
    fn n_minus_one_advances_reach_last_step_then_complete_once() {
        let shapes: Vec<Vec<Step>> = vec![
            vec![done()],
            vec![intro(), done()],
            vec![quiz(&["a", "b"], 0)],
            vec![intro(), vocab(), vocab(), quiz(&["a", "b", "c", "d"], 1), quiz(&["a", "b"], 1), done()],
            vec![quiz(&["a", "b"], 1), quiz(&["a", "b"], 0), quiz(&["a", "b"], 1)],
        ];

        for steps in shapes {
            let n = steps.len();
            let mut p = player(steps);
            let outcomes = run_to_end(&mut p);

            assert_eq!(outcomes.len(), n);
            for (i, outcome) in outcomes[..n - 1].iter().enumerate() {
                assert_eq!(outcome, &Advance::Moved { index: i + 1 });
            }
            assert!(matches!(outcomes[n - 1], Advance::Completed(_)));
            assert_eq!(p.state().current_index(), n - 1);
            assert!(p.is_complete());

            // no second signal
            assert_eq!(p.advance(), Advance::Rejected(EngineViolation::AlreadyComplete));
            assert_eq!(p.retreat(), Transition::Rejected(EngineViolation::AlreadyComplete));
            assert!(!p.can_advance());
        }
    }

    #[test]
    fn completion_counts_latest_answer_per_quiz() {
        let mut p = player(vec![quiz(&["a", "b"], 1), intro(), done()]);
        let _ = p.select_option(0);
        let _ = p.evaluate();
        let _ = p.advance();
        // revisit and answer correctly this time
        let _ = p.retreat();
        let _ = p.select_option(1);
        let _ = p.evaluate();
        let _ = p.advance();
        let _ = p.advance();
        let Advance::Completed(completion) = p.advance() else {
            panic!("expected completion");
        };
        assert_eq!(completion.correct_answers, 1);
        assert_eq!(completion.quiz_count, 1);
    }

    #[test]
    fn duplicate_option_text_compares_by_index() {
        let mut p = player(vec![quiz(&["same", "same"], 1)]);
        let _ = p.select_option(0);
        assert_eq!(p.evaluate(), Evaluation::Evaluated { correct: false });
    }

    #[test]
    fn progress_tracks_position() {
        let mut p = player(vec![intro(), intro(), intro(), done()]);
        assert_eq!(p.progress_percent(), 25.0);
        let _ = p.advance();
        let _ = p.advance();
        assert_eq!(p.position(), StepPosition { number: 3, total: 4 });
        assert_eq!(p.progress_percent(), 75.0);
        assert!(!p.is_last_step());
    }
}
