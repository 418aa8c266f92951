use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, UnitId};

//
// ─── STEP TYPES ────────────────────────────────────────────────────────────────
//

/// One word or phrase shown in a vocabulary block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub term: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

impl VocabularyEntry {
    pub fn new(term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            translation: translation.into(),
            audio: None,
        }
    }

    #[must_use]
    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self
    }
}

/// A single unit of lesson content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
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
        options: Vec<String>,
        correct_option: usize,
    },
    Completion {
        title: String,
        message: String,
    },
}

/// Discriminant of a [`Step`], for callers that only need the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Introduction,
    Vocabulary,
    Quiz,
    Completion,
}

impl Step {
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Introduction { .. } => StepKind::Introduction,
            Step::Vocabulary { .. } => StepKind::Vocabulary,
            Step::Quiz { .. } => StepKind::Quiz,
            Step::Completion { .. } => StepKind::Completion,
        }
    }

    #[must_use]
    pub fn is_quiz(&self) -> bool {
        matches!(self, Step::Quiz { .. })
    }

    /// Number of answer options, zero for non-quiz steps.
    #[must_use]
    pub fn option_count(&self) -> usize {
        match self {
            Step::Quiz { options, .. } => options.len(),
            Step::Introduction { .. } | Step::Vocabulary { .. } | Step::Completion { .. } => 0,
        }
    }

    fn validate(&self, index: usize) -> Result<(), LessonError> {
        match self {
            Step::Quiz {
                options,
                correct_option,
                ..
            } => {
                if options.len() < 2 {
                    return Err(LessonError::TooFewOptions {
                        step: index,
                        len: options.len(),
                    });
                }
                if *correct_option >= options.len() {
                    return Err(LessonError::CorrectOptionOutOfRange {
                        step: index,
                        index: *correct_option,
                        len: options.len(),
                    });
                }
                Ok(())
            }
            Step::Vocabulary { entries, .. } if entries.is_empty() => {
                Err(LessonError::EmptyVocabulary { step: index })
            }
            Step::Introduction { .. } | Step::Vocabulary { .. } | Step::Completion { .. } => {
                Ok(())
            }
        }
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A validated lesson. Step order is fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LessonRecord", into = "LessonRecord")]
pub struct Lesson {
    id: LessonId,
    unit_id: UnitId,
    title: String,
    steps: Vec<Step>,
}

impl Lesson {
    /// Build a lesson, checking every step.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is blank, there are no steps, or a
    /// step is malformed (quiz with fewer than two options or an out-of-range
    /// correct index, vocabulary block without entries).
    pub fn new(
        id: LessonId,
        unit_id: UnitId,
        title: impl Into<String>,
        steps: Vec<Step>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if steps.is_empty() {
            return Err(LessonError::NoSteps);
        }
        for (index, step) in steps.iter().enumerate() {
            step.validate(index)?;
        }

        Ok(Self {
            id,
            unit_id,
            title,
            steps,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    #[must_use]
    pub fn quiz_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_quiz()).count()
    }
}

/// Serialized shape of a lesson, validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LessonRecord {
    id: LessonId,
    unit_id: UnitId,
    title: String,
    steps: Vec<Step>,
}

impl TryFrom<LessonRecord> for Lesson {
    type Error = LessonError;

    fn try_from(record: LessonRecord) -> Result<Self, Self::Error> {
        Lesson::new(record.id, record.unit_id, record.title, record.steps)
    }
}

impl From<Lesson> for LessonRecord {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            unit_id: lesson.unit_id,
            title: lesson.title,
            steps: lesson.steps,
        }
    }
}

//
// ─── LESSON VALIDATION ERRORS ──────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson must contain at least one step")]
    NoSteps,

    #[error("quiz at step {step} has {len} option(s); at least 2 required")]
    TooFewOptions { step: usize, len: usize },

    #[error("quiz at step {step} marks option {index} correct but has only {len} options")]
    CorrectOptionOutOfRange { step: usize, index: usize, len: usize },

    #[error("vocabulary block at step {step} has no entries")]
    EmptyVocabulary { step: usize },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
