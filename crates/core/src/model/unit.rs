use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, UnitId};
use crate::model::profile::SubscriptionTier;

/// Broad flavor of a lesson, shown as a badge in unit listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonCategory {
    Vocabulary,
    Conversation,
    Grammar,
    Speaking,
    Culture,
    Quiz,
    Activity,
}

impl LessonCategory {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LessonCategory::Vocabulary => "vocabulary",
            LessonCategory::Conversation => "conversation",
            LessonCategory::Grammar => "grammar",
            LessonCategory::Speaking => "speaking",
            LessonCategory::Culture => "culture",
            LessonCategory::Quiz => "quiz",
            LessonCategory::Activity => "activity",
        }
    }
}

/// Listing entry for a lesson inside a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub id: LessonId,
    pub title: String,
    pub category: LessonCategory,
    #[serde(default)]
    pub premium: bool,
}

impl LessonSummary {
    /// Free lessons are open to everyone; premium ones need a paid tier.
    #[must_use]
    pub fn accessible_with(&self, tier: Option<SubscriptionTier>) -> bool {
        !self.premium || tier.is_some_and(SubscriptionTier::unlocks_premium)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub title: String,
    pub description: String,
    pub lessons: Vec<LessonSummary>,
}

impl Unit {
    #[must_use]
    pub fn contains(&self, lesson_id: LessonId) -> bool {
        self.lessons.iter().any(|lesson| lesson.id == lesson_id)
    }
}

/// Completed-over-total ratio for a unit or the whole course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitProgress {
    pub completed: usize,
    pub total: usize,
}

impl UnitProgress {
    #[must_use]
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            completed: completed.min(total),
            total,
        }
    }

    /// Percentage in `0.0..=100.0`; an empty unit reports zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(premium: bool) -> LessonSummary {
        LessonSummary {
            id: LessonId::new(5),
            title: "Practice Dialogue".into(),
            category: LessonCategory::Speaking,
            premium,
        }
    }

    #[test]
    fn premium_lessons_need_paid_tier() {
        let lesson = summary(true);
        assert!(!lesson.accessible_with(None));
        assert!(!lesson.accessible_with(Some(SubscriptionTier::Free)));
        assert!(lesson.accessible_with(Some(SubscriptionTier::Basic)));
        assert!(lesson.accessible_with(Some(SubscriptionTier::Premium)));
    }

    #[test]
    fn free_lessons_are_always_open() {
        assert!(summary(false).accessible_with(None));
    }

    #[test]
    fn progress_percent_handles_empty_and_partial() {
        assert_eq!(UnitProgress::new(0, 0).percent(), 0.0);
        assert_eq!(UnitProgress::new(3, 8).percent(), 37.5);
        assert!(UnitProgress::new(5, 5).is_finished());
        assert!(!UnitProgress::new(0, 0).is_finished());
    }

    #[test]
    fn progress_clamps_completed_to_total() {
        assert_eq!(UnitProgress::new(9, 4).completed, 4);
    }
}
