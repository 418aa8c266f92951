use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use lingo_core::Clock;
use lingo_core::model::{
    LessonId, LessonSummary, SubscriptionTier, Unit, UnitId, UnitProgress, UserId,
};
use lingo_core::player::{LessonCompletion, LessonPlayer};
use storage::repository::{CompletionRecord, ProgressRepository};

use crate::catalog::LessonCatalog;
use crate::error::LessonServiceError;

/// XP needed per level.
pub const XP_PER_LEVEL: u64 = 1000;

/// A lesson row on the unit page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonStatus {
    pub summary: LessonSummary,
    pub completed: bool,
    pub accessible: bool,
    pub playable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitOverview {
    pub unit: Unit,
    pub lessons: Vec<LessonStatus>,
    pub progress: UnitProgress,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitCard {
    pub id: UnitId,
    pub title: String,
    pub progress: UnitProgress,
}

/// Where "Continue learning" should take the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextLesson {
    pub unit_id: UnitId,
    pub unit_title: String,
    pub lesson_id: Option<LessonId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub total_xp: u64,
    pub level: u64,
    pub xp_to_next_level: u64,
    pub lessons: UnitProgress,
    pub units: Vec<UnitCard>,
    pub next: Option<NextLesson>,
    /// Consecutive UTC days with a completion, ending today or yesterday.
    pub streak_days: u32,
}

impl DashboardOverview {
    /// Percent of the way through the current level.
    #[must_use]
    pub fn level_percent(&self) -> f64 {
        let into_level = XP_PER_LEVEL - self.xp_to_next_level;
        #[allow(clippy::cast_precision_loss)]
        let percent = into_level as f64 / XP_PER_LEVEL as f64 * 100.0;
        percent
    }
}

/// Starts lessons, records completions and summarizes progress.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    catalog: Arc<LessonCatalog>,
    progress: Arc<dyn ProgressRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<LessonCatalog>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            progress,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &LessonCatalog {
        &self.catalog
    }

    /// Open a fresh player for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Locked` for a premium lesson when `tier`
    /// does not unlock premium content, and `LessonServiceError::Catalog` for
    /// unknown or unplayable lessons.
    pub fn start_lesson(
        &self,
        lesson_id: LessonId,
        tier: Option<SubscriptionTier>,
    ) -> Result<LessonPlayer, LessonServiceError> {
        let summary = self.catalog.summary(lesson_id)?;
        if !summary.accessible_with(tier) {
            return Err(LessonServiceError::Locked(lesson_id));
        }
        let lesson = self.catalog.lesson(lesson_id)?;
        Ok(LessonPlayer::new(lesson, self.clock))
    }

    /// Persist a completion signal for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if the record cannot be written.
    pub async fn record_completion(
        &self,
        user_id: UserId,
        completion: &LessonCompletion,
    ) -> Result<i64, LessonServiceError> {
        let record = CompletionRecord::from_completion(user_id, completion)?;
        let id = self.progress.append_completion(&record).await?;
        info!(
            %user_id,
            lesson_id = %completion.lesson_id,
            xp = completion.xp,
            correct = completion.correct_answers,
            quizzes = completion.quiz_count,
            "lesson completed"
        );
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::Catalog` for an unknown unit and
    /// `LessonServiceError::Storage` on read failures.
    pub async fn unit_overview(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        tier: Option<SubscriptionTier>,
    ) -> Result<UnitOverview, LessonServiceError> {
        let unit = self.catalog.unit(unit_id)?.clone();
        let done = self.progress.completed_lessons(user_id).await?;
        let lessons: Vec<_> = unit
            .lessons
            .iter()
            .map(|summary| LessonStatus {
                summary: summary.clone(),
                completed: done.contains(&summary.id),
                accessible: summary.accessible_with(tier),
                playable: self.catalog.is_playable(summary.id),
            })
            .collect();
        let progress = unit_progress(&unit, &done);
        Ok(UnitOverview {
            unit,
            lessons,
            progress,
        })
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` on read failures.
    pub async fn dashboard(
        &self,
        user_id: UserId,
        tier: Option<SubscriptionTier>,
    ) -> Result<DashboardOverview, LessonServiceError> {
        let total_xp = self.progress.total_xp(user_id).await?;
        let done = self.progress.completed_lessons(user_id).await?;
        let days = self.progress.completion_days(user_id).await?;
        let streak_days = current_streak(&days, self.clock.now().date_naive());

        let units: Vec<_> = self
            .catalog
            .units()
            .iter()
            .map(|unit| UnitCard {
                id: unit.id,
                title: unit.title.clone(),
                progress: unit_progress(unit, &done),
            })
            .collect();

        let completed = units.iter().map(|card| card.progress.completed).sum();
        let next = self.next_lesson(&units, &done, tier);

        Ok(DashboardOverview {
            total_xp,
            level: total_xp / XP_PER_LEVEL + 1,
            xp_to_next_level: XP_PER_LEVEL - total_xp % XP_PER_LEVEL,
            lessons: UnitProgress::new(completed, self.catalog.total_lessons()),
            units,
            next,
            streak_days,
        })
    }

    fn next_lesson(
        &self,
        cards: &[UnitCard],
        done: &BTreeSet<LessonId>,
        tier: Option<SubscriptionTier>,
    ) -> Option<NextLesson> {
        let card = cards
            .iter()
            .find(|card| !card.progress.is_finished())
            .or_else(|| cards.first())?;
        let unit = self.catalog.unit(card.id).ok()?;
        let lesson_id = unit
            .lessons
            .iter()
            .find(|summary| !done.contains(&summary.id) && summary.accessible_with(tier))
            .map(|summary| summary.id);
        Some(NextLesson {
            unit_id: card.id,
            unit_title: card.title.clone(),
            lesson_id,
        })
    }
}

/// Length of the run of consecutive days in `days` (newest first, distinct)
/// that ends today or yesterday. A run that ended earlier is broken.
fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&latest) = days.first() else {
        return 0;
    };
    if latest != today && Some(latest) != today.pred_opt() {
        return 0;
    }
    let mut streak = 1;
    for pair in days.windows(2) {
        if pair[0].pred_opt() != Some(pair[1]) {
            break;
        }
        streak += 1;
    }
    streak
}

fn unit_progress(unit: &Unit, done: &BTreeSet<LessonId>) -> UnitProgress {
    let completed = unit
        .lessons
        .iter()
        .filter(|summary| done.contains(&summary.id))
        .count();
    UnitProgress::new(completed, unit.lessons.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::player::Advance;
    use lingo_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service() -> LessonService {
        LessonService::new(
            fixed_clock(),
            Arc::new(LessonCatalog::builtin().unwrap()),
            Arc::new(InMemoryRepository::new()),
        )
    }

    fn play_through(service: &LessonService, lesson: u64) -> LessonCompletion {
        let mut player = service
            .start_lesson(LessonId::new(lesson), Some(SubscriptionTier::Premium))
            .unwrap();
        loop {
            if player.current_step().is_quiz() {
                let _ = player.select_option(0);
                let _ = player.evaluate();
            }
            if let Advance::Completed(completion) = player.advance() {
                return completion;
            }
        }
    }

    #[test]
    fn premium_lessons_are_locked_for_free_tier() {
        let service = service();
        for tier in [None, Some(SubscriptionTier::Free)] {
            assert!(matches!(
                service.start_lesson(LessonId::new(5), tier),
                Err(LessonServiceError::Locked(_))
            ));
        }
        assert!(service
            .start_lesson(LessonId::new(5), Some(SubscriptionTier::Basic))
            .is_ok());
        assert!(service.start_lesson(LessonId::new(2), None).is_ok());
    }

    #[test]
    fn listed_lesson_without_content_is_reported() {
        let err = service()
            .start_lesson(LessonId::new(23), Some(SubscriptionTier::Free))
            .unwrap_err();
        assert!(matches!(err, LessonServiceError::Catalog(_)));
    }

    #[tokio::test]
    async fn fresh_learner_dashboard() {
        let service = service();
        let overview = service
            .dashboard(UserId::random(), Some(SubscriptionTier::Free))
            .await
            .unwrap();
        assert_eq!(overview.total_xp, 0);
        assert_eq!(overview.level, 1);
        assert_eq!(overview.xp_to_next_level, 1000);
        assert_eq!(overview.lessons.completed, 0);
        let next = overview.next.unwrap();
        assert_eq!(next.unit_id, UnitId::new(1));
        assert_eq!(next.lesson_id, Some(LessonId::new(1)));
    }

    #[tokio::test]
    async fn completions_move_progress_and_xp() {
        let service = service();
        let user = UserId::random();
        for lesson in [1, 2, 2] {
            let completion = play_through(&service, lesson);
            service.record_completion(user, &completion).await.unwrap();
        }

        let overview = service
            .dashboard(user, Some(SubscriptionTier::Free))
            .await
            .unwrap();
        assert_eq!(overview.total_xp, 75);
        assert_eq!(overview.xp_to_next_level, 925);
        assert_eq!(overview.lessons.completed, 2);
        assert_eq!(overview.next.unwrap().lesson_id, Some(LessonId::new(3)));

        let unit = service
            .unit_overview(user, UnitId::new(1), Some(SubscriptionTier::Free))
            .await
            .unwrap();
        assert_eq!(unit.progress, UnitProgress::new(2, 8));
        assert!(unit.lessons[0].completed);
        assert!(!unit.lessons[2].completed);
        assert!(!unit.lessons[4].accessible);
        assert!(unit.lessons[6].accessible);
    }

    #[tokio::test]
    async fn next_lesson_skips_locked_premium_lessons() {
        let service = service();
        let user = UserId::random();
        for lesson in [1, 2, 3, 4] {
            let completion = play_through(&service, lesson);
            service.record_completion(user, &completion).await.unwrap();
        }
        let free = service
            .dashboard(user, Some(SubscriptionTier::Free))
            .await
            .unwrap();
        assert_eq!(free.next.unwrap().lesson_id, Some(LessonId::new(7)));

        let premium = service
            .dashboard(user, Some(SubscriptionTier::Premium))
            .await
            .unwrap();
        assert_eq!(premium.next.unwrap().lesson_id, Some(LessonId::new(5)));
    }

    fn day(offset: i64) -> NaiveDate {
        fixed_clock().now().date_naive() + chrono::Duration::days(offset)
    }

    #[test]
    fn streak_is_zero_without_history() {
        assert_eq!(current_streak(&[], day(0)), 0);
    }

    #[test]
    fn streak_counts_back_from_today() {
        assert_eq!(current_streak(&[day(0), day(-1), day(-2)], day(0)), 3);
        // A gap ends the run.
        assert_eq!(current_streak(&[day(0), day(-1), day(-3), day(-4)], day(0)), 2);
    }

    #[test]
    fn streak_ending_yesterday_still_counts() {
        assert_eq!(current_streak(&[day(-1), day(-2)], day(0)), 2);
    }

    #[test]
    fn streak_older_than_yesterday_is_broken() {
        assert_eq!(current_streak(&[day(-2), day(-3), day(-4)], day(0)), 0);
    }

    #[tokio::test]
    async fn dashboard_reports_streak_from_recorded_days() {
        let progress = Arc::new(InMemoryRepository::new());
        let mut clock = fixed_clock();
        clock.advance(chrono::Duration::days(-2));
        let user = UserId::random();

        // Two days ago and yesterday; nothing yet today.
        for _ in 0..2 {
            let earlier = LessonService::new(
                clock,
                Arc::new(LessonCatalog::builtin().unwrap()),
                progress.clone(),
            );
            let completion = play_through(&earlier, 1);
            earlier.record_completion(user, &completion).await.unwrap();
            clock.advance(chrono::Duration::days(1));
        }

        let today = LessonService::new(
            fixed_clock(),
            Arc::new(LessonCatalog::builtin().unwrap()),
            progress,
        );
        let overview = today
            .dashboard(user, Some(SubscriptionTier::Free))
            .await
            .unwrap();
        assert_eq!(overview.streak_days, 2);
        assert_eq!(
            service()
                .dashboard(user, Some(SubscriptionTier::Free))
                .await
                .unwrap()
                .streak_days,
            0
        );
    }

    #[test]
    fn level_percent_tracks_xp_within_level() {
        let overview = DashboardOverview {
            total_xp: 1250,
            level: 2,
            xp_to_next_level: 750,
            lessons: UnitProgress::new(0, 0),
            units: Vec::new(),
            next: None,
            streak_days: 0,
        };
        assert!((overview.level_percent() - 25.0).abs() < f64::EPSILON);
    }
}
