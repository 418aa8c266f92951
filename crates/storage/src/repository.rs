use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lingo_core::model::{LessonId, UnitId, UserId};
use lingo_core::player::LessonCompletion;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a finished lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub unit_id: UnitId,
    pub xp: u32,
    pub correct_answers: u32,
    pub quiz_count: u32,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    /// Attach a user to a completion signal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the quiz counters do not fit in `u32`.
    pub fn from_completion(
        user_id: UserId,
        completion: &LessonCompletion,
    ) -> Result<Self, StorageError> {
        let count = |field: &'static str, v: usize| {
            u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
        };

        Ok(Self {
            user_id,
            lesson_id: completion.lesson_id,
            unit_id: completion.unit_id,
            xp: completion.xp,
            correct_answers: count("correct_answers", completion.correct_answers)?,
            quiz_count: count("quiz_count", completion.quiz_count)?,
            completed_at: completion.completed_at,
        })
    }
}

/// Repository contract for lesson completions and XP.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Store a completion and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError>;

    /// UTC calendar days with at least one completion, newest first, each once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn completion_days(&self, user_id: UserId) -> Result<Vec<NaiveDate>, StorageError>;

    /// Distinct lessons the user has finished at least once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn completed_lessons(&self, user_id: UserId) -> Result<BTreeSet<LessonId>, StorageError>;

    /// Sum of XP over every completion.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn total_xp(&self, user_id: UserId) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    completions: Arc<Mutex<Vec<CompletionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, Vec<CompletionRecord>>, StorageError> {
        self.completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn append_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError> {
        let mut rows = self.rows()?;
        let id = i64::try_from(rows.len())
            .map_err(|_| StorageError::Serialization("id overflow".into()))?
            + 1;
        rows.push(record.clone());
        Ok(id)
    }

    async fn completion_days(&self, user_id: UserId) -> Result<Vec<NaiveDate>, StorageError> {
        let rows = self.rows()?;
        let days: BTreeSet<NaiveDate> = rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| row.completed_at.date_naive())
            .collect();
        Ok(days.into_iter().rev().collect())
    }

    async fn completed_lessons(&self, user_id: UserId) -> Result<BTreeSet<LessonId>, StorageError> {
        let rows = self.rows()?;
        Ok(rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| row.lesson_id)
            .collect())
    }

    async fn total_xp(&self, user_id: UserId) -> Result<u64, StorageError> {
        let rows = self.rows()?;
        Ok(rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| u64::from(row.xp))
            .sum())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lingo_core::time::fixed_now;

    fn record(user_id: UserId, lesson: u64, minutes: i64) -> CompletionRecord {
        CompletionRecord {
            user_id,
            lesson_id: LessonId::new(lesson),
            unit_id: UnitId::new(1),
            xp: 25,
            correct_answers: 1,
            quiz_count: 2,
            completed_at: fixed_now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn record_copies_completion_fields() {
        let user = UserId::random();
        let completion = LessonCompletion {
            lesson_id: LessonId::new(3),
            unit_id: UnitId::new(1),
            xp: 25,
            correct_answers: 2,
            quiz_count: 2,
            completed_at: fixed_now(),
        };
        let rec = CompletionRecord::from_completion(user, &completion).unwrap();
        assert_eq!(rec.user_id, user);
        assert_eq!(rec.lesson_id, LessonId::new(3));
        assert_eq!(rec.correct_answers, 2);
    }

    #[tokio::test]
    async fn aggregates_per_user() {
        let repo = InMemoryRepository::new();
        let ana = UserId::random();
        let ben = UserId::random();

        repo.append_completion(&record(ana, 1, 0)).await.unwrap();
        repo.append_completion(&record(ana, 1, 5)).await.unwrap();
        repo.append_completion(&record(ana, 2, 10)).await.unwrap();
        repo.append_completion(&record(ben, 4, 0)).await.unwrap();

        let lessons = repo.completed_lessons(ana).await.unwrap();
        assert_eq!(lessons.into_iter().collect::<Vec<_>>(), vec![LessonId::new(1), LessonId::new(2)]);
        assert_eq!(repo.total_xp(ana).await.unwrap(), 75);
        assert_eq!(repo.total_xp(ben).await.unwrap(), 25);

    }

    #[tokio::test]
    async fn completion_days_are_distinct_and_newest_first() {
        let repo = InMemoryRepository::new();
        let ana = UserId::random();
        let day = 24 * 60;
        for minutes in [0, 5, -2 * day, -day, -day + 1] {
            repo.append_completion(&record(ana, 1, minutes)).await.unwrap();
        }
        repo.append_completion(&record(UserId::random(), 1, day))
            .await
            .unwrap();

        let today = fixed_now().date_naive();
        let days = repo.completion_days(ana).await.unwrap();
        assert_eq!(
            days,
            vec![
                today,
                today - Duration::days(1),
                today - Duration::days(2),
            ]
        );
        assert!(repo.completion_days(UserId::random()).await.unwrap().is_empty());
    }
}
