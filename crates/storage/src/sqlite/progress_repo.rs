use std::collections::BTreeSet;

use chrono::NaiveDate;
use lingo_core::model::{LessonId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{completed_day, distinct_days, id_i64, lesson_id_from_i64, ser};
use crate::repository::{CompletionRecord, ProgressRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn append_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO lesson_completions (
                    user_id, lesson_id, unit_id, xp,
                    correct_answers, quiz_count, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(record.user_id.to_string())
        .bind(id_i64("lesson_id", record.lesson_id.value())?)
        .bind(id_i64("unit_id", record.unit_id.value())?)
        .bind(i64::from(record.xp))
        .bind(i64::from(record.correct_answers))
        .bind(i64::from(record.quiz_count))
        .bind(record.completed_at)
        .execute(self.pool())
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn completion_days(&self, user_id: UserId) -> Result<Vec<NaiveDate>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT completed_at
                FROM lesson_completions
                WHERE user_id = ?1
                ORDER BY completed_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let days = rows.iter().map(completed_day).collect::<Result<Vec<_>, _>>()?;
        Ok(distinct_days(days))
    }

    async fn completed_lessons(&self, user_id: UserId) -> Result<BTreeSet<LessonId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT DISTINCT lesson_id
                FROM lesson_completions
                WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| lesson_id_from_i64(row.try_get("lesson_id").map_err(ser)?))
            .collect()
    }

    async fn total_xp(&self, user_id: UserId) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
                SELECT COALESCE(SUM(xp), 0) AS total
                FROM lesson_completions
                WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_one(self.pool())
        .await
        .map_err(conn)?;

        let total: i64 = row.try_get("total").map_err(ser)?;
        u64::try_from(total).map_err(ser)
    }
}
