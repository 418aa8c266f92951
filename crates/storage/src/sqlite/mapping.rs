use chrono::{DateTime, NaiveDate, Utc};
use lingo_core::model::LessonId;
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    u64::try_from(v)
        .map(LessonId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid lesson_id: {v}")))
}

/// UTC calendar day of a row's `completed_at`.
pub(crate) fn completed_day(row: &sqlx::sqlite::SqliteRow) -> Result<NaiveDate, StorageError> {
    let at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    Ok(at.date_naive())
}

/// Collapse newest-first days into distinct entries.
pub(crate) fn distinct_days(days: impl IntoIterator<Item = NaiveDate>) -> Vec<NaiveDate> {
    let mut out: Vec<NaiveDate> = days.into_iter().collect();
    out.dedup();
    out
}
