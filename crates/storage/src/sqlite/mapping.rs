use sqlx::Row;

use crate::repository::{HistoryRow, StorageError, ser};

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryRow, StorageError> {
    Ok(HistoryRow {
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
        exercise: row.try_get("exercise").map_err(ser)?,
        score: row.try_get("score").map_err(ser)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
        key: row.try_get("key_name").map_err(ser)?,
    })
}

pub(crate) fn map_proficiency_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(String, f64), StorageError> {
    Ok((
        row.try_get("key_name").map_err(ser)?,
        row.try_get("proficiency").map_err(ser)?,
    ))
}
