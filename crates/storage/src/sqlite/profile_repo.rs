use async_trait::async_trait;
use fifths_core::model::UserProfile;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_history_row, map_proficiency_row, u32_from_i64};
use crate::repository::{HistoryRow, ProfileRecord, ProfileRepository, StorageError, ser};

impl SqliteRepository {
    async fn fetch_history_rows(&self) -> Result<Vec<HistoryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT recorded_at, exercise, score, difficulty, key_name
                FROM exercise_history
                ORDER BY position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_history_row).collect()
    }
}

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn load_profile(&self) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT username, exercises_completed, correct_answers, skill_level, last_session
                FROM profile
                WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let proficiency_rows = sqlx::query("SELECT key_name, proficiency FROM key_proficiency")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let record = ProfileRecord {
            username: row.try_get("username").map_err(ser)?,
            exercises_completed: u32_from_i64(
                "exercises_completed",
                row.try_get::<i64, _>("exercises_completed").map_err(ser)?,
            )?,
            correct_answers: u32_from_i64(
                "correct_answers",
                row.try_get::<i64, _>("correct_answers").map_err(ser)?,
            )?,
            skill_level: row.try_get("skill_level").map_err(ser)?,
            last_session: row.try_get("last_session").map_err(ser)?,
            key_proficiency: proficiency_rows
                .iter()
                .map(map_proficiency_row)
                .collect::<Result<_, _>>()?,
            history: self.fetch_history_rows().await?,
        };

        record.into_profile().map(Some)
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let record = ProfileRecord::from_profile(profile);
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO profile (
                    id, username, exercises_completed, correct_answers, skill_level, last_session
                )
                VALUES (1, ?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    exercises_completed = excluded.exercises_completed,
                    correct_answers = excluded.correct_answers,
                    skill_level = excluded.skill_level,
                    last_session = excluded.last_session
            ",
        )
        .bind(&record.username)
        .bind(i64::from(record.exercises_completed))
        .bind(i64::from(record.correct_answers))
        .bind(record.skill_level)
        .bind(record.last_session.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM key_proficiency")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        for (key_name, proficiency) in &record.key_proficiency {
            sqlx::query("INSERT INTO key_proficiency (key_name, proficiency) VALUES (?1, ?2)")
                .bind(key_name)
                .bind(*proficiency)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        sqlx::query("DELETE FROM exercise_history")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        for (position, entry) in record.history.iter().enumerate() {
            let position = i64::try_from(position).map_err(ser)?;
            sqlx::query(
                r"
                    INSERT INTO exercise_history (
                        position, recorded_at, exercise, score, difficulty, key_name
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(position)
            .bind(&entry.recorded_at)
            .bind(&entry.exercise)
            .bind(entry.score)
            .bind(entry.difficulty)
            .bind(entry.key.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        tracing::debug!(
            username = %record.username,
            history = record.history.len(),
            "profile saved"
        );
        Ok(())
    }

    async fn history_rows(&self) -> Result<Vec<HistoryRow>, StorageError> {
        self.fetch_history_rows().await
    }
}
