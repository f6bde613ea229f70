use async_trait::async_trait;
use fifths_core::model::{ExerciseRecord, ExerciseType, ProficiencyMap, UserProfile};
use fifths_core::theory::Key;
use fifths_core::time::{HistoryDate, format_timestamp, parse_timestamp};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Persisted shape of one history entry.
///
/// Timestamps stay textual here and in the domain `ExerciseRecord`; only
/// progress reporting parses them.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub recorded_at: String,
    pub exercise: String,
    pub score: f64,
    pub difficulty: Option<i64>,
    pub key: Option<String>,
}

impl HistoryRow {
    #[must_use]
    pub fn from_record(record: &ExerciseRecord) -> Self {
        Self {
            recorded_at: record.recorded_at().as_str().to_owned(),
            exercise: record.exercise().tag().to_owned(),
            score: record.score(),
            difficulty: record.difficulty().map(i64::from),
            key: record.key().map(|k| k.name().to_owned()),
        }
    }

    /// Convert the row back into a domain record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unknown tag, key or
    /// difficulty. The date is carried over as written.
    pub fn into_record(self) -> Result<ExerciseRecord, StorageError> {
        let exercise: ExerciseType = self.exercise.parse().map_err(ser)?;
        let difficulty = self
            .difficulty
            .map(|d| u8::try_from(d).map_err(|_| ser(format!("invalid difficulty: {d}"))))
            .transpose()?;
        let key = self
            .key
            .map(|k| k.parse::<Key>().map_err(ser))
            .transpose()?;

        let recorded_at = HistoryDate::from_raw(self.recorded_at);
        Ok(ExerciseRecord::with_date(recorded_at, exercise, self.score)
            .with_difficulty(difficulty)
            .with_key(key))
    }
}

/// Persisted shape of a profile, history included.
///
/// This mirrors the domain `UserProfile` so adapters can serialize and
/// deserialize without leaking storage concerns into the domain layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    pub username: String,
    pub exercises_completed: u32,
    pub correct_answers: u32,
    pub skill_level: f64,
    pub last_session: Option<String>,
    pub key_proficiency: Vec<(String, f64)>,
    pub history: Vec<HistoryRow>,
}

impl ProfileRecord {
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            username: profile.username().to_owned(),
            exercises_completed: profile.exercises_completed(),
            correct_answers: profile.correct_answers(),
            skill_level: profile.skill_level(),
            last_session: profile.last_session().map(format_timestamp),
            key_proficiency: profile
                .proficiency()
                .iter()
                .map(|(key, value)| (key.name().to_owned(), value))
                .collect(),
            history: profile.history().iter().map(HistoryRow::from_record).collect(),
        }
    }

    /// Convert the record back into a domain `UserProfile`.
    ///
    /// The stored skill level is not trusted; the profile recomputes it. An
    /// unreadable `last_session` is dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any field fails to parse or validate.
    pub fn into_profile(self) -> Result<UserProfile, StorageError> {
        let mut entries = Vec::with_capacity(self.key_proficiency.len());
        for (name, value) in self.key_proficiency {
            entries.push((name.parse::<Key>().map_err(ser)?, value));
        }
        let history = self
            .history
            .into_iter()
            .map(HistoryRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        let last_session = self.last_session.as_deref().and_then(|raw| {
            parse_timestamp(raw)
                .inspect_err(|err| warn!(error = %err, "ignoring unreadable last session"))
                .ok()
        });

        UserProfile::from_persisted(
            self.username,
            self.exercises_completed,
            self.correct_answers,
            ProficiencyMap::from_entries(entries),
            history,
            last_session,
        )
        .map_err(ser)
    }
}

//
// ─── REPOSITORY ────────────────────────────────────────────────────────────────
//

/// Repository contract for the single learner profile.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the stored profile, or `None` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if stored state exists but cannot be read.
    async fn load_profile(&self) -> Result<Option<UserProfile>, StorageError>;

    /// Replace the stored profile with `profile` in one write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;

    /// Raw history rows in insertion order, timestamps unparsed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be read.
    async fn history_rows(&self) -> Result<Vec<HistoryRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    record: Arc<Mutex<Option<ProfileRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with an already-serialized record.
    ///
    /// Lets tests plant data a real backend could hold, malformed or not.
    #[must_use]
    pub fn with_record(record: ProfileRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(record))),
        }
    }

    /// The raw record last written, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn stored_record(&self) -> Result<Option<ProfileRecord>, StorageError> {
        let guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn load_profile(&self) -> Result<Option<UserProfile>, StorageError> {
        self.stored_record()?
            .map(ProfileRecord::into_profile)
            .transpose()
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(ProfileRecord::from_profile(profile));
        Ok(())
    }

    async fn history_rows(&self) -> Result<Vec<HistoryRow>, StorageError> {
        Ok(self
            .stored_record()?
            .map(|record| record.history)
            .unwrap_or_default())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let profiles: Arc<dyn ProfileRepository> = Arc::new(InMemoryRepository::new());
        Self { profiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fifths_core::model::SessionCommit;
    use fifths_core::time::fixed_now;

    fn played_profile() -> UserProfile {
        let mut profile = UserProfile::new("ada").unwrap();
        let mut proficiency = profile.proficiency().clone();
        proficiency.credit(Key::BFlat, 0.6);
        profile.commit_session(SessionCommit {
            correct: 3,
            proficiency,
            record: ExerciseRecord::new(fixed_now(), ExerciseType::ChordProgression, 75.0)
                .with_difficulty(Some(2))
                .with_key(Some(Key::BFlat)),
        });
        profile.touch_last_session(fixed_now());
        profile
    }

    #[tokio::test]
    async fn empty_repository_loads_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_profile().await.unwrap().is_none());
        assert!(repo.history_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn round_trips_profile() {
        let repo = InMemoryRepository::new();
        let profile = played_profile();
        repo.save_profile(&profile).await.unwrap();

        let loaded = repo.load_profile().await.unwrap().unwrap();
        assert_eq!(loaded, profile);

        let rows = repo.history_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise, "chord_progression");
        assert_eq!(rows[0].key.as_deref(), Some("Bb"));
    }

    #[tokio::test]
    async fn fallback_timestamps_are_read() {
        let mut record = ProfileRecord::from_profile(&played_profile());
        record.history[0].recorded_at = "2023-11-14 22:13:20".into();
        let repo = InMemoryRepository::with_record(record);

        let loaded = repo.load_profile().await.unwrap().unwrap();
        assert_eq!(loaded.history()[0].recorded_at().instant().unwrap(), fixed_now());
    }

    #[tokio::test]
    async fn unreadable_dates_load_and_save_verbatim() {
        let mut record = ProfileRecord::from_profile(&played_profile());
        record.history[0].recorded_at = "yesterday".into();
        record.last_session = Some("someday".into());
        let repo = InMemoryRepository::with_record(record);

        let loaded = repo.load_profile().await.unwrap().unwrap();
        assert_eq!(loaded.username(), "ada");
        assert_eq!(loaded.history()[0].recorded_at().as_str(), "yesterday");
        assert!(loaded.last_session().is_none());

        repo.save_profile(&loaded).await.unwrap();
        let rows = repo.history_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recorded_at, "yesterday");
    }

    #[test]
    fn stored_skill_level_is_ignored() {
        let mut record = ProfileRecord::from_profile(&played_profile());
        record.skill_level = 8.0;
        let profile = record.into_profile().unwrap();
        assert!(profile.skill_level() < 2.0);
    }
}
