use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{ExerciseRecord, ProficiencyMap};
use crate::theory::Key;

/// Username given to a fresh profile.
pub const DEFAULT_USERNAME: &str = "user";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("username cannot be empty")]
    EmptyUsername,
}

//
// ─── SESSION COMMIT ────────────────────────────────────────────────────────────
//

/// Everything a finished session writes back into the profile, applied at once.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCommit {
    pub correct: u32,
    pub proficiency: ProficiencyMap,
    pub record: ExerciseRecord,
}

//
// ─── USER PROFILE ──────────────────────────────────────────────────────────────
//

/// The learner's persisted state.
///
/// Skill level is never stored here; it is derived from the proficiency map
/// whenever it is read.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    username: String,
    exercises_completed: u32,
    correct_answers: u32,
    proficiency: ProficiencyMap,
    history: Vec<ExerciseRecord>,
    last_session: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Fresh profile: every key at 1, no history.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyUsername` if the trimmed name is empty.
    pub fn new(username: impl Into<String>) -> Result<Self, ProfileError> {
        let mut profile = Self::default();
        profile.rename(username)?;
        Ok(profile)
    }

    /// Rehydrate a profile from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyUsername` if the stored name is blank.
    pub fn from_persisted(
        username: impl Into<String>,
        exercises_completed: u32,
        correct_answers: u32,
        proficiency: ProficiencyMap,
        history: Vec<ExerciseRecord>,
        last_session: Option<DateTime<Utc>>,
    ) -> Result<Self, ProfileError> {
        let mut profile = Self {
            username: String::new(),
            exercises_completed,
            correct_answers,
            proficiency,
            history,
            last_session,
        };
        profile.rename(username)?;
        Ok(profile)
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn exercises_completed(&self) -> u32 {
        self.exercises_completed
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn proficiency(&self) -> &ProficiencyMap {
        &self.proficiency
    }

    #[must_use]
    pub fn history(&self) -> &[ExerciseRecord] {
        &self.history
    }

    #[must_use]
    pub fn last_session(&self) -> Option<DateTime<Utc>> {
        self.last_session
    }

    /// Mean proficiency across all keys, recomputed on every call.
    #[must_use]
    pub fn skill_level(&self) -> f64 {
        self.proficiency.skill_level()
    }

    /// Replace the username.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyUsername` if the trimmed name is empty.
    pub fn rename(&mut self, username: impl Into<String>) -> Result<(), ProfileError> {
        let username = username.into();
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(ProfileError::EmptyUsername);
        }
        self.username = trimmed.to_owned();
        Ok(())
    }

    /// Apply a finished session in one step: counters, proficiency, history.
    pub fn commit_session(&mut self, commit: SessionCommit) {
        self.exercises_completed = self.exercises_completed.saturating_add(1);
        self.correct_answers = self.correct_answers.saturating_add(commit.correct);
        self.proficiency = commit.proficiency;
        self.history.push(commit.record);
    }

    /// Stamp the time of the most recent completed session.
    pub fn touch_last_session(&mut self, at: DateTime<Utc>) {
        self.last_session = Some(at);
    }

    /// Logical persisted layout, skill level included.
    #[must_use]
    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            username: self.username.clone(),
            exercises_completed: self.exercises_completed,
            correct_answers: self.correct_answers,
            skill_level: self.skill_level(),
            key_proficiency: self.proficiency.clone().into(),
            exercise_history: self.history.clone(),
            last_session: self.last_session,
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_owned(),
            exercises_completed: 0,
            correct_answers: 0,
            proficiency: ProficiencyMap::new(),
            history: Vec::new(),
            last_session: None,
        }
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Serializable view of a profile in its persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub username: String,
    pub exercises_completed: u32,
    pub correct_answers: u32,
    pub skill_level: f64,
    pub key_proficiency: BTreeMap<Key, f64>,
    pub exercise_history: Vec<ExerciseRecord>,
    #[serde(default)]
    pub last_session: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileSnapshot> for UserProfile {
    type Error = ProfileError;

    /// The stored `skill_level` is ignored and recomputed.
    fn try_from(snapshot: ProfileSnapshot) -> Result<Self, Self::Error> {
        UserProfile::from_persisted(
            snapshot.username,
            snapshot.exercises_completed,
            snapshot.correct_answers,
            ProficiencyMap::from(snapshot.key_proficiency),
            snapshot.exercise_history,
            snapshot.last_session,
        )
    }
}
