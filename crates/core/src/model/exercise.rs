use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::theory::Key;
use crate::time::HistoryDate;

//
// ─── EXERCISE TYPE ─────────────────────────────────────────────────────────────
//

/// Questions per session for every fixed-length exercise.
pub const FIXED_SESSION_LENGTH: usize = 5;

/// Error for an unknown exercise tag.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown exercise type: {0:?}")]
pub struct UnknownExerciseType(pub String);

/// Exercise families a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    /// Mixed circle questions, gated by skill level.
    KeyIdentification,
    /// Relative major/minor pairs.
    RelativeKeys,
    /// Sharp/flat counts.
    KeySignatures,
    /// Chord lookups by scale degree, reverse degree lookups, triad spelling.
    Advanced,
    /// Fill the blanks of a diatonic progression.
    ChordProgression,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 5] = [
        ExerciseType::KeyIdentification,
        ExerciseType::RelativeKeys,
        ExerciseType::KeySignatures,
        ExerciseType::Advanced,
        ExerciseType::ChordProgression,
    ];

    /// Stable tag used in persisted history.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            ExerciseType::KeyIdentification => "key_identification",
            ExerciseType::RelativeKeys => "relative_keys",
            ExerciseType::KeySignatures => "key_signatures",
            ExerciseType::Advanced => "advanced",
            ExerciseType::ChordProgression => "chord_progression",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            ExerciseType::KeyIdentification => "Key identification",
            ExerciseType::RelativeKeys => "Relative major/minor",
            ExerciseType::KeySignatures => "Key signatures",
            ExerciseType::Advanced => "Chords by scale degree",
            ExerciseType::ChordProgression => "Chord progressions",
        }
    }

    /// Proficiency gained per correct answer.
    #[must_use]
    pub fn proficiency_increment(self) -> f64 {
        match self {
            ExerciseType::ChordProgression => 0.3,
            _ => 0.2,
        }
    }

    /// Fixed question count, or `None` when the length follows the progression.
    #[must_use]
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            ExerciseType::ChordProgression => None,
            _ => Some(FIXED_SESSION_LENGTH),
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ExerciseType {
    type Err = UnknownExerciseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExerciseType::ALL
            .iter()
            .copied()
            .find(|t| t.tag() == s.trim())
            .ok_or_else(|| UnknownExerciseType(s.to_owned()))
    }
}

//
// ─── EXERCISE RECORD ───────────────────────────────────────────────────────────
//

/// One finished session in the history. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    #[serde(rename = "date")]
    recorded_at: HistoryDate,
    #[serde(rename = "type")]
    exercise: ExerciseType,
    score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<Key>,
}

impl ExerciseRecord {
    /// Build a record; `score` is clamped into `0..=100`.
    #[must_use]
    pub fn new(recorded_at: DateTime<Utc>, exercise: ExerciseType, score: f64) -> Self {
        Self::with_date(HistoryDate::from_instant(recorded_at), exercise, score)
    }

    /// Build a record around a date read back from storage.
    #[must_use]
    pub fn with_date(recorded_at: HistoryDate, exercise: ExerciseType, score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) };
        Self {
            recorded_at,
            exercise,
            score,
            difficulty: None,
            key: None,
        }
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Option<u8>) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: Option<Key>) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub fn recorded_at(&self) -> &HistoryDate {
        &self.recorded_at
    }

    #[must_use]
    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<u8> {
        self.difficulty
    }

    #[must_use]
    pub fn key(&self) -> Option<Key> {
        self.key
    }
}
