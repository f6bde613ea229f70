use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ExerciseType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("a session needs at least one question")]
    Empty,

    #[error("correct answers ({correct}) exceed questions asked ({total})")]
    CountMismatch { correct: u32, total: u32 },
}

/// Result of a finalized exercise session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    exercise: ExerciseType,
    completed_at: DateTime<Utc>,
    correct: u32,
    total: u32,
    score: f64,
    skill_level: f64,
}

impl SessionSummary {
    /// Build a summary from answer counts; the score is `correct / total * 100`.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::Empty` for zero questions and
    /// `SessionSummaryError::CountMismatch` if `correct > total`.
    pub fn from_counts(
        exercise: ExerciseType,
        completed_at: DateTime<Utc>,
        correct: u32,
        total: u32,
        skill_level: f64,
    ) -> Result<Self, SessionSummaryError> {
        if total == 0 {
            return Err(SessionSummaryError::Empty);
        }
        if correct > total {
            return Err(SessionSummaryError::CountMismatch { correct, total });
        }
        let score = f64::from(correct) / f64::from(total) * 100.0;
        Ok(Self {
            exercise,
            completed_at,
            correct,
            total,
            score,
            skill_level,
        })
    }

    #[must_use]
    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Percentage in `0..=100`.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Skill level after the session was committed.
    #[must_use]
    pub fn skill_level(&self) -> f64 {
        self.skill_level
    }
}
