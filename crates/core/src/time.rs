use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading stored history timestamps.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("history timestamp {raw:?} matches neither RFC 3339 nor `%Y-%m-%d %H:%M:%S%.f`")]
    MalformedTimestamp { raw: String },
}

/// Secondary layout accepted for stored timestamps, read as UTC.
pub const FALLBACK_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }
}

/// Render a timestamp for storage.
///
/// Always RFC 3339 in UTC with microsecond precision, so string order is
/// chronological order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, trying RFC 3339 first and [`FALLBACK_FORMAT`] second.
///
/// # Errors
///
/// Returns `HistoryError::MalformedTimestamp` when neither layout matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, HistoryError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, FALLBACK_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| HistoryError::MalformedTimestamp {
            raw: raw.to_owned(),
        })
}

/// A history date exactly as stored.
///
/// Profiles load and save the text untouched; it is only parsed when a caller
/// asks for the instant, so one bad row never blocks the rest of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryDate(String);

impl HistoryDate {
    #[must_use]
    pub fn from_instant(at: DateTime<Utc>) -> Self {
        Self(format_timestamp(at))
    }

    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// # Errors
    ///
    /// Returns `HistoryError::MalformedTimestamp` when the stored text
    /// matches neither accepted layout.
    pub fn instant(&self) -> Result<DateTime<Utc>, HistoryError> {
        parse_timestamp(&self.0)
    }
}

impl From<DateTime<Utc>> for HistoryDate {
    fn from(at: DateTime<Utc>) -> Self {
        Self::from_instant(at)
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}
