use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fifths_core::model::{ExerciseRecord, ExerciseType};
use fifths_core::time::HistoryError;
use storage::repository::{HistoryRow, ProfileRepository};

use crate::error::ProgressError;

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// One plotted score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub at: DateTime<Utc>,
    pub score: f64,
}

/// Time series of one exercise type, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSeries {
    pub exercise: ExerciseType,
    pub points: Vec<ProgressPoint>,
}

impl ProgressSeries {
    #[must_use]
    pub fn best(&self) -> Option<f64> {
        self.points.iter().map(|p| p.score).reduce(f64::max)
    }

    #[must_use]
    pub fn average(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.points.len() as f64;
        Some(self.points.iter().map(|p| p.score).sum::<f64>() / count)
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ProgressPoint> {
        self.points.last()
    }
}

/// History grouped by exercise type and sorted by time within each group,
/// ready for a chart renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressReport {
    pub series: Vec<ProgressSeries>,
}

impl ProgressReport {
    /// Group records and sort them by date. Groups follow catalogue order.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::MalformedTimestamp` for the first date that
    /// matches neither accepted layout.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a ExerciseRecord>,
    ) -> Result<Self, HistoryError> {
        let mut grouped: BTreeMap<ExerciseType, Vec<ProgressPoint>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.exercise())
                .or_default()
                .push(ProgressPoint {
                    at: record.recorded_at().instant()?,
                    score: record.score(),
                });
        }

        let series = grouped
            .into_iter()
            .map(|(exercise, mut points)| {
                // Stable sort keeps insertion order for identical timestamps.
                points.sort_by_key(|p| p.at);
                ProgressSeries { exercise, points }
            })
            .collect();
        Ok(Self { series })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    #[must_use]
    pub fn series_for(&self, exercise: ExerciseType) -> Option<&ProgressSeries> {
        self.series.iter().find(|s| s.exercise == exercise)
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Builds progress reports straight from stored history.
#[derive(Clone)]
pub struct ProgressService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Read stored history and group it for charting.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::MalformedTimestamp` if a stored date matches
    /// neither accepted format, and `ProgressError::Storage` for other read
    /// failures.
    pub async fn report(&self) -> Result<ProgressReport, ProgressError> {
        let rows = self.profiles.history_rows().await?;
        let records = rows
            .into_iter()
            .map(HistoryRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProgressReport::from_records(&records)?)
    }
}
