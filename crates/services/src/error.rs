//! Shared error types for the services crate.

use thiserror::Error;

use fifths_core::model::{ProfileError, SessionSummaryError};
use fifths_core::time::HistoryError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by exercise sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already completed")]
    Completed,
    #[error("no question is waiting for an answer")]
    NoQuestion,
    #[error("session finalized after {answered} of {total} answers")]
    Incomplete { answered: usize, total: usize },
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    /// A stored history date matched neither accepted format.
    #[error(transparent)]
    MalformedTimestamp(#[from] HistoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
