#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    HistoryRow, InMemoryRepository, ProfileRecord, ProfileRepository, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
