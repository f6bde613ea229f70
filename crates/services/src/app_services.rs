use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::profile_service::ProfileService;
use crate::progress_service::ProgressService;
use crate::sessions::SessionRunner;

/// Assembles the services the console front end needs.
#[derive(Clone)]
pub struct AppServices {
    profiles: Arc<ProfileService>,
    progress: Arc<ProgressService>,
    runner: SessionRunner,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over an already-assembled storage backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            profiles: Arc::new(ProfileService::new(clock, Arc::clone(&storage.profiles))),
            progress: Arc::new(ProgressService::new(Arc::clone(&storage.profiles))),
            runner: SessionRunner::new(clock),
        }
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn runner(&self) -> SessionRunner {
        self.runner
    }
}
