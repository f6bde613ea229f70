use std::fmt;
use std::sync::Arc;

use fifths_core::model::UserProfile;
use storage::repository::ProfileRepository;
use tracing::{info, warn};

use crate::Clock;
use crate::error::ProfileServiceError;

/// Moments at which the whole profile is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    SessionEnd,
    UsernameChange,
    Exit,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Checkpoint::SessionEnd => "session_end",
            Checkpoint::UsernameChange => "username_change",
            Checkpoint::Exit => "exit",
        };
        f.write_str(label)
    }
}

/// Loads the learner's profile and saves it at checkpoints.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(clock: Clock, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { clock, profiles }
    }

    /// Load the stored profile, or a fresh default one.
    ///
    /// Missing and unreadable state both yield the default profile; the
    /// latter is logged and never fatal.
    pub async fn load(&self) -> UserProfile {
        match self.profiles.load_profile().await {
            Ok(Some(profile)) => {
                info!(
                    username = profile.username(),
                    exercises = profile.exercises_completed(),
                    "profile loaded"
                );
                profile
            }
            Ok(None) => {
                info!("no stored profile, starting fresh");
                UserProfile::default()
            }
            Err(err) => {
                warn!(error = %err, "stored profile unreadable, starting fresh");
                UserProfile::default()
            }
        }
    }

    /// Write the full profile. `SessionEnd` also stamps the last-session time.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the write fails.
    pub async fn checkpoint(
        &self,
        profile: &mut UserProfile,
        checkpoint: Checkpoint,
    ) -> Result<(), ProfileServiceError> {
        if checkpoint == Checkpoint::SessionEnd {
            profile.touch_last_session(self.clock.now());
        }
        self.profiles.save_profile(profile).await?;
        info!(%checkpoint, username = profile.username(), "profile saved");
        Ok(())
    }

    /// Rename the learner and save immediately.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Profile` for a blank name (nothing is
    /// saved) and `ProfileServiceError::Storage` if the write fails.
    pub async fn rename(
        &self,
        profile: &mut UserProfile,
        username: &str,
    ) -> Result<(), ProfileServiceError> {
        profile.rename(username)?;
        self.checkpoint(profile, Checkpoint::UsernameChange).await
    }
}
