#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod generator;
pub mod profile_service;
pub mod progress_service;
pub mod sessions;

pub use fifths_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProfileServiceError, ProgressError, SessionError};
pub use generator::{ProgressionDrill, ProgressionTier, Question, QuestionKind};
pub use profile_service::{Checkpoint, ProfileService};
pub use progress_service::{ProgressPoint, ProgressReport, ProgressSeries, ProgressService};
pub use sessions::{
    AnswerFeedback, ExerciseSession, Prompter, SessionOutcome, SessionProgress, SessionRunner,
};
