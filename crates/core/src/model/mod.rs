mod exercise;
mod proficiency;
mod profile;
mod session;

pub use exercise::{ExerciseRecord, ExerciseType, FIXED_SESSION_LENGTH, UnknownExerciseType};
pub use proficiency::{MAX_PROFICIENCY, MIN_PROFICIENCY, ProficiencyMap, recompute_skill_level};
pub use profile::{DEFAULT_USERNAME, ProfileError, ProfileSnapshot, SessionCommit, UserProfile};
pub use session::{SessionSummary, SessionSummaryError};
