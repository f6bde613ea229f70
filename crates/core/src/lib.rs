#![forbid(unsafe_code)]

pub mod model;
pub mod scoring;
pub mod theory;
pub mod time;

pub use model::{ExerciseRecord, ExerciseType, ProficiencyMap, UserProfile};
pub use theory::{Direction, Key, KeySignature};
pub use time::Clock;
