use rand::Rng;
use tracing::info;

use fifths_core::model::{ExerciseType, SessionSummary, UserProfile};

use super::service::ExerciseSession;
use crate::Clock;
use crate::error::SessionError;

/// Console-side collaborator that asks questions and shows lines.
pub trait Prompter {
    /// Show `text` and block for a raw answer. `None` means input ended and
    /// the session is abandoned.
    fn prompt(&mut self, text: &str) -> Option<String>;

    /// Show a line; no reply expected.
    fn display(&mut self, text: &str);
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(SessionSummary),
    /// Input ended early; the profile was left untouched.
    Aborted { answered: usize },
}

/// Drives an [`ExerciseSession`] to completion through a [`Prompter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRunner {
    clock: Clock,
}

impl SessionRunner {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    /// Run one session of `exercise`, committing into `profile` only once
    /// every question is answered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session state machine is misused; input
    /// problems are never errors.
    pub fn run_session<P, R>(
        &self,
        exercise: ExerciseType,
        profile: &mut UserProfile,
        prompter: &mut P,
        rng: &mut R,
    ) -> Result<SessionOutcome, SessionError>
    where
        P: Prompter + ?Sized,
        R: Rng + ?Sized,
    {
        let mut session = ExerciseSession::start(exercise, profile, rng);
        prompter.display(&format!("\n=== {} ===", exercise.title()));

        while !session.is_complete() {
            let progress = session.progress();
            let prompt = {
                let question = session.next_question(rng)?;
                format!(
                    "\nQuestion {}/{}: {}",
                    progress.current_number(),
                    progress.total,
                    question.prompt
                )
            };
            let Some(raw) = prompter.prompt(&prompt) else {
                info!(
                    exercise = exercise.tag(),
                    answered = progress.answered,
                    "session abandoned"
                );
                return Ok(SessionOutcome::Aborted {
                    answered: progress.answered,
                });
            };
            let message = session.answer(&raw)?.message();
            prompter.display(&message);
        }

        let summary = session.finalize(profile, self.clock.now())?;
        prompter.display(&format!(
            "\nSession complete: {}/{} correct ({:.1}%). Skill level: {:.2}",
            summary.correct(),
            summary.total(),
            summary.score(),
            summary.skill_level()
        ));
        Ok(SessionOutcome::Completed(summary))
    }
}
