use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use fifths_core::model::{
    ExerciseRecord, ExerciseType, ProficiencyMap, SessionCommit, SessionSummary, UserProfile,
};
use fifths_core::scoring::{adapt, evaluate_any};
use fifths_core::theory::Key;

use super::progress::SessionProgress;
use crate::error::SessionError;
use crate::generator::{Question, generate, generate_progression, kind_for};

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Outcome of answering one question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub question: Question,
    pub given: String,
    pub correct: bool,
    /// Proficiency of the credited key after the answer was applied.
    pub proficiency: f64,
}

impl AnswerFeedback {
    /// Line shown to the learner after answering.
    #[must_use]
    pub fn message(&self) -> String {
        if self.correct {
            "Correct!".to_owned()
        } else {
            format!("Incorrect. The answer was {}.", self.question.expected)
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One exercise session, stepped question by question.
///
/// Proficiency changes are staged on a private copy of the learner's map and
/// reach the profile only through [`ExerciseSession::finalize`]. Dropping the
/// session before that point leaves the profile exactly as it was.
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    exercise: ExerciseType,
    skill_level: f64,
    proficiency: ProficiencyMap,
    planned: Vec<Question>,
    total: usize,
    pending: Option<Question>,
    answers: Vec<AnswerFeedback>,
    difficulty: Option<u8>,
    key: Option<Key>,
}

impl ExerciseSession {
    /// Start a session for `exercise` against the learner's current state.
    ///
    /// Progression exercises draw their progression up front; the number of
    /// questions equals its hidden slots. Every other exercise asks
    /// its fixed number of questions.
    pub fn start<R: Rng + ?Sized>(
        exercise: ExerciseType,
        profile: &UserProfile,
        rng: &mut R,
    ) -> Self {
        let proficiency = profile.proficiency().clone();
        let skill_level = proficiency.skill_level();

        let (planned, difficulty, key) = match exercise.fixed_length() {
            Some(_) => (Vec::new(), None, None),
            None => {
                let drill = generate_progression(&proficiency, skill_level, rng);
                (
                    drill.questions(),
                    Some(drill.tier().level()),
                    Some(drill.key()),
                )
            }
        };
        let total = exercise.fixed_length().unwrap_or(planned.len());

        debug!(exercise = exercise.tag(), total, skill_level, "session started");

        Self {
            exercise,
            skill_level,
            proficiency,
            planned,
            total,
            pending: None,
            answers: Vec::new(),
            difficulty,
            key,
        }
    }

    #[must_use]
    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    /// Skill level the session's questions are gated on.
    #[must_use]
    pub fn skill_level(&self) -> f64 {
        self.skill_level
    }

    /// Staged proficiency, including answers given so far.
    #[must_use]
    pub fn proficiency(&self) -> &ProficiencyMap {
        &self.proficiency
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerFeedback] {
        &self.answers
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.correct).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.total
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total,
            answered: self.answers.len(),
            correct: self.correct_count(),
            remaining: self.total.saturating_sub(self.answers.len()),
            is_complete: self.is_complete(),
        }
    }

    /// Generate the next question, or return the one still awaiting an answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once every question has been answered.
    pub fn next_question<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Question, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.pending.is_none() {
            let question = match self.planned.get(self.answers.len()) {
                Some(planned) => planned.clone(),
                None => {
                    let kind = kind_for(self.exercise, self.skill_level, rng);
                    generate(kind, &self.proficiency, self.skill_level, rng)
                }
            };
            self.pending = Some(question);
        }
        self.pending.as_ref().ok_or(SessionError::NoQuestion)
    }

    /// Score a raw answer to the pending question.
    ///
    /// Empty or garbled input is simply incorrect. A correct answer raises the
    /// credited key by the exercise's increment on the staged map.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestion` if no question is pending.
    pub fn answer(&mut self, raw: &str) -> Result<&AnswerFeedback, SessionError> {
        let question = self.pending.take().ok_or(SessionError::NoQuestion)?;
        let correct = evaluate_any(raw, &question.expected, &question.alternatives);
        let proficiency = adapt(
            &mut self.proficiency,
            question.credited_key,
            correct,
            self.exercise.proficiency_increment(),
        );

        debug!(
            exercise = self.exercise.tag(),
            key = question.credited_key.name(),
            correct,
            proficiency,
            "answer scored"
        );

        self.answers.push(AnswerFeedback {
            question,
            given: raw.trim().to_owned(),
            correct,
            proficiency,
        });
        self.answers.last().ok_or(SessionError::NoQuestion)
    }

    /// Apply the finished session to `profile` in one step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if questions remain unanswered; the
    /// profile is not touched in that case.
    pub fn finalize(
        self,
        profile: &mut UserProfile,
        completed_at: DateTime<Utc>,
    ) -> Result<SessionSummary, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::Incomplete {
                answered: self.answers.len(),
                total: self.total,
            });
        }

        let correct = u32::try_from(self.correct_count()).unwrap_or(u32::MAX);
        let total = u32::try_from(self.total).unwrap_or(u32::MAX);
        let summary = SessionSummary::from_counts(
            self.exercise,
            completed_at,
            correct,
            total,
            self.proficiency.skill_level(),
        )?;

        let record = ExerciseRecord::new(completed_at, self.exercise, summary.score())
            .with_difficulty(self.difficulty)
            .with_key(self.key);
        profile.commit_session(SessionCommit {
            correct,
            proficiency: self.proficiency,
            record,
        });

        info!(
            exercise = self.exercise.tag(),
            correct,
            total,
            score = summary.score(),
            skill_level = summary.skill_level(),
            "session finalized"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fifths_core::model::FIXED_SESSION_LENGTH;
    use fifths_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn answer_all(session: &mut ExerciseSession, rng: &mut StdRng, right: bool) {
        while !session.is_complete() {
            let expected = session.next_question(rng).unwrap().expected.clone();
            let given = if right { expected } else { "?".to_owned() };
            session.answer(&given).unwrap();
        }
    }

    #[test]
    fn fixed_exercises_ask_five_questions() {
        let profile = UserProfile::default();
        let mut rng = rng();
        for exercise in [
            ExerciseType::KeyIdentification,
            ExerciseType::RelativeKeys,
            ExerciseType::KeySignatures,
            ExerciseType::Advanced,
        ] {
            let session = ExerciseSession::start(exercise, &profile, &mut rng);
            assert_eq!(session.total_questions(), FIXED_SESSION_LENGTH);
        }
    }

    #[test]
    fn progression_asks_each_hidden_slot() {
        let profile = UserProfile::default();
        let mut rng = rng();
        let mut session =
            ExerciseSession::start(ExerciseType::ChordProgression, &profile, &mut rng);
        let total = session.total_questions();
        assert!((1..=3).contains(&total));
        answer_all(&mut session, &mut rng, true);
        assert_eq!(session.correct_count(), total);
    }

    #[test]
    fn next_question_repeats_until_answered() {
        let profile = UserProfile::default();
        let mut rng = rng();
        let mut session =
            ExerciseSession::start(ExerciseType::Advanced, &profile, &mut rng);
        let first = session.next_question(&mut rng).unwrap().clone();
        let again = session.next_question(&mut rng).unwrap().clone();
        assert_eq!(first, again);
    }

    #[test]
    fn answering_without_a_question_fails() {
        let profile = UserProfile::default();
        let mut session =
            ExerciseSession::start(ExerciseType::RelativeKeys, &profile, &mut rng());
        assert!(matches!(session.answer("C"), Err(SessionError::NoQuestion)));
    }

    #[test]
    fn finalize_commits_everything_at_once() {
        let mut profile = UserProfile::default();
        let mut rng = rng();
        let mut session =
            ExerciseSession::start(ExerciseType::KeySignatures, &profile, &mut rng);
        answer_all(&mut session, &mut rng, true);
        assert_eq!(profile.exercises_completed(), 0);

        let summary = session.finalize(&mut profile, fixed_now()).unwrap();
        assert_eq!(summary.score(), 100.0);
        assert_eq!(profile.exercises_completed(), 1);
        assert_eq!(profile.correct_answers(), 5);
        assert_eq!(profile.history().len(), 1);
        assert!(profile.skill_level() > 1.0);
        assert_eq!(summary.skill_level(), profile.skill_level());
    }

    #[test]
    fn wrong_answers_leave_proficiency_alone() {
        let mut profile = UserProfile::default();
        let mut rng = rng();
        let mut session =
            ExerciseSession::start(ExerciseType::RelativeKeys, &profile, &mut rng);
        answer_all(&mut session, &mut rng, false);
        let summary = session.finalize(&mut profile, fixed_now()).unwrap();
        assert_eq!(summary.score(), 0.0);
        assert_eq!(profile.proficiency(), &ProficiencyMap::new());
        assert_eq!(profile.exercises_completed(), 1);
    }

    #[test]
    fn unfinished_session_cannot_finalize() {
        let mut profile = UserProfile::default();
        let before = profile.clone();
        let mut rng = rng();
        let mut session =
            ExerciseSession::start(ExerciseType::KeyIdentification, &profile, &mut rng);
        let expected = session.next_question(&mut rng).unwrap().expected.clone();
        session.answer(&expected).unwrap();

        let err = session.finalize(&mut profile, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Incomplete { answered: 1, total: 5 }));
        assert_eq!(profile, before);
    }

    #[test]
    fn progression_record_carries_key_and_difficulty() {
        let mut profile = UserProfile::default();
        let mut rng = rng();
        let mut session =
            ExerciseSession::start(ExerciseType::ChordProgression, &profile, &mut rng);
        answer_all(&mut session, &mut rng, true);
        session.finalize(&mut profile, fixed_now()).unwrap();

        let record = &profile.history()[0];
        assert_eq!(record.difficulty(), Some(1));
        assert!(record.key().is_some());
    }

    #[test]
    fn completed_session_refuses_more_questions() {
        let profile = UserProfile::default();
        let mut rng = rng();
        let mut session =
            ExerciseSession::start(ExerciseType::Advanced, &profile, &mut rng);
        answer_all(&mut session, &mut rng, true);
        assert!(matches!(session.next_question(&mut rng), Err(SessionError::Completed)));
    }
}
