use std::collections::VecDeque;
use std::sync::Arc;

use fifths_core::model::{ExerciseType, UserProfile};
use fifths_core::time::fixed_now;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{
    Checkpoint, Clock, ExerciseSession, ProfileService, ProgressService, Prompter, SessionOutcome,
    SessionRunner,
};
use storage::repository::InMemoryRepository;

/// Feeds canned answers and records everything shown.
#[derive(Default)]
struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    lines: Vec<String>,
}

impl ScriptedPrompter {
    fn new(answers: impl IntoIterator<Item = String>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, text: &str) -> Option<String> {
        self.prompts.push(text.to_owned());
        self.answers.pop_front()
    }

    fn display(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}

/// Expected answers for the session a runner will draw from `seed`.
///
/// The runner consumes randomness in the same order as stepping a session by
/// hand, so replaying the seed yields the same questions.
fn correct_answers(exercise: ExerciseType, profile: &UserProfile, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = ExerciseSession::start(exercise, profile, &mut rng);
    let mut answers = Vec::new();
    while !session.is_complete() {
        let expected = session.next_question(&mut rng).unwrap().expected.clone();
        session.answer(&expected).unwrap();
        answers.push(expected);
    }
    answers
}

fn runner() -> SessionRunner {
    SessionRunner::new(Clock::fixed(fixed_now()))
}

#[test]
fn perfect_identification_session() {
    let mut profile = UserProfile::default();
    let answers = correct_answers(ExerciseType::KeyIdentification, &profile, 42);
    assert_eq!(answers.len(), 5);

    let mut prompter = ScriptedPrompter::new(answers);
    let mut rng = StdRng::seed_from_u64(42);
    let outcome = runner()
        .run_session(ExerciseType::KeyIdentification, &mut profile, &mut prompter, &mut rng)
        .unwrap();

    let SessionOutcome::Completed(summary) = outcome else {
        panic!("session should complete");
    };
    assert_eq!(summary.correct(), 5);
    assert_eq!(summary.score(), 100.0);
    assert_eq!(profile.exercises_completed(), 1);
    assert_eq!(profile.correct_answers(), 5);
    assert_eq!(profile.history().len(), 1);
    assert_eq!(profile.history()[0].score(), 100.0);
    assert!(profile.skill_level() > 1.0);
    assert_eq!(prompter.prompts.len(), 5);
    assert!(prompter.prompts[0].contains("Question 1/5"));
    assert_eq!(
        prompter.lines.iter().filter(|l| l.as_str() == "Correct!").count(),
        5
    );
}

#[test]
fn perfect_progression_session_uses_larger_increment() {
    let mut profile = UserProfile::default();
    let answers = correct_answers(ExerciseType::ChordProgression, &profile, 3);
    let expected_total = answers.len();

    let mut prompter = ScriptedPrompter::new(answers);
    let mut rng = StdRng::seed_from_u64(3);
    let outcome = runner()
        .run_session(ExerciseType::ChordProgression, &mut profile, &mut prompter, &mut rng)
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Completed(ref s) if s.score() == 100.0));
    let credited = profile.history()[0].key().unwrap();
    #[allow(clippy::cast_precision_loss)]
    let gained = 0.3 * expected_total as f64;
    assert!((profile.proficiency().get(credited) - (1.0 + gained)).abs() < 1e-9);
}

#[test]
fn garbled_answers_are_just_wrong() {
    let mut profile = UserProfile::default();
    let mut prompter = ScriptedPrompter::new(
        ["", "   ", "¿?", "C,C,C,", "12 sharps"].map(String::from),
    );
    let mut rng = StdRng::seed_from_u64(9);
    let outcome = runner()
        .run_session(ExerciseType::KeySignatures, &mut profile, &mut prompter, &mut rng)
        .unwrap();

    let SessionOutcome::Completed(summary) = outcome else {
        panic!("session should complete");
    };
    assert_eq!(summary.score(), 0.0);
    assert_eq!(profile.correct_answers(), 0);
    assert_eq!(profile.skill_level(), 1.0);
    assert_eq!(profile.exercises_completed(), 1);
}

#[test]
fn aborted_session_leaves_profile_untouched() {
    let mut profile = UserProfile::default();
    let mut rng = StdRng::seed_from_u64(1);
    // Play one session so there is history to protect.
    let answers = correct_answers(ExerciseType::RelativeKeys, &profile, 1);
    runner()
        .run_session(
            ExerciseType::RelativeKeys,
            &mut profile,
            &mut ScriptedPrompter::new(answers),
            &mut rng,
        )
        .unwrap();
    let before = profile.clone();

    let answers = correct_answers(ExerciseType::Advanced, &profile, 5);
    let mut prompter = ScriptedPrompter::new(answers.into_iter().take(3));
    let mut rng = StdRng::seed_from_u64(5);
    let outcome = runner()
        .run_session(ExerciseType::Advanced, &mut profile, &mut prompter, &mut rng)
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Aborted { answered: 3 });
    assert_eq!(profile, before);
    assert_eq!(profile.exercises_completed(), 1);
    assert_eq!(profile.history().len(), 1);
}

#[tokio::test]
async fn session_end_checkpoint_persists_and_reports() {
    let repo = Arc::new(InMemoryRepository::new());
    let clock = Clock::fixed(fixed_now());
    let profiles = ProfileService::new(clock, repo.clone());
    let progress = ProgressService::new(repo.clone());

    let mut profile = profiles.load().await;
    for (seed, exercise) in [(7, ExerciseType::KeySignatures), (8, ExerciseType::RelativeKeys)] {
        let answers = correct_answers(exercise, &profile, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        runner()
            .run_session(exercise, &mut profile, &mut ScriptedPrompter::new(answers), &mut rng)
            .unwrap();
        profiles
            .checkpoint(&mut profile, Checkpoint::SessionEnd)
            .await
            .unwrap();
    }

    let reloaded = profiles.load().await;
    assert_eq!(reloaded, profile);
    assert_eq!(reloaded.exercises_completed(), 2);
    assert_eq!(reloaded.correct_answers(), 10);
    assert_eq!(reloaded.last_session(), Some(fixed_now()));

    let report = progress.report().await.unwrap();
    assert_eq!(report.series.len(), 2);
    assert!(report.series.iter().all(|s| s.points.len() == 1));
}
