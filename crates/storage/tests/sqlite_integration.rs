use fifths_core::model::{ExerciseRecord, ExerciseType, SessionCommit, UserProfile};
use fifths_core::theory::Key;
use fifths_core::time::fixed_now;
use storage::repository::ProfileRepository;
use storage::sqlite::SqliteRepository;

async fn memory_repo(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn session(profile: &mut UserProfile, exercise: ExerciseType, correct: u32, score: f64, minutes: i64) {
    let mut proficiency = profile.proficiency().clone();
    proficiency.credit(Key::E, f64::from(correct) * exercise.proficiency_increment());
    let at = fixed_now() + chrono::Duration::minutes(minutes);
    profile.commit_session(SessionCommit {
        correct,
        proficiency,
        record: ExerciseRecord::new(at, exercise, score).with_key(Some(Key::E)),
    });
    profile.touch_last_session(at);
}

#[tokio::test]
async fn sqlite_starts_empty() {
    let repo = memory_repo("memdb_empty").await;
    assert!(repo.load_profile().await.unwrap().is_none());
    assert!(repo.history_rows().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_roundtrip_persists_profile_and_history() {
    let repo = memory_repo("memdb_roundtrip").await;

    let mut profile = UserProfile::new("ada").unwrap();
    session(&mut profile, ExerciseType::KeySignatures, 4, 80.0, 0);
    session(&mut profile, ExerciseType::ChordProgression, 1, 50.0, 5);
    repo.save_profile(&profile).await.unwrap();

    let loaded = repo.load_profile().await.unwrap().expect("profile stored");
    assert_eq!(loaded, profile);
    assert_eq!(loaded.history().len(), 2);
    assert_eq!(loaded.history()[1].exercise(), ExerciseType::ChordProgression);
    assert_eq!(loaded.last_session(), profile.last_session());
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_state() {
    let repo = memory_repo("memdb_overwrite").await;

    let mut profile = UserProfile::new("ada").unwrap();
    session(&mut profile, ExerciseType::RelativeKeys, 5, 100.0, 0);
    repo.save_profile(&profile).await.unwrap();

    profile.rename("grace").unwrap();
    session(&mut profile, ExerciseType::RelativeKeys, 2, 40.0, 10);
    repo.save_profile(&profile).await.unwrap();

    let loaded = repo.load_profile().await.unwrap().unwrap();
    assert_eq!(loaded.username(), "grace");
    assert_eq!(loaded.exercises_completed(), 2);
    assert_eq!(loaded.correct_answers(), 7);
    assert_eq!(repo.history_rows().await.unwrap().len(), 2);
}

#[tokio::test]
async fn sqlite_keeps_fallback_and_garbage_timestamps_as_written() {
    let repo = memory_repo("memdb_timestamps").await;
    let mut profile = UserProfile::default();
    session(&mut profile, ExerciseType::Advanced, 3, 60.0, 0);
    repo.save_profile(&profile).await.unwrap();

    sqlx::query("UPDATE exercise_history SET recorded_at = '2023-11-14 22:13:20'")
        .execute(repo.pool())
        .await
        .unwrap();
    let loaded = repo.load_profile().await.unwrap().unwrap();
    assert_eq!(loaded.history()[0].recorded_at().instant().unwrap(), fixed_now());

    sqlx::query("UPDATE exercise_history SET recorded_at = 'last tuesday'")
        .execute(repo.pool())
        .await
        .unwrap();
    let loaded = repo.load_profile().await.unwrap().unwrap();
    assert_eq!(loaded.exercises_completed(), 1);
    assert_eq!(loaded.history()[0].recorded_at().as_str(), "last tuesday");
    assert!(loaded.history()[0].recorded_at().instant().is_err());

    repo.save_profile(&loaded).await.unwrap();
    let rows = repo.history_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].recorded_at, "last tuesday");
}
