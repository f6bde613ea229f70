use std::io::{self, BufRead, Write};

use anyhow::Result;
use fifths_core::model::{ExerciseType, UserProfile};
use fifths_core::time::format_timestamp;
use services::{AppServices, Checkpoint, ProgressReport, Prompter, SessionOutcome};
use tracing::{debug, warn};

/// Prompter over any line reader and writer; stdin/stdout in the binary.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn prompt(&mut self, text: &str) -> Option<String> {
        if writeln!(self.output, "{text}").is_err() || write!(self.output, "> ").is_err() {
            return None;
        }
        if let Err(err) = self.output.flush() {
            debug!(error = %err, "prompt flush failed");
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
        }
    }

    fn display(&mut self, text: &str) {
        if let Err(err) = writeln!(self.output, "{text}") {
            debug!(error = %err, "display write failed");
        }
    }
}

//
// ─── MENU ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Exercise(ExerciseType),
    Stats,
    Progress,
    Rename,
    Exit,
}

const MENU_EXTRAS: [(&str, MenuChoice); 4] = [
    ("View statistics", MenuChoice::Stats),
    ("View progress", MenuChoice::Progress),
    ("Change username", MenuChoice::Rename),
    ("Exit", MenuChoice::Exit),
];

fn menu_text(profile: &UserProfile) -> String {
    let mut text = format!(
        "\nCircle of Fifths Trainer ({}, skill {:.2})\n",
        profile.username(),
        profile.skill_level()
    );
    let exercises = ExerciseType::ALL.iter().map(|e| e.title());
    let extras = MENU_EXTRAS.iter().map(|(label, _)| *label);
    for (n, label) in exercises.chain(extras).enumerate() {
        text.push_str(&format!("  {}. {label}\n", n + 1));
    }
    text.push_str("Choose an option:");
    text
}

fn parse_choice(raw: &str) -> Option<MenuChoice> {
    let n: usize = raw.trim().parse().ok()?;
    let index = n.checked_sub(1)?;
    match ExerciseType::ALL.get(index) {
        Some(exercise) => Some(MenuChoice::Exercise(*exercise)),
        None => MENU_EXTRAS
            .get(index - ExerciseType::ALL.len())
            .map(|(_, choice)| *choice),
    }
}

/// Interactive loop: run exercises until the learner exits or input ends.
///
/// The profile is saved after every finished session, after a rename, and
/// once more on the way out.
pub async fn practice<P: Prompter>(
    services: &AppServices,
    profile: &mut UserProfile,
    prompter: &mut P,
) -> Result<()> {
    let profiles = services.profiles();
    let runner = services.runner();

    loop {
        let Some(raw) = prompter.prompt(&menu_text(profile)) else {
            break;
        };
        let Some(choice) = parse_choice(&raw) else {
            prompter.display("Invalid choice, try again.");
            continue;
        };

        match choice {
            MenuChoice::Exercise(exercise) => {
                let outcome =
                    runner.run_session(exercise, profile, prompter, &mut rand::rng())?;
                match outcome {
                    SessionOutcome::Completed(_) => {
                        profiles.checkpoint(profile, Checkpoint::SessionEnd).await?;
                    }
                    SessionOutcome::Aborted { .. } => break,
                }
            }
            MenuChoice::Stats => prompter.display(&stats_text(profile)),
            MenuChoice::Progress => match services.progress().report().await {
                Ok(report) => prompter.display(&progress_text(&report)),
                Err(err) => {
                    warn!(error = %err, "progress report unavailable");
                    prompter.display(&format!("Progress unavailable: {err}"));
                }
            },
            MenuChoice::Rename => {
                let Some(name) = prompter.prompt("New username:") else {
                    break;
                };
                match profiles.rename(profile, &name).await {
                    Ok(()) => prompter.display(&format!("Username set to {}.", profile.username())),
                    Err(err) => prompter.display(&format!("Username unchanged: {err}")),
                }
            }
            MenuChoice::Exit => break,
        }
    }

    profiles.checkpoint(profile, Checkpoint::Exit).await?;
    prompter.display("Goodbye!");
    Ok(())
}

//
// ─── REPORTS ───────────────────────────────────────────────────────────────────
//

pub fn stats_text(profile: &UserProfile) -> String {
    let mut text = format!(
        "\nUser: {}\nExercises completed: {}\nCorrect answers: {}\nSkill level: {:.2}\nLast session: {}\n\nKey proficiency:\n",
        profile.username(),
        profile.exercises_completed(),
        profile.correct_answers(),
        profile.skill_level(),
        profile
            .last_session()
            .map_or_else(|| "never".to_owned(), format_timestamp),
    );
    for (key, level) in profile.proficiency().iter() {
        text.push_str(&format!("  {:<6} {level:>5.2}\n", key.label()));
    }
    text
}

pub fn progress_text(report: &ProgressReport) -> String {
    if report.is_empty() {
        return "\nNo exercises completed yet.".to_owned();
    }
    let mut text = String::from("\nProgress by exercise:\n");
    for series in &report.series {
        text.push_str(&format!(
            "\n{} ({} sessions, best {:.1}%, average {:.1}%)\n",
            series.exercise.title(),
            series.points.len(),
            series.best().unwrap_or_default(),
            series.average().unwrap_or_default(),
        ));
        for point in &series.points {
            text.push_str(&format!(
                "  {}  {:>5.1}%  {}\n",
                point.at.format("%Y-%m-%d %H:%M"),
                point.score,
                score_bar(point.score)
            ));
        }
    }
    text
}

fn score_bar(score: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (score.clamp(0.0, 100.0) / 5.0).round() as usize;
    "#".repeat(filled)
}
