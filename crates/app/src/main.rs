use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use services::{AppServices, Clock};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod console;

use console::{LinePrompter, practice, progress_text, stats_text};

#[derive(Parser)]
#[command(name = "fifths")]
#[command(about = "Circle of fifths trainer with adaptive practice", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQLite database URL or file path
    #[arg(long = "db", env = "FIFTHS_DB_URL", default_value = "sqlite://fifths.sqlite3")]
    db_url: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Interactive practice menu (default)
    Practice,
    /// Print profile statistics
    Stats,
    /// Print score history per exercise type
    Progress,
    /// Print the stored profile as JSON
    Export,
    /// Change the username
    Rename { name: String },
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // Prompts own stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if cli.db_url.trim().is_empty() {
        bail!("invalid --db value: {:?}", cli.db_url);
    }
    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;
    debug!(%db_url, "opening profile database");

    let services = AppServices::new_sqlite(&db_url, Clock::default())
        .await
        .with_context(|| format!("opening {db_url}"))?;

    match cli.command.unwrap_or(Command::Practice) {
        Command::Practice => {
            let mut profile = services.profiles().load().await;
            let mut prompter = LinePrompter::stdio();
            practice(&services, &mut profile, &mut prompter).await?;
        }
        Command::Stats => {
            let profile = services.profiles().load().await;
            println!("{}", stats_text(&profile));
        }
        Command::Progress => {
            let report = services
                .progress()
                .report()
                .await
                .context("reading exercise history")?;
            println!("{}", progress_text(&report));
        }
        Command::Export => {
            let profile = services.profiles().load().await;
            let json = serde_json::to_string_pretty(&profile.snapshot())?;
            println!("{json}");
        }
        Command::Rename { name } => {
            let mut profile = services.profiles().load().await;
            services.profiles().rename(&mut profile, &name).await?;
            info!(username = profile.username(), "username changed");
            println!("Username set to {}.", profile.username());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
