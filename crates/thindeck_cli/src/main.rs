//! Command-line access to a local Thindeck repo store.
//!
//! # Responsibility
//! - Parse configuration from flags or `THINDECK_*` environment variables.
//! - Run one `Repos` operation per invocation and print the result.

use clap::{Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use thindeck_core::db::open_db;
use thindeck_core::{
    default_log_level, init_logging, DyRepos, Repo, RepoError, Repos, SqliteRegion,
};

#[derive(Debug, Parser)]
#[command(name = "thindeck", version, about = "Manage repos in a Thindeck store")]
struct Cli {
    /// Path of the SQLite store file.
    #[arg(long, env = "THINDECK_DB")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, env = "THINDECK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "THINDECK_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a repo.
    Add { name: String },
    /// Show one repo.
    Get { name: String },
    /// List all repos.
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(message) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {message}");
        }
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let conn = open_db(&cli.db)
        .map_err(|err| format!("cannot open `{}`: {err}", cli.db.display()))?;
    let region = SqliteRegion::try_new(&conn).map_err(|err| err.to_string())?;
    let repos = DyRepos::new(region);

    match &cli.command {
        Command::Add { name } => print_repo(&repos.add(name).map_err(describe)?),
        Command::Get { name } => print_repo(&repos.get(name).map_err(describe)?),
        Command::List => {
            for repo in repos.iterate() {
                print_repo(&repo.map_err(describe)?);
            }
        }
    }
    Ok(())
}

fn print_repo(repo: &Repo) {
    println!("{}\t{}", repo.name, repo.updated);
}

fn describe(err: RepoError) -> String {
    match err {
        RepoError::AlreadyExists(name) => {
            format!("repo `{name}` already exists; choose a different name")
        }
        other => other.to_string(),
    }
}
