//! schoolrec CLI - command-line front end for the school record store
//!
//! Every subcommand maps onto one repository operation:
//! - `student`, `class`, `subject`, `cca`, `activity` for records and memberships
//! - `import` for bulk CSV loads of students and CCAs
//!
//! Results are printed as JSON on stdout. Recoverable failures (unknown
//! names, duplicates, bad input) print one sentence on stderr and exit 1;
//! storage failures exit 2.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use schoolrec_core::{init_logging, open_db, LogLevel};

mod commands;
mod messages;

#[derive(Parser, Debug)]
#[command(
    name = "schoolrec",
    author,
    version,
    about = "Keep student, class, subject, CCA and activity records in one SQLite file"
)]
struct Cli {
    /// Path to the SQLite database file (created on first use)
    #[arg(
        long,
        global = true,
        env = "SCHOOLREC_DB",
        default_value = "schoolrec.sqlite3"
    )]
    db: PathBuf,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, env = "SCHOOLREC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, global = true, env = "SCHOOLREC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add, look up, rewrite and remove students
    Student(commands::student::StudentArgs),
    /// Add, look up and rewrite classes; list class members
    Class(commands::class::ClassArgs),
    /// Maintain the subject catalogue and student enrollments
    Subject(commands::subject::SubjectArgs),
    /// Maintain CCAs and student memberships
    Cca(commands::cca::CcaArgs),
    /// Maintain activities and student participation
    Activity(commands::activity::ActivityArgs),
    /// Bulk-load students or CCAs from CSV files
    Import(commands::import::ImportArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => match messages::user_message(&err) {
            Some(message) => {
                eprintln!("{message}");
                ExitCode::from(1)
            }
            None => {
                eprintln!("error: {err:#}");
                ExitCode::from(2)
            }
        },
    }
}

fn run(cli: Cli) -> Result<String> {
    if let Some(log_dir) = &cli.log_dir {
        start_logging(cli.log_level.as_deref(), log_dir)?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("Failed to open database {}", cli.db.display()))?;
    info!("event=cli_command module=cli status=start");

    let output = match cli.command {
        Commands::Student(args) => commands::student::run(&conn, args.command)?,
        Commands::Class(args) => commands::class::run(&conn, args.command)?,
        Commands::Subject(args) => commands::subject::run(&conn, args.command)?,
        Commands::Cca(args) => commands::cca::run(&conn, args.command)?,
        Commands::Activity(args) => commands::activity::run(&conn, args.command)?,
        Commands::Import(args) => commands::import::run(&conn, args.command)?,
    };

    info!("event=cli_command module=cli status=ok");
    serde_json::to_string_pretty(&output).context("Failed to render output")
}

fn start_logging(level: Option<&str>, log_dir: &Path) -> Result<()> {
    let level = match level {
        Some(value) => LogLevel::parse(value)?,
        None => LogLevel::build_default(),
    };
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Could not determine working directory")?
            .join(log_dir)
    };
    init_logging(level, &log_dir)?;
    Ok(())
}
