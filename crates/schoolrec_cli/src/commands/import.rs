//! `schoolrec import ...`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use schoolrec_core::{
    ImportService, SqliteCcaRepository, SqliteClassRepository, SqliteStudentRepository,
};
use serde_json::Value;

use super::to_json;

#[derive(Parser, Debug)]
pub struct ImportArgs {
    #[command(subcommand)]
    pub command: ImportCommand,
}

#[derive(Subcommand, Debug)]
pub enum ImportCommand {
    /// Import students from a CSV with student_name,class_id,year_enrolled columns
    Students {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Import CCAs from a CSV with name,type columns
    Ccas {
        /// Path to the CSV file
        file: PathBuf,
    },
}

pub fn run(conn: &Connection, command: ImportCommand) -> Result<Value> {
    let service = ImportService::new(
        SqliteClassRepository::try_new(conn)?,
        SqliteStudentRepository::try_new(conn)?,
        SqliteCcaRepository::try_new(conn)?,
    );

    let report = match command {
        ImportCommand::Students { file } => service.import_students(&read_source(&file)?)?,
        ImportCommand::Ccas { file } => service.import_ccas(&read_source(&file)?)?,
    };
    to_json(&report)
}

fn read_source(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}
