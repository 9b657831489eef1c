//! `schoolrec subject ...`

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use schoolrec_core::{
    EnrollmentInput, SqliteSubjectRepository, SubjectKey, SubjectRepository, WithdrawalInput,
};
use serde_json::{json, Value};

use super::to_json;

#[derive(Parser, Debug)]
pub struct SubjectArgs {
    #[command(subcommand)]
    pub command: SubjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubjectCommand {
    /// Add a subject to the catalogue
    Add {
        #[arg(long)]
        name: String,
        /// Level, e.g. H2
        #[arg(long)]
        level: String,
    },
    /// List the subject catalogue
    List,
    /// Enroll a student into one or more subjects, all or nothing
    Enroll {
        /// Student name fragment (case-sensitive)
        student: String,
        /// Subject as NAME:LEVEL; repeat for several subjects
        #[arg(long = "subject", required = true, value_parser = parse_subject_key)]
        subjects: Vec<SubjectKey>,
    },
    /// List subjects of students whose name contains STUDENT
    Enrollments {
        /// Student name fragment (case-sensitive)
        student: String,
    },
    /// Withdraw a student from one subject
    Withdraw {
        /// Student name, matched exactly
        student: String,
        /// Subject as NAME:LEVEL
        #[arg(long, value_parser = parse_subject_key)]
        subject: SubjectKey,
    },
}

pub fn run(conn: &Connection, command: SubjectCommand) -> Result<Value> {
    let subjects = SqliteSubjectRepository::try_new(conn)?;

    match command {
        SubjectCommand::Add { name, level } => {
            let subj_id = subjects.add(&SubjectKey::new(name, level))?;
            Ok(json!({ "subj_id": subj_id }))
        }
        SubjectCommand::List => to_json(&subjects.list_all()?),
        SubjectCommand::Enroll {
            student,
            subjects: keys,
        } => {
            let enrolled = subjects.add_student(&EnrollmentInput {
                student_name: student,
                subjects: keys,
            })?;
            Ok(json!({ "enrolled": enrolled }))
        }
        SubjectCommand::Enrollments { student } => to_json(&subjects.get_student(&student)?),
        SubjectCommand::Withdraw { student, subject } => {
            subjects.delete_student(&WithdrawalInput {
                student_name: student,
                subject,
            })?;
            Ok(json!({ "withdrawn": 1 }))
        }
    }
}

/// Splits `NAME:LEVEL` at the last colon.
fn parse_subject_key(value: &str) -> Result<SubjectKey, String> {
    match value.rsplit_once(':') {
        Some((name, level)) if !name.trim().is_empty() && !level.trim().is_empty() => {
            Ok(SubjectKey::new(name.trim(), level.trim()))
        }
        _ => Err(format!("expected NAME:LEVEL, got `{value}`")),
    }
}
