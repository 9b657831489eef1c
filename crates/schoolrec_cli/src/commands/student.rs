//! `schoolrec student ...`

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use schoolrec_core::{SqliteStudentRepository, StudentInput, StudentRepository};
use serde_json::{json, Value};

use super::to_json;

#[derive(Parser, Debug)]
pub struct StudentArgs {
    #[command(subcommand)]
    pub command: StudentCommand,
}

/// Every field of a student record.
#[derive(Args, Debug)]
pub struct StudentFields {
    /// Student name (unique)
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: i64,
    /// Year the student enrolled, e.g. 2022
    #[arg(long)]
    year_enrolled: i64,
    /// Expected graduation year
    #[arg(long)]
    grad_year: i64,
    /// Exact name of an existing class
    #[arg(long = "class")]
    class_name: String,
}

impl From<StudentFields> for StudentInput {
    fn from(fields: StudentFields) -> Self {
        Self {
            name: fields.name,
            age: fields.age,
            year_enrolled: fields.year_enrolled,
            grad_year: fields.grad_year,
            class_name: fields.class_name,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum StudentCommand {
    /// Add a student to an existing class
    Add(StudentFields),
    /// Show the first student whose name contains NAME
    Get {
        /// Name fragment (case-sensitive)
        name: String,
    },
    /// Rewrite every field of the student named exactly NAME
    Update {
        /// Current name, matched exactly
        current: String,
        #[command(flatten)]
        fields: StudentFields,
    },
    /// Remove a student together with all CCA, activity and subject links
    Delete {
        /// Name, matched exactly
        name: String,
    },
    /// List every student
    List,
}

pub fn run(conn: &Connection, command: StudentCommand) -> Result<Value> {
    let students = SqliteStudentRepository::try_new(conn)?;

    match command {
        StudentCommand::Add(fields) => {
            let student_id = students.add(&fields.into())?;
            Ok(json!({ "student_id": student_id }))
        }
        StudentCommand::Get { name } => to_json(&students.get(&name)?),
        StudentCommand::Update { current, fields } => {
            students.update(&current, &fields.into())?;
            Ok(json!({ "updated": current }))
        }
        StudentCommand::Delete { name } => {
            students.delete(&name)?;
            Ok(json!({ "deleted": name }))
        }
        StudentCommand::List => to_json(&students.list_all()?),
    }
}
