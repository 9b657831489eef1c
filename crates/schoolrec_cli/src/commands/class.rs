//! `schoolrec class ...`

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use schoolrec_core::{ClassInput, ClassRepository, SqliteClassRepository};
use serde_json::{json, Value};

use super::to_json;

#[derive(Parser, Debug)]
pub struct ClassArgs {
    #[command(subcommand)]
    pub command: ClassCommand,
}

#[derive(Args, Debug)]
pub struct ClassFields {
    /// Class name (unique), e.g. J2-01
    #[arg(long)]
    name: String,
    /// Level, e.g. J2
    #[arg(long)]
    level: String,
}

impl From<ClassFields> for ClassInput {
    fn from(fields: ClassFields) -> Self {
        Self {
            name: fields.name,
            level: fields.level,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ClassCommand {
    /// Add a class
    Add(ClassFields),
    /// Show name and level of the first class whose name contains NAME
    Info {
        /// Name fragment (case-sensitive)
        name: String,
    },
    /// List students of every class whose name contains NAME
    Members {
        /// Name fragment (case-sensitive)
        name: String,
    },
    /// Rewrite name and level of the class named exactly NAME
    Update {
        /// Current name, matched exactly
        current: String,
        #[command(flatten)]
        fields: ClassFields,
    },
    /// List every class
    List,
}

pub fn run(conn: &Connection, command: ClassCommand) -> Result<Value> {
    let classes = SqliteClassRepository::try_new(conn)?;

    match command {
        ClassCommand::Add(fields) => {
            let class_id = classes.add(&fields.into())?;
            Ok(json!({ "class_id": class_id }))
        }
        ClassCommand::Info { name } => to_json(&classes.get_info(&name)?),
        ClassCommand::Members { name } => to_json(&classes.get(&name)?),
        ClassCommand::Update { current, fields } => {
            classes.update(&current, &fields.into())?;
            Ok(json!({ "updated": current }))
        }
        ClassCommand::List => to_json(&classes.list_all()?),
    }
}
