//! `schoolrec cca ...`

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use schoolrec_core::{CcaInput, CcaMembershipInput, CcaRepository, SqliteCcaRepository};
use serde_json::{json, Value};

use super::to_json;

#[derive(Parser, Debug)]
pub struct CcaArgs {
    #[command(subcommand)]
    pub command: CcaCommand,
}

#[derive(Args, Debug)]
pub struct CcaFields {
    /// CCA name (unique)
    #[arg(long)]
    name: String,
    /// CCA type, e.g. Performing Arts
    #[arg(long = "type")]
    kind: String,
}

impl From<CcaFields> for CcaInput {
    fn from(fields: CcaFields) -> Self {
        Self {
            name: fields.name,
            kind: fields.kind,
        }
    }
}

#[derive(Args, Debug)]
pub struct MembershipFields {
    /// Student name
    #[arg(long)]
    student: String,
    /// CCA name
    #[arg(long)]
    cca: String,
    /// Role held in the CCA
    #[arg(long)]
    role: String,
}

impl From<MembershipFields> for CcaMembershipInput {
    fn from(fields: MembershipFields) -> Self {
        Self {
            student_name: fields.student,
            cca_name: fields.cca,
            role: fields.role,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CcaCommand {
    /// Add a CCA
    Add(CcaFields),
    /// Show the first CCA whose name contains NAME
    Get {
        /// Name fragment (case-sensitive)
        name: String,
    },
    /// List every CCA
    List,
    /// Rewrite name and type of the CCA named exactly NAME
    Update {
        /// Current name, matched exactly
        current: String,
        #[command(flatten)]
        fields: CcaFields,
    },
    /// Remove a CCA and all of its memberships
    Delete {
        /// Name, matched exactly
        name: String,
    },
    /// Add a student to a CCA (both names match by fragment)
    AddStudent(MembershipFields),
    /// List CCA memberships of students whose name contains STUDENT
    Memberships {
        /// Student name fragment (case-sensitive)
        student: String,
        /// Narrow to CCAs whose name contains this fragment
        #[arg(long)]
        cca: Option<String>,
    },
    /// Change the role of an existing membership (CCA name matched exactly)
    UpdateStudent(MembershipFields),
    /// Remove one membership (both names matched exactly)
    DeleteStudent {
        #[arg(long)]
        student: String,
        #[arg(long)]
        cca: String,
    },
}

pub fn run(conn: &Connection, command: CcaCommand) -> Result<Value> {
    let ccas = SqliteCcaRepository::try_new(conn)?;

    match command {
        CcaCommand::Add(fields) => {
            let cca_id = ccas.add(&fields.into())?;
            Ok(json!({ "cca_id": cca_id }))
        }
        CcaCommand::Get { name } => to_json(&ccas.get(&name)?),
        CcaCommand::List => to_json(&ccas.list_all()?),
        CcaCommand::Update { current, fields } => {
            ccas.update(&current, &fields.into())?;
            Ok(json!({ "updated": current }))
        }
        CcaCommand::Delete { name } => {
            ccas.delete(&name)?;
            Ok(json!({ "deleted": name }))
        }
        CcaCommand::AddStudent(fields) => {
            ccas.add_student(&fields.into())?;
            Ok(json!({ "joined": 1 }))
        }
        CcaCommand::Memberships { student, cca } => {
            to_json(&ccas.get_student(&student, cca.as_deref())?)
        }
        CcaCommand::UpdateStudent(fields) => {
            ccas.update_student(&fields.into())?;
            Ok(json!({ "updated": 1 }))
        }
        CcaCommand::DeleteStudent { student, cca } => {
            ccas.delete_student(&student, &cca)?;
            Ok(json!({ "left": 1 }))
        }
    }
}
