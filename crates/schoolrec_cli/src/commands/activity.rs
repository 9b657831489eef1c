//! `schoolrec activity ...`

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use schoolrec_core::{
    ActivityInput, ActivityMembershipInput, ActivityRepository, SqliteActivityRepository,
};
use serde_json::{json, Value};

use super::to_json;

#[derive(Parser, Debug)]
pub struct ActivityArgs {
    #[command(subcommand)]
    pub command: ActivityCommand,
}

#[derive(Args, Debug)]
pub struct ActivityFields {
    /// Activity name (unique)
    #[arg(long)]
    name: String,
    /// Start date, YYYY-MM-DD
    #[arg(long)]
    start: String,
    /// End date, YYYY-MM-DD; omit for open-ended activities
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    description: String,
}

impl From<ActivityFields> for ActivityInput {
    fn from(fields: ActivityFields) -> Self {
        Self {
            name: fields.name,
            start_date: fields.start,
            end_date: fields.end,
            description: fields.description,
        }
    }
}

#[derive(Args, Debug)]
pub struct ParticipationFields {
    /// Student name
    #[arg(long)]
    student: String,
    /// Activity name
    #[arg(long)]
    activity: String,
    /// Role played in the activity
    #[arg(long)]
    role: String,
    /// Award received, if any
    #[arg(long)]
    award: Option<String>,
    /// Hours contributed
    #[arg(long)]
    hours: Option<i64>,
}

impl From<ParticipationFields> for ActivityMembershipInput {
    fn from(fields: ParticipationFields) -> Self {
        Self {
            student_name: fields.student,
            activity_name: fields.activity,
            role: fields.role,
            award: fields.award,
            hours: fields.hours,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ActivityCommand {
    /// Add an activity
    Add(ActivityFields),
    /// Show the first activity whose name contains NAME
    Get {
        /// Name fragment (case-sensitive)
        name: String,
    },
    /// List every activity
    List,
    /// Rewrite every field of the activity named exactly NAME
    Update {
        /// Current name, matched exactly
        current: String,
        #[command(flatten)]
        fields: ActivityFields,
    },
    /// Remove an activity and all participation records
    Delete {
        /// Name, matched exactly
        name: String,
    },
    /// Record a student's participation (both names match by fragment)
    AddStudent(ParticipationFields),
    /// List participation of students whose name contains STUDENT
    Participation {
        /// Student name fragment (case-sensitive)
        student: String,
        /// Narrow to activities whose name contains this fragment
        #[arg(long)]
        activity: Option<String>,
    },
    /// Rewrite role, award and hours (activity name matched exactly)
    UpdateStudent(ParticipationFields),
    /// Remove one participation record (both names matched exactly)
    DeleteStudent {
        #[arg(long)]
        student: String,
        #[arg(long)]
        activity: String,
    },
}

pub fn run(conn: &Connection, command: ActivityCommand) -> Result<Value> {
    let activities = SqliteActivityRepository::try_new(conn)?;

    match command {
        ActivityCommand::Add(fields) => {
            let activity_id = activities.add(&fields.into())?;
            Ok(json!({ "activity_id": activity_id }))
        }
        ActivityCommand::Get { name } => to_json(&activities.get(&name)?),
        ActivityCommand::List => to_json(&activities.list_all()?),
        ActivityCommand::Update { current, fields } => {
            activities.update(&current, &fields.into())?;
            Ok(json!({ "updated": current }))
        }
        ActivityCommand::Delete { name } => {
            activities.delete(&name)?;
            Ok(json!({ "deleted": name }))
        }
        ActivityCommand::AddStudent(fields) => {
            activities.add_student(&fields.into())?;
            Ok(json!({ "joined": 1 }))
        }
        ActivityCommand::Participation { student, activity } => {
            to_json(&activities.get_student(&student, activity.as_deref())?)
        }
        ActivityCommand::UpdateStudent(fields) => {
            activities.update_student(&fields.into())?;
            Ok(json!({ "updated": 1 }))
        }
        ActivityCommand::DeleteStudent { student, activity } => {
            activities.delete_student(&student, &activity)?;
            Ok(json!({ "left": 1 }))
        }
    }
}
