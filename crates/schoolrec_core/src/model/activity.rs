//! Activity records and student participation.
//!
//! # Invariants
//! - `start_date` and `end_date` are calendar dates; `end_date >= start_date`
//!   when present.
//! - `hours`, when recorded, is never negative.

use crate::model::validation::{
    parse_date_range, require_non_negative, require_text, ValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type ActivityId = i64;

/// Input for adding an activity or rewriting all of its fields.
///
/// Dates arrive as `YYYY-MM-DD` text; a blank `end_date` means open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInput {
    pub name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: String,
}

impl ActivityInput {
    /// Validates the input and returns the parsed date range.
    pub fn validate(&self) -> Result<(NaiveDate, Option<NaiveDate>), ValidationError> {
        require_text("activity_name", &self.name)?;
        require_text("description", &self.description)?;
        parse_date_range(&self.start_date, self.end_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: ActivityId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: String,
}

/// Student x Activity link with its three mutable attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMembershipInput {
    pub student_name: String,
    pub activity_name: String,
    pub role: String,
    pub award: Option<String>,
    pub hours: Option<i64>,
}

impl ActivityMembershipInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("student_name", &self.student_name)?;
        require_text("activity_name", &self.activity_name)?;
        require_text("role", &self.role)?;
        if let Some(hours) = self.hours {
            require_non_negative("hours", hours)?;
        }
        Ok(())
    }

    /// Award with blank text folded to `None`.
    pub fn normalized_award(&self) -> Option<&str> {
        self.award
            .as_deref()
            .map(str::trim)
            .filter(|award| !award.is_empty())
    }
}

/// One participation as seen from the student side.
///
/// `student_name` is only filled when the lookup was narrowed to one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMembershipRecord {
    pub activity_name: String,
    pub role: String,
    pub award: Option<String>,
    pub hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}
