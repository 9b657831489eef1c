//! Student records.

use crate::model::validation::{require_non_negative, require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type StudentId = i64;

/// Input for adding a student or rewriting all of its fields.
///
/// `class_name` must name an existing class exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInput {
    pub name: String,
    pub age: i64,
    pub year_enrolled: i64,
    pub grad_year: i64,
    pub class_name: String,
}

impl StudentInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("student_name", &self.name)?;
        require_text("class_name", &self.class_name)?;
        require_non_negative("age", self.age)?;
        require_non_negative("year_enrolled", self.year_enrolled)?;
        require_non_negative("grad_year", self.grad_year)?;
        Ok(())
    }
}

/// Flattened student read model with the owning class name joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: StudentId,
    pub name: String,
    pub age: i64,
    pub year_enrolled: i64,
    pub grad_year: i64,
    pub class_name: String,
}
