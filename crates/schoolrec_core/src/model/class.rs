//! Class records.

use crate::model::student::StudentId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type ClassId = i64;

/// Input for adding a class or rewriting its name and level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInput {
    pub name: String,
    pub level: String,
}

impl ClassInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("class_name", &self.name)?;
        require_text("level", &self.level)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub class_id: ClassId,
    pub name: String,
    pub level: String,
}

/// One student owned by a class, as listed by `ClassRepository::get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMember {
    pub student_id: StudentId,
    pub student_name: String,
}
