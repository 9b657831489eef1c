//! Subject catalogue and enrollment records.
//!
//! A subject is keyed by its `(name, level)` pair; the same name may exist
//! at several levels as distinct rows.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type SubjectId = i64;

/// Natural key of one subject row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectKey {
    pub name: String,
    pub level: String,
}

impl SubjectKey {
    pub fn new(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: level.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("subj_name", &self.name)?;
        require_text("level", &self.level)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub subj_id: SubjectId,
    pub name: String,
    pub level: String,
}

/// Enrolls one student into every listed subject, all or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentInput {
    pub student_name: String,
    pub subjects: Vec<SubjectKey>,
}

impl EnrollmentInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("student_name", &self.student_name)?;
        if self.subjects.is_empty() {
            return Err(ValidationError::EmptySubjectList);
        }
        for subject in &self.subjects {
            subject.validate()?;
        }
        Ok(())
    }
}

/// Removes one enrollment; both names resolve by exact match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalInput {
    pub student_name: String,
    pub subject: SubjectKey,
}

impl WithdrawalInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("student_name", &self.student_name)?;
        self.subject.validate()
    }
}
