//! CCA records and student memberships.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type CcaId = i64;

/// Input for adding a CCA or rewriting its name and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcaInput {
    pub name: String,
    /// Persisted in the `type` column.
    #[serde(rename = "type")]
    pub kind: String,
}

impl CcaInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("cca_name", &self.name)?;
        require_text("type", &self.kind)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcaRecord {
    pub cca_id: CcaId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Student x CCA link; `role` is the only mutable attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcaMembershipInput {
    pub student_name: String,
    pub cca_name: String,
    pub role: String,
}

impl CcaMembershipInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("student_name", &self.student_name)?;
        require_text("cca_name", &self.cca_name)?;
        require_text("role", &self.role)?;
        Ok(())
    }
}

/// One membership as seen from the student side.
///
/// `student_name` is only filled when the lookup was narrowed to one CCA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcaMembershipRecord {
    pub cca_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}
