//! Typed records exchanged between the repositories and their callers.
//!
//! # Responsibility
//! - Define one input struct per write operation and one output struct per
//!   read shape, replacing loosely keyed field maps.
//! - Validate caller input before persistence.
//!
//! # Invariants
//! - Identifiers are store-assigned integers and never supplied by callers
//!   on create.
//! - Names are the human-facing keys; identifiers are for joins only.

pub mod activity;
pub mod cca;
pub mod class;
pub mod student;
pub mod subject;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of record a repository result or failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student,
    Class,
    Subject,
    Cca,
    Activity,
    /// Student x CCA junction row.
    CcaMembership,
    /// Student x Activity junction row.
    ActivityMembership,
    /// Student x Subject junction row.
    SubjectEnrollment,
}

impl EntityKind {
    /// Human-facing label used by presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Class => "Class",
            Self::Subject => "Subject",
            Self::Cca => "CCA",
            Self::Activity => "Activity",
            Self::CcaMembership => "CCA membership",
            Self::ActivityMembership => "Activity participation",
            Self::SubjectEnrollment => "Subject enrollment",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
