//! Repository error taxonomy.
//!
//! The first four variants are the caller-recoverable outcomes a
//! presentation layer turns into user-facing text. The rest are transport or
//! bootstrap failures.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::EntityKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure returned by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// The named target does not resolve to any row.
    NotFound { entity: EntityKind, name: String },
    /// A unique name or unique membership would be violated.
    AlreadyExists { entity: EntityKind, name: String },
    /// A foreign name supplied by the caller does not resolve.
    InvalidReference { entity: EntityKind, name: String },
    /// Caller input failed validation before reaching storage.
    MalformedInput(ValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            name: name.into(),
        }
    }

    pub(crate) fn already_exists(entity: EntityKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            name: name.into(),
        }
    }

    pub(crate) fn invalid_reference(entity: EntityKind, name: impl Into<String>) -> Self {
        Self::InvalidReference {
            entity,
            name: name.into(),
        }
    }

    /// Stable short code for log lines and exit status mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::MalformedInput(_) => "malformed_input",
            Self::Db(_) => "db_error",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_required_table",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, name } => write!(f, "{entity} not found: `{name}`"),
            Self::AlreadyExists { entity, name } => {
                write!(f, "{entity} already exists: `{name}`")
            }
            Self::InvalidReference { entity, name } => {
                write!(f, "referenced {entity} does not exist: `{name}`")
            }
            Self::MalformedInput(err) => write!(f, "malformed input: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record repositories require schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record repositories require table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedInput(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::MalformedInput(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Display name for a student x target junction row.
pub(crate) fn membership_name(student: &str, target: &str) -> String {
    format!("{student} / {target}")
}
