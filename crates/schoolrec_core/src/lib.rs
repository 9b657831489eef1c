//! Data-access layer for school records.
//!
//! Students, classes, subjects, CCAs and activities live in one SQLite file;
//! the repositories here are the only code that reads or writes it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::activity::{
    ActivityId, ActivityInput, ActivityMembershipInput, ActivityMembershipRecord, ActivityRecord,
};
pub use model::cca::{CcaId, CcaInput, CcaMembershipInput, CcaMembershipRecord, CcaRecord};
pub use model::class::{ClassId, ClassInput, ClassMember, ClassRecord};
pub use model::student::{StudentId, StudentInput, StudentRecord};
pub use model::subject::{EnrollmentInput, SubjectId, SubjectKey, SubjectRecord, WithdrawalInput};
pub use model::validation::ValidationError;
pub use model::EntityKind;
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::cca_repo::{CcaRepository, SqliteCcaRepository};
pub use repo::class_repo::{ClassRepository, SqliteClassRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
pub use service::import_service::{
    ImportDefaults, ImportError, ImportReport, ImportService, RejectedRow,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
