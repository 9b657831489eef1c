//! User-facing text for recoverable repository failures.

use schoolrec_core::{ImportError, RepoError};

/// Sentence for failures the user can fix by retrying with other input.
///
/// Returns `None` for storage and bootstrap failures, which are reported
/// with their full error chain instead.
pub fn user_message(err: &anyhow::Error) -> Option<String> {
    if let Some(repo_err) = err.downcast_ref::<RepoError>() {
        return repo_message(repo_err);
    }
    match err.downcast_ref::<ImportError>()? {
        ImportError::Repo(repo_err) => repo_message(repo_err),
        other => Some(format!("Cannot import: {other}")),
    }
}

fn repo_message(err: &RepoError) -> Option<String> {
    match err {
        RepoError::NotFound { entity, name } => Some(format!("The {entity} {name} does not exist")),
        RepoError::AlreadyExists { entity, name } => {
            Some(format!("The {entity} {name} already exists"))
        }
        RepoError::InvalidReference { entity, name } => {
            Some(format!("No {entity} matches {name}"))
        }
        RepoError::MalformedInput(validation) => Some(format!("Invalid input: {validation}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::user_message;
    use schoolrec_core::{EntityKind, RepoError, ValidationError};

    #[test]
    fn duplicate_reads_as_a_sentence() {
        let err = anyhow::Error::new(RepoError::AlreadyExists {
            entity: EntityKind::Cca,
            name: "Choir".to_string(),
        });
        assert_eq!(
            user_message(&err).as_deref(),
            Some("The CCA Choir already exists")
        );
    }

    #[test]
    fn validation_failure_names_the_field() {
        let err = anyhow::Error::new(RepoError::MalformedInput(ValidationError::EmptyField(
            "student_name",
        )));
        assert_eq!(
            user_message(&err).as_deref(),
            Some("Invalid input: student_name must not be empty")
        );
    }

    #[test]
    fn storage_failures_have_no_user_message() {
        let err = anyhow::Error::new(RepoError::InvalidData("bad date".to_string()));
        assert!(user_message(&err).is_none());
        assert!(user_message(&anyhow::anyhow!("disk full")).is_none());
    }
}
