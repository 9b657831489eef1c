//! Input validation shared by every record kind.
//!
//! # Responsibility
//! - Reject empty required names before any SQL is issued.
//! - Parse calendar dates in strict `YYYY-MM-DD` form.
//!
//! # Invariants
//! - An end date, when present, is never earlier than its start date.
//! - A blank optional date is treated as absent, never as malformed.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Caller-supplied input that cannot be persisted as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    EmptyField(&'static str),
    /// A date field is not a real `YYYY-MM-DD` calendar date.
    InvalidDate { field: &'static str, value: String },
    /// End date precedes start date.
    DateRangeReversed { start: NaiveDate, end: NaiveDate },
    /// A numeric field that must not be negative is negative.
    NegativeValue { field: &'static str, value: i64 },
    /// Subject enrollment request carries no subjects.
    EmptySubjectList,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::InvalidDate { field, value } => {
                write!(f, "{field} `{value}` is not a valid YYYY-MM-DD date")
            }
            Self::DateRangeReversed { start, end } => {
                write!(f, "end date {end} is earlier than start date {start}")
            }
            Self::NegativeValue { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            Self::EmptySubjectList => write!(f, "subject list must not be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Returns the trimmed value, or `EmptyField` when nothing is left.
pub fn require_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed)
}

/// Parses one strict `YYYY-MM-DD` date.
///
/// Chrono alone accepts single-digit months and days, so the shape is
/// checked first.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    let invalid = || ValidationError::InvalidDate {
        field,
        value: trimmed.to_string(),
    };
    if !ISO_DATE_RE.is_match(trimmed) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())
}

/// Parses an optional date; `None` and blank strings both mean absent.
pub fn parse_optional_date(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(field, text).map(Some),
    }
}

/// Validates a start/end pair and returns both parsed dates.
pub fn parse_date_range(
    start: &str,
    end: Option<&str>,
) -> Result<(NaiveDate, Option<NaiveDate>), ValidationError> {
    let start = parse_date("start_date", start)?;
    let end = parse_optional_date("end_date", end)?;
    if let Some(end) = end {
        if end < start {
            return Err(ValidationError::DateRangeReversed { start, end });
        }
    }
    Ok((start, end))
}

/// Formats a date the way it is persisted.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn require_non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeValue { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_date, parse_date_range, require_text, ValidationError};

    #[test]
    fn require_text_trims_and_rejects_blank() {
        assert_eq!(require_text("name", "  Ben ").unwrap(), "Ben");
        assert_eq!(
            require_text("name", "   ").unwrap_err(),
            ValidationError::EmptyField("name")
        );
    }

    #[test]
    fn parse_date_requires_zero_padded_fields() {
        assert!(parse_date("start_date", "2023-01-05").is_ok());
        assert!(parse_date("start_date", "2023-1-5").is_err());
        assert!(parse_date("start_date", "23-01-05").is_err());
    }

    #[test]
    fn parse_date_rejects_impossible_calendar_days() {
        assert!(parse_date("start_date", "2023-02-30").is_err());
        assert!(parse_date("start_date", "2024-02-29").is_ok());
    }

    #[test]
    fn date_range_allows_same_day_and_blank_end() {
        let (start, end) = parse_date_range("2023-03-01", Some("2023-03-01")).unwrap();
        assert_eq!(end, Some(start));

        let (_, end) = parse_date_range("2023-03-01", Some("  ")).unwrap();
        assert_eq!(end, None);
    }

    #[test]
    fn date_range_rejects_reversed_dates() {
        let err = parse_date_range("2023-03-02", Some("2023-03-01")).unwrap_err();
        assert!(matches!(err, ValidationError::DateRangeReversed { .. }));
    }
}
