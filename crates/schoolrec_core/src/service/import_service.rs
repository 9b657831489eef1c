//! Bulk import of students and CCAs from tabular files.
//!
//! # Responsibility
//! - Parse header-keyed CSV text into rows.
//! - Feed each row through the repository `add` contracts.
//! - Create a default class the first time a student row names an unknown
//!   class.
//!
//! # Invariants
//! - One bad row never aborts the import; it is reported and skipped.
//! - A class is only created for a row whose student is then inserted.
//! - Quoted fields may span lines; a row reports the line it starts on.
//! - Rows naming an existing student/CCA are counted as skipped, not failed.
//! - Importing the same file twice adds nothing the second time.

use crate::model::cca::CcaInput;
use crate::model::class::ClassInput;
use crate::model::student::StudentInput;
use crate::model::EntityKind;
use crate::repo::cca_repo::CcaRepository;
use crate::repo::class_repo::ClassRepository;
use crate::repo::error::RepoError;
use crate::repo::student_repo::StudentRepository;
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const STUDENT_NAME_HEADER: &str = "student_name";
const STUDENT_CLASS_HEADER: &str = "class_id";
const STUDENT_YEAR_HEADER: &str = "year_enrolled";
const CCA_NAME_HEADER: &str = "name";
const CCA_TYPE_HEADER: &str = "type";

/// Values filled in for fields the source files do not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDefaults {
    pub age: i64,
    pub grad_year: i64,
    /// Level given to classes created on the fly.
    pub class_level: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            age: 18,
            grad_year: 2023,
            class_level: "J2".to_string(),
        }
    }
}

/// One data row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based line number in the source text, header included.
    pub line: usize,
    pub reason: String,
}

/// Outcome summary of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub skipped: usize,
    pub classes_created: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Errors that abort an import before any row is processed, or on storage
/// failure mid-run.
#[derive(Debug)]
pub enum ImportError {
    /// Source text has no header line.
    EmptyInput,
    /// Header line lacks a required column.
    MissingColumn(&'static str),
    /// A quoted field is never closed.
    UnterminatedQuote { line: usize },
    /// Storage-level failure.
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "import file is empty"),
            Self::MissingColumn(column) => write!(f, "import header lacks column `{column}`"),
            Self::UnterminatedQuote { line } => {
                write!(f, "unterminated quoted field on line {line}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Import use-case service over the class, student and CCA repositories.
pub struct ImportService<C: ClassRepository, S: StudentRepository, K: CcaRepository> {
    classes: C,
    students: S,
    ccas: K,
    defaults: ImportDefaults,
}

impl<C: ClassRepository, S: StudentRepository, K: CcaRepository> ImportService<C, S, K> {
    /// Creates a service using the provided repository implementations.
    pub fn new(classes: C, students: S, ccas: K) -> Self {
        Self {
            classes,
            students,
            ccas,
            defaults: ImportDefaults::default(),
        }
    }

    /// Replaces the default field values.
    pub fn with_defaults(mut self, defaults: ImportDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Imports students from CSV text with `student_name,class_id,year_enrolled`
    /// columns; `class_id` holds the class name.
    pub fn import_students(&self, source: &str) -> Result<ImportReport, ImportError> {
        let table = CsvTable::parse(source)?;
        let name_col = table.column(STUDENT_NAME_HEADER)?;
        let class_col = table.column(STUDENT_CLASS_HEADER)?;
        let year_col = table.column(STUDENT_YEAR_HEADER)?;

        let mut report = ImportReport::default();
        for row in &table.rows {
            let class_name = row.field(class_col);
            let year_text = row.field(year_col);
            let year_enrolled = match year_text.parse::<i64>() {
                Ok(year) => year,
                Err(_) => {
                    report.rejected.push(RejectedRow {
                        line: row.line,
                        reason: format!("year_enrolled `{year_text}` is not a number"),
                    });
                    continue;
                }
            };

            let student = StudentInput {
                name: row.field(name_col).to_string(),
                age: self.defaults.age,
                year_enrolled,
                grad_year: self.defaults.grad_year,
                class_name: class_name.to_string(),
            };

            let mut outcome = self.students.add(&student).map(|_| ());
            if matches!(
                outcome,
                Err(RepoError::InvalidReference {
                    entity: EntityKind::Class,
                    ..
                })
            ) {
                let class = ClassInput {
                    name: class_name.to_string(),
                    level: self.defaults.class_level.clone(),
                };
                outcome = self.classes.add(&class).map(|_| ());
                if outcome.is_ok() {
                    report.classes_created += 1;
                    outcome = self.students.add(&student).map(|_| ());
                }
            }
            record_outcome(&mut report, row.line, outcome)?;
        }

        log_report("import_students", &report);
        Ok(report)
    }

    /// Imports CCAs from CSV text with `name,type` columns.
    pub fn import_ccas(&self, source: &str) -> Result<ImportReport, ImportError> {
        let table = CsvTable::parse(source)?;
        let name_col = table.column(CCA_NAME_HEADER)?;
        let type_col = table.column(CCA_TYPE_HEADER)?;

        let mut report = ImportReport::default();
        for row in &table.rows {
            let cca = CcaInput {
                name: row.field(name_col).to_string(),
                kind: row.field(type_col).to_string(),
            };
            record_outcome(&mut report, row.line, self.ccas.add(&cca).map(|_| ()))?;
        }

        log_report("import_ccas", &report);
        Ok(report)
    }
}

fn record_outcome(
    report: &mut ImportReport,
    line: usize,
    outcome: Result<(), RepoError>,
) -> Result<(), ImportError> {
    match outcome {
        Ok(()) => report.added += 1,
        Err(RepoError::AlreadyExists { .. }) => report.skipped += 1,
        Err(
            err @ (RepoError::MalformedInput(_)
            | RepoError::InvalidReference { .. }
            | RepoError::NotFound { .. }),
        ) => report.rejected.push(RejectedRow {
            line,
            reason: err.to_string(),
        }),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn log_report(event: &str, report: &ImportReport) {
    info!(
        "event={} module=import status=ok added={} skipped={} rejected={} classes_created={}",
        event,
        report.added,
        report.skipped,
        report.rejected.len(),
        report.classes_created
    );
}

#[derive(Debug)]
struct CsvRow {
    line: usize,
    fields: Vec<String>,
}

impl CsvRow {
    /// Trimmed field value; missing trailing fields read as empty.
    fn field(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |value| value.trim())
    }
}

struct CsvTable {
    header: HashMap<String, usize>,
    rows: Vec<CsvRow>,
}

impl CsvTable {
    fn parse(source: &str) -> Result<Self, ImportError> {
        let mut records = parse_records(source)?.into_iter();
        let header_row = records.next().ok_or(ImportError::EmptyInput)?;
        let header = header_row
            .fields
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), index))
            .collect();

        Ok(Self {
            header,
            rows: records.collect(),
        })
    }

    fn column(&self, name: &'static str) -> Result<usize, ImportError> {
        self.header
            .get(name)
            .copied()
            .ok_or(ImportError::MissingColumn(name))
    }
}

/// Splits CSV text into records, honouring double-quoted fields, `""`
/// escapes and line breaks inside quotes. Blank lines are dropped.
fn parse_records(source: &str) -> Result<Vec<CsvRow>, ImportError> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted_record = false;
    let mut line = 1;
    let mut start_line = 1;
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
                quoted_record = true;
            }
            ('\r', _) if chars.peek() == Some(&'\n') => {}
            ('\n', true) => {
                current.push('\n');
                line += 1;
            }
            ('\n', false) => {
                fields.push(std::mem::take(&mut current));
                push_record(&mut rows, start_line, std::mem::take(&mut fields), quoted_record);
                quoted_record = false;
                line += 1;
                start_line = line;
            }
            (',', false) => fields.push(std::mem::take(&mut current)),
            (other, _) => current.push(other),
        }
    }

    if in_quotes {
        return Err(ImportError::UnterminatedQuote { line: start_line });
    }
    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        push_record(&mut rows, start_line, fields, quoted_record);
    }
    Ok(rows)
}

fn push_record(rows: &mut Vec<CsvRow>, line: usize, fields: Vec<String>, quoted: bool) {
    let blank = !quoted && fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        rows.push(CsvRow { line, fields });
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_records, CsvTable, ImportError};

    fn fields_of(source: &str) -> Vec<Vec<String>> {
        parse_records(source)
            .unwrap()
            .into_iter()
            .map(|row| row.fields)
            .collect()
    }

    #[test]
    fn records_handle_quotes_and_escapes() {
        let records = fields_of(r#"plain,"with, comma","say ""hi""""#);
        assert_eq!(records, vec![vec!["plain", "with, comma", r#"say "hi""#]]);
    }

    #[test]
    fn records_keep_empty_trailing_field() {
        assert_eq!(fields_of("a,b,\n"), vec![vec!["a", "b", ""]]);
    }

    #[test]
    fn quoted_field_may_span_lines() {
        let rows = parse_records("name,type\r\nChoir,\"Performing\r\nArts\"\r\nChess,Clubs\r\n")
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].fields, vec!["Choir", "Performing\nArts"]);
        assert_eq!(rows[1].line, 2);
        assert_eq!(rows[2].fields, vec!["Chess", "Clubs"]);
        assert_eq!(rows[2].line, 4);
    }

    #[test]
    fn unterminated_quote_reports_starting_line() {
        let err = parse_records("name,type\nChoir,Performing\na,\"open\nstill open\n").unwrap_err();
        assert!(matches!(err, ImportError::UnterminatedQuote { line: 3 }));
    }

    #[test]
    fn table_skips_blank_lines_and_keeps_source_line_numbers() {
        let table = CsvTable::parse("name,type\n\nChoir,Performing\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].line, 3);
        assert_eq!(table.rows[0].field(table.column("type").unwrap()), "Performing");
    }

    #[test]
    fn table_reports_missing_column() {
        let table = CsvTable::parse("name\nChoir\n").unwrap();
        assert!(matches!(
            table.column("type"),
            Err(ImportError::MissingColumn("type"))
        ));
    }
}
