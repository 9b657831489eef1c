//! Statement primitives, identifier resolver and existence checker.
//!
//! # Responsibility
//! - Run parameterized statements against the shared connection and map rows
//!   into typed records.
//! - Translate human-entered names into internal identifiers.
//! - Answer "does a row with these key values exist" for entity and junction
//!   tables.
//!
//! # Invariants
//! - Only `Table`/`Column`/`NamedTable` identifiers are ever interpolated
//!   into SQL text; every value is bound as a parameter.
//! - Substring matching is case-sensitive containment (`instr`), not `LIKE`.
//! - Among several substring matches the lowest identifier wins. Callers
//!   must not rely on which one.

use crate::db::migrations::latest_version;
use crate::repo::error::{RepoError, RepoResult};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{Connection, Params, Row, Transaction, TransactionBehavior};

/// Every table the record store owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Classes,
    Students,
    Subjects,
    Ccas,
    Activities,
    StudentsCcas,
    StudentsActivities,
    StudentsSubjects,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Classes,
        Table::Students,
        Table::Subjects,
        Table::Ccas,
        Table::Activities,
        Table::StudentsCcas,
        Table::StudentsActivities,
        Table::StudentsSubjects,
    ];

    /// Unquoted table name as stored in `sqlite_master`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Classes => "Classes",
            Self::Students => "Students",
            Self::Subjects => "Subjects",
            Self::Ccas => "CCAs",
            Self::Activities => "Activities",
            Self::StudentsCcas => "Students-CCAs",
            Self::StudentsActivities => "Students-Activities",
            Self::StudentsSubjects => "Students-Subjects",
        }
    }

    /// Quoted identifier safe to splice into SQL text.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Classes => "\"Classes\"",
            Self::Students => "\"Students\"",
            Self::Subjects => "\"Subjects\"",
            Self::Ccas => "\"CCAs\"",
            Self::Activities => "\"Activities\"",
            Self::StudentsCcas => "\"Students-CCAs\"",
            Self::StudentsActivities => "\"Students-Activities\"",
            Self::StudentsSubjects => "\"Students-Subjects\"",
        }
    }
}

/// Key columns usable in existence checks and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    ClassId,
    ClassName,
    StudentId,
    StudentName,
    SubjId,
    SubjName,
    Level,
    CcaId,
    CcaName,
    ActivityId,
    ActivityName,
}

impl Column {
    pub fn sql(self) -> &'static str {
        match self {
            Self::ClassId => "class_id",
            Self::ClassName => "class_name",
            Self::StudentId => "student_id",
            Self::StudentName => "student_name",
            Self::SubjId => "subj_id",
            Self::SubjName => "subj_name",
            Self::Level => "level",
            Self::CcaId => "cca_id",
            Self::CcaName => "cca_name",
            Self::ActivityId => "activity_id",
            Self::ActivityName => "activity_name",
        }
    }
}

/// Entity tables keyed by a unique name column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedTable {
    Classes,
    Students,
    Ccas,
    Activities,
}

impl NamedTable {
    pub fn table(self) -> Table {
        match self {
            Self::Classes => Table::Classes,
            Self::Students => Table::Students,
            Self::Ccas => Table::Ccas,
            Self::Activities => Table::Activities,
        }
    }

    pub fn id_column(self) -> Column {
        match self {
            Self::Classes => Column::ClassId,
            Self::Students => Column::StudentId,
            Self::Ccas => Column::CcaId,
            Self::Activities => Column::ActivityId,
        }
    }

    pub fn name_column(self) -> Column {
        match self {
            Self::Classes => Column::ClassName,
            Self::Students => Column::StudentName,
            Self::Ccas => Column::CcaName,
            Self::Activities => Column::ActivityName,
        }
    }
}

/// How a human-entered name is matched against a name column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole-value equality.
    Exact,
    /// Case-sensitive containment anywhere in the name.
    Substring,
}

/// Executes one statement and returns the number of changed rows.
pub fn execute<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<usize> {
    Ok(conn.execute(sql, params)?)
}

/// Runs a query and maps the first row, if any.
pub fn query_one<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> RepoResult<Option<T>>
where
    P: Params,
    F: FnOnce(&Row<'_>) -> RepoResult<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(map(row)?)),
        None => Ok(None),
    }
}

/// Runs a query and maps every row in store order.
pub fn query_many<T, P, F>(conn: &Connection, sql: &str, params: P, mut map: F) -> RepoResult<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> RepoResult<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(map(row)?);
    }
    Ok(items)
}

/// Resolves a name to its identifier; `Ok(None)` when nothing matches.
pub fn resolve_id(
    conn: &Connection,
    table: NamedTable,
    value: &str,
    mode: MatchMode,
) -> RepoResult<Option<i64>> {
    let id_column = table.id_column().sql();
    let name_column = table.name_column().sql();
    let predicate = match mode {
        MatchMode::Exact => format!("{name_column} = ?1"),
        MatchMode::Substring => format!("instr({name_column}, ?1) > 0"),
    };
    let sql = format!(
        "SELECT {id_column} FROM {} WHERE {predicate} ORDER BY {id_column} ASC;",
        table.table().sql()
    );

    let ids = query_many(conn, &sql, [value], |row| Ok(row.get::<_, i64>(0)?))?;
    if ids.len() > 1 {
        warn!(
            "event=resolve_ambiguous module=repo status=ok table={} match_count={} chosen_id={}",
            table.table().name(),
            ids.len(),
            ids[0]
        );
    }
    Ok(ids.first().copied())
}

/// Tests whether a row holding `first` (and `second`, when given) exists.
///
/// The two-key form requires both predicates on the same row, which is how
/// junction-table memberships are checked.
pub fn exists(
    conn: &Connection,
    table: Table,
    first: (Column, Value),
    second: Option<(Column, Value)>,
) -> RepoResult<bool> {
    let found: i64 = match second {
        Some((second_column, second_value)) => conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2);",
                table.sql(),
                first.0.sql(),
                second_column.sql()
            ),
            [first.1, second_value],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1);",
                table.sql(),
                first.0.sql()
            ),
            [first.1],
            |row| row.get(0),
        )?,
    };
    Ok(found == 1)
}

/// Deletes every row of `table` whose `column` equals `value`.
pub fn delete_where(conn: &Connection, table: Table, column: Column, value: i64) -> RepoResult<usize> {
    execute(
        conn,
        &format!("DELETE FROM {} WHERE {} = ?1;", table.sql(), column.sql()),
        [value],
    )
}

/// Bind value for a text key.
pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Bind value for an identifier key.
pub fn id(value: i64) -> Value {
    Value::Integer(value)
}

/// Opens the one write transaction that wraps a public repository operation.
///
/// Dropping the returned handle without `commit` rolls everything back, so
/// every early `?` return leaves the store untouched.
pub fn begin_write(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

/// Opens a deferred transaction so multi-statement reads see one snapshot.
pub fn begin_read(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Deferred,
    )?)
}

/// Rejects connections that have not been opened through `db::open_db*`.
pub fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in Table::ALL {
        if !table_exists(conn, table.name())? {
            return Err(RepoError::MissingRequiredTable(table.name()));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
