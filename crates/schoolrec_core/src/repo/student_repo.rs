//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Add, look up, rewrite and remove student rows.
//! - Keep the class reference of every student pointing at a real class.
//!
//! # Invariants
//! - Student names are unique; add and rename reject collisions.
//! - Delete removes the student's CCA, activity and subject links together
//!   with the student row, in one transaction.

use crate::model::student::{StudentId, StudentInput, StudentRecord};
use crate::model::validation::require_text;
use crate::model::EntityKind;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::store::{
    begin_read, begin_write, delete_where, ensure_connection_ready, execute, exists, query_many,
    query_one, resolve_id, text, Column, MatchMode, NamedTable, Table,
};
use log::info;
use rusqlite::{params, Connection, Row};

const STUDENT_SELECT_SQL: &str = "SELECT
    s.student_id AS student_id,
    s.student_name AS student_name,
    s.age AS age,
    s.year_enrolled AS year_enrolled,
    s.grad_year AS grad_year,
    c.class_name AS class_name
FROM \"Students\" s
INNER JOIN \"Classes\" c ON c.class_id = s.class_id";

/// Junction tables holding a `student_id`, cleared before the student row.
const STUDENT_LINK_TABLES: [Table; 3] = [
    Table::StudentsActivities,
    Table::StudentsCcas,
    Table::StudentsSubjects,
];

/// Repository interface for student records.
pub trait StudentRepository {
    /// Adds one student; the class must already exist.
    fn add(&self, input: &StudentInput) -> RepoResult<StudentId>;
    /// Finds one student by substring of its name.
    fn get(&self, name: &str) -> RepoResult<StudentRecord>;
    /// Rewrites every field of the student named exactly `name`.
    fn update(&self, name: &str, input: &StudentInput) -> RepoResult<()>;
    /// Removes the student named exactly `name` and all of its links.
    fn delete(&self, name: &str) -> RepoResult<()>;
    /// Lists every student ordered by identifier.
    fn list_all(&self) -> RepoResult<Vec<StudentRecord>>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn add(&self, input: &StudentInput) -> RepoResult<StudentId> {
        input.validate()?;
        let name = input.name.trim();
        let class_name = input.class_name.trim();

        let tx = begin_write(self.conn)?;
        if exists(&tx, Table::Students, (Column::StudentName, text(name)), None)? {
            return Err(RepoError::already_exists(EntityKind::Student, name));
        }
        let class_id = resolve_id(&tx, NamedTable::Classes, class_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Class, class_name))?;

        execute(
            &tx,
            "INSERT INTO \"Students\" (
                student_name,
                age,
                year_enrolled,
                grad_year,
                class_id
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                name,
                input.age,
                input.year_enrolled,
                input.grad_year,
                class_id
            ],
        )?;
        let student_id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "event=student_add module=repo status=ok student_id={} class_id={}",
            student_id, class_id
        );
        Ok(student_id)
    }

    fn get(&self, name: &str) -> RepoResult<StudentRecord> {
        let name = require_text("student_name", name)?;
        let tx = begin_read(self.conn)?;
        let student_id = resolve_id(&tx, NamedTable::Students, name, MatchMode::Substring)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Student, name))?;

        query_one(
            &tx,
            &format!("{STUDENT_SELECT_SQL} WHERE s.student_id = ?1;"),
            [student_id],
            parse_student_row,
        )?
        .ok_or_else(|| RepoError::not_found(EntityKind::Student, name))
    }

    fn update(&self, name: &str, input: &StudentInput) -> RepoResult<()> {
        let current = require_text("student_name", name)?;
        input.validate()?;
        let new_name = input.name.trim();
        let class_name = input.class_name.trim();

        let tx = begin_write(self.conn)?;
        let student_id = resolve_id(&tx, NamedTable::Students, current, MatchMode::Exact)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Student, current))?;
        let class_id = resolve_id(&tx, NamedTable::Classes, class_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Class, class_name))?;
        if new_name != current
            && exists(&tx, Table::Students, (Column::StudentName, text(new_name)), None)?
        {
            return Err(RepoError::already_exists(EntityKind::Student, new_name));
        }

        execute(
            &tx,
            "UPDATE \"Students\"
             SET
                student_name = ?1,
                age = ?2,
                year_enrolled = ?3,
                grad_year = ?4,
                class_id = ?5
             WHERE student_id = ?6;",
            params![
                new_name,
                input.age,
                input.year_enrolled,
                input.grad_year,
                class_id,
                student_id
            ],
        )?;
        tx.commit()?;

        info!(
            "event=student_update module=repo status=ok student_id={} class_id={}",
            student_id, class_id
        );
        Ok(())
    }

    fn delete(&self, name: &str) -> RepoResult<()> {
        let name = require_text("student_name", name)?;

        let tx = begin_write(self.conn)?;
        let student_id = resolve_id(&tx, NamedTable::Students, name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Student, name))?;

        let mut removed_links = 0;
        for table in STUDENT_LINK_TABLES {
            removed_links += delete_where(&tx, table, Column::StudentId, student_id)?;
        }
        delete_where(&tx, Table::Students, Column::StudentId, student_id)?;
        tx.commit()?;

        info!(
            "event=student_delete module=repo status=ok student_id={} removed_links={}",
            student_id, removed_links
        );
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<StudentRecord>> {
        query_many(
            self.conn,
            &format!("{STUDENT_SELECT_SQL} ORDER BY s.student_id ASC;"),
            [],
            parse_student_row,
        )
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<StudentRecord> {
    Ok(StudentRecord {
        student_id: row.get("student_id")?,
        name: row.get("student_name")?,
        age: row.get("age")?,
        year_enrolled: row.get("year_enrolled")?,
        grad_year: row.get("grad_year")?,
        class_name: row.get("class_name")?,
    })
}
