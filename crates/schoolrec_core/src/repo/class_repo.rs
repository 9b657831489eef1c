//! Class repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Add, look up and rewrite class rows.
//! - List the students owned by classes matching a name fragment.
//!
//! # Invariants
//! - Class names are unique; add and rename reject collisions.
//! - Member listings are ordered by `student_id ASC`.

use crate::model::class::{ClassId, ClassInput, ClassMember, ClassRecord};
use crate::model::validation::require_text;
use crate::model::EntityKind;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::store::{
    begin_read, begin_write, ensure_connection_ready, execute, exists, query_many, query_one,
    resolve_id, text, Column, MatchMode, NamedTable, Table,
};
use log::info;
use rusqlite::{params, Connection, Row};

/// Repository interface for class records.
pub trait ClassRepository {
    /// Adds one class.
    fn add(&self, input: &ClassInput) -> RepoResult<ClassId>;
    /// Returns the class's own fields, matching by name substring.
    fn get_info(&self, name: &str) -> RepoResult<ClassRecord>;
    /// Returns the students of every class whose name contains `name`.
    fn get(&self, name: &str) -> RepoResult<Vec<ClassMember>>;
    /// Rewrites name and level of the class named exactly `name`.
    fn update(&self, name: &str, input: &ClassInput) -> RepoResult<()>;
    /// Lists every class ordered by identifier.
    fn list_all(&self) -> RepoResult<Vec<ClassRecord>>;
}

/// SQLite-backed class repository.
pub struct SqliteClassRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClassRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ClassRepository for SqliteClassRepository<'_> {
    fn add(&self, input: &ClassInput) -> RepoResult<ClassId> {
        input.validate()?;
        let name = input.name.trim();

        let tx = begin_write(self.conn)?;
        if exists(&tx, Table::Classes, (Column::ClassName, text(name)), None)? {
            return Err(RepoError::already_exists(EntityKind::Class, name));
        }
        execute(
            &tx,
            "INSERT INTO \"Classes\" (class_name, level) VALUES (?1, ?2);",
            params![name, input.level.trim()],
        )?;
        let class_id = tx.last_insert_rowid();
        tx.commit()?;

        info!("event=class_add module=repo status=ok class_id={class_id}");
        Ok(class_id)
    }

    fn get_info(&self, name: &str) -> RepoResult<ClassRecord> {
        let name = require_text("class_name", name)?;
        let tx = begin_read(self.conn)?;
        let class_id = resolve_id(&tx, NamedTable::Classes, name, MatchMode::Substring)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Class, name))?;

        query_one(
            &tx,
            "SELECT class_id, class_name, level FROM \"Classes\" WHERE class_id = ?1;",
            [class_id],
            parse_class_row,
        )?
        .ok_or_else(|| RepoError::not_found(EntityKind::Class, name))
    }

    fn get(&self, name: &str) -> RepoResult<Vec<ClassMember>> {
        let name = require_text("class_name", name)?;
        let tx = begin_read(self.conn)?;
        if resolve_id(&tx, NamedTable::Classes, name, MatchMode::Substring)?.is_none() {
            return Err(RepoError::not_found(EntityKind::Class, name));
        }

        query_many(
            &tx,
            "SELECT
                s.student_id AS student_id,
                s.student_name AS student_name
             FROM \"Students\" s
             INNER JOIN \"Classes\" c ON c.class_id = s.class_id
             WHERE instr(c.class_name, ?1) > 0
             ORDER BY s.student_id ASC;",
            [name],
            |row| {
                Ok(ClassMember {
                    student_id: row.get("student_id")?,
                    student_name: row.get("student_name")?,
                })
            },
        )
    }

    fn update(&self, name: &str, input: &ClassInput) -> RepoResult<()> {
        let current = require_text("class_name", name)?;
        input.validate()?;
        let new_name = input.name.trim();

        let tx = begin_write(self.conn)?;
        let class_id = resolve_id(&tx, NamedTable::Classes, current, MatchMode::Exact)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Class, current))?;
        if new_name != current
            && exists(&tx, Table::Classes, (Column::ClassName, text(new_name)), None)?
        {
            return Err(RepoError::already_exists(EntityKind::Class, new_name));
        }

        execute(
            &tx,
            "UPDATE \"Classes\" SET class_name = ?1, level = ?2 WHERE class_id = ?3;",
            params![new_name, input.level.trim(), class_id],
        )?;
        tx.commit()?;

        info!("event=class_update module=repo status=ok class_id={class_id}");
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<ClassRecord>> {
        query_many(
            self.conn,
            "SELECT class_id, class_name, level FROM \"Classes\" ORDER BY class_id ASC;",
            [],
            parse_class_row,
        )
    }
}

fn parse_class_row(row: &Row<'_>) -> RepoResult<ClassRecord> {
    Ok(ClassRecord {
        class_id: row.get("class_id")?,
        name: row.get("class_name")?,
        level: row.get("level")?,
    })
}
