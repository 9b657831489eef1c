//! CCA repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Add, look up, rewrite and remove CCA rows.
//! - Own the Student x CCA membership lifecycle (add, update role, remove).
//!
//! # Invariants
//! - A membership exists at most once per `(student, cca)` pair.
//! - `update_student` rewrites the role only, never the identity pair.
//! - Deleting a CCA removes all of its memberships in the same transaction.

use crate::model::cca::{CcaId, CcaInput, CcaMembershipInput, CcaMembershipRecord, CcaRecord};
use crate::model::validation::require_text;
use crate::model::EntityKind;
use crate::repo::error::{membership_name, RepoError, RepoResult};
use crate::repo::store::{
    begin_read, begin_write, delete_where, ensure_connection_ready, execute, exists, id,
    query_many, query_one, resolve_id, text, Column, MatchMode, NamedTable, Table,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

/// Repository interface for CCAs and their memberships.
pub trait CcaRepository {
    /// Adds one CCA.
    fn add(&self, input: &CcaInput) -> RepoResult<CcaId>;
    /// Links a student to a CCA; both names match by substring.
    fn add_student(&self, input: &CcaMembershipInput) -> RepoResult<()>;
    /// Returns the CCA's own fields, matching by name substring.
    fn get(&self, name: &str) -> RepoResult<CcaRecord>;
    /// Lists memberships of students matching `student_name`, optionally
    /// narrowed to CCAs matching `cca_name`.
    fn get_student(
        &self,
        student_name: &str,
        cca_name: Option<&str>,
    ) -> RepoResult<Vec<CcaMembershipRecord>>;
    /// Rewrites name and type of the CCA named exactly `name`.
    fn update(&self, name: &str, input: &CcaInput) -> RepoResult<()>;
    /// Rewrites the role of an existing membership.
    fn update_student(&self, input: &CcaMembershipInput) -> RepoResult<()>;
    /// Removes the CCA named exactly `name` and all of its memberships.
    fn delete(&self, name: &str) -> RepoResult<()>;
    /// Removes one membership; both names match exactly.
    fn delete_student(&self, student_name: &str, cca_name: &str) -> RepoResult<()>;
    /// Lists every CCA ordered by identifier.
    fn list_all(&self) -> RepoResult<Vec<CcaRecord>>;
}

/// SQLite-backed CCA repository.
pub struct SqliteCcaRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCcaRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CcaRepository for SqliteCcaRepository<'_> {
    fn add(&self, input: &CcaInput) -> RepoResult<CcaId> {
        input.validate()?;
        let name = input.name.trim();

        let tx = begin_write(self.conn)?;
        if exists(&tx, Table::Ccas, (Column::CcaName, text(name)), None)? {
            return Err(RepoError::already_exists(EntityKind::Cca, name));
        }
        execute(
            &tx,
            "INSERT INTO \"CCAs\" (cca_name, type) VALUES (?1, ?2);",
            params![name, input.kind.trim()],
        )?;
        let cca_id = tx.last_insert_rowid();
        tx.commit()?;

        info!("event=cca_add module=repo status=ok cca_id={cca_id}");
        Ok(cca_id)
    }

    fn add_student(&self, input: &CcaMembershipInput) -> RepoResult<()> {
        input.validate()?;
        let student_name = input.student_name.trim();
        let cca_name = input.cca_name.trim();

        let tx = begin_write(self.conn)?;
        let student_id =
            resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Substring)?
                .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;
        let cca_id = resolve_id(&tx, NamedTable::Ccas, cca_name, MatchMode::Substring)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Cca, cca_name))?;

        if membership_exists(&tx, student_id, cca_id)? {
            return Err(RepoError::already_exists(
                EntityKind::CcaMembership,
                membership_name(student_name, cca_name),
            ));
        }
        execute(
            &tx,
            "INSERT INTO \"Students-CCAs\" (student_id, cca_id, role) VALUES (?1, ?2, ?3);",
            params![student_id, cca_id, input.role.trim()],
        )?;
        tx.commit()?;

        info!(
            "event=cca_join module=repo status=ok student_id={} cca_id={}",
            student_id, cca_id
        );
        Ok(())
    }

    fn get(&self, name: &str) -> RepoResult<CcaRecord> {
        let name = require_text("cca_name", name)?;
        let tx = begin_read(self.conn)?;
        let cca_id = resolve_id(&tx, NamedTable::Ccas, name, MatchMode::Substring)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Cca, name))?;

        query_one(
            &tx,
            "SELECT cca_id, cca_name, type FROM \"CCAs\" WHERE cca_id = ?1;",
            [cca_id],
            parse_cca_row,
        )?
        .ok_or_else(|| RepoError::not_found(EntityKind::Cca, name))
    }

    fn get_student(
        &self,
        student_name: &str,
        cca_name: Option<&str>,
    ) -> RepoResult<Vec<CcaMembershipRecord>> {
        let student_name = require_text("student_name", student_name)?;
        let cca_name = cca_name
            .map(|value| require_text("cca_name", value))
            .transpose()?;

        let mut sql = String::from(
            "SELECT
                c.cca_name AS cca_name,
                link.role AS role,
                s.student_name AS student_name
             FROM \"Students\" s
             INNER JOIN \"Students-CCAs\" link ON link.student_id = s.student_id
             INNER JOIN \"CCAs\" c ON c.cca_id = link.cca_id
             WHERE instr(s.student_name, ?) > 0",
        );
        let mut bind_values = vec![Value::Text(student_name.to_string())];
        if let Some(cca_name) = cca_name {
            sql.push_str(" AND instr(c.cca_name, ?) > 0");
            bind_values.push(Value::Text(cca_name.to_string()));
        }
        sql.push_str(" ORDER BY s.student_id ASC, c.cca_id ASC;");

        let narrowed = cca_name.is_some();
        let memberships = query_many(self.conn, &sql, params_from_iter(bind_values), |row| {
            Ok(CcaMembershipRecord {
                cca_name: row.get("cca_name")?,
                role: row.get("role")?,
                student_name: if narrowed {
                    Some(row.get("student_name")?)
                } else {
                    None
                },
            })
        })?;

        if memberships.is_empty() {
            let name = match cca_name {
                Some(cca_name) => membership_name(student_name, cca_name),
                None => student_name.to_string(),
            };
            return Err(RepoError::not_found(EntityKind::CcaMembership, name));
        }
        Ok(memberships)
    }

    fn update(&self, name: &str, input: &CcaInput) -> RepoResult<()> {
        let current = require_text("cca_name", name)?;
        input.validate()?;
        let new_name = input.name.trim();

        let tx = begin_write(self.conn)?;
        let cca_id = resolve_id(&tx, NamedTable::Ccas, current, MatchMode::Exact)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Cca, current))?;
        if new_name != current && exists(&tx, Table::Ccas, (Column::CcaName, text(new_name)), None)?
        {
            return Err(RepoError::already_exists(EntityKind::Cca, new_name));
        }

        execute(
            &tx,
            "UPDATE \"CCAs\" SET cca_name = ?1, type = ?2 WHERE cca_id = ?3;",
            params![new_name, input.kind.trim(), cca_id],
        )?;
        tx.commit()?;

        info!("event=cca_update module=repo status=ok cca_id={cca_id}");
        Ok(())
    }

    fn update_student(&self, input: &CcaMembershipInput) -> RepoResult<()> {
        input.validate()?;
        let student_name = input.student_name.trim();
        let cca_name = input.cca_name.trim();

        let tx = begin_write(self.conn)?;
        let student_id =
            resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Substring)?
                .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;
        let cca_id = resolve_id(&tx, NamedTable::Ccas, cca_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Cca, cca_name))?;

        if !membership_exists(&tx, student_id, cca_id)? {
            return Err(RepoError::not_found(
                EntityKind::CcaMembership,
                membership_name(student_name, cca_name),
            ));
        }
        execute(
            &tx,
            "UPDATE \"Students-CCAs\" SET role = ?1 WHERE student_id = ?2 AND cca_id = ?3;",
            params![input.role.trim(), student_id, cca_id],
        )?;
        tx.commit()?;

        info!(
            "event=cca_role_update module=repo status=ok student_id={} cca_id={}",
            student_id, cca_id
        );
        Ok(())
    }

    fn delete(&self, name: &str) -> RepoResult<()> {
        let name = require_text("cca_name", name)?;

        let tx = begin_write(self.conn)?;
        let cca_id = resolve_id(&tx, NamedTable::Ccas, name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Cca, name))?;
        let removed_links = delete_where(&tx, Table::StudentsCcas, Column::CcaId, cca_id)?;
        delete_where(&tx, Table::Ccas, Column::CcaId, cca_id)?;
        tx.commit()?;

        info!(
            "event=cca_delete module=repo status=ok cca_id={} removed_links={}",
            cca_id, removed_links
        );
        Ok(())
    }

    fn delete_student(&self, student_name: &str, cca_name: &str) -> RepoResult<()> {
        let student_name = require_text("student_name", student_name)?;
        let cca_name = require_text("cca_name", cca_name)?;

        let tx = begin_write(self.conn)?;
        let student_id = resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;
        let cca_id = resolve_id(&tx, NamedTable::Ccas, cca_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Cca, cca_name))?;

        if !membership_exists(&tx, student_id, cca_id)? {
            return Err(RepoError::not_found(
                EntityKind::CcaMembership,
                membership_name(student_name, cca_name),
            ));
        }
        execute(
            &tx,
            "DELETE FROM \"Students-CCAs\" WHERE student_id = ?1 AND cca_id = ?2;",
            params![student_id, cca_id],
        )?;
        tx.commit()?;

        info!(
            "event=cca_leave module=repo status=ok student_id={} cca_id={}",
            student_id, cca_id
        );
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<CcaRecord>> {
        query_many(
            self.conn,
            "SELECT cca_id, cca_name, type FROM \"CCAs\" ORDER BY cca_id ASC;",
            [],
            parse_cca_row,
        )
    }
}

fn membership_exists(conn: &Connection, student_id: i64, cca_id: CcaId) -> RepoResult<bool> {
    exists(
        conn,
        Table::StudentsCcas,
        (Column::StudentId, id(student_id)),
        Some((Column::CcaId, id(cca_id))),
    )
}

fn parse_cca_row(row: &Row<'_>) -> RepoResult<CcaRecord> {
    Ok(CcaRecord {
        cca_id: row.get("cca_id")?,
        name: row.get("cca_name")?,
        kind: row.get("type")?,
    })
}
