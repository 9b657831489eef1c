//! Subject catalogue and enrollment repository.
//!
//! # Responsibility
//! - Maintain the `(name, level)` keyed subject catalogue.
//! - Enroll students into subjects and withdraw them again.
//!
//! # Invariants
//! - Enrollment is all or nothing: one unresolved subject or one existing
//!   enrollment rejects the whole request.
//! - Subjects always resolve by exact name and level.

use crate::model::subject::{
    EnrollmentInput, SubjectId, SubjectKey, SubjectRecord, WithdrawalInput,
};
use crate::model::validation::require_text;
use crate::model::EntityKind;
use crate::repo::error::{membership_name, RepoError, RepoResult};
use crate::repo::store::{
    begin_write, ensure_connection_ready, execute, exists, id, query_many, query_one, resolve_id,
    Column, MatchMode, NamedTable, Table,
};
use log::info;
use rusqlite::{params, Connection};
use std::collections::HashSet;

/// Repository interface for subjects and student enrollments.
pub trait SubjectRepository {
    /// Adds one subject to the catalogue.
    fn add(&self, subject: &SubjectKey) -> RepoResult<SubjectId>;
    /// Lists the catalogue ordered by identifier.
    fn list_all(&self) -> RepoResult<Vec<SubjectRecord>>;
    /// Enrolls one student into every listed subject; returns rows inserted.
    fn add_student(&self, input: &EnrollmentInput) -> RepoResult<usize>;
    /// Lists the subjects of students whose name contains `student_name`.
    fn get_student(&self, student_name: &str) -> RepoResult<Vec<SubjectKey>>;
    /// Removes one enrollment.
    fn delete_student(&self, input: &WithdrawalInput) -> RepoResult<()>;
}

/// SQLite-backed subject repository.
pub struct SqliteSubjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubjectRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SubjectRepository for SqliteSubjectRepository<'_> {
    fn add(&self, subject: &SubjectKey) -> RepoResult<SubjectId> {
        subject.validate()?;
        let key = trimmed_key(subject);

        let tx = begin_write(self.conn)?;
        if resolve_subject_id(&tx, &key)?.is_some() {
            return Err(RepoError::already_exists(
                EntityKind::Subject,
                subject_label(&key),
            ));
        }
        execute(
            &tx,
            "INSERT INTO \"Subjects\" (subj_name, level) VALUES (?1, ?2);",
            params![key.name, key.level],
        )?;
        let subj_id = tx.last_insert_rowid();
        tx.commit()?;

        info!("event=subject_add module=repo status=ok subj_id={subj_id}");
        Ok(subj_id)
    }

    fn list_all(&self) -> RepoResult<Vec<SubjectRecord>> {
        query_many(
            self.conn,
            "SELECT subj_id, subj_name, level FROM \"Subjects\" ORDER BY subj_id ASC;",
            [],
            |row| {
                Ok(SubjectRecord {
                    subj_id: row.get("subj_id")?,
                    name: row.get("subj_name")?,
                    level: row.get("level")?,
                })
            },
        )
    }

    fn add_student(&self, input: &EnrollmentInput) -> RepoResult<usize> {
        input.validate()?;
        let student_name = input.student_name.trim();

        let mut seen = HashSet::new();
        let keys: Vec<SubjectKey> = input
            .subjects
            .iter()
            .map(trimmed_key)
            .filter(|key| seen.insert(key.clone()))
            .collect();

        let tx = begin_write(self.conn)?;
        let mut subj_ids = Vec::with_capacity(keys.len());
        for key in &keys {
            let subj_id = resolve_subject_id(&tx, key)?.ok_or_else(|| {
                RepoError::invalid_reference(EntityKind::Subject, subject_label(key))
            })?;
            subj_ids.push(subj_id);
        }

        let student_id =
            resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Substring)?
                .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;

        for (key, subj_id) in keys.iter().zip(&subj_ids) {
            if exists(
                &tx,
                Table::StudentsSubjects,
                (Column::StudentId, id(student_id)),
                Some((Column::SubjId, id(*subj_id))),
            )? {
                return Err(RepoError::already_exists(
                    EntityKind::SubjectEnrollment,
                    membership_name(student_name, &subject_label(key)),
                ));
            }
        }

        for subj_id in &subj_ids {
            execute(
                &tx,
                "INSERT INTO \"Students-Subjects\" (student_id, subj_id) VALUES (?1, ?2);",
                params![student_id, subj_id],
            )?;
        }
        tx.commit()?;

        info!(
            "event=subject_enroll module=repo status=ok student_id={} subject_count={}",
            student_id,
            subj_ids.len()
        );
        Ok(subj_ids.len())
    }

    fn get_student(&self, student_name: &str) -> RepoResult<Vec<SubjectKey>> {
        let student_name = require_text("student_name", student_name)?;
        let subjects = query_many(
            self.conn,
            "SELECT
                subj.subj_name AS subj_name,
                subj.level AS level
             FROM \"Students-Subjects\" link
             INNER JOIN \"Subjects\" subj ON subj.subj_id = link.subj_id
             INNER JOIN \"Students\" s ON s.student_id = link.student_id
             WHERE instr(s.student_name, ?1) > 0
             ORDER BY s.student_id ASC, subj.subj_id ASC;",
            [student_name],
            |row| {
                Ok(SubjectKey {
                    name: row.get("subj_name")?,
                    level: row.get("level")?,
                })
            },
        )?;

        if subjects.is_empty() {
            return Err(RepoError::not_found(
                EntityKind::SubjectEnrollment,
                student_name,
            ));
        }
        Ok(subjects)
    }

    fn delete_student(&self, input: &WithdrawalInput) -> RepoResult<()> {
        input.validate()?;
        let student_name = input.student_name.trim();
        let key = trimmed_key(&input.subject);

        let tx = begin_write(self.conn)?;
        let subj_id = resolve_subject_id(&tx, &key)?.ok_or_else(|| {
            RepoError::invalid_reference(EntityKind::Subject, subject_label(&key))
        })?;
        let student_id = resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;

        if !exists(
            &tx,
            Table::StudentsSubjects,
            (Column::StudentId, id(student_id)),
            Some((Column::SubjId, id(subj_id))),
        )? {
            return Err(RepoError::not_found(
                EntityKind::SubjectEnrollment,
                membership_name(student_name, &subject_label(&key)),
            ));
        }

        execute(
            &tx,
            "DELETE FROM \"Students-Subjects\" WHERE student_id = ?1 AND subj_id = ?2;",
            params![student_id, subj_id],
        )?;
        tx.commit()?;

        info!(
            "event=subject_withdraw module=repo status=ok student_id={} subj_id={}",
            student_id, subj_id
        );
        Ok(())
    }
}

fn resolve_subject_id(conn: &Connection, key: &SubjectKey) -> RepoResult<Option<SubjectId>> {
    query_one(
        conn,
        "SELECT subj_id FROM \"Subjects\" WHERE subj_name = ?1 AND level = ?2;",
        params![key.name, key.level],
        |row| Ok(row.get(0)?),
    )
}

fn trimmed_key(key: &SubjectKey) -> SubjectKey {
    SubjectKey::new(key.name.trim(), key.level.trim())
}

fn subject_label(key: &SubjectKey) -> String {
    format!("{} ({})", key.name, key.level)
}
