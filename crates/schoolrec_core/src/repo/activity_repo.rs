//! Activity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Add, look up, rewrite and remove one-off activity rows.
//! - Own the Student x Activity participation lifecycle (role, award, hours).
//!
//! # Invariants
//! - Dates are persisted as `YYYY-MM-DD` text and re-validated on read.
//! - A participation exists at most once per `(student, activity)` pair.
//! - `update_student` rewrites role, award and hours together, never the
//!   identity pair.
//! - Deleting an activity removes all of its participations in the same
//!   transaction.

use crate::model::activity::{
    ActivityId, ActivityInput, ActivityMembershipInput, ActivityMembershipRecord, ActivityRecord,
};
use crate::model::validation::{format_date, parse_date, require_text};
use crate::model::EntityKind;
use crate::repo::error::{membership_name, RepoError, RepoResult};
use crate::repo::store::{
    begin_read, begin_write, delete_where, ensure_connection_ready, execute, exists, id,
    query_many, query_one, resolve_id, text, Column, MatchMode, NamedTable, Table,
};
use chrono::NaiveDate;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    activity_id,
    activity_name,
    start_date,
    end_date,
    description
FROM \"Activities\"";

/// Repository interface for activities and student participation.
pub trait ActivityRepository {
    /// Adds one activity.
    fn add(&self, input: &ActivityInput) -> RepoResult<ActivityId>;
    /// Links a student to an activity; both names match by substring.
    fn add_student(&self, input: &ActivityMembershipInput) -> RepoResult<()>;
    /// Returns the activity's own fields, matching by name substring.
    fn get(&self, name: &str) -> RepoResult<ActivityRecord>;
    /// Lists participations of students matching `student_name`, optionally
    /// narrowed to activities matching `activity_name`.
    fn get_student(
        &self,
        student_name: &str,
        activity_name: Option<&str>,
    ) -> RepoResult<Vec<ActivityMembershipRecord>>;
    /// Rewrites every field of the activity named exactly `name`.
    fn update(&self, name: &str, input: &ActivityInput) -> RepoResult<()>;
    /// Rewrites role, award and hours of an existing participation.
    fn update_student(&self, input: &ActivityMembershipInput) -> RepoResult<()>;
    /// Removes the activity named exactly `name` and all participations.
    fn delete(&self, name: &str) -> RepoResult<()>;
    /// Removes one participation; both names match exactly.
    fn delete_student(&self, student_name: &str, activity_name: &str) -> RepoResult<()>;
    /// Lists every activity ordered by identifier.
    fn list_all(&self) -> RepoResult<Vec<ActivityRecord>>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn add(&self, input: &ActivityInput) -> RepoResult<ActivityId> {
        let (start_date, end_date) = input.validate()?;
        let name = input.name.trim();

        let tx = begin_write(self.conn)?;
        if exists(&tx, Table::Activities, (Column::ActivityName, text(name)), None)? {
            return Err(RepoError::already_exists(EntityKind::Activity, name));
        }
        execute(
            &tx,
            "INSERT INTO \"Activities\" (
                activity_name,
                start_date,
                end_date,
                description
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                name,
                format_date(start_date),
                end_date.map(format_date),
                input.description.trim()
            ],
        )?;
        let activity_id = tx.last_insert_rowid();
        tx.commit()?;

        info!("event=activity_add module=repo status=ok activity_id={activity_id}");
        Ok(activity_id)
    }

    fn add_student(&self, input: &ActivityMembershipInput) -> RepoResult<()> {
        input.validate()?;
        let student_name = input.student_name.trim();
        let activity_name = input.activity_name.trim();

        let tx = begin_write(self.conn)?;
        let student_id =
            resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Substring)?
                .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;
        let activity_id =
            resolve_id(&tx, NamedTable::Activities, activity_name, MatchMode::Substring)?
                .ok_or_else(|| {
                    RepoError::invalid_reference(EntityKind::Activity, activity_name)
                })?;

        if participation_exists(&tx, student_id, activity_id)? {
            return Err(RepoError::already_exists(
                EntityKind::ActivityMembership,
                membership_name(student_name, activity_name),
            ));
        }
        execute(
            &tx,
            "INSERT INTO \"Students-Activities\" (
                student_id,
                activity_id,
                role,
                award,
                hours
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                student_id,
                activity_id,
                input.role.trim(),
                input.normalized_award(),
                input.hours
            ],
        )?;
        tx.commit()?;

        info!(
            "event=activity_join module=repo status=ok student_id={} activity_id={}",
            student_id, activity_id
        );
        Ok(())
    }

    fn get(&self, name: &str) -> RepoResult<ActivityRecord> {
        let name = require_text("activity_name", name)?;
        let tx = begin_read(self.conn)?;
        let activity_id = resolve_id(&tx, NamedTable::Activities, name, MatchMode::Substring)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Activity, name))?;

        query_one(
            &tx,
            &format!("{ACTIVITY_SELECT_SQL} WHERE activity_id = ?1;"),
            [activity_id],
            parse_activity_row,
        )?
        .ok_or_else(|| RepoError::not_found(EntityKind::Activity, name))
    }

    fn get_student(
        &self,
        student_name: &str,
        activity_name: Option<&str>,
    ) -> RepoResult<Vec<ActivityMembershipRecord>> {
        let student_name = require_text("student_name", student_name)?;
        let activity_name = activity_name
            .map(|value| require_text("activity_name", value))
            .transpose()?;

        let mut sql = String::from(
            "SELECT
                a.activity_name AS activity_name,
                link.role AS role,
                link.award AS award,
                link.hours AS hours,
                s.student_name AS student_name
             FROM \"Students\" s
             INNER JOIN \"Students-Activities\" link ON link.student_id = s.student_id
             INNER JOIN \"Activities\" a ON a.activity_id = link.activity_id
             WHERE instr(s.student_name, ?) > 0",
        );
        let mut bind_values = vec![Value::Text(student_name.to_string())];
        if let Some(activity_name) = activity_name {
            sql.push_str(" AND instr(a.activity_name, ?) > 0");
            bind_values.push(Value::Text(activity_name.to_string()));
        }
        sql.push_str(" ORDER BY s.student_id ASC, a.activity_id ASC;");

        let narrowed = activity_name.is_some();
        let participations = query_many(self.conn, &sql, params_from_iter(bind_values), |row| {
            Ok(ActivityMembershipRecord {
                activity_name: row.get("activity_name")?,
                role: row.get("role")?,
                award: row.get("award")?,
                hours: row.get("hours")?,
                student_name: if narrowed {
                    Some(row.get("student_name")?)
                } else {
                    None
                },
            })
        })?;

        if participations.is_empty() {
            let name = match activity_name {
                Some(activity_name) => membership_name(student_name, activity_name),
                None => student_name.to_string(),
            };
            return Err(RepoError::not_found(EntityKind::ActivityMembership, name));
        }
        Ok(participations)
    }

    fn update(&self, name: &str, input: &ActivityInput) -> RepoResult<()> {
        let current = require_text("activity_name", name)?;
        let (start_date, end_date) = input.validate()?;
        let new_name = input.name.trim();

        let tx = begin_write(self.conn)?;
        let activity_id = resolve_id(&tx, NamedTable::Activities, current, MatchMode::Exact)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Activity, current))?;
        if new_name != current
            && exists(
                &tx,
                Table::Activities,
                (Column::ActivityName, text(new_name)),
                None,
            )?
        {
            return Err(RepoError::already_exists(EntityKind::Activity, new_name));
        }

        execute(
            &tx,
            "UPDATE \"Activities\"
             SET
                activity_name = ?1,
                start_date = ?2,
                end_date = ?3,
                description = ?4
             WHERE activity_id = ?5;",
            params![
                new_name,
                format_date(start_date),
                end_date.map(format_date),
                input.description.trim(),
                activity_id
            ],
        )?;
        tx.commit()?;

        info!("event=activity_update module=repo status=ok activity_id={activity_id}");
        Ok(())
    }

    fn update_student(&self, input: &ActivityMembershipInput) -> RepoResult<()> {
        input.validate()?;
        let student_name = input.student_name.trim();
        let activity_name = input.activity_name.trim();

        let tx = begin_write(self.conn)?;
        let student_id =
            resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Substring)?
                .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;
        let activity_id = resolve_id(&tx, NamedTable::Activities, activity_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Activity, activity_name))?;

        if !participation_exists(&tx, student_id, activity_id)? {
            return Err(RepoError::not_found(
                EntityKind::ActivityMembership,
                membership_name(student_name, activity_name),
            ));
        }
        execute(
            &tx,
            "UPDATE \"Students-Activities\"
             SET
                role = ?1,
                award = ?2,
                hours = ?3
             WHERE student_id = ?4
               AND activity_id = ?5;",
            params![
                input.role.trim(),
                input.normalized_award(),
                input.hours,
                student_id,
                activity_id
            ],
        )?;
        tx.commit()?;

        info!(
            "event=activity_participation_update module=repo status=ok student_id={} activity_id={}",
            student_id, activity_id
        );
        Ok(())
    }

    fn delete(&self, name: &str) -> RepoResult<()> {
        let name = require_text("activity_name", name)?;

        let tx = begin_write(self.conn)?;
        let activity_id = resolve_id(&tx, NamedTable::Activities, name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Activity, name))?;
        let removed_links = delete_where(
            &tx,
            Table::StudentsActivities,
            Column::ActivityId,
            activity_id,
        )?;
        delete_where(&tx, Table::Activities, Column::ActivityId, activity_id)?;
        tx.commit()?;

        info!(
            "event=activity_delete module=repo status=ok activity_id={} removed_links={}",
            activity_id, removed_links
        );
        Ok(())
    }

    fn delete_student(&self, student_name: &str, activity_name: &str) -> RepoResult<()> {
        let student_name = require_text("student_name", student_name)?;
        let activity_name = require_text("activity_name", activity_name)?;

        let tx = begin_write(self.conn)?;
        let student_id = resolve_id(&tx, NamedTable::Students, student_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Student, student_name))?;
        let activity_id = resolve_id(&tx, NamedTable::Activities, activity_name, MatchMode::Exact)?
            .ok_or_else(|| RepoError::invalid_reference(EntityKind::Activity, activity_name))?;

        if !participation_exists(&tx, student_id, activity_id)? {
            return Err(RepoError::not_found(
                EntityKind::ActivityMembership,
                membership_name(student_name, activity_name),
            ));
        }
        execute(
            &tx,
            "DELETE FROM \"Students-Activities\" WHERE student_id = ?1 AND activity_id = ?2;",
            params![student_id, activity_id],
        )?;
        tx.commit()?;

        info!(
            "event=activity_leave module=repo status=ok student_id={} activity_id={}",
            student_id, activity_id
        );
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<ActivityRecord>> {
        query_many(
            self.conn,
            &format!("{ACTIVITY_SELECT_SQL} ORDER BY activity_id ASC;"),
            [],
            parse_activity_row,
        )
    }
}

fn participation_exists(
    conn: &Connection,
    student_id: i64,
    activity_id: ActivityId,
) -> RepoResult<bool> {
    exists(
        conn,
        Table::StudentsActivities,
        (Column::StudentId, id(student_id)),
        Some((Column::ActivityId, id(activity_id))),
    )
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<ActivityRecord> {
    let start_text: String = row.get("start_date")?;
    let end_text: Option<String> = row.get("end_date")?;

    Ok(ActivityRecord {
        activity_id: row.get("activity_id")?,
        name: row.get("activity_name")?,
        start_date: parse_stored_date(&start_text, "Activities.start_date")?,
        end_date: end_text
            .map(|value| parse_stored_date(&value, "Activities.end_date"))
            .transpose()?,
        description: row.get("description")?,
    })
}

fn parse_stored_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    parse_date("date", value)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}
