// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed database for project, sprint, and issue storage.
//!
//! The [`Database`] struct provides all data access operations. Every
//! status write goes through [`Database::update_issue_status`] so the
//! issues table and the status-change log can never disagree. Snapshot
//! loaders run inside a single read transaction so the chart calculators
//! see a consistent view.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::chart::{IssueSnapshot, SprintSnapshot};
use crate::error::{Error, Result};
use crate::issue::{Issue, Status, StatusChangeEvent};
use crate::sprint::{Project, Sprint, SprintStatus};

/// SQL schema for the tracker database.
pub const SCHEMA: &str = r#"
-- Projects own sprints and issues
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    key TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Sprints are inclusive calendar windows
CREATE TABLE IF NOT EXISTS sprints (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'planned',
    created_at TEXT NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects(id),
    CHECK (start_date <= end_date)
);

-- Core issue table
CREATE TABLE IF NOT EXISTS issues (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'todo',
    estimate INTEGER NOT NULL DEFAULT 0,
    sprint_id TEXT,
    assignee TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects(id),
    FOREIGN KEY (sprint_id) REFERENCES sprints(id)
);

-- Status-change log (burndown source of truth)
CREATE TABLE IF NOT EXISTS status_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id TEXT NOT NULL,
    old_status TEXT,
    new_status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (issue_id) REFERENCES issues(id)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
CREATE INDEX IF NOT EXISTS idx_issues_sprint ON issues(sprint_id);
CREATE INDEX IF NOT EXISTS idx_sprints_project ON sprints(project_id);
CREATE INDEX IF NOT EXISTS idx_status_events_issue ON status_events(issue_id);

-- At most one active sprint per project
CREATE UNIQUE INDEX IF NOT EXISTS idx_sprints_one_active
    ON sprints(project_id) WHERE status = 'active';
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Run schema creation and all migrations on a database connection.
///
/// Applies the canonical schema and runs idempotent migrations to
/// upgrade older databases that may be missing columns.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_assignee(conn)?;
    Ok(())
}

/// Migration: Add assignee column to databases created before it existed.
fn migrate_add_assignee(conn: &Connection) -> Result<()> {
    let has_assignee: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('issues') WHERE name = 'assignee'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_assignee {
        conn.execute("ALTER TABLE issues ADD COLUMN assignee TEXT", [])?;
    }
    Ok(())
}

/// SQLite database connection with tracker operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for concurrency
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    // ── Projects ─────────────────────────────────────────────────────

    /// Create a new project.
    pub fn create_project(&self, project: &Project) -> Result<()> {
        self.conn.execute(
            "INSERT INTO projects (id, key, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                project.id,
                project.key,
                project.name,
                project.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a project by ID.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        get_project(&self.conn, id)
    }

    /// Check if a project exists.
    pub fn project_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get all projects, newest first.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, key, name, created_at FROM projects ORDER BY created_at DESC",
        )?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    // ── Issues ───────────────────────────────────────────────────────

    /// Create a new issue and its creation event in one transaction.
    ///
    /// The creation event anchors the status-change log: replaying the
    /// log from the first event always reproduces the stored status.
    pub fn create_issue(&mut self, issue: &Issue) -> Result<()> {
        if !self.project_exists(&issue.project_id)? {
            return Err(Error::ProjectNotFound(issue.project_id.clone()));
        }
        if let Some(ref sprint_id) = issue.sprint_id {
            get_sprint(&self.conn, sprint_id)?;
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO issues (id, project_id, title, description, status, estimate,
             sprint_id, assignee, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                issue.id,
                issue.project_id,
                issue.title,
                issue.description,
                issue.status.as_str(),
                issue.estimate,
                issue.sprint_id,
                issue.assignee,
                issue.created_at.to_rfc3339(),
                issue.updated_at.to_rfc3339(),
            ],
        )?;
        tx.execute(
            "INSERT INTO status_events (issue_id, old_status, new_status, created_at)
             VALUES (?1, NULL, ?2, ?3)",
            params![
                issue.id,
                issue.status.as_str(),
                issue.created_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Get an issue by ID.
    pub fn get_issue(&self, id: &str) -> Result<Issue> {
        get_issue(&self.conn, id)
    }

    /// Check if an issue exists.
    pub fn issue_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List a project's issues with optional filters.
    pub fn list_issues(
        &self,
        project_id: &str,
        status: Option<Status>,
        sprint_id: Option<&str>,
    ) -> Result<Vec<Issue>> {
        let mut sql = String::from(
            "SELECT id, project_id, title, description, status, estimate,
             sprint_id, assignee, created_at, updated_at
             FROM issues WHERE project_id = ?",
        );

        let mut params_vec: Vec<String> = vec![project_id.to_string()];

        if let Some(s) = status {
            sql.push_str(" AND status = ?");
            params_vec.push(s.as_str().to_string());
        }

        if let Some(sp) = sprint_id {
            sql.push_str(" AND sprint_id = ?");
            params_vec.push(sp.to_string());
        }

        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = self.conn.prepare(&sql)?;

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();

        let issues = stmt
            .query_map(params_refs.as_slice(), issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    /// Move an issue to a new status, appending the status-change event
    /// in the same transaction.
    ///
    /// Returns the recorded event. Rejects self-transitions.
    pub fn update_issue_status(&mut self, id: &str, status: Status) -> Result<StatusChangeEvent> {
        let issue = self.get_issue(id)?;
        if !issue.status.can_transition_to(status) {
            return Err(Error::InvalidTransition {
                from: issue.status.to_string(),
                to: status.to_string(),
                valid_targets: issue.status.valid_targets(),
            });
        }

        let now = Utc::now();
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE issues SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now.to_rfc3339(), id],
        )?;
        tx.execute(
            "INSERT INTO status_events (issue_id, old_status, new_status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                issue.status.as_str(),
                status.as_str(),
                now.to_rfc3339(),
            ],
        )?;
        let event_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(StatusChangeEvent {
            id: event_id,
            issue_id: id.to_string(),
            old_status: Some(issue.status),
            new_status: status,
            created_at: now,
        })
    }

    /// Assign an issue to a sprint, or clear the assignment with None.
    ///
    /// The sprint must belong to the issue's project.
    pub fn assign_to_sprint(&mut self, issue_id: &str, sprint_id: Option<&str>) -> Result<()> {
        let issue = self.get_issue(issue_id)?;
        if let Some(sp) = sprint_id {
            let sprint = self.get_sprint(sp)?;
            if sprint.project_id != issue.project_id {
                return Err(Error::InvalidInput(format!(
                    "sprint {} belongs to a different project than issue {}",
                    sp, issue_id
                )));
            }
        }

        self.conn.execute(
            "UPDATE issues SET sprint_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![sprint_id, Utc::now().to_rfc3339(), issue_id],
        )?;
        Ok(())
    }

    /// Update an issue's story-point estimate.
    pub fn update_estimate(&mut self, id: &str, estimate: u32) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE issues SET estimate = ?1, updated_at = ?2 WHERE id = ?3",
            params![estimate, Utc::now().to_rfc3339(), id],
        )?;

        if affected == 0 {
            return Err(Error::IssueNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Get an issue's status-change history, ordered by time.
    pub fn get_status_events(&self, issue_id: &str) -> Result<Vec<StatusChangeEvent>> {
        if !self.issue_exists(issue_id)? {
            return Err(Error::IssueNotFound(issue_id.to_string()));
        }
        get_status_events(&self.conn, issue_id)
    }

    // ── Sprints ──────────────────────────────────────────────────────

    /// Create a new sprint, validating the calendar window.
    pub fn create_sprint(&self, sprint: &Sprint) -> Result<()> {
        sprint.validate_window()?;
        if !self.project_exists(&sprint.project_id)? {
            return Err(Error::ProjectNotFound(sprint.project_id.clone()));
        }

        self.conn.execute(
            "INSERT INTO sprints (id, project_id, name, start_date, end_date, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sprint.id,
                sprint.project_id,
                sprint.name,
                sprint.start_date.to_string(),
                sprint.end_date.to_string(),
                sprint.status.as_str(),
                sprint.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a sprint by ID.
    pub fn get_sprint(&self, id: &str) -> Result<Sprint> {
        get_sprint(&self.conn, id)
    }

    /// Check if a sprint exists.
    pub fn sprint_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sprints WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List a project's sprints, oldest first.
    pub fn list_sprints(&self, project_id: &str) -> Result<Vec<Sprint>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, name, start_date, end_date, status, created_at
             FROM sprints WHERE project_id = ?1 ORDER BY start_date, created_at",
        )?;

        let sprints = stmt
            .query_map(params![project_id], sprint_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sprints)
    }

    /// Start a planned sprint.
    ///
    /// Fails if the project already has an active sprint. The check and
    /// the update run in one transaction; a partial unique index backstops
    /// the invariant against writers on other connections.
    pub fn start_sprint(&mut self, id: &str) -> Result<()> {
        let sprint = self.get_sprint(id)?;
        if sprint.status != SprintStatus::Planned {
            return Err(Error::SprintNotPlanned(id.to_string()));
        }

        let tx = self.conn.transaction()?;
        let active: Option<String> = tx
            .query_row(
                "SELECT id FROM sprints WHERE project_id = ?1 AND status = 'active'",
                params![sprint.project_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(active_id) = active {
            return Err(Error::ActiveSprintExists {
                project_id: sprint.project_id,
                active_id,
            });
        }
        tx.execute(
            "UPDATE sprints SET status = 'active' WHERE id = ?1",
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Complete an active sprint.
    pub fn complete_sprint(&mut self, id: &str) -> Result<()> {
        let sprint = self.get_sprint(id)?;
        if sprint.status != SprintStatus::Active {
            return Err(Error::SprintNotActive(id.to_string()));
        }

        self.conn.execute(
            "UPDATE sprints SET status = 'completed' WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Load a sprint with all its issues and their histories in a single
    /// read transaction.
    pub fn sprint_snapshot(&mut self, sprint_id: &str) -> Result<SprintSnapshot> {
        let tx = self.conn.transaction()?;
        let snapshot = load_sprint_snapshot(&tx, sprint_id)?;
        tx.commit()?;
        Ok(snapshot)
    }

    /// Load snapshots of all completed sprints of a project, ordered by
    /// start date, in a single read transaction.
    pub fn completed_sprint_snapshots(&mut self, project_id: &str) -> Result<Vec<SprintSnapshot>> {
        let tx = self.conn.transaction()?;
        get_project(&tx, project_id)?;

        let sprint_ids: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM sprints
                 WHERE project_id = ?1 AND status = 'completed'
                 ORDER BY start_date, created_at",
            )?;
            let rows = stmt
                .query_map(params![project_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let snapshots = sprint_ids
            .iter()
            .map(|id| load_sprint_snapshot(&tx, id))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(snapshots)
    }
}

// ── Row mapping ──────────────────────────────────────────────────────
//
// Standalone functions over a plain Connection so the same mapping
// serves both Database methods and transactional snapshot loading.

fn project_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<Project, rusqlite::Error> {
    let created_str: String = row.get(3)?;
    Ok(Project {
        id: row.get(0)?,
        key: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
    })
}

fn issue_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<Issue, rusqlite::Error> {
    let status_str: String = row.get(4)?;
    let created_str: String = row.get(8)?;
    let updated_str: String = row.get(9)?;
    Ok(Issue {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: parse_db(&status_str, "status")?,
        estimate: row.get(5)?,
        sprint_id: row.get(6)?,
        assignee: row.get(7)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        updated_at: parse_timestamp(&updated_str, "updated_at")?,
    })
}

fn sprint_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<Sprint, rusqlite::Error> {
    let start_str: String = row.get(3)?;
    let end_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let created_str: String = row.get(6)?;
    Ok(Sprint {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        start_date: parse_db::<NaiveDate>(&start_str, "start_date")?,
        end_date: parse_db::<NaiveDate>(&end_str, "end_date")?,
        status: parse_db(&status_str, "status")?,
        created_at: parse_timestamp(&created_str, "created_at")?,
    })
}

fn get_project(conn: &Connection, id: &str) -> Result<Project> {
    let project = conn
        .query_row(
            "SELECT id, key, name, created_at FROM projects WHERE id = ?1",
            params![id],
            project_from_row,
        )
        .optional()?;

    project.ok_or_else(|| Error::ProjectNotFound(id.to_string()))
}

fn get_issue(conn: &Connection, id: &str) -> Result<Issue> {
    let issue = conn
        .query_row(
            "SELECT id, project_id, title, description, status, estimate,
             sprint_id, assignee, created_at, updated_at
             FROM issues WHERE id = ?1",
            params![id],
            issue_from_row,
        )
        .optional()?;

    issue.ok_or_else(|| Error::IssueNotFound(id.to_string()))
}

fn get_sprint(conn: &Connection, id: &str) -> Result<Sprint> {
    let sprint = conn
        .query_row(
            "SELECT id, project_id, name, start_date, end_date, status, created_at
             FROM sprints WHERE id = ?1",
            params![id],
            sprint_from_row,
        )
        .optional()?;

    sprint.ok_or_else(|| Error::SprintNotFound(id.to_string()))
}

/// Read an issue's status history, ordered by time then insert order.
///
/// Rows whose status or timestamp no longer parse are skipped: the issue
/// then reads as never transitioned for the affected span.
fn get_status_events(conn: &Connection, issue_id: &str) -> Result<Vec<StatusChangeEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, issue_id, old_status, new_status, created_at
         FROM status_events WHERE issue_id = ?1 ORDER BY created_at, id",
    )?;

    let rows = stmt
        .query_map(params![issue_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let events = rows
        .into_iter()
        .filter_map(|(id, issue_id, old, new, created)| {
            let new_status = new.parse::<Status>().ok()?;
            let created_at = DateTime::parse_from_rfc3339(&created)
                .ok()?
                .with_timezone(&Utc);
            Some(StatusChangeEvent {
                id,
                issue_id,
                old_status: old.and_then(|s| s.parse().ok()),
                new_status,
                created_at,
            })
        })
        .collect();

    Ok(events)
}

fn load_sprint_snapshot(conn: &Connection, sprint_id: &str) -> Result<SprintSnapshot> {
    let sprint = get_sprint(conn, sprint_id)?;

    let issues: Vec<Issue> = {
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, description, status, estimate,
             sprint_id, assignee, created_at, updated_at
             FROM issues WHERE sprint_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map(params![sprint_id], issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows
    };

    let issues = issues
        .into_iter()
        .map(|issue| {
            let events = get_status_events(conn, &issue.id)?;
            Ok(IssueSnapshot { issue, events })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SprintSnapshot { sprint, issues })
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
