// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for agileflow-core operations.

use chrono::NaiveDate;
use thiserror::Error;

/// All possible errors that can occur in agileflow-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("sprint not found: {0}")]
    SprintNotFound(String),

    #[error("invalid status transition: cannot go from {from} to {to}\n  hint: from '{from}' you can go to: {valid_targets}")]
    InvalidTransition {
        from: String,
        to: String,
        valid_targets: String,
    },

    #[error("invalid status: '{0}'\n  hint: valid statuses are: todo, in_progress, code_review, done")]
    InvalidStatus(String),

    #[error("invalid sprint status: '{0}'\n  hint: valid statuses are: planned, active, completed")]
    InvalidSprintStatus(String),

    #[error("invalid sprint window: end date {end} is before start date {start}")]
    InvalidSprintWindow { start: NaiveDate, end: NaiveDate },

    #[error("project {project_id} already has an active sprint: {active_id}\n  hint: complete the active sprint before starting another")]
    ActiveSprintExists {
        project_id: String,
        active_id: String,
    },

    #[error("sprint {0} is not planned\n  hint: only a planned sprint can be started")]
    SprintNotPlanned(String),

    #[error("sprint {0} is not active\n  hint: only an active sprint can be completed")]
    SprintNotActive(String),

    #[error("invalid project key: must be 2+ alphanumeric characters with at least one letter")]
    InvalidProjectKey,

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for agileflow-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
