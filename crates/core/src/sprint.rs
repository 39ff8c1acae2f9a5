// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project and sprint types.
//!
//! A sprint is a time-boxed window of calendar days owned by a project.
//! At most one sprint per project may be active at a time; the database
//! layer enforces this.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A container for issues and sprints, identified by a short key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: String,
    /// Short tag used as the prefix of issue IDs (e.g., "agile").
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project.
    pub fn new(id: String, key: String, name: String, created_at: DateTime<Utc>) -> Self {
        Project {
            id,
            key,
            name,
            created_at,
        }
    }
}

/// Lifecycle state of a sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    /// Created but not yet started.
    Planned,
    /// Currently running. At most one per project.
    Active,
    /// Closed. Counts toward velocity.
    Completed,
}

impl SprintStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintStatus::Planned => "planned",
            SprintStatus::Active => "active",
            SprintStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SprintStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(SprintStatus::Planned),
            "active" => Ok(SprintStatus::Active),
            "completed" => Ok(SprintStatus::Completed),
            _ => Err(Error::InvalidSprintStatus(s.to_string())),
        }
    }
}

/// A fixed time-boxed period during which a committed set of issues is worked.
///
/// `start_date` and `end_date` are inclusive calendar days. The window is
/// validated on creation: an end date before the start date is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    /// Unique identifier.
    pub id: String,
    /// The project this sprint belongs to.
    pub project_id: String,
    /// Human-readable name (e.g., "Sprint 12").
    pub name: String,
    /// First day of the sprint.
    pub start_date: NaiveDate,
    /// Last day of the sprint, inclusive. Must not precede `start_date`.
    pub end_date: NaiveDate,
    /// Lifecycle state.
    pub status: SprintStatus,
    /// When the sprint record was created.
    pub created_at: DateTime<Utc>,
}

impl Sprint {
    /// Creates a new planned sprint.
    pub fn new(
        id: String,
        project_id: String,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Sprint {
            id,
            project_id,
            name,
            start_date,
            end_date,
            status: SprintStatus::Planned,
            created_at,
        }
    }

    /// Validate the calendar window, rejecting an end date before the start.
    pub fn validate_window(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(Error::InvalidSprintWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "sprint_tests.rs"]
mod tests;
