// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core issue types for the AgileFlow tracker.
//!
//! This module contains the fundamental data types: Issue, Status, and
//! StatusChangeEvent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Workflow status of an issue, matching the board columns.
///
/// The variants are ordered as they appear on the board, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not yet started. Initial state for new issues.
    Todo,
    /// Currently being worked on.
    InProgress,
    /// Implementation finished, awaiting review.
    CodeReview,
    /// Accepted and complete.
    Done,
}

impl Status {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::CodeReview => "code_review",
            Status::Done => "done",
        }
    }

    /// Check if a transition from this status to target is valid.
    ///
    /// Any non-self transition is valid: cards move freely between board
    /// columns, including backwards out of done.
    pub fn can_transition_to(&self, target: Status) -> bool {
        *self != target
    }

    /// Get valid transition targets as a formatted string.
    pub fn valid_targets(&self) -> String {
        match self {
            Status::Todo => "in_progress, code_review, done".to_string(),
            Status::InProgress => "todo, code_review, done".to_string(),
            Status::CodeReview => "todo, in_progress, done".to_string(),
            Status::Done => "todo, in_progress, code_review".to_string(),
        }
    }

    /// Returns true if this status counts toward completed work.
    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(Status::Todo),
            "in_progress" => Ok(Status::InProgress),
            "code_review" => Ok(Status::CodeReview),
            "done" => Ok(Status::Done),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// The primary entity representing a tracked work item.
///
/// Issues are identified by a unique ID generated from the project key
/// and a hash of the title and creation time (e.g., "agile-a1b2c3d4").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier (format: `{project_key}-{hash}`).
    pub id: String,
    /// The project this issue belongs to.
    pub project_id: String,
    /// Short description of the work.
    pub title: String,
    /// Longer description providing context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current workflow state.
    pub status: Status,
    /// Story-point estimate. Zero means unestimated.
    pub estimate: u32,
    /// The sprint this issue is committed to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
    /// Person this issue is assigned to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// When the issue was created.
    pub created_at: DateTime<Utc>,
    /// When the issue was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Creates a new issue in the todo state, unassigned to any sprint.
    pub fn new(
        id: String,
        project_id: String,
        title: String,
        estimate: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Issue {
            id,
            project_id,
            title,
            description: None,
            status: Status::Todo,
            estimate,
            sprint_id: None,
            assignee: None,
            created_at,
            updated_at: created_at,
        }
    }
}

/// A status-history entry recording one workflow transition.
///
/// Events form an immutable, time-ordered log per issue. Replaying the log
/// up to a cutoff reconstructs the issue's status as of that moment, which
/// is what the burndown calculation relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeEvent {
    /// Database-assigned identifier.
    pub id: i64,
    /// The issue this event belongs to.
    pub issue_id: String,
    /// Status before the transition. None for the creation event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<Status>,
    /// Status after the transition.
    pub new_status: Status,
    /// When the transition occurred.
    pub created_at: DateTime<Utc>,
}

impl StatusChangeEvent {
    /// Creates a new event with the current timestamp.
    ///
    /// The `id` field is set to 0 and will be assigned by the database on insert.
    pub fn new(issue_id: String, old_status: Option<Status>, new_status: Status) -> Self {
        StatusChangeEvent {
            id: 0, // Will be set by database
            issue_id,
            old_status,
            new_status,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
