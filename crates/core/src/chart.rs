// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Burndown and velocity derivation from issue status history.
//!
//! Both calculators are pure functions over snapshots loaded by the
//! database layer. Past-day status is reconstructed by folding each
//! issue's status-change log up to the end of the day in question, never
//! by inspecting the issue's current status field. An issue that reached
//! done and was later reopened therefore counts as remaining again from
//! the day of the reversal.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::issue::{Issue, Status, StatusChangeEvent};
use crate::sprint::Sprint;

/// An issue together with its full, time-ordered status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    /// The issue record.
    pub issue: Issue,
    /// Status-change log, ordered by timestamp ascending.
    pub events: Vec<StatusChangeEvent>,
}

/// A sprint together with snapshots of every issue assigned to it.
///
/// Loaded in a single read transaction so the calculators see a
/// consistent view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSnapshot {
    /// The sprint record.
    pub sprint: Sprint,
    /// Snapshots of the issues assigned to the sprint.
    pub issues: Vec<IssueSnapshot>,
}

/// One day of a burndown series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurndownPoint {
    /// Display label for the day (weekday + day-of-month, e.g. "Mon 9").
    pub day: String,
    /// Ideal remaining work, interpolated linearly to zero at sprint end.
    pub ideal: f64,
    /// Actual remaining work in story points.
    pub remaining: u32,
}

/// Commitment and completion totals for one completed sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityPoint {
    /// Sprint display label.
    pub sprint: String,
    /// Sum of estimates of the issues committed to the sprint.
    pub commitment: u32,
    /// Sum of estimates of issues done by sprint end.
    pub completed: u32,
}

/// Status implied by the event log at the end of the given day.
///
/// Returns None when no event is dated at or before the day, meaning the
/// log says nothing about the issue yet. Events must be ordered by
/// timestamp ascending, which is how the database returns them.
pub fn status_on(events: &[StatusChangeEvent], day: NaiveDate) -> Option<Status> {
    events
        .iter()
        .filter(|e| e.created_at.date_naive() <= day)
        .next_back()
        .map(|e| e.new_status)
}

/// Story points done as of the end of the given day.
fn done_points_on(issues: &[IssueSnapshot], day: NaiveDate) -> u32 {
    issues
        .iter()
        .filter(|s| status_on(&s.events, day).is_some_and(|status| status.is_done()))
        .map(|s| s.issue.estimate)
        .sum()
}

/// Compute the day-by-day burndown series for a sprint.
///
/// Produces one point per calendar day from the sprint's start date to
/// `min(end_date, today)`, inclusive. `today` is an explicit argument so
/// identical snapshots always yield identical output.
///
/// A sprint with no assigned issues produces a flat zero/zero series. An
/// inverted window (end before start) is a configuration error and is
/// reported to the caller, not silently corrected.
pub fn burndown_series(snapshot: &SprintSnapshot, today: NaiveDate) -> Result<Vec<BurndownPoint>> {
    let sprint = &snapshot.sprint;
    if sprint.end_date < sprint.start_date {
        return Err(Error::InvalidSprintWindow {
            start: sprint.start_date,
            end: sprint.end_date,
        });
    }

    let total_scope: u32 = snapshot.issues.iter().map(|s| s.issue.estimate).sum();
    let total_days = (sprint.end_date - sprint.start_date).num_days();
    let last_day = sprint.end_date.min(today);

    let mut points = Vec::new();
    let mut day = sprint.start_date;
    let mut index: i64 = 0;
    while day <= last_day {
        let ideal = if total_days == 0 {
            // Degenerate one-day sprint: full scope on day 0.
            total_scope as f64
        } else {
            total_scope as f64 * (total_days - index) as f64 / total_days as f64
        };
        points.push(BurndownPoint {
            day: day_label(day),
            ideal,
            remaining: total_scope - done_points_on(&snapshot.issues, day),
        });
        day = day + Duration::days(1);
        index += 1;
    }

    Ok(points)
}

/// Compute one velocity point per completed sprint.
///
/// Commitment is the sum of estimates of the sprint's issues; completed
/// is the sum of estimates of issues whose replayed status as of the
/// sprint's end date is done. Sprints with zero commitment are included.
pub fn velocity_points(snapshots: &[SprintSnapshot]) -> Vec<VelocityPoint> {
    snapshots
        .iter()
        .map(|snap| VelocityPoint {
            sprint: snap.sprint.name.clone(),
            commitment: snap.issues.iter().map(|s| s.issue.estimate).sum(),
            completed: done_points_on(&snap.issues, snap.sprint.end_date),
        })
        .collect()
}

/// Format a day label as weekday + day-of-month (e.g. "Mon 9").
fn day_label(day: NaiveDate) -> String {
    day.format("%a %-d").to_string()
}

#[cfg(test)]
#[path = "chart_tests.rs"]
mod tests;
