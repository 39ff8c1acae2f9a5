// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::Error;
use yare::parameterized;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn test_sprint(start: NaiveDate, end: NaiveDate) -> Sprint {
    Sprint::new(
        "agile-s1".into(),
        "agile".into(),
        "Sprint 1".into(),
        start,
        end,
        Utc::now(),
    )
}

// SprintStatus parsing tests
#[parameterized(
    planned = { "planned", SprintStatus::Planned },
    active = { "active", SprintStatus::Active },
    completed = { "completed", SprintStatus::Completed },
    planned_upper = { "PLANNED", SprintStatus::Planned },
)]
fn sprint_status_from_str_valid(input: &str, expected: SprintStatus) {
    assert_eq!(input.parse::<SprintStatus>().unwrap(), expected);
}

#[parameterized(
    invalid = { "paused" },
    empty = { "" },
)]
fn sprint_status_from_str_invalid(input: &str) {
    assert!(input.parse::<SprintStatus>().is_err());
}

#[parameterized(
    planned = { SprintStatus::Planned, "planned" },
    active = { SprintStatus::Active, "active" },
    completed = { SprintStatus::Completed, "completed" },
)]
fn sprint_status_as_str(status: SprintStatus, expected: &str) {
    assert_eq!(status.as_str(), expected);
}

#[test]
fn new_sprint_is_planned() {
    let sprint = test_sprint(date(2026, 3, 2), date(2026, 3, 13));
    assert_eq!(sprint.status, SprintStatus::Planned);
}

#[test]
fn validate_window_accepts_ordered_dates() {
    let sprint = test_sprint(date(2026, 3, 2), date(2026, 3, 13));
    assert!(sprint.validate_window().is_ok());
}

#[test]
fn validate_window_accepts_single_day() {
    let sprint = test_sprint(date(2026, 3, 2), date(2026, 3, 2));
    assert!(sprint.validate_window().is_ok());
}

#[test]
fn validate_window_rejects_inverted_dates() {
    let sprint = test_sprint(date(2026, 3, 13), date(2026, 3, 2));
    assert!(matches!(
        sprint.validate_window(),
        Err(Error::InvalidSprintWindow { .. })
    ));
}
