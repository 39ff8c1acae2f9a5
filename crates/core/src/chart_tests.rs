// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::{TimeZone, Utc};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn noon(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn test_sprint(start: NaiveDate, end: NaiveDate) -> Sprint {
    let mut sprint = Sprint::new(
        "agile-s1".into(),
        "agile".into(),
        "Sprint 1".into(),
        start,
        end,
        noon(2026, 2, 20),
    );
    sprint.status = crate::sprint::SprintStatus::Active;
    sprint
}

fn snapshot_issue(
    id: &str,
    estimate: u32,
    transitions: &[(Option<Status>, Status, chrono::DateTime<Utc>)],
) -> IssueSnapshot {
    let mut issue = Issue::new(
        id.to_string(),
        "agile".into(),
        format!("Issue {id}"),
        estimate,
        noon(2026, 2, 20),
    );
    issue.sprint_id = Some("agile-s1".into());
    if let Some((_, last, _)) = transitions.last() {
        issue.status = *last;
    }

    let events = transitions
        .iter()
        .enumerate()
        .map(|(i, (old, new, at))| StatusChangeEvent {
            id: i as i64 + 1,
            issue_id: id.to_string(),
            old_status: *old,
            new_status: *new,
            created_at: *at,
        })
        .collect();

    IssueSnapshot { issue, events }
}

// A 10-day window: Mon Mar 2 .. Wed Mar 11, 2026.
fn ten_day_sprint() -> Sprint {
    test_sprint(date(2026, 3, 2), date(2026, 3, 11))
}

/// Day labels are weekday + day-of-month. 2026-03-02 is a Monday.
#[test]
fn day_labels_use_weekday_and_day_of_month() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();
    assert_eq!(points[0].day, "Mon 2");
    assert_eq!(points[1].day, "Tue 3");
    assert_eq!(points[9].day, "Wed 11");
}

#[test]
fn ideal_starts_at_scope_and_ends_at_zero() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![snapshot_issue("agile-a1b2", 20, &[])],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();

    assert_eq!(points.len(), 10);
    assert_eq!(points[0].ideal, 20.0);
    assert_eq!(points[9].ideal, 0.0);
    // Linear in between
    assert!((points[3].ideal - 20.0 * 6.0 / 9.0).abs() < 1e-9);
}

#[test]
fn remaining_stays_within_scope_bounds() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![
            snapshot_issue(
                "agile-a1b2",
                8,
                &[(Some(Status::Todo), Status::Done, noon(2026, 3, 4))],
            ),
            snapshot_issue("agile-c3d4", 5, &[]),
        ],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();

    for point in &points {
        assert!(point.remaining <= 13);
    }
}

#[test]
fn identical_snapshots_yield_identical_output() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![snapshot_issue(
            "agile-a1b2",
            20,
            &[(Some(Status::Todo), Status::Done, noon(2026, 3, 5))],
        )],
    };
    let today = date(2026, 3, 8);
    let first = burndown_series(&snapshot, today).unwrap();
    let second = burndown_series(&snapshot, today).unwrap();
    assert_eq!(first, second);
}

/// One 20-point issue done on day 3 of a 10-day sprint.
#[test]
fn single_done_transition_drops_remaining_from_that_day() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![snapshot_issue(
            "agile-a1b2",
            20,
            &[
                (Some(Status::Todo), Status::InProgress, noon(2026, 3, 3)),
                (Some(Status::InProgress), Status::Done, noon(2026, 3, 5)),
            ],
        )],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();

    for (i, point) in points.iter().enumerate() {
        let expected = if i < 3 { 20 } else { 0 };
        assert_eq!(point.remaining, expected, "day {i}");
    }
}

/// Done on day 2, reopened on day 4: the estimate comes back.
#[test]
fn reopened_issue_counts_as_remaining_again() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![snapshot_issue(
            "agile-a1b2",
            20,
            &[
                (Some(Status::Todo), Status::Done, noon(2026, 3, 4)),
                (Some(Status::Done), Status::InProgress, noon(2026, 3, 6)),
            ],
        )],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();

    for (i, point) in points.iter().enumerate() {
        let expected = if (2..4).contains(&i) { 0 } else { 20 };
        assert_eq!(point.remaining, expected, "day {i}");
    }
}

#[test]
fn empty_sprint_produces_flat_zero_series() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();

    assert_eq!(points.len(), 10);
    for point in &points {
        assert_eq!(point.ideal, 0.0);
        assert_eq!(point.remaining, 0);
    }
}

#[test]
fn issue_with_no_history_counts_as_remaining_every_day() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![snapshot_issue("agile-a1b2", 13, &[])],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();

    for point in &points {
        assert_eq!(point.remaining, 13);
    }
}

#[test]
fn series_is_clamped_to_today_for_active_sprints() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![snapshot_issue("agile-a1b2", 20, &[])],
    };
    let points = burndown_series(&snapshot, date(2026, 3, 5)).unwrap();

    // Mar 2 through Mar 5 inclusive
    assert_eq!(points.len(), 4);
}

#[test]
fn today_before_sprint_start_yields_empty_series() {
    let snapshot = SprintSnapshot {
        sprint: ten_day_sprint(),
        issues: vec![],
    };
    let points = burndown_series(&snapshot, date(2026, 2, 1)).unwrap();
    assert!(points.is_empty());
}

#[test]
fn single_day_sprint_carries_full_scope() {
    let snapshot = SprintSnapshot {
        sprint: test_sprint(date(2026, 3, 2), date(2026, 3, 2)),
        issues: vec![snapshot_issue("agile-a1b2", 8, &[])],
    };
    let points = burndown_series(&snapshot, date(2026, 4, 1)).unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].ideal, 8.0);
    assert_eq!(points[0].remaining, 8);
}

#[test]
fn inverted_window_is_a_configuration_error() {
    let snapshot = SprintSnapshot {
        sprint: test_sprint(date(2026, 3, 11), date(2026, 3, 2)),
        issues: vec![],
    };
    let result = burndown_series(&snapshot, date(2026, 4, 1));
    assert!(matches!(
        result,
        Err(Error::InvalidSprintWindow { .. })
    ));
}

#[test]
fn status_on_returns_none_without_events() {
    assert_eq!(status_on(&[], date(2026, 3, 5)), None);
}

#[test]
fn status_on_ignores_events_after_cutoff() {
    let snap = snapshot_issue(
        "agile-a1b2",
        5,
        &[
            (Some(Status::Todo), Status::InProgress, noon(2026, 3, 3)),
            (Some(Status::InProgress), Status::Done, noon(2026, 3, 7)),
        ],
    );
    assert_eq!(
        status_on(&snap.events, date(2026, 3, 5)),
        Some(Status::InProgress)
    );
    assert_eq!(status_on(&snap.events, date(2026, 3, 7)), Some(Status::Done));
    assert_eq!(status_on(&snap.events, date(2026, 3, 2)), None);
}

#[test]
fn status_on_takes_last_event_of_the_day() {
    let snap = snapshot_issue(
        "agile-a1b2",
        5,
        &[
            (Some(Status::Todo), Status::Done, noon(2026, 3, 3)),
            (
                Some(Status::Done),
                Status::CodeReview,
                Utc.with_ymd_and_hms(2026, 3, 3, 17, 30, 0).unwrap(),
            ),
        ],
    );
    assert_eq!(
        status_on(&snap.events, date(2026, 3, 3)),
        Some(Status::CodeReview)
    );
}

/// Two 25-point issues committed, one done by sprint end.
#[test]
fn velocity_splits_commitment_and_completed() {
    let snapshot = SprintSnapshot {
        sprint: test_sprint(date(2026, 3, 2), date(2026, 3, 11)),
        issues: vec![
            snapshot_issue(
                "agile-a1b2",
                25,
                &[(Some(Status::Todo), Status::Done, noon(2026, 3, 9))],
            ),
            snapshot_issue(
                "agile-c3d4",
                25,
                &[(Some(Status::Todo), Status::InProgress, noon(2026, 3, 4))],
            ),
        ],
    };
    let points = velocity_points(&[snapshot]);

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].sprint, "Sprint 1");
    assert_eq!(points[0].commitment, 50);
    assert_eq!(points[0].completed, 25);
}

#[test]
fn velocity_ignores_done_transitions_after_sprint_end() {
    let snapshot = SprintSnapshot {
        sprint: test_sprint(date(2026, 3, 2), date(2026, 3, 11)),
        issues: vec![snapshot_issue(
            "agile-a1b2",
            25,
            &[(Some(Status::Todo), Status::Done, noon(2026, 3, 15))],
        )],
    };
    let points = velocity_points(&[snapshot]);
    assert_eq!(points[0].completed, 0);
}

#[test]
fn velocity_includes_zero_commitment_sprints() {
    let empty = SprintSnapshot {
        sprint: test_sprint(date(2026, 2, 16), date(2026, 2, 27)),
        issues: vec![],
    };
    let points = velocity_points(&[empty]);

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].commitment, 0);
    assert_eq!(points[0].completed, 0);
}
