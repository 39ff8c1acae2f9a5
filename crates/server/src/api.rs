// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP API: routing, request payloads, and handlers.
//!
//! Routes under /api require a bearer token when one is configured.
//! Chart endpoints load a consistent snapshot under the database lock,
//! then run the pure calculators outside of it.

use std::sync::MutexGuard;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use agileflow_core::{
    burndown_series, id, velocity_points, BurndownPoint, Database, Error as CoreError, Issue,
    Project, Sprint, Status, StatusChangeEvent, VelocityPoint,
};

use crate::auth::require_bearer;
use crate::state::SharedState;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub key: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateIssueRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub estimate: u32,
    pub assignee: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSprintRequest {
    pub name: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
}

#[derive(Deserialize)]
pub struct MoveIssueRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct AssignSprintRequest {
    pub sprint_id: Option<String>,
}

#[derive(Deserialize)]
pub struct IssueFilter {
    pub status: Option<String>,
    pub sprint: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    Unauthorized,
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid bearer token".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProjectNotFound(_)
            | CoreError::IssueNotFound(_)
            | CoreError::SprintNotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::InvalidTransition { .. }
            | CoreError::InvalidStatus(_)
            | CoreError::InvalidSprintStatus(_)
            | CoreError::InvalidSprintWindow { .. }
            | CoreError::InvalidProjectKey
            | CoreError::InvalidInput(_) => ApiError::BadRequest(err.to_string()),
            CoreError::ActiveSprintExists { .. }
            | CoreError::SprintNotPlanned(_)
            | CoreError::SprintNotActive(_) => ApiError::Conflict(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

/// Lock the database, mapping a poisoned lock to a 500.
fn lock(state: &SharedState) -> Result<MutexGuard<'_, Database>, ApiError> {
    state
        .db
        .lock()
        .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
}

// ── Router ────────────────────────────────────────────────────────────

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{id}", get(get_project))
        .route(
            "/api/projects/{id}/issues",
            get(list_issues).post(create_issue),
        )
        .route(
            "/api/projects/{id}/sprints",
            get(list_sprints).post(create_sprint),
        )
        .route("/api/projects/{id}/velocity", get(project_velocity))
        .route("/api/issues/{id}", get(get_issue))
        .route("/api/issues/{id}/events", get(issue_events))
        .route("/api/issues/{id}/status", patch(move_issue))
        .route("/api/issues/{id}/sprint", patch(assign_sprint))
        .route("/api/sprints/{id}", get(get_sprint))
        .route("/api/sprints/{id}/start", post(start_sprint))
        .route("/api/sprints/{id}/complete", post(complete_sprint))
        .route("/api/sprints/{id}/burndown", get(sprint_burndown))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn create_project(
    State(state): State<SharedState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !id::validate_key(&req.key) {
        return Err(CoreError::InvalidProjectKey.into());
    }

    let db = lock(&state)?;
    if db.project_exists(&req.key)? {
        return Err(ApiError::Conflict(format!(
            "project already exists: {}",
            req.key
        )));
    }

    let project = Project::new(req.key.clone(), req.key, req.name, Utc::now());
    db.create_project(&project)?;
    info!("created project {}", project.id);
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let db = lock(&state)?;
    Ok(Json(db.list_projects()?))
}

async fn get_project(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let db = lock(&state)?;
    Ok(Json(db.get_project(&project_id)?))
}

async fn create_issue(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(req): Json<CreateIssueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut db = lock(&state)?;
    let project = db.get_project(&project_id)?;

    let now = Utc::now();
    let issue_id = id::generate_unique_id(&project.key, &req.title, &now, |candidate| {
        db.issue_exists(candidate).unwrap_or(false)
    });

    let mut issue = Issue::new(issue_id, project.id, req.title, req.estimate, now);
    issue.description = req.description;
    issue.assignee = req.assignee;
    db.create_issue(&issue)?;
    info!("created issue {}", issue.id);
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn list_issues(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Query(filter): Query<IssueFilter>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let status = match filter.status {
        Some(text) => Some(text.parse::<Status>()?),
        None => None,
    };

    let db = lock(&state)?;
    db.get_project(&project_id)?;
    Ok(Json(db.list_issues(
        &project_id,
        status,
        filter.sprint.as_deref(),
    )?))
}

async fn get_issue(
    State(state): State<SharedState>,
    Path(issue_id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
    let db = lock(&state)?;
    Ok(Json(db.get_issue(&issue_id)?))
}

async fn issue_events(
    State(state): State<SharedState>,
    Path(issue_id): Path<String>,
) -> Result<Json<Vec<StatusChangeEvent>>, ApiError> {
    let db = lock(&state)?;
    Ok(Json(db.get_status_events(&issue_id)?))
}

async fn move_issue(
    State(state): State<SharedState>,
    Path(issue_id): Path<String>,
    Json(req): Json<MoveIssueRequest>,
) -> Result<Json<StatusChangeEvent>, ApiError> {
    let status: Status = req.status.parse()?;
    let mut db = lock(&state)?;
    let event = db.update_issue_status(&issue_id, status)?;
    info!("moved issue {} to {}", issue_id, status);
    Ok(Json(event))
}

async fn assign_sprint(
    State(state): State<SharedState>,
    Path(issue_id): Path<String>,
    Json(req): Json<AssignSprintRequest>,
) -> Result<Json<Issue>, ApiError> {
    let mut db = lock(&state)?;
    db.assign_to_sprint(&issue_id, req.sprint_id.as_deref())?;
    Ok(Json(db.get_issue(&issue_id)?))
}

async fn create_sprint(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(req): Json<CreateSprintRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = lock(&state)?;
    let project = db.get_project(&project_id)?;

    let now = Utc::now();
    let sprint_id = id::generate_unique_id(&project.key, &req.name, &now, |candidate| {
        db.sprint_exists(candidate).unwrap_or(false)
    });

    let sprint = Sprint::new(
        sprint_id,
        project.id,
        req.name,
        req.start_date,
        req.end_date,
        now,
    );
    db.create_sprint(&sprint)?;
    info!("created sprint {}", sprint.id);
    Ok((StatusCode::CREATED, Json(sprint)))
}

async fn list_sprints(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Sprint>>, ApiError> {
    let db = lock(&state)?;
    db.get_project(&project_id)?;
    Ok(Json(db.list_sprints(&project_id)?))
}

async fn get_sprint(
    State(state): State<SharedState>,
    Path(sprint_id): Path<String>,
) -> Result<Json<Sprint>, ApiError> {
    let db = lock(&state)?;
    Ok(Json(db.get_sprint(&sprint_id)?))
}

async fn start_sprint(
    State(state): State<SharedState>,
    Path(sprint_id): Path<String>,
) -> Result<Json<Sprint>, ApiError> {
    let mut db = lock(&state)?;
    db.start_sprint(&sprint_id)?;
    info!("started sprint {}", sprint_id);
    Ok(Json(db.get_sprint(&sprint_id)?))
}

async fn complete_sprint(
    State(state): State<SharedState>,
    Path(sprint_id): Path<String>,
) -> Result<Json<Sprint>, ApiError> {
    let mut db = lock(&state)?;
    db.complete_sprint(&sprint_id)?;
    info!("completed sprint {}", sprint_id);
    Ok(Json(db.get_sprint(&sprint_id)?))
}

async fn sprint_burndown(
    State(state): State<SharedState>,
    Path(sprint_id): Path<String>,
) -> Result<Json<Vec<BurndownPoint>>, ApiError> {
    let snapshot = {
        let mut db = lock(&state)?;
        db.sprint_snapshot(&sprint_id)?
    };
    let points = burndown_series(&snapshot, Utc::now().date_naive())?;
    Ok(Json(points))
}

async fn project_velocity(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<VelocityPoint>>, ApiError> {
    let snapshots = {
        let mut db = lock(&state)?;
        db.completed_sprint_snapshots(&project_id)?
    };
    Ok(Json(velocity_points(&snapshots)))
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
