// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared server state.

use std::sync::{Arc, Mutex};

use agileflow_core::Database;

/// State shared across all request handlers.
pub struct AppState {
    /// The tracker database. Handlers are synchronous over a single
    /// connection, so a plain mutex is enough.
    pub db: Mutex<Database>,
    /// Bearer token required on /api routes. None disables auth.
    pub token: Option<String>,
}

pub type SharedState = Arc<AppState>;
