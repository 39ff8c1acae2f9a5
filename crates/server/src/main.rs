// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! agileflowd - The AgileFlow HTTP API server.
//!
//! Serves project, sprint, and issue operations plus the burndown and
//! velocity chart endpoints over a SQLite database.
//!
//! Usage:
//!   agileflowd --bind 127.0.0.1:8090 --db agileflow.db --token <secret>

mod api;
mod auth;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use agileflow_core::Database;
use state::AppState;

/// agileflowd: AgileFlow tracker API server
#[derive(Parser, Debug)]
#[command(name = "agileflowd")]
#[command(about = "HTTP API server for the AgileFlow issue tracker")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:8090")]
    bind: SocketAddr,

    /// Path to the SQLite database file
    #[arg(short, long, default_value = "agileflow.db")]
    db: PathBuf,

    /// Bearer token required on /api routes (falls back to AGILEFLOW_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Allow cross-origin requests (for frontend development)
    #[arg(long)]
    cors: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let token = args
        .token
        .or_else(|| std::env::var("AGILEFLOW_TOKEN").ok());

    info!("Starting agileflowd");
    info!("  Bind address: {}", args.bind);
    info!("  Database: {}", args.db.display());
    if token.is_none() {
        warn!("no bearer token configured; /api routes are unauthenticated");
    }

    let db = Database::open(&args.db)
        .with_context(|| format!("failed to open database at {}", args.db.display()))?;

    let state = Arc::new(AppState {
        db: Mutex::new(db),
        token,
    });

    let mut app = api::router(state);
    if args.cors {
        app = app.layer(tower_http::cors::CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind to {}", args.bind))?;
    info!("Listening on: {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("agileflowd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}
