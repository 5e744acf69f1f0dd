//! Development server that answers the repository archive endpoint from a
//! directory of checked-out revisions (`<data-dir>/<project>/<revision>/`).

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, extract::Path};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[path = "archive_server/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "archive_server/handlers.rs"]
mod handlers;
use self::handlers::*;
#[path = "archive_server/runtime.rs"]
mod runtime;
use self::runtime::*;

struct AppState {
    data_dir: PathBuf,

    // Bearer token required on archive requests when set.
    token: Option<String>,

    // Remaining archive requests to answer with 503 (retry testing).
    fail_remaining: AtomicU32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
