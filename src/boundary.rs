//! HTTP request boundary.
//!
//! Accepts a query, runs the scrape pipeline **out-of-process** (the
//! `listing-scout-dump` binary), and relays the dump text or a structured
//! error. Each invocation gets its own uuid-named artifact directory, so
//! concurrent requests (including identical queries) never read each
//! other's dumps.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::artifact;
use crate::core::types::{ErrorResponse, ScrapeRequest, ScrapeResponse};
use crate::core::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/scrape", post(scrape_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "listing-scout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(msg: impl Into<String>) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: msg.into() }),
    )
}

fn internal(msg: impl Into<String>) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: msg.into() }),
    )
}

async fn scrape_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, HandlerError> {
    let query = request.query.trim().to_string();
    // Cheapest possible rejection: nothing is spawned for a blank query.
    if query.is_empty() {
        return Err(bad_request("Missing query"));
    }

    info!("Processing scrape request: {}", query);

    let run_dir = state
        .artifact_root
        .join(format!("listing-scout-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&run_dir).await.map_err(|e| {
        error!("failed to create artifact dir {}: {}", run_dir.display(), e);
        internal(format!("failed to prepare artifact directory: {}", e))
    })?;

    let result = run_pipeline(&state, &query, &run_dir).await;

    if let Err(e) = tokio::fs::remove_dir_all(&run_dir).await {
        warn!("artifact dir cleanup failed for {}: {}", run_dir.display(), e);
    }

    match result {
        Ok(text) => Ok(Json(ScrapeResponse { results: text })),
        Err(e) => {
            error!("Scrape error for '{}': {}", query, e.1.error);
            Err(e)
        }
    }
}

/// Spawn the dump binary, bound its runtime, and read back its artifact.
async fn run_pipeline(
    state: &AppState,
    query: &str,
    run_dir: &Path,
) -> Result<String, HandlerError> {
    let mut cmd = tokio::process::Command::new(&state.dump_bin);
    cmd.arg(query)
        .arg("--headless")
        .arg("--out-dir")
        .arg(run_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // If the timeout below drops the wait future, the child (and the
        // browser it owns) must die with it.
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
        internal(format!(
            "failed to start scrape pipeline ({}): {}",
            state.dump_bin.display(),
            e
        ))
    })?;

    let output = match tokio::time::timeout(state.boundary_timeout, child.wait_with_output()).await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(internal(format!("scrape pipeline failed: {}", e))),
        Err(_) => {
            return Err(internal(format!(
                "scrape pipeline exceeded {:?} and was killed",
                state.boundary_timeout
            )))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let msg = if stderr.is_empty() {
            format!("scrape pipeline exited with {}", output.status)
        } else {
            stderr.to_string()
        };
        return Err(internal(msg));
    }

    // The pipeline prints the dump path as its sole stdout output.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let dump_path = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| internal("scrape pipeline reported no dump path"))?;

    let text = artifact::read_dump(&dump_path)
        .await
        .map_err(|e| internal(e.to_string()))?;
    artifact::discard_dump(&dump_path).await;

    Ok(text)
}
