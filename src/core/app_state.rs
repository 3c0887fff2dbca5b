use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::config;

/// Shared state for the HTTP boundary.
///
/// The boundary itself holds no browser; every `/scrape` request spawns the
/// `listing-scout-dump` binary, so concurrent requests are fully isolated.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Path to the pipeline binary the boundary shells out to.
    pub dump_bin: PathBuf,
    /// Root under which request-scoped artifact directories are created.
    pub artifact_root: PathBuf,
    /// Hard wall-clock ceiling per pipeline subprocess.
    pub boundary_timeout: Duration,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            dump_bin: resolve_dump_bin(),
            artifact_root: resolve_artifact_root(),
            boundary_timeout: config::boundary_timeout(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// `LISTING_SCOUT_DUMP_BIN` override, else the `listing-scout-dump` binary
/// sitting next to the server executable (the normal `cargo install` /
/// `target/` layout).
fn resolve_dump_bin() -> PathBuf {
    if let Ok(p) = env::var(config::ENV_DUMP_BIN) {
        let p = p.trim();
        if !p.is_empty() {
            return PathBuf::from(p);
        }
    }

    let sibling = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join("listing-scout-dump")));
    sibling.unwrap_or_else(|| PathBuf::from("listing-scout-dump"))
}

fn resolve_artifact_root() -> PathBuf {
    if let Ok(p) = env::var(config::ENV_ARTIFACT_DIR) {
        let p = p.trim();
        if !p.is_empty() {
            return PathBuf::from(p);
        }
    }
    env::temp_dir()
}
