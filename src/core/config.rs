use std::path::Path;
use std::time::Duration;

pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_PANE_TIMEOUT_SECS: &str = "LISTING_SCOUT_PANE_TIMEOUT_SECS";
pub const ENV_SCROLL_TIMEOUT_SECS: &str = "LISTING_SCOUT_SCROLL_TIMEOUT_SECS";
pub const ENV_POLL_MS: &str = "LISTING_SCOUT_POLL_MS";
pub const ENV_DUMP_BIN: &str = "LISTING_SCOUT_DUMP_BIN";
pub const ENV_ARTIFACT_DIR: &str = "LISTING_SCOUT_ARTIFACT_DIR";
pub const ENV_BOUNDARY_TIMEOUT_SECS: &str = "LISTING_SCOUT_BOUNDARY_TIMEOUT_SECS";

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Optional override for the Chromium-family browser executable.
///
/// Default behavior is **auto-discovery** (see `scraping::session::find_chrome_executable()`).
/// This function only returns a value when `CHROME_EXECUTABLE` is set to an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    if Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

/// Per-strategy appearance budget for the pane locator. Default: 30s.
pub fn pane_timeout() -> Duration {
    Duration::from_secs(env_u64(ENV_PANE_TIMEOUT_SECS, 30))
}

/// Hard budget for the incremental scroll loop. Default: 75s.
pub fn scroll_timeout() -> Duration {
    Duration::from_secs(env_u64(ENV_SCROLL_TIMEOUT_SECS, 75))
}

/// Pause between scroll commands while lazy content loads. Default: 100ms.
pub fn poll_interval() -> Duration {
    Duration::from_millis(env_u64(ENV_POLL_MS, 100))
}

/// Wall-clock ceiling for one boundary-spawned pipeline run. Default: 300s.
///
/// Every stage inside the pipeline is individually bounded; this is the
/// last-resort caller-side cancellation the HTTP boundary enforces.
pub fn boundary_timeout() -> Duration {
    Duration::from_secs(env_u64(ENV_BOUNDARY_TIMEOUT_SECS, 300))
}
