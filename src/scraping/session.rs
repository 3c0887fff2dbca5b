//! Controlled browser sessions using `chromiumoxide`.
//!
//! This module is the single source of truth for:
//! * Finding a usable Chromium-family executable (env override → PATH →
//!   well-known install paths).
//! * Building a stealth `BrowserConfig`: fixed viewport, image blocking,
//!   automation fingerprint suppressed, randomized desktop user-agent.
//! * `Session`, an exclusively-owned browser handle, created per scrape and
//!   torn down on every exit path.

use std::path::Path;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use rand::seq::IndexedRandom;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::config;
use crate::error::ScrapeError;

// ── Realistic User-Agent pool ────────────────────────────────────────────────

const DESKTOP_USER_AGENTS: &[&str] = &[
    // Chrome 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 132 – macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 131 – Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Edge 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
];

/// Returns a randomly-chosen realistic desktop User-Agent string.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    DESKTOP_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
}

// ── Browser executable discovery ─────────────────────────────────────────────

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan – finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = config::chrome_executable_override() {
        return Some(p);
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/brave-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

// ── Launch configuration ─────────────────────────────────────────────────────

/// Recognized session options.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    /// No UI surface.
    pub headless: bool,
    /// Skip image network fetches for speed.
    pub block_images: bool,
    /// Fixed width×height for deterministic layout.
    pub viewport: (u32, u32),
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            block_images: true,
            viewport: (1920, 1080),
        }
    }
}

/// Build a `BrowserConfig` with stealth defaults.
///
/// Flags chosen for:
/// * Compatibility with CI / restricted environments (`--no-sandbox`, `--disable-dev-shm-usage`).
/// * Stealth: `--disable-blink-features=AutomationControlled` hides the
///   `navigator.webdriver` flag; UA is randomly drawn from `DESKTOP_USER_AGENTS`.
fn build_config(exe: &str, opts: &LaunchOptions) -> Result<BrowserConfig, ScrapeError> {
    let ua = random_user_agent();
    let (width, height) = opts.viewport;

    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--disable-gpu")
        .arg("--no-sandbox") // often required in CI / restricted environments
        .arg("--disable-dev-shm-usage") // avoids /dev/shm OOM in constrained environments
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio")
        // Stealth: suppress CDP automation fingerprint
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={}", ua));

    if opts.block_images {
        builder = builder.arg("--blink-settings=imagesEnabled=false");
    }
    builder = if opts.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    builder
        .build()
        .map_err(|e| ScrapeError::Launch(format!("failed to build browser config: {}", e)))
}

// ── Session handle ───────────────────────────────────────────────────────────

/// An exclusively-owned, per-request browser instance.
///
/// Created by [`Session::launch`], destroyed by [`Session::close`]. `Drop`
/// spawns a best-effort close as a backstop so no exit path leaks a
/// Chromium process.
pub struct Session {
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Start a controlled browser with the given options.
    pub async fn launch(opts: &LaunchOptions) -> Result<Self, ScrapeError> {
        let exe = find_chrome_executable().ok_or_else(|| {
            ScrapeError::Launch(
                "no browser found; install Chrome or Chromium, or set CHROME_EXECUTABLE"
                    .to_string(),
            )
        })?;

        info!("🚀 Launching browser session ({})", exe);
        let config = build_config(&exe, opts)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Launch(format!("failed to launch ({}): {}", exe, e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler_task: Some(handler_task),
        })
    }

    /// Open the results page in a fresh tab and wait for navigation.
    pub async fn open(&self, url: &str) -> Result<Page, ScrapeError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScrapeError::Launch("session already closed".to_string()))?;

        info!("🌐 Navigating to: {}", url);
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| ScrapeError::Navigation(format!("{}: {}", url, e)))?;

        if let Err(e) = page.wait_for_navigation().await {
            // The pane locator has its own appearance wait, so a noisy load
            // event is not fatal here.
            warn!("navigation settle incomplete: {}", e);
        }

        Ok(page)
    }

    /// Gracefully close the browser and stop the CDP handler task.
    pub async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close error (non-fatal): {}", e);
            }
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        info!("🛑 Browser session torn down");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best-effort cleanup. Drop cannot await; if we're inside a tokio
        // runtime, spawn a task to close the browser to avoid zombie
        // Chromium processes.
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        handle.spawn(async move {
            let _ = browser.close().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_pool_is_desktop_only() {
        for _ in 0..16 {
            let ua = random_user_agent();
            assert!(ua.contains("Mozilla/5.0"));
            assert!(!ua.contains("Mobile"));
        }
    }

    #[test]
    fn default_options_are_headless_with_fixed_viewport() {
        let opts = LaunchOptions::default();
        assert!(opts.headless);
        assert!(opts.block_images);
        assert_eq!(opts.viewport, (1920, 1080));
    }
}
