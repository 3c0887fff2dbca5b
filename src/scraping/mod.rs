//! The scrape pipeline: session → navigate → locate pane → load all →
//! extract.

pub mod extract;
pub mod loader;
pub mod pane;
pub mod session;

use std::time::Duration;

use tracing::info;

use crate::core::config;
use crate::error::ScrapeError;
use session::{LaunchOptions, Session};

const MAPS_SEARCH_BASE: &str = "https://www.google.com/maps/search/";

/// Knobs for one pipeline run.
#[derive(Clone, Debug)]
pub struct ScrapeOptions {
    pub launch: LaunchOptions,
    /// Appearance budget per pane-location strategy.
    pub pane_timeout: Duration,
    /// Hard budget for the incremental scroll loop.
    pub scroll_timeout: Duration,
    /// Pause between scroll commands.
    pub poll_interval: Duration,
}

impl ScrapeOptions {
    /// Defaults, with env-var overrides applied (see `core::config`).
    pub fn from_env() -> Self {
        Self {
            launch: LaunchOptions::default(),
            pane_timeout: config::pane_timeout(),
            scroll_timeout: config::scroll_timeout(),
            poll_interval: config::poll_interval(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.launch.headless = headless;
        self
    }
}

/// Build the maps search URL for a query (`+` for spaces, percent-escapes
/// otherwise).
pub fn maps_search_url(query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    format!("{}{}/", MAPS_SEARCH_BASE, encoded)
}

/// Run the whole pipeline for one query and return the pane's final visible
/// text.
///
/// The session is torn down on every exit path: the fallible stages run
/// inside an inner future, and `close` runs after it regardless of outcome
/// (with close-on-drop as the backstop for cancellation).
pub async fn scrape_listings(query: &str, opts: &ScrapeOptions) -> Result<String, ScrapeError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ScrapeError::InvalidInput("empty query".to_string()));
    }

    let url = maps_search_url(query);
    let mut session = Session::launch(&opts.launch).await?;

    let result: Result<String, ScrapeError> = async {
        let page = session.open(&url).await?;
        let pane = pane::locate(&page, opts.pane_timeout).await?;
        let outcome = loader::load_all(&pane, opts.scroll_timeout, opts.poll_interval).await?;
        info!("scroll loop finished: {:?}", outcome);
        extract::extract(&pane).await
    }
    .await;

    // Teardown must not be skipped by an error above.
    session.close().await;

    if let Ok(text) = &result {
        info!("✅ Extracted {} chars for query '{}'", text.len(), query);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_uses_plus_encoding() {
        assert_eq!(
            maps_search_url("cleaning services singapore"),
            "https://www.google.com/maps/search/cleaning+services+singapore/"
        );
    }

    #[test]
    fn search_url_escapes_reserved_characters() {
        let url = maps_search_url("cafés & bars");
        assert!(url.starts_with(MAPS_SEARCH_BASE));
        assert!(url.ends_with('/'));
        assert!(!url.contains('&'));
        assert!(!url.contains(' '));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_launch() {
        let err = scrape_listings("   ", &ScrapeOptions::from_env())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(_)));
    }
}
