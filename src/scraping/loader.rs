//! Incremental loading of the results pane.
//!
//! The page lazy-loads listings as the pane scrolls, and there is no event
//! to subscribe to when a batch has finished rendering, so the loop is
//! cooperative polling: scroll to the bottom, wait a fixed quantum,
//! re-measure, decide. Termination is dual: the page's explicit end-of-list
//! phrase when it renders, sustained non-growth past the deadline when it
//! does not (layout variance means the marker cannot be relied on).
//!
//! The decision logic is a pure function over the iteration's readings so
//! the termination behavior is testable without a browser.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ScrapeError;

/// Status phrase the page renders when no further lazy-loaded content
/// remains. Matched case-insensitively, without the apostrophe-carrying
/// prefix: the page has shipped both straight and curly quotes.
pub const END_OF_LIST_MARKER: &str = "reached the end of the list";

/// Driver seam over the located pane. The real implementation lives in
/// [`super::pane::Pane`]; tests substitute scripted panes.
#[async_trait]
pub trait ResultsPane: Send + Sync {
    /// Command the pane to scroll to its current maximum extent.
    async fn scroll_to_end(&self) -> Result<(), ScrapeError>;
    /// Re-measure the pane's scrollable height.
    async fn content_extent(&self) -> Result<i64, ScrapeError>;
    /// Re-read the pane's visible text.
    async fn visible_text(&self) -> Result<String, ScrapeError>;
}

/// Loop state. Both terminal states are success exits for the caller:
/// partial results are still useful, so "end reached" and "budget exhausted
/// while still growing" are treated identically upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Scrolling,
    /// End of list reached: explicit marker, or sustained stall past the
    /// deadline.
    Done,
    /// Time budget exhausted while content was still growing.
    TimedOut,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LoadState::Scrolling)
    }
}

fn contains_end_marker(text: &str) -> bool {
    text.to_lowercase().contains(END_OF_LIST_MARKER)
}

/// Decide the next state from one iteration's readings.
///
/// The marker is checked first, every iteration, so a rendered marker always
/// wins over a stall verdict within the same iteration. A single unchanged
/// extent reading before the deadline never terminates the loop; content
/// may still be loading asynchronously; only non-growth observed at or past
/// the deadline counts as exhaustion.
fn evaluate_iteration(
    text: &str,
    extent: i64,
    last_extent: Option<i64>,
    elapsed: Duration,
    timeout: Duration,
) -> LoadState {
    if contains_end_marker(text) {
        return LoadState::Done;
    }
    if elapsed >= timeout {
        if last_extent == Some(extent) {
            // Stalled at the deadline: implicit end of list.
            return LoadState::Done;
        }
        return LoadState::TimedOut;
    }
    LoadState::Scrolling
}

/// Drive the pane until the list is fully materialized or the budget runs
/// out. Never retries and never fails on its own termination logic; the only
/// error source is the pane reference itself going stale.
///
/// Always returns within `timeout + poll_interval` wall-clock (plus CDP
/// round-trip slack).
pub async fn load_all<P: ResultsPane + ?Sized>(
    pane: &P,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<LoadState, ScrapeError> {
    let started = Instant::now();
    let mut last_extent: Option<i64> = None;
    let mut iterations = 0u32;

    loop {
        pane.scroll_to_end().await?;
        tokio::time::sleep(poll_interval).await;

        let extent = pane.content_extent().await?;
        let text = pane.visible_text().await?;
        iterations += 1;

        let state = evaluate_iteration(&text, extent, last_extent, started.elapsed(), timeout);
        match state {
            LoadState::Done => {
                info!(
                    "📜 Pane fully loaded after {} scroll passes ({:?})",
                    iterations,
                    started.elapsed()
                );
                return Ok(state);
            }
            LoadState::TimedOut => {
                info!(
                    "⏳ Scroll budget exhausted after {} passes ({:?}), keeping partial list",
                    iterations,
                    started.elapsed()
                );
                return Ok(state);
            }
            LoadState::Scrolling => {
                debug!("pane extent {} after pass {}", extent, iterations);
                last_extent = Some(extent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

    const SECOND: Duration = Duration::from_secs(1);

    // ── Pure decision-function tests ─────────────────────────────────

    #[test]
    fn marker_terminates_immediately() {
        let state = evaluate_iteration(
            "Listing A\nYou've reached the end of the list.",
            500,
            None,
            Duration::ZERO,
            SECOND,
        );
        assert_eq!(state, LoadState::Done);
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        let state = evaluate_iteration(
            "REACHED THE END OF THE LIST",
            500,
            Some(400),
            Duration::ZERO,
            SECOND,
        );
        assert_eq!(state, LoadState::Done);
    }

    #[test]
    fn marker_wins_over_stall_in_same_iteration() {
        // Both conditions hold; the marker verdict must be the one taken.
        let state = evaluate_iteration(
            "you've Reached the End of the list",
            500,
            Some(500),
            2 * SECOND,
            SECOND,
        );
        assert_eq!(state, LoadState::Done);
    }

    #[test]
    fn single_unchanged_reading_before_deadline_keeps_scrolling() {
        let state = evaluate_iteration("Listing A", 500, Some(500), Duration::from_millis(10), SECOND);
        assert_eq!(state, LoadState::Scrolling);
    }

    #[test]
    fn stall_past_deadline_is_done() {
        let state = evaluate_iteration("Listing A", 500, Some(500), 2 * SECOND, SECOND);
        assert_eq!(state, LoadState::Done);
    }

    #[test]
    fn growth_past_deadline_is_timed_out() {
        let state = evaluate_iteration("Listing A", 700, Some(500), 2 * SECOND, SECOND);
        assert_eq!(state, LoadState::TimedOut);
    }

    #[test]
    fn growth_before_deadline_keeps_scrolling() {
        let state = evaluate_iteration("Listing A", 700, Some(500), Duration::from_millis(10), SECOND);
        assert_eq!(state, LoadState::Scrolling);
    }

    #[test]
    fn first_iteration_past_deadline_without_baseline_times_out() {
        // No previous reading to compare against, so no stall claim.
        let state = evaluate_iteration("Listing A", 500, None, 2 * SECOND, SECOND);
        assert_eq!(state, LoadState::TimedOut);
    }

    #[test]
    fn terminal_states() {
        assert!(!LoadState::Scrolling.is_terminal());
        assert!(LoadState::Done.is_terminal());
        assert!(LoadState::TimedOut.is_terminal());
    }

    // ── Scripted-pane loop tests ─────────────────────────────────────

    /// Pane whose extent either grows by `growth` per scroll or holds still,
    /// with a fixed text.
    struct ScriptedPane {
        text: String,
        extent: AtomicI64,
        growth: i64,
        scrolls: AtomicU32,
    }

    impl ScriptedPane {
        fn new(text: &str, growth: i64) -> Self {
            Self {
                text: text.to_string(),
                extent: AtomicI64::new(1000),
                growth,
                scrolls: AtomicU32::new(0),
            }
        }

        fn scroll_count(&self) -> u32 {
            self.scrolls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResultsPane for ScriptedPane {
        async fn scroll_to_end(&self) -> Result<(), ScrapeError> {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            self.extent.fetch_add(self.growth, Ordering::SeqCst);
            Ok(())
        }

        async fn content_extent(&self) -> Result<i64, ScrapeError> {
            Ok(self.extent.load(Ordering::SeqCst))
        }

        async fn visible_text(&self) -> Result<String, ScrapeError> {
            Ok(self.text.clone())
        }
    }

    #[tokio::test]
    async fn marker_text_returns_done_without_reaching_timeout() {
        let pane = ScriptedPane::new("Café X\nCafé Y\nReached the End of the List", 200);
        let started = Instant::now();
        let state = load_all(&pane, Duration::from_secs(30), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(state, LoadState::Done);
        assert_eq!(pane.scroll_count(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn frozen_extent_terminates_at_or_after_timeout() {
        let timeout = Duration::from_millis(150);
        let pane = ScriptedPane::new("Listing A\nListing B", 0);
        let started = Instant::now();
        let state = load_all(&pane, timeout, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(state, LoadState::Done);
        assert!(started.elapsed() >= timeout);
        assert!(pane.scroll_count() > 1);
    }

    #[tokio::test]
    async fn endless_growth_still_terminates_within_budget() {
        let timeout = Duration::from_millis(150);
        let poll = Duration::from_millis(20);
        let pane = ScriptedPane::new("Listing A", 200);
        let started = Instant::now();
        let state = load_all(&pane, timeout, poll).await.unwrap();
        assert_eq!(state, LoadState::TimedOut);
        // Terminates within timeout + poll_interval, with slack for the
        // scripted pane's (instant) round trips.
        assert!(started.elapsed() >= timeout);
        assert!(started.elapsed() < timeout + poll + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn stale_pane_surfaces_the_error() {
        struct StalePaneStub;

        #[async_trait]
        impl ResultsPane for StalePaneStub {
            async fn scroll_to_end(&self) -> Result<(), ScrapeError> {
                Err(ScrapeError::StalePane("node detached".to_string()))
            }
            async fn content_extent(&self) -> Result<i64, ScrapeError> {
                unreachable!()
            }
            async fn visible_text(&self) -> Result<String, ScrapeError> {
                unreachable!()
            }
        }

        let err = load_all(&StalePaneStub, SECOND, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::StalePane(_)));
    }
}
