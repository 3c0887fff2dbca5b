//! Results-pane discovery.
//!
//! The listings panel is rendered dynamically and its class names have
//! changed across page redesigns, so location is strategy-based: an ordered
//! list of selectors is tried in sequence, each with its own bounded
//! appearance wait, and the first match wins. Structural class selectors
//! come first (fast, specific to known layouts); semantic role selectors
//! come last, since role attributes survive redesigns that class names do
//! not.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::scraping::loader::ResultsPane;

/// One way of finding the scrollable results container.
#[derive(Clone, Copy, Debug)]
pub struct PaneStrategy {
    pub label: &'static str,
    pub selector: &'static str,
}

/// Candidate strategies, most-specific first, most-generic last.
pub const PANE_STRATEGIES: &[PaneStrategy] = &[
    PaneStrategy {
        label: "widget pane (older layout)",
        selector: "div.widget-pane-content.scrollable-y",
    },
    PaneStrategy {
        label: "section scrollbox (newer layout)",
        selector: "div.section-layout.section-scrollbox.scrollable-y",
    },
    PaneStrategy {
        label: "bare section scrollbox",
        selector: "div.section-scrollbox",
    },
    PaneStrategy {
        label: "feed role",
        selector: "div[role='feed']",
    },
    PaneStrategy {
        label: "region role",
        selector: "div[role='region']",
    },
];

const APPEARANCE_POLL: Duration = Duration::from_millis(250);

/// A located results pane: a reference into the live page's element tree.
///
/// Discovered, not owned: the reference dies with the session, and a page
/// reload invalidates it. The loader and extractor both operate on the one
/// instance `locate` returned. Scroll and measurement go through the winning
/// selector on the same page; the located element itself backs the text
/// reads.
pub struct Pane {
    page: Page,
    element: Element,
    pub strategy: PaneStrategy,
}

/// Try each strategy in order, giving each its own bounded wait for the
/// element to appear. Short-circuits on the first match; exhausting the
/// whole list is `PaneNotFound`.
pub async fn locate(page: &Page, per_strategy_timeout: Duration) -> Result<Pane, ScrapeError> {
    for (i, strategy) in PANE_STRATEGIES.iter().enumerate() {
        match wait_for_element(page, strategy.selector, per_strategy_timeout).await {
            Some(element) => {
                info!(
                    "✅ Results pane located via strategy #{} ({})",
                    i + 1,
                    strategy.label
                );
                return Ok(Pane {
                    page: page.clone(),
                    element,
                    strategy: *strategy,
                });
            }
            None => {
                debug!(
                    "pane strategy #{} ({}) found nothing within {:?}",
                    i + 1,
                    strategy.label,
                    per_strategy_timeout
                );
            }
        }
    }
    Err(ScrapeError::PaneNotFound)
}

/// Poll for a selector until it appears or the timeout elapses.
async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> Option<Element> {
    let start = Instant::now();
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Some(element);
        }
        if start.elapsed() >= timeout {
            return None;
        }
        tokio::time::sleep(APPEARANCE_POLL).await;
    }
}

impl Pane {
    /// Run a script against the pane node; `null` means the node is gone.
    async fn eval_on_pane(&self, body: &str) -> Result<serde_json::Value, ScrapeError> {
        let script = format!(
            "(() => {{ const p = document.querySelector(\"{}\"); if (!p) return null; {} }})()",
            self.strategy.selector, body
        );
        let value = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::StalePane(e.to_string()))?
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null);

        if value.is_null() {
            return Err(ScrapeError::StalePane(format!(
                "selector {} no longer matches",
                self.strategy.selector
            )));
        }
        Ok(value)
    }
}

#[async_trait]
impl ResultsPane for Pane {
    async fn scroll_to_end(&self) -> Result<(), ScrapeError> {
        self.eval_on_pane("p.scrollTo(0, p.scrollHeight); return true;")
            .await?;
        Ok(())
    }

    async fn content_extent(&self) -> Result<i64, ScrapeError> {
        let value = self.eval_on_pane("return p.scrollHeight;").await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .ok_or_else(|| {
                ScrapeError::StalePane("pane scrollHeight was not a number".to_string())
            })
    }

    async fn visible_text(&self) -> Result<String, ScrapeError> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| ScrapeError::StalePane(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_ordered_specific_to_generic() {
        // Structural class selectors first, role-based fallbacks last.
        assert_eq!(
            PANE_STRATEGIES[0].selector,
            "div.widget-pane-content.scrollable-y"
        );
        assert!(PANE_STRATEGIES[3].selector.contains("role='feed'"));
        assert!(PANE_STRATEGIES
            .last()
            .unwrap()
            .selector
            .contains("role='region'"));
    }

    #[test]
    fn strategies_are_distinct() {
        let mut selectors: Vec<&str> = PANE_STRATEGIES.iter().map(|s| s.selector).collect();
        selectors.sort_unstable();
        selectors.dedup();
        assert_eq!(selectors.len(), PANE_STRATEGIES.len());
    }

    #[test]
    fn selectors_embed_cleanly_in_the_eval_script() {
        // Scroll/measure scripts wrap the selector in double quotes.
        for s in PANE_STRATEGIES {
            assert!(!s.selector.contains('"'), "{} would break the script", s.selector);
        }
    }
}
