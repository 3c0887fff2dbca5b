//! Final text extraction from the fully-loaded pane.

use crate::error::ScrapeError;
use crate::scraping::loader::ResultsPane;

/// Snapshot the pane's current visible text, verbatim.
///
/// The only failure mode is the pane reference having gone stale, which the
/// driver surfaces as [`ScrapeError::StalePane`].
pub async fn extract<P: ResultsPane + ?Sized>(pane: &P) -> Result<String, ScrapeError> {
    pane.visible_text().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedPane(&'static str);

    #[async_trait]
    impl ResultsPane for FixedPane {
        async fn scroll_to_end(&self) -> Result<(), ScrapeError> {
            Ok(())
        }
        async fn content_extent(&self) -> Result<i64, ScrapeError> {
            Ok(0)
        }
        async fn visible_text(&self) -> Result<String, ScrapeError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn returns_pane_text_verbatim() {
        let pane = FixedPane("Acme Cleaners\n4.8 stars\nOpen 24 hours");
        let text = extract(&pane).await.unwrap();
        assert_eq!(text, "Acme Cleaners\n4.8 stars\nOpen 24 hours");
    }
}
