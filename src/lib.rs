pub mod artifact;
pub mod boundary;
pub mod core;
pub mod error;
pub mod scraping;

// --- Primary core exports ---
pub use crate::core::types;
pub use crate::core::types::*;
pub use crate::core::AppState;
pub use error::ScrapeError;
pub use scraping::{scrape_listings, ScrapeOptions};
