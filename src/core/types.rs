use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// User-supplied search term. Absent and empty are treated the same;
    /// both are rejected before any browser work starts.
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    /// The pane's final visible text, relayed verbatim.
    pub results: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
