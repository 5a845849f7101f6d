//! Error types for web fetching and scanning.

use thiserror::Error;

/// Errors that can occur while talking to the remote site.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("document parse failed: {0}")]
    Parse(String),
}
