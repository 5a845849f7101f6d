//! Error types for URL and name codec operations.

use thiserror::Error;

/// Errors that can occur while normalizing URLs or decoding entry names.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("encoded name '{name}' is not a link: {reason}")]
    Decode { name: String, reason: String },
}

impl ModelError {
    pub(crate) fn decode(name: &str, reason: impl std::fmt::Display) -> Self {
        ModelError::Decode {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
