//! WebClient trait for page and content retrieval.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use url::Url;

use crate::error::WebError;

/// Trait for types that can fetch remote site content.
///
/// Implement this trait to integrate with different transports
/// (HTTP, memory, etc.).
#[async_trait]
pub trait WebClient: Send + Sync {
    /// Fetch a page body as text.
    ///
    /// # Arguments
    /// * `url` - Page URL
    ///
    /// # Returns
    /// The document text.
    async fn fetch_page(&self, url: &Url) -> Result<String, WebError>;

    /// Fetch a resource body as raw bytes.
    ///
    /// # Arguments
    /// * `url` - Resource URL
    ///
    /// # Returns
    /// The entire body, buffered.
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, WebError>;
}

/// In-memory web client for testing.
///
/// Serves pre-registered pages and resources and counts fetches so
/// tests can assert on fetch-per-operation behavior.
#[derive(Debug, Default)]
pub struct MemoryWebClient {
    /// Page text by URL.
    pages: HashMap<String, String>,
    /// Resource bytes by URL.
    resources: HashMap<String, Vec<u8>>,
    page_fetches: AtomicUsize,
    byte_fetches: AtomicUsize,
}

impl MemoryWebClient {
    /// Create a new empty memory client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page body.
    pub fn insert_page(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(url.into(), body.into());
    }

    /// Register resource bytes.
    pub fn insert_bytes(&mut self, url: impl Into<String>, data: Vec<u8>) {
        self.resources.insert(url.into(), data);
    }

    /// Number of `fetch_page` calls so far.
    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    /// Number of `fetch_bytes` calls so far.
    pub fn byte_fetches(&self) -> usize {
        self.byte_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebClient for MemoryWebClient {
    async fn fetch_page(&self, url: &Url) -> Result<String, WebError> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| WebError::Fetch {
                url: url.to_string(),
                source: "page not registered in memory client".into(),
            })
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, WebError> {
        self.byte_fetches.fetch_add(1, Ordering::SeqCst);
        self.resources
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| WebError::Fetch {
                url: url.to_string(),
                source: "resource not registered in memory client".into(),
            })
    }
}
