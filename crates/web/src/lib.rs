//! Web boundary for sitefs.
//!
//! Everything that touches the network lives here:
//! - `WebClient` - transport seam (HTTP in production, memory in tests)
//! - `HttpWebClient` - reqwest-backed implementation
//! - `PageScanner` - extracts image and link URLs from fetched pages

pub mod client;
pub mod error;
pub mod http;
pub mod scanner;

pub use client::{MemoryWebClient, WebClient};
pub use error::WebError;
pub use http::HttpWebClient;
pub use scanner::PageScanner;
