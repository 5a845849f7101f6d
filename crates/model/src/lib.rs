//! URL and entry-name model for sitefs.
//!
//! Pure, I/O-free building blocks shared by the web and filesystem
//! layers:
//! - `normalize` - resolve raw page candidates into absolute URLs
//! - `encode_link` / `decode_link` - reversible mapping between link
//!   URLs and filesystem-safe directory names
//! - `image_name` - display name for an image URL

pub mod error;
pub mod name;
pub mod normalize;

pub use error::ModelError;
pub use name::{decode_link, encode_link, image_name};
pub use normalize::normalize;
