//! File node implementation.

use std::any::Any;
use std::sync::RwLock;

use url::Url;

use super::types::{NodeId, NodeKind, SiteNode};

/// Default file permissions (rw-r--r--).
pub const DEFAULT_FILE_PERMS: u16 = 0o644;

/// File node representing one image on a page.
///
/// The node carries only the image URL; content and size are fetched
/// on demand. When a later scan maps the same basename to a different
/// image, the URL is swapped in place and the node ID stays stable.
#[derive(Debug)]
pub struct ImageFile {
    /// Node ID.
    id: NodeId,
    /// Parent directory node ID.
    parent_id: NodeId,
    /// File name (image basename).
    name: String,
    /// Image URL, last scan wins.
    url: RwLock<Url>,
}

impl ImageFile {
    /// Create a new file node.
    ///
    /// # Arguments
    /// * `id` - Node ID
    /// * `parent_id` - Parent directory node ID
    /// * `name` - Image basename
    /// * `url` - Image URL
    pub fn new(id: NodeId, parent_id: NodeId, name: String, url: Url) -> Self {
        Self {
            id,
            parent_id,
            name,
            url: RwLock::new(url),
        }
    }

    /// Get the current image URL.
    pub fn url(&self) -> Url {
        let url: std::sync::RwLockReadGuard<'_, Url> = self.url.read().unwrap();
        url.clone()
    }

    /// Replace the image URL.
    pub fn set_url(&self, url: Url) {
        let mut guard: std::sync::RwLockWriteGuard<'_, Url> = self.url.write().unwrap();
        *guard = url;
    }
}

impl SiteNode for ImageFile {
    fn id(&self) -> NodeId {
        self.id
    }

    fn parent_id(&self) -> NodeId {
        self.parent_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    fn permissions(&self) -> u16 {
        DEFAULT_FILE_PERMS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
