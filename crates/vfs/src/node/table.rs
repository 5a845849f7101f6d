//! Node table for allocating and tracking nodes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use url::Url;

use crate::VfsError;

use super::dir::{DirEntry, PageDir};
use super::file::ImageFile;
use super::types::{NodeId, NodeKind, SiteNode, ROOT_NODE};

/// Tracks every node of the mounted site.
///
/// The root node projects the entry-point site URL; all other nodes are
/// materialized lazily, either by a directory resolution or by looking
/// up a decodable link name directly.
pub struct NodeTable {
    /// Next node ID to allocate.
    next_id: AtomicU64,
    /// All nodes by ID.
    nodes: RwLock<HashMap<NodeId, Arc<dyn SiteNode>>>,
}

impl NodeTable {
    /// Create a new node table with a root directory for `site_url`.
    pub fn new(site_url: Url) -> Self {
        let table = Self {
            next_id: AtomicU64::new(ROOT_NODE + 1),
            nodes: RwLock::new(HashMap::new()),
        };

        let root: Arc<PageDir> =
            Arc::new(PageDir::new(ROOT_NODE, ROOT_NODE, String::new(), site_url));
        {
            let mut nodes: std::sync::RwLockWriteGuard<'_, HashMap<NodeId, Arc<dyn SiteNode>>> =
                table.nodes.write().unwrap();
            nodes.insert(ROOT_NODE, root);
        }

        table
    }

    /// Allocate a new node ID.
    fn allocate_id(&self) -> NodeId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<Arc<dyn SiteNode>> {
        let nodes: std::sync::RwLockReadGuard<'_, HashMap<NodeId, Arc<dyn SiteNode>>> =
            self.nodes.read().unwrap();
        nodes.get(&id).cloned()
    }

    /// Get the total number of nodes.
    pub fn node_count(&self) -> usize {
        let nodes: std::sync::RwLockReadGuard<'_, HashMap<NodeId, Arc<dyn SiteNode>>> =
            self.nodes.read().unwrap();
        nodes.len()
    }

    /// Remove a node from the table.
    pub fn remove(&self, id: NodeId) {
        let mut nodes: std::sync::RwLockWriteGuard<'_, HashMap<NodeId, Arc<dyn SiteNode>>> =
            self.nodes.write().unwrap();
        nodes.remove(&id);
    }

    fn insert(&self, id: NodeId, node: Arc<dyn SiteNode>) {
        let mut nodes: std::sync::RwLockWriteGuard<'_, HashMap<NodeId, Arc<dyn SiteNode>>> =
            self.nodes.write().unwrap();
        nodes.insert(id, node);
    }

    /// Get the page URL of a directory node.
    ///
    /// # Returns
    /// The URL, or an error if the node is missing or not a directory.
    pub fn dir_url(&self, id: NodeId) -> Result<Url, VfsError> {
        let node: Arc<dyn SiteNode> = self.get(id).ok_or(VfsError::NodeNotFound(id))?;
        let dir: &PageDir = node
            .as_any()
            .downcast_ref::<PageDir>()
            .ok_or(VfsError::NotADirectory(id))?;
        Ok(dir.url().clone())
    }

    /// Get the captured listing of a directory node.
    pub fn dir_entries(&self, id: NodeId) -> Result<Vec<DirEntry>, VfsError> {
        let node: Arc<dyn SiteNode> = self.get(id).ok_or(VfsError::NodeNotFound(id))?;
        let dir: &PageDir = node
            .as_any()
            .downcast_ref::<PageDir>()
            .ok_or(VfsError::NotADirectory(id))?;
        Ok(dir.entries())
    }

    /// Look up an image URL in a directory's index.
    pub fn image_url(&self, dir_id: NodeId, name: &str) -> Result<Url, VfsError> {
        let node: Arc<dyn SiteNode> = self.get(dir_id).ok_or(VfsError::NodeNotFound(dir_id))?;
        let dir: &PageDir = node
            .as_any()
            .downcast_ref::<PageDir>()
            .ok_or(VfsError::NotADirectory(dir_id))?;
        dir.image_url(name)
            .ok_or_else(|| VfsError::NotFound(name.to_string()))
    }

    /// Get the image URL of a file node.
    pub fn file_url(&self, id: NodeId) -> Result<Url, VfsError> {
        let node: Arc<dyn SiteNode> = self.get(id).ok_or(VfsError::NodeNotFound(id))?;
        let file: &ImageFile = node
            .as_any()
            .downcast_ref::<ImageFile>()
            .ok_or(VfsError::NotAFile(id))?;
        Ok(file.url())
    }

    /// Get or create the named directory child under `parent_id`.
    ///
    /// An existing directory child keeps its node ID. A file child of
    /// the same name is replaced.
    pub fn ensure_dir_child(
        &self,
        parent_id: NodeId,
        name: &str,
        url: Url,
    ) -> Result<NodeId, VfsError> {
        let parent: Arc<dyn SiteNode> =
            self.get(parent_id).ok_or(VfsError::NodeNotFound(parent_id))?;
        let parent_dir: &PageDir = parent
            .as_any()
            .downcast_ref::<PageDir>()
            .ok_or(VfsError::NotADirectory(parent_id))?;

        if let Some(existing) = parent_dir.child(name) {
            if let Some(node) = self.get(existing) {
                if node.kind() == NodeKind::Directory {
                    return Ok(existing);
                }
            }
            // The name changed kind since the last listing.
            self.remove(existing);
        }

        let id: NodeId = self.allocate_id();
        let dir: Arc<PageDir> = Arc::new(PageDir::new(id, parent_id, name.to_string(), url));
        self.insert(id, dir);
        parent_dir.add_child(name.to_string(), id);
        Ok(id)
    }

    /// Get or create the named file child under `parent_id`.
    ///
    /// An existing file child keeps its node ID and takes the new URL.
    /// A directory child of the same name is replaced.
    pub fn ensure_file_child(
        &self,
        parent_id: NodeId,
        name: &str,
        url: Url,
    ) -> Result<NodeId, VfsError> {
        let parent: Arc<dyn SiteNode> =
            self.get(parent_id).ok_or(VfsError::NodeNotFound(parent_id))?;
        let parent_dir: &PageDir = parent
            .as_any()
            .downcast_ref::<PageDir>()
            .ok_or(VfsError::NotADirectory(parent_id))?;

        if let Some(existing) = parent_dir.child(name) {
            if let Some(node) = self.get(existing) {
                if let Some(file) = node.as_any().downcast_ref::<ImageFile>() {
                    file.set_url(url);
                    return Ok(existing);
                }
            }
            self.remove(existing);
        }

        let id: NodeId = self.allocate_id();
        let file: Arc<ImageFile> = Arc::new(ImageFile::new(id, parent_id, name.to_string(), url));
        self.insert(id, file);
        parent_dir.add_child(name.to_string(), id);
        Ok(id)
    }

    /// Replace a directory's listing state and drop pruned children.
    pub fn install_listing(
        &self,
        dir_id: NodeId,
        entries: Vec<DirEntry>,
        images: HashMap<String, Url>,
    ) -> Result<(), VfsError> {
        let node: Arc<dyn SiteNode> = self.get(dir_id).ok_or(VfsError::NodeNotFound(dir_id))?;
        let dir: &PageDir = node
            .as_any()
            .downcast_ref::<PageDir>()
            .ok_or(VfsError::NotADirectory(dir_id))?;
        let removed: Vec<NodeId> = dir.install_listing(entries, images);
        for id in removed {
            self.remove(id);
        }
        Ok(())
    }
}
