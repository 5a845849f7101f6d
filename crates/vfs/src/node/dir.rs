//! Directory node implementation.
//!
//! A directory projects one page of the remote site. Its listing state
//! is rebuilt from a fresh scan on every directory resolution and is
//! private to the directory, so listing one page never disturbs the
//! image index of another.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use url::Url;

use super::types::{NodeId, NodeKind, SiteNode};

/// Default directory permissions (rwxr-xr-x).
pub const DEFAULT_DIR_PERMS: u16 = 0o755;

/// One entry of a captured directory listing.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Node ID of the entry.
    pub node_id: NodeId,
    /// Entry kind.
    pub kind: NodeKind,
    /// Entry name (image basename or encoded link).
    pub name: String,
}

/// Mutable listing state, replaced wholesale on each resolution.
#[derive(Debug, Default)]
struct DirState {
    /// Listing captured by the most recent resolution, in order.
    entries: Vec<DirEntry>,
    /// Image index: basename to image URL, last scan wins.
    images: HashMap<String, Url>,
    /// Child entries: name to node ID.
    children: HashMap<String, NodeId>,
}

/// Directory node representing one page of the site.
#[derive(Debug)]
pub struct PageDir {
    /// Node ID.
    id: NodeId,
    /// Parent directory node ID.
    parent_id: NodeId,
    /// Entry name (encoded link, empty for the root).
    name: String,
    /// Page URL this directory projects.
    url: Url,
    /// Listing state.
    state: RwLock<DirState>,
}

impl PageDir {
    /// Create a new directory node.
    ///
    /// # Arguments
    /// * `id` - Node ID
    /// * `parent_id` - Parent directory node ID
    /// * `name` - Entry name (empty for the root)
    /// * `url` - Page URL
    pub fn new(id: NodeId, parent_id: NodeId, name: String, url: Url) -> Self {
        Self {
            id,
            parent_id,
            name,
            url,
            state: RwLock::new(DirState::default()),
        }
    }

    /// Get the page URL this directory projects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Add a child entry to this directory.
    pub fn add_child(&self, name: String, id: NodeId) {
        let mut state: std::sync::RwLockWriteGuard<'_, DirState> = self.state.write().unwrap();
        state.children.insert(name, id);
    }

    /// Get a child node ID by name.
    pub fn child(&self, name: &str) -> Option<NodeId> {
        let state: std::sync::RwLockReadGuard<'_, DirState> = self.state.read().unwrap();
        state.children.get(name).copied()
    }

    /// Get all children as (name, node_id) pairs.
    pub fn children(&self) -> Vec<(String, NodeId)> {
        let state: std::sync::RwLockReadGuard<'_, DirState> = self.state.read().unwrap();
        state.children.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Get the listing captured by the most recent resolution.
    pub fn entries(&self) -> Vec<DirEntry> {
        let state: std::sync::RwLockReadGuard<'_, DirState> = self.state.read().unwrap();
        state.entries.clone()
    }

    /// Look up an image URL in this directory's index.
    pub fn image_url(&self, name: &str) -> Option<Url> {
        let state: std::sync::RwLockReadGuard<'_, DirState> = self.state.read().unwrap();
        state.images.get(name).cloned()
    }

    /// Replace the listing state with a freshly resolved one.
    ///
    /// Children whose names no longer appear in the listing are pruned.
    ///
    /// # Returns
    /// Node IDs of the pruned children.
    pub fn install_listing(
        &self,
        entries: Vec<DirEntry>,
        images: HashMap<String, Url>,
    ) -> Vec<NodeId> {
        let keep: HashSet<String> = entries.iter().map(|e| e.name.clone()).collect();
        let mut state: std::sync::RwLockWriteGuard<'_, DirState> = self.state.write().unwrap();
        let mut removed: Vec<NodeId> = Vec::new();
        state.children.retain(|name, id| {
            let kept: bool = keep.contains(name);
            if !kept {
                removed.push(*id);
            }
            kept
        });
        state.entries = entries;
        state.images = images;
        removed
    }
}

impl SiteNode for PageDir {
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
        NodeKind::Directory
    }

    fn permissions(&self) -> u16 {
        DEFAULT_DIR_PERMS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
