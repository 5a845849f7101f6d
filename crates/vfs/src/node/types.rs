//! Core node types and traits.

use std::any::Any;

/// Unique identifier for a node.
pub type NodeId = u64;

/// Root directory node ID (always 1 per FUSE convention).
pub const ROOT_NODE: NodeId = 1;

/// Type of node entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Regular file backed by an image URL.
    File,
    /// Directory backed by a page URL.
    Directory,
}

/// Common trait for all node types.
pub trait SiteNode: Send + Sync + std::fmt::Debug {
    /// Get the node ID.
    fn id(&self) -> NodeId;

    /// Get the parent node ID.
    fn parent_id(&self) -> NodeId;

    /// Get the entry name under the parent directory.
    fn name(&self) -> &str;

    /// Get the node kind.
    fn kind(&self) -> NodeKind;

    /// Get the permissions (POSIX mode bits).
    fn permissions(&self) -> u16;

    /// Downcast to Any for type-safe downcasting.
    fn as_any(&self) -> &dyn Any;
}
