//! Error types for the VFS crate.

use std::fmt;

/// Errors that can occur during VFS operations.
#[derive(Debug)]
pub enum VfsError {
    /// Node not found.
    NodeNotFound(u64),

    /// Not a directory.
    NotADirectory(u64),

    /// Not a file.
    NotAFile(u64),

    /// Name not present in the directory index.
    NotFound(String),

    /// Content retrieval failed.
    ContentRetrievalFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Page scan failed.
    ScanFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mount operation failed.
    MountFailed(String),

    /// Read-only filesystem.
    ReadOnly,
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::NodeNotFound(id) => write!(f, "Node not found: {}", id),
            VfsError::NotADirectory(id) => write!(f, "Not a directory: {}", id),
            VfsError::NotAFile(id) => write!(f, "Not a file: {}", id),
            VfsError::NotFound(name) => write!(f, "Not found in directory index: {}", name),
            VfsError::ContentRetrievalFailed { url, source } => {
                write!(f, "Content retrieval failed for {}: {}", url, source)
            }
            VfsError::ScanFailed { url, source } => {
                write!(f, "Page scan failed for {}: {}", url, source)
            }
            VfsError::MountFailed(msg) => write!(f, "Mount failed: {}", msg),
            VfsError::ReadOnly => write!(f, "Read-only filesystem"),
        }
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VfsError::ContentRetrievalFailed { source, .. } => Some(source.as_ref()),
            VfsError::ScanFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
