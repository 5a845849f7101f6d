//! FUSE-based virtual filesystem for browsing a website.
//!
//! This crate provides a read-only FUSE filesystem that projects a
//! website: pages appear as directories, images on a page appear as
//! files, and all content is fetched on demand. Nothing is cached
//! between operations.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: FUSE Interface (fuser::Filesystem impl)
//! Layer 2: VFS Operations (DirectoryResolver)
//! Layer 1: Primitives (NodeTable, PageDir, ImageFile)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sitefs_vfs::{SiteFs, VfsOptions};
//!
//! let client = Arc::new(HttpWebClient::default());
//! let vfs = SiteFs::new(site_url, client, VfsOptions::default())?;
//! sitefs_vfs::mount(vfs, Path::new("/mnt/site"))?;
//! ```

pub mod error;
pub mod node;
pub mod options;
pub mod resolver;

#[cfg(feature = "fuse")]
pub mod fuse;

pub use error::VfsError;
pub use node::{
    DirEntry, ImageFile, NodeId, NodeKind, NodeTable, PageDir, SiteNode, DEFAULT_DIR_PERMS,
    DEFAULT_FILE_PERMS, ROOT_NODE,
};
pub use options::VfsOptions;
pub use resolver::DirectoryResolver;

#[cfg(feature = "fuse")]
pub use fuse::{mount, spawn_mount, SiteFs};
