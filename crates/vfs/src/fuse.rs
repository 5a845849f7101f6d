//! FUSE filesystem implementation.

#[cfg(feature = "fuse")]
mod impl_fuse {
    use std::collections::HashMap;
    use std::ffi::OsStr;
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, RwLock};
    use std::time::{Duration, UNIX_EPOCH};

    use fuser::{
        FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
        ReplyEmpty, ReplyEntry, ReplyOpen, Request,
    };
    use tokio::runtime::Handle;
    use tracing::{debug, warn};
    use url::Url;

    use sitefs_model::decode_link;
    use sitefs_web::WebClient;

    use crate::node::{DirEntry, NodeId, NodeKind, NodeTable, PageDir, SiteNode};
    use crate::options::VfsOptions;
    use crate::resolver::DirectoryResolver;
    use crate::VfsError;

    struct OpenHandle {
        node: NodeId,
        data: Vec<u8>,
    }

    /// Read-only FUSE filesystem that projects a website.
    ///
    /// Directories are pages, files are the images found on them. Every
    /// operation that needs remote state fetches it at call time; nothing
    /// is cached between calls beyond the node table itself.
    pub struct SiteFs {
        table: NodeTable,
        client: Arc<dyn WebClient>,
        resolver: DirectoryResolver,
        /// Open file handles holding fully buffered content.
        handles: Arc<RwLock<HashMap<u64, OpenHandle>>>,
        next_handle: AtomicU64,
        options: VfsOptions,
        /// Runtime handle captured at construction, used to drive async
        /// work from the synchronous FUSE callbacks.
        runtime: Handle,
    }

    impl SiteFs {
        /// Create a new filesystem rooted at `site_url`.
        ///
        /// Must be called from within a tokio runtime; the runtime handle
        /// is captured here and used by every FUSE callback.
        ///
        /// # Arguments
        /// * `site_url` - Entry-point page projected as the root directory
        /// * `client` - Web client used for all page and content fetches
        /// * `options` - Filesystem configuration
        pub fn new(
            site_url: Url,
            client: Arc<dyn WebClient>,
            options: VfsOptions,
        ) -> Result<Self, VfsError> {
            let runtime: Handle = Handle::try_current().map_err(|err| {
                VfsError::MountFailed(format!("no tokio runtime available: {}", err))
            })?;
            let resolver: DirectoryResolver = DirectoryResolver::new()
                .map_err(|err| VfsError::MountFailed(format!("selector setup failed: {}", err)))?;

            Ok(Self {
                table: NodeTable::new(site_url),
                client,
                resolver,
                handles: Arc::new(RwLock::new(HashMap::new())),
                next_handle: AtomicU64::new(1),
                options,
                runtime,
            })
        }

        fn ttl(&self) -> Duration {
            Duration::from_secs(self.options.attr_timeout_secs)
        }

        /// Fetch the full content behind `url`.
        fn fetch_content(&self, url: &Url) -> Result<Vec<u8>, VfsError> {
            let client: &dyn WebClient = self.client.as_ref();
            self.runtime
                .block_on(client.fetch_bytes(url))
                .map_err(|err| VfsError::ContentRetrievalFailed {
                    url: url.to_string(),
                    source: Box::new(err),
                })
        }

        /// Rescan the page behind `dir_id` and return the fresh listing.
        fn resolve_listing(&self, dir_id: NodeId) -> Result<Vec<DirEntry>, VfsError> {
            let client: &dyn WebClient = self.client.as_ref();
            self.runtime
                .block_on(self.resolver.resolve(client, &self.table, dir_id))
        }

        /// Build kernel attributes for a node.
        ///
        /// File sizes are only known by fetching the content, so file
        /// attributes cost a full download.
        fn node_attr(&self, node: &Arc<dyn SiteNode>) -> Result<FileAttr, VfsError> {
            let size: u64 = match node.kind() {
                NodeKind::Directory => 0,
                NodeKind::File => {
                    let url: Url = self.table.file_url(node.id())?;
                    self.fetch_content(&url)?.len() as u64
                }
            };
            Ok(self.to_file_attr(node, size))
        }

        fn to_file_attr(&self, node: &Arc<dyn SiteNode>, size: u64) -> FileAttr {
            let kind: FileType = match node.kind() {
                NodeKind::Directory => FileType::Directory,
                NodeKind::File => FileType::RegularFile,
            };
            let nlink: u32 = match node.kind() {
                NodeKind::Directory => 2,
                NodeKind::File => 1,
            };

            FileAttr {
                ino: node.id(),
                size,
                blocks: (size + 511) / 512,
                atime: UNIX_EPOCH,
                mtime: UNIX_EPOCH,
                ctime: UNIX_EPOCH,
                crtime: UNIX_EPOCH,
                kind,
                perm: node.permissions(),
                nlink,
                uid: unsafe { libc::getuid() },
                gid: unsafe { libc::getgid() },
                rdev: 0,
                blksize: 512,
                flags: 0,
            }
        }

        /// Look up `name` under `parent`.
        ///
        /// A name already present in the parent's children is answered
        /// from the table. Otherwise, a name that decodes to a URL
        /// materializes a new directory child on the spot; anything else
        /// does not exist.
        fn lookup_child(&self, parent: NodeId, name: &str) -> Result<FileAttr, VfsError> {
            let parent_node: Arc<dyn SiteNode> = self
                .table
                .get(parent)
                .ok_or(VfsError::NodeNotFound(parent))?;
            if parent_node.kind() != NodeKind::Directory {
                return Err(VfsError::NotADirectory(parent));
            }

            let dir: &PageDir = parent_node
                .as_any()
                .downcast_ref::<PageDir>()
                .ok_or(VfsError::NotADirectory(parent))?;

            if let Some(child_id) = dir.child(name) {
                if let Some(child) = self.table.get(child_id) {
                    return self.node_attr(&child);
                }
            }

            // Unknown name: a decodable one names a page we have not
            // listed yet; everything else is absent.
            match decode_link(name) {
                Ok(url) => {
                    let id: NodeId = self.table.ensure_dir_child(parent, name, url)?;
                    let node: Arc<dyn SiteNode> =
                        self.table.get(id).ok_or(VfsError::NodeNotFound(id))?;
                    self.node_attr(&node)
                }
                Err(_) => Err(VfsError::NotFound(name.to_string())),
            }
        }

        /// Open the file node `ino` and buffer its entire content.
        fn open_file(&self, ino: NodeId) -> Result<u64, VfsError> {
            let url: Url = self.table.file_url(ino)?;
            let data: Vec<u8> = self.fetch_content(&url)?;

            let fh: u64 = self.next_handle.fetch_add(1, Ordering::SeqCst);
            let mut handles: std::sync::RwLockWriteGuard<'_, HashMap<u64, OpenHandle>> =
                self.handles.write().unwrap();
            handles.insert(fh, OpenHandle { node: ino, data });
            Ok(fh)
        }
    }

    /// Map a VFS error to an errno for the kernel.
    fn errno(err: &VfsError) -> i32 {
        match err {
            VfsError::NodeNotFound(_) => libc::ENOENT,
            VfsError::NotFound(_) => libc::ENOENT,
            VfsError::ContentRetrievalFailed { .. } => libc::ENOENT,
            VfsError::ScanFailed { .. } => libc::ENOENT,
            VfsError::NotADirectory(_) => libc::ENOTDIR,
            VfsError::NotAFile(_) => libc::EISDIR,
            VfsError::ReadOnly => libc::EROFS,
            VfsError::MountFailed(_) => libc::EIO,
        }
    }

    impl Filesystem for SiteFs {
        fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
            let name: &str = match name.to_str() {
                Some(name) => name,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };
            debug!(parent, name, "lookup");

            match self.lookup_child(parent, name) {
                Ok(attr) => reply.entry(&self.ttl(), &attr, 0),
                Err(err) => {
                    debug!(parent, name, %err, "lookup failed");
                    reply.error(errno(&err));
                }
            }
        }

        fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
            debug!(ino, "getattr");
            let node: Arc<dyn SiteNode> = match self.table.get(ino) {
                Some(node) => node,
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            match self.node_attr(&node) {
                Ok(attr) => reply.attr(&self.ttl(), &attr),
                Err(err) => {
                    warn!(ino, %err, "getattr failed");
                    reply.error(errno(&err));
                }
            }
        }

        fn readdir(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            offset: i64,
            mut reply: ReplyDirectory,
        ) {
            debug!(ino, offset, "readdir");

            // A fresh scan once per listing pass; continuation offsets
            // reuse the listing that pass installed.
            let entries: Vec<DirEntry> = if offset == 0 {
                match self.resolve_listing(ino) {
                    Ok(entries) => entries,
                    Err(err) => {
                        warn!(ino, %err, "readdir scan failed");
                        reply.error(errno(&err));
                        return;
                    }
                }
            } else {
                match self.table.dir_entries(ino) {
                    Ok(entries) => entries,
                    Err(err) => {
                        reply.error(errno(&err));
                        return;
                    }
                }
            };

            let parent: NodeId = match self.table.get(ino) {
                Some(node) => node.parent_id(),
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let mut listing: Vec<(u64, FileType, String)> =
                Vec::with_capacity(entries.len() + 2);
            listing.push((ino, FileType::Directory, ".".to_string()));
            listing.push((parent, FileType::Directory, "..".to_string()));
            for entry in entries {
                let kind: FileType = match entry.kind {
                    NodeKind::Directory => FileType::Directory,
                    NodeKind::File => FileType::RegularFile,
                };
                listing.push((entry.node_id, kind, entry.name));
            }

            for (i, (entry_ino, kind, name)) in
                listing.into_iter().enumerate().skip(offset as usize)
            {
                if reply.add(entry_ino, (i + 1) as i64, kind, &name) {
                    break;
                }
            }
            reply.ok();
        }

        fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
            debug!(ino, flags, "open");

            if flags & (libc::O_WRONLY | libc::O_RDWR) != 0 {
                reply.error(errno(&VfsError::ReadOnly));
                return;
            }

            match self.open_file(ino) {
                Ok(fh) => reply.opened(fh, 0),
                Err(err) => {
                    warn!(ino, %err, "open failed");
                    reply.error(errno(&err));
                }
            }
        }

        fn read(
            &mut self,
            _req: &Request,
            ino: u64,
            fh: u64,
            offset: i64,
            size: u32,
            _flags: i32,
            _lock_owner: Option<u64>,
            reply: ReplyData,
        ) {
            let handles: std::sync::RwLockReadGuard<'_, HashMap<u64, OpenHandle>> =
                self.handles.read().unwrap();
            let handle: &OpenHandle = match handles.get(&fh) {
                Some(handle) if handle.node == ino => handle,
                _ => {
                    reply.error(libc::EBADF);
                    return;
                }
            };

            let data: &[u8] = &handle.data;
            let start: usize = (offset.max(0) as usize).min(data.len());
            let end: usize = start.saturating_add(size as usize).min(data.len());
            reply.data(&data[start..end]);
        }

        fn release(
            &mut self,
            _req: &Request,
            _ino: u64,
            fh: u64,
            _flags: i32,
            _lock_owner: Option<u64>,
            _flush: bool,
            reply: ReplyEmpty,
        ) {
            let mut handles: std::sync::RwLockWriteGuard<'_, HashMap<u64, OpenHandle>> =
                self.handles.write().unwrap();
            handles.remove(&fh);
            reply.ok();
        }
    }

    /// Mount the filesystem at `mountpoint`, blocking until unmounted.
    pub fn mount(vfs: SiteFs, mountpoint: &Path) -> Result<(), VfsError> {
        let options: Vec<MountOption> = mount_options(&vfs);
        fuser::mount2(vfs, mountpoint, &options)
            .map_err(|err| VfsError::MountFailed(err.to_string()))
    }

    /// Mount the filesystem at `mountpoint` on a background thread.
    ///
    /// # Returns
    /// A session guard; dropping it unmounts the filesystem.
    pub fn spawn_mount(
        vfs: SiteFs,
        mountpoint: &Path,
    ) -> Result<fuser::BackgroundSession, VfsError> {
        let options: Vec<MountOption> = mount_options(&vfs);
        fuser::spawn_mount2(vfs, mountpoint, &options)
            .map_err(|err| VfsError::MountFailed(err.to_string()))
    }

    fn mount_options(vfs: &SiteFs) -> Vec<MountOption> {
        vec![
            MountOption::RO,
            MountOption::FSName(vfs.options.fs_name.clone()),
            MountOption::AutoUnmount,
        ]
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::node::{DEFAULT_DIR_PERMS, DEFAULT_FILE_PERMS, ROOT_NODE};
        use sitefs_model::encode_link;
        use sitefs_web::MemoryWebClient;
        use tokio::runtime::Runtime;

        const SITE: &str = "http://example.com/";

        // The FUSE callbacks block on a captured runtime handle, so the
        // tests enter a runtime the way the mounting binary does instead
        // of running inside one.
        fn vfs_with(client: MemoryWebClient) -> (Runtime, SiteFs) {
            let runtime: Runtime = Runtime::new().unwrap();
            let vfs: SiteFs = {
                let _guard: tokio::runtime::EnterGuard<'_> = runtime.enter();
                SiteFs::new(
                    Url::parse(SITE).unwrap(),
                    Arc::new(client),
                    VfsOptions::default(),
                )
                .unwrap()
            };
            (runtime, vfs)
        }

        #[test]
        fn test_lookup_listed_file_fetches_for_size() {
            let mut client: MemoryWebClient = MemoryWebClient::new();
            client.insert_page(SITE, r#"<html><body><img src="/a.png"></body></html>"#);
            client.insert_bytes("http://example.com/a.png", vec![1, 2, 3]);
            let (_runtime, vfs) = vfs_with(client);

            vfs.resolve_listing(ROOT_NODE).unwrap();
            let attr: FileAttr = vfs.lookup_child(ROOT_NODE, "a.png").unwrap();

            assert_eq!(attr.kind, FileType::RegularFile);
            assert_eq!(attr.size, 3);
            assert_eq!(attr.perm, DEFAULT_FILE_PERMS);
        }

        #[test]
        fn test_lookup_decodable_name_materializes_directory() {
            let (_runtime, vfs) = vfs_with(MemoryWebClient::new());
            let name: String = encode_link(&Url::parse("http://example.com/deep").unwrap());

            let attr: FileAttr = vfs.lookup_child(ROOT_NODE, &name).unwrap();

            assert_eq!(attr.kind, FileType::Directory);
            assert_eq!(attr.perm, DEFAULT_DIR_PERMS);
            assert_eq!(
                vfs.table.dir_url(attr.ino).unwrap().as_str(),
                "http://example.com/deep"
            );
        }

        #[test]
        fn test_lookup_junk_name_is_not_found() {
            let (_runtime, vfs) = vfs_with(MemoryWebClient::new());

            let result = vfs.lookup_child(ROOT_NODE, "no such entry!");
            assert!(matches!(result, Err(VfsError::NotFound(_))));
        }

        #[test]
        fn test_open_buffers_whole_body() {
            let mut client: MemoryWebClient = MemoryWebClient::new();
            client.insert_page(SITE, r#"<html><body><img src="/a.png"></body></html>"#);
            client.insert_bytes("http://example.com/a.png", b"abcdef".to_vec());
            let (_runtime, vfs) = vfs_with(client);

            vfs.resolve_listing(ROOT_NODE).unwrap();
            let attr: FileAttr = vfs.lookup_child(ROOT_NODE, "a.png").unwrap();
            let fh: u64 = vfs.open_file(attr.ino).unwrap();

            let handles: std::sync::RwLockReadGuard<'_, HashMap<u64, OpenHandle>> =
                vfs.handles.read().unwrap();
            assert_eq!(handles.get(&fh).unwrap().data, b"abcdef");
        }

        #[test]
        fn test_open_directory_is_eisdir() {
            let (_runtime, vfs) = vfs_with(MemoryWebClient::new());

            let result = vfs.open_file(ROOT_NODE);
            assert!(matches!(result, Err(VfsError::NotAFile(_))));
            assert_eq!(errno(&result.unwrap_err()), libc::EISDIR);
        }

        #[test]
        fn test_missing_content_maps_to_enoent() {
            let mut client: MemoryWebClient = MemoryWebClient::new();
            client.insert_page(SITE, r#"<html><body><img src="/gone.png"></body></html>"#);
            let (_runtime, vfs) = vfs_with(client);

            vfs.resolve_listing(ROOT_NODE).unwrap();
            let attr_err: VfsError = vfs.lookup_child(ROOT_NODE, "gone.png").unwrap_err();

            assert!(matches!(
                attr_err,
                VfsError::ContentRetrievalFailed { .. }
            ));
            assert_eq!(errno(&attr_err), libc::ENOENT);
        }

        #[test]
        fn test_errno_mapping() {
            assert_eq!(errno(&VfsError::NodeNotFound(7)), libc::ENOENT);
            assert_eq!(errno(&VfsError::NotADirectory(7)), libc::ENOTDIR);
            assert_eq!(errno(&VfsError::NotAFile(7)), libc::EISDIR);
            assert_eq!(errno(&VfsError::ReadOnly), libc::EROFS);
            assert_eq!(
                errno(&VfsError::MountFailed("boom".to_string())),
                libc::EIO
            );
        }
    }
}

#[cfg(feature = "fuse")]
pub use impl_fuse::{mount, spawn_mount, SiteFs};
