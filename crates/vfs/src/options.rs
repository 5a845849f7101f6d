//! VFS configuration options.

/// Configuration for the mounted filesystem.
#[derive(Debug, Clone)]
pub struct VfsOptions {
    /// TTL for kernel attribute caching, in seconds.
    ///
    /// Attribute lookups on files fetch the full content to learn its
    /// size, so a short kernel cache keeps repeated `stat` calls from
    /// each hitting the network.
    pub attr_timeout_secs: u64,
    /// Filesystem name reported to the kernel.
    pub fs_name: String,
}

impl Default for VfsOptions {
    fn default() -> Self {
        Self {
            attr_timeout_secs: 1,
            fs_name: "sitefs".to_string(),
        }
    }
}
