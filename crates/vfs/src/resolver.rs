//! Directory resolution: scan a page and rebuild the owning
//! directory's listing.

use std::collections::HashMap;

use tracing::debug;
use url::Url;

use sitefs_model::{encode_link, image_name};
use sitefs_web::{PageScanner, WebClient, WebError};

use crate::node::{DirEntry, NodeId, NodeKind, NodeTable};
use crate::VfsError;

/// Resolves a directory node by scanning its page.
///
/// Every resolution fetches the page fresh, twice: once for image
/// sources and once for hyperlinks. The result replaces the directory's
/// previous listing state wholesale.
pub struct DirectoryResolver {
    scanner: PageScanner,
}

impl DirectoryResolver {
    /// Create a resolver with compiled selectors.
    pub fn new() -> Result<Self, WebError> {
        Ok(Self {
            scanner: PageScanner::new()?,
        })
    }

    /// Scan the page behind `dir_id` and install the fresh listing.
    ///
    /// The listing is file entries first (one per distinct image
    /// basename, first-seen order), then one directory entry per
    /// scanned link in document order. The directory's image index maps
    /// each basename to the last URL scanned for it.
    ///
    /// # Returns
    /// The installed listing, in order.
    pub async fn resolve(
        &self,
        client: &dyn WebClient,
        table: &NodeTable,
        dir_id: NodeId,
    ) -> Result<Vec<DirEntry>, VfsError> {
        let page_url: Url = table.dir_url(dir_id)?;
        debug!(%page_url, dir_id, "resolving directory");

        let images: Vec<Url> = self
            .scanner
            .scan_images(client, &page_url)
            .await
            .map_err(|err| scan_failed(&page_url, err))?;
        let links: Vec<Url> = self
            .scanner
            .scan_links(client, &page_url)
            .await
            .map_err(|err| scan_failed(&page_url, err))?;

        // One file entry per distinct basename; the index keeps the
        // last URL scanned for that basename.
        let mut file_names: Vec<String> = Vec::new();
        let mut index: HashMap<String, Url> = HashMap::new();
        for url in images {
            let name: String = image_name(&url);
            if !index.contains_key(&name) {
                file_names.push(name.clone());
            }
            index.insert(name, url);
        }

        let mut entries: Vec<DirEntry> = Vec::with_capacity(file_names.len() + links.len());
        for name in &file_names {
            let url: Url = index[name].clone();
            let id: NodeId = table.ensure_file_child(dir_id, name, url)?;
            entries.push(DirEntry {
                node_id: id,
                kind: NodeKind::File,
                name: name.clone(),
            });
        }
        for url in &links {
            let name: String = encode_link(url);
            let id: NodeId = table.ensure_dir_child(dir_id, &name, url.clone())?;
            entries.push(DirEntry {
                node_id: id,
                kind: NodeKind::Directory,
                name,
            });
        }

        table.install_listing(dir_id, entries.clone(), index)?;
        debug!(dir_id, entry_count = entries.len(), "directory resolved");
        Ok(entries)
    }
}

fn scan_failed(url: &Url, err: WebError) -> VfsError {
    VfsError::ScanFailed {
        url: url.to_string(),
        source: Box::new(err),
    }
}
