//! Integration tests for site navigation.
//!
//! Tests drive the DirectoryResolver against a NodeTable and an
//! in-memory web client, covering multi-page traversal, listing
//! refresh, and the per-directory image index.

use std::sync::Arc;

use url::Url;

use sitefs_model::{decode_link, encode_link};
use sitefs_vfs::{DirEntry, DirectoryResolver, NodeKind, NodeTable, VfsError, ROOT_NODE};
use sitefs_web::{MemoryWebClient, WebClient};

// ============================================================================
// Test Infrastructure
// ============================================================================

const SITE: &str = "http://example.com/";

struct Site {
    client: MemoryWebClient,
    table: NodeTable,
    resolver: DirectoryResolver,
}

impl Site {
    fn new() -> Self {
        Self {
            client: MemoryWebClient::new(),
            table: NodeTable::new(Url::parse(SITE).unwrap()),
            resolver: DirectoryResolver::new().unwrap(),
        }
    }

    fn page(&mut self, url: &str, body: &str) {
        self.client.insert_page(url, body);
    }

    async fn resolve(&self, dir_id: u64) -> Vec<DirEntry> {
        self.resolver
            .resolve(&self.client, &self.table, dir_id)
            .await
            .unwrap()
    }
}

fn dir_entry<'a>(entries: &'a [DirEntry], target: &str) -> &'a DirEntry {
    entries
        .iter()
        .find(|e| {
            e.kind == NodeKind::Directory
                && decode_link(&e.name).map(|u| u.as_str() == target).unwrap_or(false)
        })
        .unwrap_or_else(|| panic!("no directory entry for {}", target))
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_navigate_from_root_into_linked_page() {
    let mut site: Site = Site::new();
    site.page(
        SITE,
        r#"<html><body>
            <img src="/banner.png">
            <a href="/gallery">gallery</a>
        </body></html>"#,
    );
    site.page(
        "http://example.com/gallery",
        r#"<html><body>
            <img src="/images/cat.png">
            <img src="/images/dog.png">
        </body></html>"#,
    );

    let root: Vec<DirEntry> = site.resolve(ROOT_NODE).await;
    assert_eq!(root.len(), 2);
    assert_eq!(root[0].name, "banner.png");

    let gallery: &DirEntry = dir_entry(&root, "http://example.com/gallery");
    let listing: Vec<DirEntry> = site.resolve(gallery.node_id).await;

    let names: Vec<&str> = listing.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["cat.png", "dog.png"]);
}

#[tokio::test]
async fn test_links_chain_across_hosts() {
    let mut site: Site = Site::new();
    site.page(
        SITE,
        r#"<html><body><a href="http://other.net/start">away</a></body></html>"#,
    );
    site.page(
        "http://other.net/start",
        r#"<html><body><img src="/pic.png"></body></html>"#,
    );

    let root: Vec<DirEntry> = site.resolve(ROOT_NODE).await;
    let away: &DirEntry = dir_entry(&root, "http://other.net/start");

    let listing: Vec<DirEntry> = site.resolve(away.node_id).await;
    assert_eq!(listing.len(), 1);
    assert_eq!(
        site.table.image_url(away.node_id, "pic.png").unwrap().as_str(),
        "http://other.net/pic.png"
    );
}

#[tokio::test]
async fn test_encoded_names_round_trip_through_listing() {
    let mut site: Site = Site::new();
    site.page(
        SITE,
        r#"<html><body><a href="/a?q=1&p=2">query</a></body></html>"#,
    );

    let root: Vec<DirEntry> = site.resolve(ROOT_NODE).await;
    assert_eq!(root.len(), 1);

    let decoded: Url = decode_link(&root[0].name).unwrap();
    assert_eq!(decoded.as_str(), "http://example.com/a?q=1&p=2");
    assert_eq!(encode_link(&decoded), root[0].name);
}

// ============================================================================
// Per-directory image index
// ============================================================================

#[tokio::test]
async fn test_same_basename_in_two_directories_stays_independent() {
    let mut site: Site = Site::new();
    site.page(
        SITE,
        r#"<html><body>
            <img src="/root/logo.png">
            <a href="/sub">sub</a>
        </body></html>"#,
    );
    site.page(
        "http://example.com/sub",
        r#"<html><body><img src="/sub/logo.png"></body></html>"#,
    );

    let root: Vec<DirEntry> = site.resolve(ROOT_NODE).await;
    let sub: &DirEntry = dir_entry(&root, "http://example.com/sub");
    site.resolve(sub.node_id).await;

    assert_eq!(
        site.table.image_url(ROOT_NODE, "logo.png").unwrap().as_str(),
        "http://example.com/root/logo.png"
    );
    assert_eq!(
        site.table.image_url(sub.node_id, "logo.png").unwrap().as_str(),
        "http://example.com/sub/logo.png"
    );
}

#[tokio::test]
async fn test_basename_collision_within_page_last_wins() {
    let mut site: Site = Site::new();
    site.page(
        SITE,
        r#"<html><body>
            <img src="/a/pic.png">
            <img src="/b/pic.png">
        </body></html>"#,
    );

    let root: Vec<DirEntry> = site.resolve(ROOT_NODE).await;

    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name, "pic.png");
    assert_eq!(
        site.table.image_url(ROOT_NODE, "pic.png").unwrap().as_str(),
        "http://example.com/b/pic.png"
    );
}

// ============================================================================
// Listing refresh
// ============================================================================

#[tokio::test]
async fn test_relisting_keeps_node_ids_for_surviving_entries() {
    let mut site: Site = Site::new();
    site.page(
        SITE,
        r#"<html><body>
            <img src="/keep.png">
            <a href="/stay">stay</a>
        </body></html>"#,
    );

    let first: Vec<DirEntry> = site.resolve(ROOT_NODE).await;
    let second: Vec<DirEntry> = site.resolve(ROOT_NODE).await;

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.node_id, b.node_id);
        assert_eq!(a.name, b.name);
    }
}

#[tokio::test]
async fn test_relisting_drops_entries_the_page_no_longer_has() {
    let mut site: Site = Site::new();
    site.page(
        SITE,
        r#"<html><body>
            <img src="/old.png">
            <img src="/new.png">
        </body></html>"#,
    );

    let first: Vec<DirEntry> = site.resolve(ROOT_NODE).await;
    assert_eq!(first.len(), 2);
    let old_id: u64 = first[0].node_id;

    site.page(SITE, r#"<html><body><img src="/new.png"></body></html>"#);
    let second: Vec<DirEntry> = site.resolve(ROOT_NODE).await;

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].name, "new.png");
    assert!(site.table.get(old_id).is_none());
    assert!(matches!(
        site.table.image_url(ROOT_NODE, "old.png"),
        Err(VfsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_every_listing_hits_the_network() {
    let mut site: Site = Site::new();
    site.page(SITE, r#"<html><body><img src="/a.png"></body></html>"#);

    site.resolve(ROOT_NODE).await;
    site.resolve(ROOT_NODE).await;
    site.resolve(ROOT_NODE).await;

    // Images and links are scanned separately, so two fetches per pass.
    assert_eq!(site.client.page_fetches(), 6);
}

// ============================================================================
// Content retrieval
// ============================================================================

#[tokio::test]
async fn test_listed_file_content_is_fetched_on_demand() {
    let mut site: Site = Site::new();
    site.page(SITE, r#"<html><body><img src="/photo.jpg"></body></html>"#);
    site.client
        .insert_bytes("http://example.com/photo.jpg", b"jpeg bytes".to_vec());

    let root: Vec<DirEntry> = site.resolve(ROOT_NODE).await;
    assert_eq!(site.client.byte_fetches(), 0);

    let client: Arc<MemoryWebClient> = Arc::new(site.client);
    let url: Url = site.table.file_url(root[0].node_id).unwrap();
    let body: Vec<u8> = client.fetch_bytes(&url).await.unwrap();

    assert_eq!(body, b"jpeg bytes");
    assert_eq!(client.byte_fetches(), 1);
}
