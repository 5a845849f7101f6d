//! Mount a website as a read-only filesystem.
//!
//! Usage:
//!   sitefs <mountpoint> <website>
//!
//! Example:
//!   sitefs /mnt/site example.com
//!
//! The root of the mount lists the images and hyperlinks of the entry
//! page. Hyperlinks appear as directories whose names are the encoded
//! target URLs; entering one lists that page in turn.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use sitefs_vfs::{SiteFs, VfsOptions};
use sitefs_web::HttpWebClient;

#[derive(Parser, Debug)]
#[command(name = "sitefs", about = "Mount a website as a read-only filesystem")]
struct Args {
    /// Directory to mount the filesystem at.
    mountpoint: PathBuf,

    /// Website to mount, with or without a scheme.
    website: String,
}

/// Parse the website argument into a URL.
///
/// A bare host like `example.com` gets an `http://` prefix; anything
/// with a scheme is taken as given.
fn parse_website(website: &str) -> anyhow::Result<Url> {
    match Url::parse(website) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{}", website))
                .with_context(|| format!("invalid website: {}", website))
        }
        Err(err) => Err(err).with_context(|| format!("invalid website: {}", website)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sitefs=debug")),
        )
        .init();

    let args: Args = Args::parse();
    let site_url: Url = parse_website(&args.website)?;

    let runtime: tokio::runtime::Runtime = tokio::runtime::Runtime::new()?;
    let _guard: tokio::runtime::EnterGuard<'_> = runtime.enter();

    let client: Arc<HttpWebClient> = Arc::new(HttpWebClient::default());
    let vfs: SiteFs = SiteFs::new(site_url.clone(), client, VfsOptions::default())?;

    info!(%site_url, mountpoint = %args.mountpoint.display(), "mounting");
    let session = sitefs_vfs::spawn_mount(vfs, &args.mountpoint)
        .with_context(|| format!("failed to mount at {}", args.mountpoint.display()))?;

    let running: Arc<AtomicBool> = Arc::new(AtomicBool::new(true));
    let r: Arc<AtomicBool> = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    info!("mounted, press Ctrl+C to unmount");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    info!("unmounting");
    drop(session);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_website_bare_host_gets_http() {
        let url: Url = parse_website("example.com").unwrap();
        assert_eq!(url.as_str(), "http://example.com/");
    }

    #[test]
    fn test_parse_website_keeps_scheme() {
        let url: Url = parse_website("https://example.com/page").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_parse_website_rejects_garbage() {
        assert!(parse_website("http://").is_err());
    }
}
