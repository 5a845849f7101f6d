//! Page scanning: extract image and link URLs from a fetched document.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use sitefs_model::normalize;

use crate::client::WebClient;
use crate::error::WebError;

const IMAGE_SELECTOR: &str = "html body img";
const LINK_SELECTOR: &str = "html body a";

/// Scans fetched pages for image sources and hyperlinks.
///
/// Every scan fetches and parses the page fresh. Candidates are
/// trimmed, filtered, and normalized against the page URL; candidates
/// that fail normalization are skipped.
pub struct PageScanner {
    image_selector: Selector,
    link_selector: Selector,
}

impl PageScanner {
    /// Create a scanner with the image and link selectors compiled.
    pub fn new() -> Result<Self, WebError> {
        Ok(Self {
            image_selector: parse_selector(IMAGE_SELECTOR)?,
            link_selector: parse_selector(LINK_SELECTOR)?,
        })
    }

    /// Fetch `page_url` and return the normalized image source URLs in
    /// document order.
    ///
    /// Empty and `data:image` sources are skipped.
    pub async fn scan_images(
        &self,
        client: &dyn WebClient,
        page_url: &Url,
    ) -> Result<Vec<Url>, WebError> {
        let body = client.fetch_page(page_url).await?;
        Ok(self.extract(&body, page_url, &self.image_selector, "src", "data:image"))
    }

    /// Fetch `page_url` and return the normalized hyperlink URLs in
    /// document order.
    ///
    /// Empty and `javascript:` targets are skipped.
    pub async fn scan_links(
        &self,
        client: &dyn WebClient,
        page_url: &Url,
    ) -> Result<Vec<Url>, WebError> {
        let body = client.fetch_page(page_url).await?;
        Ok(self.extract(&body, page_url, &self.link_selector, "href", "javascript:"))
    }

    // Sync on purpose: scraper's Html is not Send, so the document must
    // not live across an await point.
    fn extract(
        &self,
        body: &str,
        page_url: &Url,
        selector: &Selector,
        attribute: &str,
        skip_prefix: &str,
    ) -> Vec<Url> {
        let document = Html::parse_document(body);
        let mut urls: Vec<Url> = Vec::new();
        for element in document.select(selector) {
            let candidate = match element.value().attr(attribute) {
                Some(value) => value.trim(),
                None => continue,
            };
            if candidate.is_empty() || candidate.starts_with(skip_prefix) {
                continue;
            }
            match normalize(candidate, page_url) {
                Ok(url) => urls.push(url),
                Err(err) => debug!(candidate, %err, "skipping candidate"),
            }
        }
        urls
    }
}

fn parse_selector(selector: &str) -> Result<Selector, WebError> {
    Selector::parse(selector).map_err(|err| WebError::Parse(err.to_string()))
}
