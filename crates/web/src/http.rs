//! HTTP-backed WebClient.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::client::WebClient;
use crate::error::WebError;

/// WebClient over plain HTTP GET requests.
///
/// One request per fetch, whole body buffered, no retries and no
/// caching. Any status other than 200 is an error.
#[derive(Debug, Clone)]
pub struct HttpWebClient {
    client: reqwest::Client,
}

impl HttpWebClient {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, WebError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| WebError::Fetch {
                url: url.to_string(),
                source: err.into(),
            })?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(WebError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Default for HttpWebClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebClient for HttpWebClient {
    async fn fetch_page(&self, url: &Url) -> Result<String, WebError> {
        debug!(%url, "fetching page");
        let response = self.get(url).await?;
        response.text().await.map_err(|err| WebError::Fetch {
            url: url.to_string(),
            source: err.into(),
        })
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, WebError> {
        debug!(%url, "fetching content");
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(|err| WebError::Fetch {
            url: url.to_string(),
            source: err.into(),
        })?;
        Ok(bytes.to_vec())
    }
}
