//! Entry-name codec: reversible names for link directories and display
//! names for image files.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use url::Url;

use crate::error::ModelError;

/// Encode a link URL as a single path segment.
///
/// URL-safe base64 without padding, so the name never contains `/` and
/// is usable verbatim as a directory name.
pub fn encode_link(url: &Url) -> String {
    URL_SAFE_NO_PAD.encode(url.as_str().as_bytes())
}

/// Decode a path segment produced by [`encode_link`].
///
/// # Returns
/// The link URL, or [`ModelError::Decode`] when the segment is not
/// base64, the bytes are not UTF-8, or the text is not an absolute URL.
pub fn decode_link(name: &str) -> Result<Url, ModelError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(name)
        .map_err(|err| ModelError::decode(name, err))?;
    let text = String::from_utf8(bytes).map_err(|err| ModelError::decode(name, err))?;
    Url::parse(&text).map_err(|err| ModelError::decode(name, err))
}

/// Display name for an image URL: the final segment of the URL string,
/// ignoring trailing slashes.
pub fn image_name(url: &Url) -> String {
    let trimmed = url.as_str().trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[idx + 1..].to_string(),
        None => trimmed.to_string(),
    }
}
