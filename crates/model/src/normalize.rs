//! Candidate URL normalization against a context page.

use url::Url;

use crate::error::ModelError;

/// Normalize a raw link or image candidate found on a page.
///
/// Absolute candidates pass through untouched. Everything else inherits
/// the context's authority and nothing more: scheme-relative candidates
/// keep their path but take the context's host and port, and
/// path-relative candidates resolve root-relative against that
/// authority. Inherited candidates always come out with scheme `http`,
/// regardless of the context's scheme.
///
/// # Arguments
/// * `candidate` - Raw attribute value, already trimmed by the caller
/// * `context` - URL of the page the candidate was found on
///
/// # Returns
/// The absolute URL, or `ModelError::UrlParse` for malformed input.
pub fn normalize(candidate: &str, context: &Url) -> Result<Url, ModelError> {
    match Url::parse(candidate) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = authority_root(context)?;
            if let Some(rest) = candidate.strip_prefix("//") {
                // Scheme-relative: the candidate's own authority is dropped.
                let end = rest
                    .find(|c: char| c == '/' || c == '?' || c == '#')
                    .unwrap_or(rest.len());
                Ok(base.join(&rest[end..])?)
            } else {
                Ok(base.join(candidate)?)
            }
        }
        Err(err) => Err(ModelError::UrlParse(err)),
    }
}

/// `http://<host[:port]>/` for the context, the base every relative
/// candidate resolves against.
fn authority_root(context: &Url) -> Result<Url, ModelError> {
    let host = context.host_str().unwrap_or_default();
    let root = match context.port() {
        Some(port) => format!("http://{host}:{port}/"),
        None => format!("http://{host}/"),
    };
    Ok(Url::parse(&root)?)
}
