//! URL resolution utilities.
//!
//! [URL Standard](https://url.spec.whatwg.org/)
//!
//! Stylesheet references (`@import`, `<?xml-stylesheet?>`, external links)
//! are resolved against the URL of the document or stylesheet that contains
//! them.

use std::path::Path;

pub use url::{ParseError, Url};

/// [URL Standard § 4.4 URL parsing](https://url.spec.whatwg.org/#url-parsing)
///
/// Resolve a potentially relative reference against a base URL.
///
/// STEP 1: "If input is an absolute-URL string, return it parsed on its own."
///
/// STEP 2: "Otherwise, parse input with base as the base URL."
///
/// # Errors
///
/// Returns [`ParseError::RelativeUrlWithoutBase`] when `href` is relative and
/// no base is available, or any other parse error for malformed input.
pub fn resolve_url(href: &str, base: Option<&Url>) -> Result<Url, ParseError> {
    Url::options().base_url(base).parse(href.trim())
}

/// Build a `file:` URL for a path on disk.
///
/// The path is canonicalized first so the result is absolute and free of
/// `.`/`..` segments. Returns `None` if the path does not exist or cannot be
/// expressed as a URL.
#[must_use]
pub fn file_url_for_path(path: &Path) -> Option<Url> {
    let absolute = path.canonicalize().ok()?;
    Url::from_file_path(absolute).ok()
}

/// Strip parameters from a MIME type and normalize its case.
///
/// `"Text/CSS; charset=utf-8"` becomes `"text/css"`.
#[must_use]
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
