//! Resource loading for stylesheets referenced by a document.
//!
//! The loader answers one question for the engine: given a reference, what
//! bytes and which MIME type does it name? It also enforces the policy of
//! *where* those bytes may come from:
//!
//! - `data:` URLs are always decoded in memory.
//! - `file:` URLs are served only when the document itself was loaded from a
//!   file, and only from the document's directory or below it.
//! - `http:`/`https:` URLs are fetched only when network access was enabled.
//! - Every other scheme is refused.
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use thiserror::Error;

use crate::url::{ParseError, Url, mime_essence, resolve_url};

/// User-Agent header sent with all requests.
const USER_AGENT: &str = concat!("kestrel/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// MIME type reported for `data:` URLs without a media type.
///
/// [RFC 2397 § 2](https://www.rfc-editor.org/rfc/rfc2397#section-2)
/// "If <mediatype> is omitted, it defaults to text/plain;charset=US-ASCII."
const DEFAULT_DATA_MIME: &str = "text/plain";

/// MIME type reported when nothing better is known.
const OCTET_STREAM: &str = "application/octet-stream";

/// Errors produced while loading a resource.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The reference could not be parsed or resolved.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The reference as written.
        url: String,
        /// Why parsing failed.
        #[source]
        source: ParseError,
    },
    /// The URL scheme is not one the loader serves.
    #[error("scheme '{0}' is not allowed")]
    SchemeNotAllowed(String),
    /// An `http:`/`https:` URL was requested while network access is off.
    #[error("network access is disabled")]
    NetworkDisabled,
    /// A `file:` URL was requested without a `file:` base document.
    #[error("file access requires a document loaded from a file")]
    NoFileBase,
    /// A `file:` URL pointed outside the document's directory.
    #[error("'{0}' is outside the document directory")]
    OutsideBase(String),
    /// A `file:` URL that does not name a local path.
    #[error("'{0}' is not a local file path")]
    InvalidFilePath(String),
    /// A malformed `data:` URL.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
    /// Reading from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The HTTP client failed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(u16),
}

/// A loaded resource: its bytes and the MIME type they were served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Raw bytes of the resource.
    pub data: Vec<u8>,
    /// MIME type essence, lowercase and without parameters.
    pub mime_type: String,
}

/// Policy for a [`ResourceLoader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// URL of the document the references appear in.
    pub base_url: Option<Url>,
    /// Whether `http:`/`https:` references may be fetched.
    pub allow_network: bool,
    /// Request timeout for network fetches.
    pub timeout: Duration,
    /// Read at most this many bytes plus one, so callers can tell an
    /// oversized resource from one that exactly fits.
    pub max_bytes: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            allow_network: false,
            timeout: TIMEOUT,
            max_bytes: None,
        }
    }
}

/// Loads resources according to a [`LoaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    config: LoaderConfig,
}

impl ResourceLoader {
    /// Create a loader with the given policy.
    #[must_use]
    pub const fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// The policy this loader enforces.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Resolve `href` against the base URL and load it.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the reference is malformed, forbidden by
    /// the policy, or cannot be read.
    pub fn load(&self, href: &str) -> Result<Resource, LoadError> {
        let url =
            resolve_url(href, self.config.base_url.as_ref()).map_err(|source| {
                LoadError::InvalidUrl {
                    url: href.to_string(),
                    source,
                }
            })?;

        match url.scheme() {
            "data" => decode_data_url(url.as_str()),
            "file" => self.load_file(&url),
            "http" | "https" => {
                if self.config.allow_network {
                    self.fetch(&url)
                } else {
                    Err(LoadError::NetworkDisabled)
                }
            }
            other => Err(LoadError::SchemeNotAllowed(other.to_string())),
        }
    }

    /// Read a `file:` URL that lies under the base document's directory.
    fn load_file(&self, url: &Url) -> Result<Resource, LoadError> {
        let base_dir = self
            .config
            .base_url
            .as_ref()
            .filter(|base| base.scheme() == "file")
            .and_then(|base| base.to_file_path().ok())
            .and_then(|path| path.parent().map(PathBuf::from))
            .ok_or(LoadError::NoFileBase)?
            .canonicalize()?;

        let target = url
            .to_file_path()
            .map_err(|()| LoadError::InvalidFilePath(url.to_string()))?
            .canonicalize()?;

        if !target.starts_with(&base_dir) {
            return Err(LoadError::OutsideBase(target.display().to_string()));
        }

        let file = File::open(&target)?;
        let data = self.read_limited(file)?;
        let mime_type = mime_for_extension(
            target
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or_default(),
        );

        Ok(Resource {
            data,
            mime_type: mime_type.to_string(),
        })
    }

    /// Fetch an `http:`/`https:` URL.
    fn fetch(&self, url: &Url) -> Result<Resource, LoadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()?;

        let response = client
            .get(url.as_str())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()?;

        if !response.status().is_success() {
            return Err(LoadError::Status(response.status().as_u16()));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or_else(|| OCTET_STREAM.to_string(), mime_essence);

        let data = self.read_limited(response)?;
        Ok(Resource { data, mime_type })
    }

    /// Read a body, stopping one byte past the configured limit.
    fn read_limited(&self, mut reader: impl Read) -> Result<Vec<u8>, LoadError> {
        let mut data = Vec::new();
        match self.config.max_bytes {
            Some(limit) => {
                let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
                let _ = reader.take(cap).read_to_end(&mut data)?;
            }
            None => {
                let _ = reader.read_to_end(&mut data)?;
            }
        }
        Ok(data)
    }
}

/// [RFC 2397](https://www.rfc-editor.org/rfc/rfc2397)
///
/// Decode a `data:` URL into its payload and media type.
///
/// `dataurl := "data:" [ mediatype ] [ ";base64" ] "," data`
///
/// # Errors
///
/// Returns [`LoadError::InvalidDataUrl`] if the comma is missing or the
/// base64 payload is malformed.
pub fn decode_data_url(url: &str) -> Result<Resource, LoadError> {
    let Some(rest) = url.strip_prefix("data:") else {
        return Err(LoadError::InvalidDataUrl("missing data: prefix".to_string()));
    };

    let Some((metadata, payload)) = rest.split_once(',') else {
        return Err(LoadError::InvalidDataUrl("missing comma".to_string()));
    };

    let (media_type, is_base64) = match metadata.strip_suffix(";base64") {
        Some(media_type) => (media_type, true),
        None => (metadata, false),
    };

    let mime_type = match mime_essence(media_type) {
        essence if essence.is_empty() => DEFAULT_DATA_MIME.to_string(),
        essence => essence,
    };

    let percent_decoded = urlencoding::decode_binary(payload.as_bytes());
    let data = if is_base64 {
        let compact: Vec<u8> = percent_decoded
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| LoadError::InvalidDataUrl(format!("base64 decode error: {e}")))?
    } else {
        percent_decoded.into_owned()
    };

    Ok(Resource { data, mime_type })
}

/// MIME type for a file extension, as a web server would report it.
#[must_use]
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "css" => "text/css",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => OCTET_STREAM,
    }
}
