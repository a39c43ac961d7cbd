//! Acquisition of `@import`ed stylesheets.
//!
//! The cascade never touches files or the network itself. It asks an
//! [`Acquire`] implementation for the bytes behind a URI and decides from
//! the answer whether to parse them.

use std::collections::HashMap;

use kestrel_common::net::{LoadError, ResourceLoader};
use thiserror::Error;

/// Bytes returned for an import, with the MIME type they were served as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    /// The stylesheet bytes.
    pub data: Vec<u8>,
    /// MIME type essence, e.g. `text/css`.
    pub mime_type: String,
}

impl Acquired {
    /// A `text/css` resource.
    #[must_use]
    pub fn css(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            mime_type: "text/css".to_string(),
        }
    }
}

/// Why an import could not be acquired.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The acquirer does not serve imports at all.
    #[error("imports are not allowed")]
    Refused,
    /// Nothing is known under this URI.
    #[error("not found")]
    NotFound,
    /// The resource loader failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Source of imported stylesheets.
pub trait Acquire {
    /// Fetch the resource behind `uri`.
    ///
    /// # Errors
    ///
    /// Returns an [`AcquireError`] if the resource is unavailable or not
    /// allowed.
    fn acquire(&self, uri: &str) -> Result<Acquired, AcquireError>;
}

impl<A: Acquire + ?Sized> Acquire for &A {
    fn acquire(&self, uri: &str) -> Result<Acquired, AcquireError> {
        (**self).acquire(uri)
    }
}

impl<A: Acquire + ?Sized> Acquire for Box<A> {
    fn acquire(&self, uri: &str) -> Result<Acquired, AcquireError> {
        (**self).acquire(uri)
    }
}

/// Refuses every import. The default for untrusted input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAcquire;

impl Acquire for NoAcquire {
    fn acquire(&self, _uri: &str) -> Result<Acquired, AcquireError> {
        Err(AcquireError::Refused)
    }
}

/// Loads imports with the policy of a [`ResourceLoader`]: `data:` always,
/// `file:` under the document directory, network only when enabled.
impl Acquire for ResourceLoader {
    fn acquire(&self, uri: &str) -> Result<Acquired, AcquireError> {
        let resource = self.load(uri)?;
        Ok(Acquired {
            data: resource.data,
            mime_type: resource.mime_type,
        })
    }
}

/// Stylesheets held in memory, looked up by exact URI.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    resources: HashMap<String, Acquired>,
}

impl StaticResources {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `resource` under `uri`, replacing anything already there.
    #[must_use]
    pub fn with(mut self, uri: &str, resource: Acquired) -> Self {
        self.insert(uri, resource);
        self
    }

    /// Serve `resource` under `uri`, replacing anything already there.
    pub fn insert(&mut self, uri: &str, resource: Acquired) {
        let _ = self.resources.insert(uri.to_string(), resource);
    }
}

impl Acquire for StaticResources {
    fn acquire(&self, uri: &str) -> Result<Acquired, AcquireError> {
        self.resources
            .get(uri)
            .cloned()
            .ok_or(AcquireError::NotFound)
    }
}
