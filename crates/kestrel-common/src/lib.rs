//! Common utilities for the Kestrel CSS engine.
//!
//! This crate provides shared infrastructure used by the engine and the CLI:
//! - **Warning System** - deduplicated, colored terminal diagnostics
//! - **URL resolution** - relative references against a document base
//! - **Resource loading** - `data:`, sandboxed `file:` and opt-in network fetches

pub mod net;
pub mod url;
pub mod warning;

pub use net::{LoadError, LoaderConfig, Resource, ResourceLoader};
pub use warning::{clear_warnings, warn_once};
