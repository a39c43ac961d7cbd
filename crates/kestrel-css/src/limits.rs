//! Fixed resource limits.
//!
//! These bound the memory and time a hostile stylesheet can cost. They are
//! not configurable: every document handle gets the same budget.

/// Largest stylesheet, top-level or imported, that is parsed at all.
pub const MAX_CSS_SIZE: usize = 1024 * 1024;

/// Style rules accepted per document.
pub const MAX_RULES: usize = 5000;

/// Declarations accepted per document.
pub const MAX_DECLARATIONS: usize = 50_000;

/// Store writes, one per selector key per declaration, accepted per
/// document. Bounds what a long selector list can multiply the declaration
/// budget into.
pub const MAX_STORE_WRITES: usize = 200_000;

/// Longest selector key that is stored.
pub const MAX_SELECTOR_LENGTH: usize = 512;

/// Deepest chain of nested `@import`s that is followed.
pub const MAX_IMPORT_DEPTH: usize = 16;

/// `@import` rules followed per document, whether or not the target could
/// be acquired.
pub const MAX_IMPORTS: usize = 256;

/// Warnings kept in one [`StylesheetReport`](crate::StylesheetReport); the
/// rest are only counted.
pub const MAX_REPORTED_WARNINGS: usize = 256;
