//! A bounded CSS cascade for SVG documents.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - All token types, with byte spans
//!   - Comment handling
//!   - Escape sequences
//!
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Streaming, event based: rules and declarations are handed to a
//!     [`CssEventSink`] as they are read
//!   - `@import`; every other at-rule is skipped
//!   - `style` attribute declaration lists
//!
//! - **Selector keys** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, class, id and universal selectors and compounds of one of each
//!
//! - **Cascade** ([CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/))
//!   - A keyed declaration store with sticky `!important`
//!   - Fixed lookup order in place of specificity
//!   - SVG presentation attributes and inline styles
//!
//! # Limits
//!
//! Every document handle gets the budget in [`limits`]: stylesheet size,
//! rule, declaration, store write and import counts, selector length and
//! import depth. Work past
//! a limit is dropped with a [`CssWarning`]; only an oversized top-level
//! sheet is an error.
//!
//! # Not Implemented
//!
//! - Combinators, pseudo-classes and attribute selectors
//! - Media queries
//! - Inheritance and value computation

/// Cascade accumulation per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod cascade;
/// The per-document engine.
pub mod engine;
/// Warnings and errors.
pub mod error;
/// `@import` acquisition per [CSS Cascading Level 4 § 2.1](https://www.w3.org/TR/css-cascade-4/#at-import).
pub mod import;
pub mod limits;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// Selector keys per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
pub mod store;
/// Style application.
pub mod style;
/// CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;

// Re-exports for convenience
pub use cascade::{Accumulator, CascadeSession};
pub use engine::StyleEngine;
pub use error::{CssWarning, StylesheetError, StylesheetReport};
pub use import::{Acquire, AcquireError, Acquired, NoAcquire, StaticResources};
pub use parser::{
    CSSParser, CssEventSink, Declaration, ParseError, ParseErrorKind, ParserConfig,
    parse_declaration_list,
};
pub use selector::{Selector, SelectorKey, SelectorList};
pub use store::{DeclarationStore, PropertyValue};
pub use style::{AttributeBag, ElementQuery, Origin, ResolvedStyle, ResolvedValue, apply};
pub use tokenizer::{CSSToken, CSSTokenizer};
