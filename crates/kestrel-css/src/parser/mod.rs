//! CSS parser module.
//!
//! The parser does not build a stylesheet object. It walks the token stream
//! once and reports what it finds to a [`CssEventSink`]: rule boundaries,
//! declarations, `@import`s and parse errors. Whatever sits behind the sink
//! decides what to keep.

use thiserror::Error;

use crate::selector::SelectorList;

/// Streaming parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod css_parser;

pub use css_parser::{
    CSSParser, Declaration, parse_declaration_list, parse_stylesheet, parse_stylesheet_bytes,
};

/// Receiver of parse events, in source order.
///
/// For every style rule with a usable prelude the parser calls
/// [`begin_rule`](Self::begin_rule), then [`declare`](Self::declare) once per
/// declaration in the block, then [`end_rule`](Self::end_rule).
pub trait CssEventSink {
    /// A style rule starts. The selector list stays valid until `end_rule`.
    fn begin_rule(&mut self, selectors: &SelectorList);

    /// A declaration inside the current rule. `value` is serialized from the
    /// source with `!important` removed.
    fn declare(&mut self, name: &str, value: &str, important: bool);

    /// The current rule ends.
    fn end_rule(&mut self);

    /// [CSS Cascading Level 4 § 2.1](https://www.w3.org/TR/css-cascade-4/#at-import)
    ///
    /// An `@import` rule in a position where it is allowed. `uri` may be empty.
    fn import(&mut self, _uri: &str, _media: &[String]) {}

    /// A parse error. Parsing continues after every error except a fatal one,
    /// which is always the last event.
    fn error(&mut self, error: ParseError);

    /// An at-rule the engine does not interpret (`@media`, `@font-face`, ...)
    /// was skipped along with its block.
    fn ignored_at_rule(&mut self, _name: &str) {}
}

/// Per-invocation parser settings.
///
/// Built by the caller and passed by reference; the parser keeps no global
/// state between invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Report `@import` rules to the sink. When false they are skipped like
    /// any other uninterpreted at-rule.
    pub allow_imports: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            allow_imports: true,
        }
    }
}

/// What went wrong at a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// [§ 5.4.3](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    /// "EOF: This is a parse error. Return nothing."
    #[error("rule prelude is not followed by a block")]
    UnterminatedPrelude,
    /// A block was still open at the end of the input.
    #[error("unclosed block at end of input")]
    UnclosedBlock,
    /// The selector list could not be parsed; the whole rule is dropped.
    #[error("invalid selector")]
    InvalidSelector,
    /// [§ 5.4.6](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    /// "If the next token is anything other than a <colon-token>, this is a
    /// parse error."
    #[error("declaration without ':'")]
    MissingColon,
    /// A declaration with nothing after the colon.
    #[error("declaration without a value")]
    EmptyValue,
    /// A token that cannot start a declaration.
    #[error("unexpected token in declaration list")]
    UnexpectedToken,
    /// A `<bad-string-token>` or `<bad-url-token>` inside a declaration.
    #[error("malformed string or url")]
    BadToken,
    /// `@import` after a style rule or another at-rule.
    #[error("@import after other rules")]
    MisplacedImport,
    /// `@import` without a string or url, or with a block.
    #[error("malformed @import")]
    MalformedImport,
    /// The input is not UTF-8. Everything before the first invalid byte has
    /// been parsed; nothing after it is.
    #[error("stylesheet is not valid UTF-8")]
    InvalidUtf8,
}

/// A parse error and the byte offset where it was noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Byte offset into the stylesheet.
    pub offset: usize,
}

impl ParseError {
    /// Whether parsing stopped because of this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind, ParseErrorKind::InvalidUtf8)
    }
}
