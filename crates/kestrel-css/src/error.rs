//! Warnings and errors raised while loading stylesheets.
//!
//! Nothing that goes wrong inside a stylesheet stops a document from
//! loading. Every problem is a [`CssWarning`]: it is logged through
//! [`warn_once`] and collected in the [`StylesheetReport`] of the sheet that
//! caused it. The only error is [`StylesheetError`], for a top-level sheet
//! that is rejected before parsing starts.

use kestrel_common::warning::warn_once;
use thiserror::Error;

use crate::limits::MAX_REPORTED_WARNINGS;
use crate::parser::ParseError;

/// Longest selector or URL quoted in a warning.
const MAX_QUOTED_LEN: usize = 80;

/// A recoverable problem found while loading a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssWarning {
    /// A top-level stylesheet was larger than the size limit.
    #[error("stylesheet of {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Size of the rejected stylesheet.
        size: usize,
        /// The limit it exceeded.
        limit: usize,
    },
    /// The per-document rule budget is spent.
    #[error("rule limit of {0} reached; further rules ignored")]
    RuleLimit(usize),
    /// The per-document declaration budget is spent.
    #[error("declaration limit of {0} reached; further declarations ignored")]
    DeclarationLimit(usize),
    /// The per-document store write budget is spent.
    #[error("store write limit of {0} reached; further selector keys ignored")]
    StoreWriteLimit(usize),
    /// The per-document import budget is spent.
    #[error("import limit of {0} reached; further imports ignored")]
    ImportLimit(usize),
    /// A selector key longer than the limit was dropped.
    #[error("selector '{selector}' is {length} bytes, longer than {limit}; ignored")]
    SelectorTooLong {
        /// Start of the selector text.
        selector: String,
        /// Length of the key.
        length: usize,
        /// The limit it exceeded.
        limit: usize,
    },
    /// A valid selector the cascade has no key for.
    #[error("unsupported selector '{0}' ignored")]
    UnsupportedSelector(String),
    /// An `@import` nested deeper than the limit.
    #[error("import of '{uri}' skipped: nested deeper than {limit}")]
    ImportDepth {
        /// The import target.
        uri: String,
        /// The depth limit.
        limit: usize,
    },
    /// An `@import` target could not be acquired.
    #[error("import of '{uri}' failed: {reason}")]
    ImportFailed {
        /// The import target.
        uri: String,
        /// Why acquisition failed.
        reason: String,
    },
    /// An `@import` target was not served as `text/css`.
    #[error("import of '{uri}' skipped: MIME type '{mime_type}' is not text/css")]
    ImportMimeType {
        /// The import target.
        uri: String,
        /// The MIME type it was served with.
        mime_type: String,
    },
    /// An `@import` target was larger than the size limit.
    #[error("import of '{uri}' skipped: {size} bytes exceeds the {limit} byte limit")]
    ImportTooLarge {
        /// The import target.
        uri: String,
        /// Size of the imported data.
        size: usize,
        /// The limit it exceeded.
        limit: usize,
    },
    /// An at-rule the engine does not interpret.
    #[error("@{0} rule ignored")]
    IgnoredAtRule(String),
    /// A parse error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl CssWarning {
    /// The message logged for this warning.
    ///
    /// Parse errors leave out the byte offset so that the same mistake
    /// repeated across a sheet is logged once.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self {
            Self::Parse(error) => format!("parse error: {}", error.kind),
            other => other.to_string(),
        }
    }
}

/// Shorten attacker-controlled text before it is quoted in a warning.
pub(crate) fn quoted(text: &str) -> String {
    match text.char_indices().nth(MAX_QUOTED_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// A stylesheet rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StylesheetError {
    /// The stylesheet is larger than the size limit. Nothing was parsed.
    #[error("stylesheet of {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Size of the rejected stylesheet.
        size: usize,
        /// The limit it exceeded.
        limit: usize,
    },
}

/// What loading one stylesheet (and its imports) did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylesheetReport {
    /// Style rules accepted.
    pub rules: usize,
    /// Declarations accepted.
    pub declarations: usize,
    /// Imported stylesheets that were parsed.
    pub imports: usize,
    /// Warnings raised, in order, up to a fixed number.
    pub warnings: Vec<CssWarning>,
    /// Warnings raised beyond those kept in `warnings`.
    pub suppressed_warnings: usize,
}

impl StylesheetReport {
    /// Log a warning and record it.
    pub fn warn(&mut self, warning: CssWarning) {
        warn_once("CSS", &warning.log_message());
        if self.warnings.len() < MAX_REPORTED_WARNINGS {
            self.warnings.push(warning);
        } else {
            self.suppressed_warnings += 1;
        }
    }

    /// Total number of warnings raised.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.len() + self.suppressed_warnings
    }

    /// Whether any warning was raised.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warning_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseErrorKind;

    #[test]
    fn test_parse_warning_log_message_has_no_offset() {
        let warning = CssWarning::from(ParseError {
            kind: ParseErrorKind::MissingColon,
            offset: 42,
        });
        assert_eq!(warning.to_string(), "declaration without ':' at byte 42");
        assert_eq!(warning.log_message(), "parse error: declaration without ':'");
    }

    #[test]
    fn test_report_caps_stored_warnings() {
        let mut report = StylesheetReport::default();
        for _ in 0..MAX_REPORTED_WARNINGS + 3 {
            report.warn(CssWarning::IgnoredAtRule("media".to_string()));
        }
        assert_eq!(report.warnings.len(), MAX_REPORTED_WARNINGS);
        assert_eq!(report.suppressed_warnings, 3);
        assert_eq!(report.warning_count(), MAX_REPORTED_WARNINGS + 3);
    }

    #[test]
    fn test_quoted_shortens_long_text() {
        let long = "a".repeat(500);
        assert_eq!(quoted(&long).len(), MAX_QUOTED_LEN + 3);
        assert_eq!(quoted("rect"), "rect");
    }
}
