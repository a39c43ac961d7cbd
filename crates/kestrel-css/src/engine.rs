//! One document's styling state.

use crate::cascade::{Accumulator, CascadeSession};
use crate::error::{CssWarning, StylesheetError, StylesheetReport};
use crate::import::{Acquire, NoAcquire};
use crate::limits::MAX_CSS_SIZE;
use crate::parser::ParserConfig;
use crate::store::DeclarationStore;
use crate::style::{ElementQuery, ResolvedStyle, apply};

/// Stylesheets loaded for a document, and the means to style its elements.
///
/// Every stylesheet fed to one engine shares its declaration store and its
/// rule and declaration budget.
///
/// ```ignore
/// let mut engine = StyleEngine::default();
/// let report = engine.parse_stylesheet(b"rect { fill: red }")?;
/// let style = engine.apply_styles(&ElementQuery::new("rect"));
/// assert_eq!(style.value("fill"), Some("red"));
/// ```
#[derive(Debug)]
pub struct StyleEngine<A: Acquire = NoAcquire> {
    store: DeclarationStore,
    session: CascadeSession,
    acquirer: A,
    config: ParserConfig,
}

impl Default for StyleEngine<NoAcquire> {
    fn default() -> Self {
        Self::new(NoAcquire)
    }
}

impl<A: Acquire> StyleEngine<A> {
    /// An engine with no stylesheets that loads imports through `acquirer`.
    pub fn new(acquirer: A) -> Self {
        Self {
            store: DeclarationStore::new(),
            session: CascadeSession::new(),
            acquirer,
            config: ParserConfig::default(),
        }
    }

    /// Use `config` for every stylesheet parsed from now on.
    #[must_use]
    pub const fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether `@import` rules are followed.
    pub const fn set_allow_imports(&mut self, allow: bool) {
        self.config.allow_imports = allow;
    }

    /// Parse a stylesheet into the document's store.
    ///
    /// Problems inside the sheet are warnings in the returned report.
    ///
    /// # Errors
    ///
    /// Returns [`StylesheetError::TooLarge`] if `bytes` is larger than
    /// [`MAX_CSS_SIZE`]. Nothing is parsed in that case.
    pub fn parse_stylesheet(&mut self, bytes: &[u8]) -> Result<StylesheetReport, StylesheetError> {
        let mut report = StylesheetReport::default();
        if bytes.is_empty() {
            return Ok(report);
        }
        if bytes.len() > MAX_CSS_SIZE {
            report.warn(CssWarning::TooLarge {
                size: bytes.len(),
                limit: MAX_CSS_SIZE,
            });
            return Err(StylesheetError::TooLarge {
                size: bytes.len(),
                limit: MAX_CSS_SIZE,
            });
        }

        Accumulator::new(
            &mut self.store,
            &mut self.session,
            &mut report,
            &self.acquirer,
            &self.config,
        )
        .feed(bytes);
        Ok(report)
    }

    /// [`Self::parse_stylesheet`] for text.
    ///
    /// # Errors
    ///
    /// See [`Self::parse_stylesheet`].
    pub fn parse_stylesheet_str(&mut self, css: &str) -> Result<StylesheetReport, StylesheetError> {
        self.parse_stylesheet(css.as_bytes())
    }

    /// Resolve the style of one element.
    #[must_use]
    pub fn apply_styles(&self, query: &ElementQuery<'_>) -> ResolvedStyle {
        apply(&self.store, query)
    }

    /// The declarations stored so far.
    #[must_use]
    pub const fn store(&self) -> &DeclarationStore {
        &self.store
    }

    /// The document-wide counters.
    #[must_use]
    pub const fn session(&self) -> &CascadeSession {
        &self.session
    }

    /// Rules counted so far, across all stylesheets.
    #[must_use]
    pub const fn rules_seen(&self) -> usize {
        self.session.rules_seen()
    }

    /// Declarations counted so far, across all stylesheets.
    #[must_use]
    pub const fn declarations_seen(&self) -> usize {
        self.session.declarations_seen()
    }

    /// `@import` rules followed so far, across all stylesheets.
    #[must_use]
    pub const fn imports_seen(&self) -> usize {
        self.session.imports_seen()
    }

    /// The import acquirer.
    pub const fn acquirer(&self) -> &A {
        &self.acquirer
    }

    /// The import acquirer, for changing its policy between stylesheets.
    pub const fn acquirer_mut(&mut self) -> &mut A {
        &mut self.acquirer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sheet_is_a_clean_no_op() {
        let mut engine = StyleEngine::default();
        let report = engine.parse_stylesheet(b"").unwrap();
        assert!(report.is_clean());
        assert_eq!(engine.rules_seen(), 0);
    }

    #[test]
    fn test_oversized_sheet_is_rejected() {
        let mut engine = StyleEngine::default();
        let css = vec![b' '; MAX_CSS_SIZE + 1];
        assert_eq!(
            engine.parse_stylesheet(&css),
            Err(StylesheetError::TooLarge {
                size: MAX_CSS_SIZE + 1,
                limit: MAX_CSS_SIZE
            })
        );
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_sheets_share_one_store() {
        let mut engine = StyleEngine::default();
        let _ = engine.parse_stylesheet_str(".a { fill: red }").unwrap();
        let _ = engine.parse_stylesheet_str(".a { stroke: blue }").unwrap();
        let style = engine.apply_styles(&ElementQuery::new("rect").with_class_attribute("a"));
        assert_eq!(style.value("fill"), Some("red"));
        assert_eq!(style.value("stroke"), Some("blue"));
        assert_eq!(engine.rules_seen(), 2);
    }
}
