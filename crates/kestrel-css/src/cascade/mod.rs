//! Cascade accumulation.
//!
//! The [`Accumulator`] sits behind the parser as its [`CssEventSink`] and
//! writes declarations into the [`DeclarationStore`]. It owns the policy
//! that keeps a hostile stylesheet cheap:
//!
//! - rules, declarations and store writes are counted per document, across
//!   every sheet and import, and everything past the limits is dropped;
//! - over-long selector keys are never stored, and a key repeated in one
//!   selector list is stored once;
//! - imports are followed only to a fixed depth and a fixed count, only
//!   when served as `text/css`, and only when small enough.

use std::collections::HashSet;

use crate::error::{CssWarning, StylesheetReport, quoted};
use crate::import::Acquire;
use crate::limits::{
    MAX_CSS_SIZE, MAX_DECLARATIONS, MAX_IMPORT_DEPTH, MAX_IMPORTS, MAX_RULES,
    MAX_SELECTOR_LENGTH, MAX_STORE_WRITES,
};
use crate::parser::{CssEventSink, ParseError, ParserConfig, parse_stylesheet_bytes};
use crate::selector::{SelectorKey, SelectorList};
use crate::store::DeclarationStore;

/// Document-wide counters.
///
/// Lives as long as the store it guards, so every stylesheet loaded into a
/// document draws from the same budget.
#[derive(Debug, Clone, Default)]
pub struct CascadeSession {
    rules_seen: usize,
    declarations_seen: usize,
    store_writes: usize,
    imports_seen: usize,
    import_depth: usize,
    rule_limit_reported: bool,
    declaration_limit_reported: bool,
    store_limit_reported: bool,
    import_limit_reported: bool,
}

impl CascadeSession {
    /// A fresh budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Style rules counted so far.
    #[must_use]
    pub const fn rules_seen(&self) -> usize {
        self.rules_seen
    }

    /// Declarations counted so far.
    #[must_use]
    pub const fn declarations_seen(&self) -> usize {
        self.declarations_seen
    }

    /// Store writes made so far.
    #[must_use]
    pub const fn store_writes(&self) -> usize {
        self.store_writes
    }

    /// `@import` rules followed so far, including ones whose target could
    /// not be acquired.
    #[must_use]
    pub const fn imports_seen(&self) -> usize {
        self.imports_seen
    }

    /// Current `@import` nesting level; zero outside an import.
    #[must_use]
    pub const fn import_depth(&self) -> usize {
        self.import_depth
    }

    /// Take one rule from the budget. Returns false, warning once per
    /// document, if it is spent.
    fn admit_rule(&mut self, report: &mut StylesheetReport) -> bool {
        if self.rules_seen >= MAX_RULES {
            if !self.rule_limit_reported {
                self.rule_limit_reported = true;
                report.warn(CssWarning::RuleLimit(MAX_RULES));
            }
            return false;
        }
        self.rules_seen += 1;
        true
    }

    fn admit_declaration(&mut self, report: &mut StylesheetReport) -> bool {
        if self.declarations_seen >= MAX_DECLARATIONS {
            if !self.declaration_limit_reported {
                self.declaration_limit_reported = true;
                report.warn(CssWarning::DeclarationLimit(MAX_DECLARATIONS));
            }
            return false;
        }
        self.declarations_seen += 1;
        true
    }

    fn admit_store_write(&mut self, report: &mut StylesheetReport) -> bool {
        if self.store_writes >= MAX_STORE_WRITES {
            if !self.store_limit_reported {
                self.store_limit_reported = true;
                report.warn(CssWarning::StoreWriteLimit(MAX_STORE_WRITES));
            }
            return false;
        }
        self.store_writes += 1;
        true
    }

    fn admit_import(&mut self, report: &mut StylesheetReport) -> bool {
        if self.imports_seen >= MAX_IMPORTS {
            if !self.import_limit_reported {
                self.import_limit_reported = true;
                report.warn(CssWarning::ImportLimit(MAX_IMPORTS));
            }
            return false;
        }
        self.imports_seen += 1;
        true
    }
}

/// Parser event sink that fills a [`DeclarationStore`].
pub struct Accumulator<'s, A: Acquire + ?Sized> {
    store: &'s mut DeclarationStore,
    session: &'s mut CascadeSession,
    report: &'s mut StylesheetReport,
    acquirer: &'s A,
    config: ParserConfig,
    /// Keys of the rule being read; `None` between rules or for a rule that
    /// was over the limit.
    current: Option<Vec<SelectorKey>>,
}

impl<'s, A: Acquire + ?Sized> Accumulator<'s, A> {
    /// Accumulate into `store`, drawing from `session`'s budget and
    /// recording warnings in `report`. `config` is used again for imports.
    pub fn new(
        store: &'s mut DeclarationStore,
        session: &'s mut CascadeSession,
        report: &'s mut StylesheetReport,
        acquirer: &'s A,
        config: &ParserConfig,
    ) -> Self {
        Self {
            store,
            session,
            report,
            acquirer,
            config: *config,
            current: None,
        }
    }

    /// Parse `bytes` and accumulate everything in it.
    pub fn feed(&mut self, bytes: &[u8]) {
        let config = self.config;
        parse_stylesheet_bytes(bytes, &config, self);
    }

    /// [CSS Cascading Level 4 § 2.1](https://www.w3.org/TR/css-cascade-4/#at-import)
    ///
    /// STEP 1: Refuse imports nested too deeply, before fetching anything.
    /// STEP 2: Charge the import to the import budget.
    /// STEP 3: Acquire the bytes; give up if that fails.
    /// STEP 4: Require the exact MIME type `text/css`.
    /// STEP 5: Require the size limit a top-level sheet gets.
    /// STEP 6: Parse into the same store with the same budget, one level deeper.
    fn resolve_import(&mut self, uri: &str) {
        // STEP 1
        if self.session.import_depth >= MAX_IMPORT_DEPTH {
            self.report.warn(CssWarning::ImportDepth {
                uri: quoted(uri),
                limit: MAX_IMPORT_DEPTH,
            });
            return;
        }

        // STEP 2
        if !self.session.admit_import(self.report) {
            return;
        }

        // STEP 3
        let acquired = match self.acquirer.acquire(uri) {
            Ok(acquired) => acquired,
            Err(error) => {
                self.report.warn(CssWarning::ImportFailed {
                    uri: quoted(uri),
                    reason: error.to_string(),
                });
                return;
            }
        };

        // STEP 4
        if acquired.mime_type != "text/css" {
            self.report.warn(CssWarning::ImportMimeType {
                uri: quoted(uri),
                mime_type: quoted(&acquired.mime_type),
            });
            return;
        }

        // STEP 5
        if acquired.data.len() > MAX_CSS_SIZE {
            self.report.warn(CssWarning::ImportTooLarge {
                uri: quoted(uri),
                size: acquired.data.len(),
                limit: MAX_CSS_SIZE,
            });
            return;
        }

        // STEP 6
        let outer_rule = self.current.take();
        self.session.import_depth += 1;
        self.feed(&acquired.data);
        self.session.import_depth -= 1;
        self.current = outer_rule;
        self.report.imports += 1;
    }
}

impl<A: Acquire + ?Sized> CssEventSink for Accumulator<'_, A> {
    fn begin_rule(&mut self, selectors: &SelectorList) {
        if !self.session.admit_rule(self.report) {
            self.current = None;
            return;
        }
        self.report.rules += 1;

        let mut keys = Vec::with_capacity(selectors.len());
        let mut seen = HashSet::with_capacity(selectors.len());
        for selector in selectors {
            match &selector.key {
                None => self
                    .report
                    .warn(CssWarning::UnsupportedSelector(quoted(&selector.text))),
                Some(key) if key.serialized_len() > MAX_SELECTOR_LENGTH => {
                    self.report.warn(CssWarning::SelectorTooLong {
                        selector: quoted(&selector.text),
                        length: key.serialized_len(),
                        limit: MAX_SELECTOR_LENGTH,
                    });
                }
                Some(key) => {
                    if seen.insert(key) {
                        keys.push(key.clone());
                    }
                }
            }
        }
        self.current = Some(keys);
    }

    fn declare(&mut self, name: &str, value: &str, important: bool) {
        // Declarations count against the budget even when their rule was
        // dropped, so a rule bomb cannot reset it.
        if !self.session.admit_declaration(self.report) {
            return;
        }

        let Some(keys) = &self.current else {
            return;
        };
        self.report.declarations += 1;
        for key in keys {
            if !self.session.admit_store_write(self.report) {
                break;
            }
            let _ = self.store.define(key, name, value, important);
        }
    }

    fn end_rule(&mut self) {
        self.current = None;
    }

    fn import(&mut self, uri: &str, _media: &[String]) {
        if uri.trim().is_empty() {
            return;
        }
        self.resolve_import(uri);
    }

    fn error(&mut self, error: ParseError) {
        self.report.warn(CssWarning::Parse(error));
    }

    fn ignored_at_rule(&mut self, name: &str) {
        self.report.warn(CssWarning::IgnoredAtRule(quoted(name)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::NoAcquire;

    fn accumulate(css: &str, store: &mut DeclarationStore, session: &mut CascadeSession) -> StylesheetReport {
        let mut report = StylesheetReport::default();
        Accumulator::new(store, session, &mut report, &NoAcquire, &ParserConfig::default())
            .feed(css.as_bytes());
        report
    }

    #[test]
    fn test_each_selector_in_list_gets_the_declaration() {
        let mut store = DeclarationStore::new();
        let mut session = CascadeSession::new();
        let report = accumulate("rect, .a, #b { fill: red }", &mut store, &mut session);
        assert_eq!(store.len(), 3);
        assert_eq!(report.rules, 1);
        assert_eq!(report.declarations, 1);
        assert_eq!(session.rules_seen(), 1);
    }

    #[test]
    fn test_unsupported_selector_is_counted_not_stored() {
        let mut store = DeclarationStore::new();
        let mut session = CascadeSession::new();
        let report = accumulate("g rect { fill: red }", &mut store, &mut session);
        assert!(store.is_empty());
        assert_eq!(session.declarations_seen(), 1);
        assert!(matches!(
            report.warnings.as_slice(),
            [CssWarning::UnsupportedSelector(text)] if text == "g rect"
        ));
    }

    #[test]
    fn test_import_refused_by_no_acquire() {
        let mut store = DeclarationStore::new();
        let mut session = CascadeSession::new();
        let report = accumulate("@import 'a.css'; rect { fill: red }", &mut store, &mut session);
        assert_eq!(report.imports, 0);
        assert_eq!(store.len(), 1);
        assert_eq!(session.imports_seen(), 1);
        assert_eq!(session.rules_seen(), 1);
        assert!(
            report
                .warnings
                .iter()
                .any(|w| matches!(w, CssWarning::ImportFailed { uri, .. } if uri == "a.css"))
        );
    }

    #[test]
    fn test_repeated_key_in_list_is_written_once() {
        let mut store = DeclarationStore::new();
        let mut session = CascadeSession::new();
        let report = accumulate(".a, .a, *.a, rect { fill: red }", &mut store, &mut session);
        assert_eq!(store.len(), 2);
        assert_eq!(session.store_writes(), 2);
        assert!(report.is_clean());
    }

    #[test]
    fn test_store_writes_stop_at_budget() {
        let mut store = DeclarationStore::new();
        let mut session = CascadeSession {
            store_writes: MAX_STORE_WRITES - 1,
            ..CascadeSession::default()
        };
        let report = accumulate(".a, .b { fill: red; stroke: blue }", &mut store, &mut session);
        assert_eq!(store.property_count(), 1);
        assert_eq!(session.store_writes(), MAX_STORE_WRITES);
        assert_eq!(session.declarations_seen(), 2);
        assert_eq!(report.warnings, vec![CssWarning::StoreWriteLimit(MAX_STORE_WRITES)]);
    }

    #[test]
    fn test_declaration_outside_rule_budget_still_counts() {
        let mut store = DeclarationStore::new();
        let mut session = CascadeSession {
            rules_seen: MAX_RULES,
            ..CascadeSession::default()
        };
        let report = accumulate(".a { fill: red; stroke: blue }", &mut store, &mut session);
        assert!(store.is_empty());
        assert_eq!(session.declarations_seen(), 2);
        assert_eq!(report.declarations, 0);
        assert_eq!(report.warnings, vec![CssWarning::RuleLimit(MAX_RULES)]);
    }
}
