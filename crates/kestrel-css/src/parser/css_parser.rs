//! CSS Parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! "The input to the parsing stage is a stream of tokens from the tokenization stage."
//!
//! Tokens are pulled from the tokenizer one at a time with a single token of
//! lookahead. Only a rule prelude or a declaration value is ever held in
//! memory at once.

use super::{CssEventSink, ParseError, ParseErrorKind, ParserConfig};
use crate::selector::SelectorList;
use crate::tokenizer::{CSSToken, CSSTokenizer, SpannedToken};

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
///
/// A declaration from a `style` attribute (e.g., `color: red`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The property name as written.
    pub name: String,
    /// The value serialized from the source, without `!important`.
    pub value: String,
    /// Whether the declaration has `!important`.
    pub important: bool,
}

/// Streaming CSS parser.
pub struct CSSParser<'a> {
    tokenizer: CSSTokenizer<'a>,
    lookahead: Option<SpannedToken>,
    config: ParserConfig,
    /// Set once anything other than `@charset` or `@import` has been seen.
    seen_rule: bool,
}

impl<'a> CSSParser<'a> {
    /// Create a parser over `source`. A leading byte order mark is ignored.
    #[must_use]
    pub fn new(source: &'a str, config: &ParserConfig) -> Self {
        let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
        Self {
            tokenizer: CSSTokenizer::new(source),
            lookahead: None,
            config: *config,
            seen_rule: false,
        }
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    ///
    /// "Consume a list of rules from input, with the top-level flag set."
    pub fn parse_stylesheet<S: CssEventSink + ?Sized>(&mut self, sink: &mut S) {
        loop {
            match self.peek() {
                // "<EOF-token>": "Return the list of rules."
                CSSToken::EOF => return,

                // "<whitespace-token>": "Do nothing."
                // "<CDO-token> / <CDC-token>": "If the top-level flag is set, do nothing."
                CSSToken::Whitespace | CSSToken::CDO | CSSToken::CDC => {
                    let _ = self.consume();
                }

                // "<at-keyword-token>": "Consume an at-rule."
                CSSToken::AtKeyword(_) => self.consume_at_rule(sink),

                // "anything else": "Consume a qualified rule."
                _ => self.consume_qualified_rule(sink),
            }
        }
    }

    /// [§ 5.3.6 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
    ///
    /// Parse declarations from a style attribute or similar. No rule events
    /// are emitted, only `declare` and `error`.
    pub fn parse_declaration_list<S: CssEventSink + ?Sized>(&mut self, sink: &mut S) {
        self.consume_declarations(false, sink);
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule<S: CssEventSink + ?Sized>(&mut self, sink: &mut S) {
        let offset = self.peek_offset();
        let (name, prelude, has_block) = self.consume_at_rule_parts(false, sink);

        // "@charset" is only an encoding hint; the input is already text.
        if name.eq_ignore_ascii_case("charset") {
            return;
        }

        if !name.eq_ignore_ascii_case("import") {
            self.seen_rule = true;
            sink.ignored_at_rule(&name);
            return;
        }

        if !self.config.allow_imports {
            sink.ignored_at_rule(&name);
            return;
        }

        // [CSS Cascading Level 4 § 2.1](https://www.w3.org/TR/css-cascade-4/#at-import)
        // "Any @import rules must precede all other valid at-rules and style
        // rules in a style sheet (ignoring @charset and @layer statement rules)
        // and must not have any other valid at-rules or style rules between it
        // and previous @import rules, or else the @import rule is invalid."
        if self.seen_rule {
            sink.error(ParseError {
                kind: ParseErrorKind::MisplacedImport,
                offset,
            });
            return;
        }

        match import_target(&prelude, self.tokenizer.source()) {
            Some((uri, media)) if !has_block => sink.import(&uri, &media),
            _ => sink.error(ParseError {
                kind: ParseErrorKind::MalformedImport,
                offset,
            }),
        }
    }

    /// Consume an at-rule and its block, if any. Returns the name, the
    /// prelude and whether a block followed.
    fn consume_at_rule_parts<S: CssEventSink + ?Sized>(
        &mut self,
        in_block: bool,
        sink: &mut S,
    ) -> (String, Vec<SpannedToken>, bool) {
        let name = match self.consume().token {
            CSSToken::AtKeyword(name) => name,
            _ => String::new(),
        };

        // "Consume the next input token": the prelude runs to a ';' or a '{'.
        let prelude = self.collect_until(move |token| {
            matches!(token, CSSToken::Semicolon | CSSToken::LeftBrace)
                || (in_block && matches!(token, CSSToken::RightBrace))
        });

        let has_block = match self.peek() {
            CSSToken::LeftBrace => {
                self.skip_block(sink);
                true
            }
            CSSToken::Semicolon => {
                let _ = self.consume();
                false
            }
            _ => false,
        };

        (name, prelude, has_block)
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule<S: CssEventSink + ?Sized>(&mut self, sink: &mut S) {
        let offset = self.peek_offset();
        let prelude = self.collect_until(|token| matches!(token, CSSToken::LeftBrace));

        // "<EOF-token>": "This is a parse error. Return nothing."
        if self.peek().is_eof() {
            sink.error(ParseError {
                kind: ParseErrorKind::UnterminatedPrelude,
                offset,
            });
            return;
        }

        self.seen_rule = true;

        // [Selectors Level 4 § 3.1](https://www.w3.org/TR/selectors-4/#invalid)
        // "If a selector list contains an invalid selector, the entire rule is
        // invalid."
        let Some(selectors) = SelectorList::parse(&prelude, self.tokenizer.source()) else {
            sink.error(ParseError {
                kind: ParseErrorKind::InvalidSelector,
                offset,
            });
            self.skip_block(sink);
            return;
        };

        let _ = self.consume(); // {
        sink.begin_rule(&selectors);
        self.consume_declarations(true, sink);
        sink.end_rule();
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    ///
    /// Inside a block the list ends at the matching '}', which is consumed.
    fn consume_declarations<S: CssEventSink + ?Sized>(&mut self, in_block: bool, sink: &mut S) {
        loop {
            match self.peek() {
                // "<whitespace-token>" or "<semicolon-token>": "Do nothing."
                CSSToken::Whitespace | CSSToken::Semicolon => {
                    let _ = self.consume();
                }

                CSSToken::EOF => {
                    if in_block {
                        let offset = self.peek_offset();
                        sink.error(ParseError {
                            kind: ParseErrorKind::UnclosedBlock,
                            offset,
                        });
                    }
                    return;
                }

                CSSToken::RightBrace if in_block => {
                    let _ = self.consume();
                    return;
                }

                // "<at-keyword-token>": nested at-rules carry nothing the
                // cascade uses.
                CSSToken::AtKeyword(_) => {
                    let (name, _, _) = self.consume_at_rule_parts(in_block, sink);
                    sink.ignored_at_rule(&name);
                }

                // "<ident-token>": "Consume a declaration."
                CSSToken::Ident(_) => self.consume_declaration(in_block, sink),

                // "anything else": "This is a parse error. ... As long as the
                // next input token is anything other than a <semicolon-token>
                // or <EOF-token>, consume a component value and throw away the
                // returned value."
                _ => {
                    let offset = self.peek_offset();
                    sink.error(ParseError {
                        kind: ParseErrorKind::UnexpectedToken,
                        offset,
                    });
                    self.skip_declaration(in_block);
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration<S: CssEventSink + ?Sized>(&mut self, in_block: bool, sink: &mut S) {
        let name_token = self.consume();
        let offset = name_token.start;
        let CSSToken::Ident(name) = name_token.token else {
            return;
        };

        // "While the next input token is a <whitespace-token>, consume the next input token."
        self.skip_whitespace();

        // "If the next input token is anything other than a <colon-token>, this is a parse error.
        // Return nothing."
        if !matches!(self.peek(), CSSToken::Colon) {
            sink.error(ParseError {
                kind: ParseErrorKind::MissingColon,
                offset,
            });
            self.skip_declaration(in_block);
            return;
        }
        let _ = self.consume(); // :

        let value = self.collect_until(move |token| ends_declaration(token, in_block));

        if value
            .iter()
            .any(|token| matches!(token.token, CSSToken::BadString | CSSToken::BadUrl))
        {
            sink.error(ParseError {
                kind: ParseErrorKind::BadToken,
                offset,
            });
            return;
        }

        let important = check_important(&value);
        let value = serialize_tokens(&trim_important(value), self.tokenizer.source());

        if value.is_empty() {
            sink.error(ParseError {
                kind: ParseErrorKind::EmptyValue,
                offset,
            });
            return;
        }

        sink.declare(&name, &value, important);
    }

    /// Skip a `{}` block whose opening brace is the next token.
    fn skip_block<S: CssEventSink + ?Sized>(&mut self, sink: &mut S) {
        let open = self.consume();
        let mut depth = 1_usize;

        loop {
            let token = self.consume();
            if token.token.is_eof() {
                sink.error(ParseError {
                    kind: ParseErrorKind::UnclosedBlock,
                    offset: open.start,
                });
                return;
            }
            if token.token.opens_block() {
                depth += 1;
            } else if token.token.closes_block() {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    fn skip_declaration(&mut self, in_block: bool) {
        self.walk_until(move |token| ends_declaration(token, in_block), drop);
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_whitespace() {
            let _ = self.consume();
        }
    }

    /// [§ 5.4.8 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    ///
    /// Collect component values until `stop` matches a token outside any
    /// nested block, or EOF. The stopping token is left unconsumed.
    fn collect_until(&mut self, stop: impl Fn(&CSSToken) -> bool) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();
        self.walk_until(stop, |token| tokens.push(token));
        tokens
    }

    fn walk_until(
        &mut self,
        stop: impl Fn(&CSSToken) -> bool,
        mut visit: impl FnMut(SpannedToken),
    ) {
        let mut depth = 0_usize;
        loop {
            let token = self.peek();
            if token.is_eof() || (depth == 0 && stop(token)) {
                return;
            }
            if token.opens_block() {
                depth += 1;
            } else if token.closes_block() {
                depth = depth.saturating_sub(1);
            }
            visit(self.consume());
        }
    }

    fn peek(&mut self) -> &CSSToken {
        let tokenizer = &mut self.tokenizer;
        &self
            .lookahead
            .get_or_insert_with(|| tokenizer.next_token())
            .token
    }

    fn peek_offset(&mut self) -> usize {
        let _ = self.peek();
        self.lookahead
            .as_ref()
            .map_or_else(|| self.tokenizer.position(), |token| token.start)
    }

    fn consume(&mut self) -> SpannedToken {
        self.lookahead
            .take()
            .unwrap_or_else(|| self.tokenizer.next_token())
    }
}

/// Parse a stylesheet from text, reporting events to `sink`.
pub fn parse_stylesheet<S: CssEventSink + ?Sized>(
    source: &str,
    config: &ParserConfig,
    sink: &mut S,
) {
    CSSParser::new(source, config).parse_stylesheet(sink);
}

/// Parse a stylesheet from raw bytes.
///
/// A leading byte order mark is skipped by [`CSSParser::new`]. If the bytes
/// are not valid UTF-8 the valid prefix is parsed and then a fatal
/// [`ParseErrorKind::InvalidUtf8`] error is reported.
pub fn parse_stylesheet_bytes<S: CssEventSink + ?Sized>(
    bytes: &[u8],
    config: &ParserConfig,
    sink: &mut S,
) {
    match core::str::from_utf8(bytes) {
        Ok(source) => parse_stylesheet(source, config, sink),
        Err(error) => {
            let valid = error.valid_up_to();
            let prefix = bytes
                .get(..valid)
                .and_then(|prefix| core::str::from_utf8(prefix).ok())
                .unwrap_or_default();
            parse_stylesheet(prefix, config, sink);
            sink.error(ParseError {
                kind: ParseErrorKind::InvalidUtf8,
                offset: valid,
            });
        }
    }
}

/// [§ 5.3.6 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
///
/// Parse the contents of a `style` attribute. Malformed declarations are
/// dropped.
#[must_use]
pub fn parse_declaration_list(text: &str) -> Vec<Declaration> {
    let mut collector = DeclarationCollector::default();
    CSSParser::new(text, &ParserConfig::default()).parse_declaration_list(&mut collector);
    collector.declarations
}

#[derive(Default)]
struct DeclarationCollector {
    declarations: Vec<Declaration>,
}

impl CssEventSink for DeclarationCollector {
    fn begin_rule(&mut self, _selectors: &SelectorList) {}

    fn declare(&mut self, name: &str, value: &str, important: bool) {
        self.declarations.push(Declaration {
            name: name.to_string(),
            value: value.to_string(),
            important,
        });
    }

    fn end_rule(&mut self) {}

    fn error(&mut self, _error: ParseError) {}
}

fn ends_declaration(token: &CSSToken, in_block: bool) -> bool {
    matches!(token, CSSToken::Semicolon) || (in_block && matches!(token, CSSToken::RightBrace))
}

/// [CSS Cascading Level 4 § 2.1](https://www.w3.org/TR/css-cascade-4/#at-import)
///
/// "@import [ <url> | <string> ] <media-query-list>?"
///
/// Returns the URL and the media queries, each serialized from the source.
fn import_target(prelude: &[SpannedToken], source: &str) -> Option<(String, Vec<String>)> {
    let mut index = skip_whitespace_tokens(prelude, 0);

    let uri = match &prelude.get(index)?.token {
        CSSToken::Url(uri) | CSSToken::String(uri) => {
            index += 1;
            uri.clone()
        }
        CSSToken::Function(name) if name.eq_ignore_ascii_case("url") => {
            index = skip_whitespace_tokens(prelude, index + 1);
            let CSSToken::String(uri) = &prelude.get(index)?.token else {
                return None;
            };
            index = skip_whitespace_tokens(prelude, index + 1);
            if !matches!(prelude.get(index)?.token, CSSToken::RightParen) {
                return None;
            }
            index += 1;
            uri.clone()
        }
        _ => return None,
    };

    let media = prelude
        .get(index..)
        .unwrap_or_default()
        .split(|token| matches!(token.token, CSSToken::Comma))
        .map(|query| serialize_tokens(query, source))
        .filter(|query| !query.is_empty())
        .collect();

    Some((uri, media))
}

fn skip_whitespace_tokens(tokens: &[SpannedToken], mut index: usize) -> usize {
    while tokens.get(index).is_some_and(|token| token.token.is_whitespace()) {
        index += 1;
    }
    index
}

/// [§ 9 Serialization](https://www.w3.org/TR/css-syntax-3/#serialization)
///
/// Serialize tokens by copying their source text. Whitespace runs and
/// comments between tokens become a single space; leading and trailing
/// whitespace is dropped.
fn serialize_tokens(tokens: &[SpannedToken], source: &str) -> String {
    let mut out = String::new();
    let mut previous_end = None;

    for token in tokens {
        let separated = token.token.is_whitespace()
            || previous_end.is_some_and(|end| end < token.start);
        if separated && !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
        if !token.token.is_whitespace() {
            out.push_str(source.get(token.span()).unwrap_or_default());
        }
        previous_end = Some(token.end);
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

/// Check if the value ends with !important.
///
/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation, i.e.
/// if the last two (non-whitespace, non-comment) tokens in its value are
/// a <delim-token> with the value "!" followed by an <ident-token> with
/// a value that is an ASCII case-insensitive match for "important"."
///
/// STEP 1: Skip trailing whitespace in the value.
/// STEP 2: Check for <ident-token> "important".
/// STEP 3: Skip any whitespace between "!" and "important".
/// STEP 4: Check for <delim-token> "!".
fn check_important(value: &[SpannedToken]) -> bool {
    let mut iter = value.iter().rev().map(|token| &token.token).peekable();

    // STEP 1: Skip trailing whitespace
    while iter.next_if(|token| token.is_whitespace()).is_some() {}

    // STEP 2: Check for ident "important"
    match iter.next() {
        Some(CSSToken::Ident(s)) if s.eq_ignore_ascii_case("important") => {}
        _ => return false,
    }

    // STEP 3: Skip whitespace between ! and important
    while iter.next_if(|token| token.is_whitespace()).is_some() {}

    // STEP 4: Check for !
    matches!(iter.next(), Some(CSSToken::Delim('!')))
}

/// Remove trailing whitespace and !important from a declaration value.
///
/// STEP 1: Remove trailing whitespace.
/// STEP 2: Remove "important" ident token, the whitespace before it and the "!".
/// STEP 3: Remove any remaining trailing whitespace.
fn trim_important(mut value: Vec<SpannedToken>) -> Vec<SpannedToken> {
    let pop_whitespace = |value: &mut Vec<SpannedToken>| {
        while value.last().is_some_and(|token| token.token.is_whitespace()) {
            let _ = value.pop();
        }
    };

    // STEP 1
    pop_whitespace(&mut value);

    // STEP 2
    if check_important(&value) {
        let _ = value.pop();
        pop_whitespace(&mut value);
        let _ = value.pop();
    }

    // STEP 3
    pop_whitespace(&mut value);
    value
}
