//! Integration tests for the streaming CSS parser.

use kestrel_css::parser::{
    CssEventSink, ParseError, ParseErrorKind, ParserConfig, parse_declaration_list,
    parse_stylesheet, parse_stylesheet_bytes,
};
use kestrel_css::selector::{SelectorKey, SelectorList};

/// Everything a sink can be told, in order.
#[derive(Debug, Clone, PartialEq)]
enum Event {
    Begin(Vec<String>),
    Declare(String, String, bool),
    End,
    Import(String, Vec<String>),
    Error(ParseErrorKind),
    Ignored(String),
}

#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
}

impl CssEventSink for Recorder {
    fn begin_rule(&mut self, selectors: &SelectorList) {
        self.events.push(Event::Begin(
            selectors.iter().map(|s| s.text.clone()).collect(),
        ));
    }

    fn declare(&mut self, name: &str, value: &str, important: bool) {
        self.events
            .push(Event::Declare(name.to_string(), value.to_string(), important));
    }

    fn end_rule(&mut self) {
        self.events.push(Event::End);
    }

    fn import(&mut self, uri: &str, media: &[String]) {
        self.events.push(Event::Import(uri.to_string(), media.to_vec()));
    }

    fn error(&mut self, error: ParseError) {
        self.events.push(Event::Error(error.kind));
    }

    fn ignored_at_rule(&mut self, name: &str) {
        self.events.push(Event::Ignored(name.to_string()));
    }
}

fn events(css: &str) -> Vec<Event> {
    let mut recorder = Recorder::default();
    parse_stylesheet(css, &ParserConfig::default(), &mut recorder);
    recorder.events
}

fn declare(name: &str, value: &str, important: bool) -> Event {
    Event::Declare(name.to_string(), value.to_string(), important)
}

#[test]
fn test_rule_events_in_order() {
    assert_eq!(
        events("rect, .a { fill: red; stroke: blue }"),
        vec![
            Event::Begin(vec!["rect".to_string(), ".a".to_string()]),
            declare("fill", "red", false),
            declare("stroke", "blue", false),
            Event::End,
        ]
    );
}

#[test]
fn test_value_whitespace_and_comments_collapse() {
    assert_eq!(
        events("g { font-family:  Arial ,\n /* c */ sans-serif ; }")[1],
        declare("font-family", "Arial , sans-serif", false)
    );
}

#[test]
fn test_important_is_stripped() {
    assert_eq!(
        events("g { fill: red ! IMPORTANT }")[1],
        declare("fill", "red", true)
    );
}

#[test]
fn test_bad_declarations_are_reported_and_skipped() {
    assert_eq!(
        events("g { fill red; stroke: ; opacity: 1 }"),
        vec![
            Event::Begin(vec!["g".to_string()]),
            Event::Error(ParseErrorKind::MissingColon),
            Event::Error(ParseErrorKind::EmptyValue),
            declare("opacity", "1", false),
            Event::End,
        ]
    );
}

#[test]
fn test_invalid_selector_drops_rule() {
    assert_eq!(
        events("a..b { fill: red } c { fill: blue }"),
        vec![
            Event::Error(ParseErrorKind::InvalidSelector),
            Event::Begin(vec!["c".to_string()]),
            declare("fill", "blue", false),
            Event::End,
        ]
    );
}

#[test]
fn test_import_forms() {
    assert_eq!(
        events("@import 'a.css'; @import url(b.css) screen; @import url(\"c.css\");"),
        vec![
            Event::Import("a.css".to_string(), vec![]),
            Event::Import("b.css".to_string(), vec!["screen".to_string()]),
            Event::Import("c.css".to_string(), vec![]),
        ]
    );
}

#[test]
fn test_import_after_rule_is_misplaced() {
    assert_eq!(
        events("@charset \"utf-8\"; g {} @import 'a.css';"),
        vec![
            Event::Begin(vec!["g".to_string()]),
            Event::End,
            Event::Error(ParseErrorKind::MisplacedImport),
        ]
    );
}

#[test]
fn test_imports_disabled_are_ignored() {
    let mut recorder = Recorder::default();
    let config = ParserConfig {
        allow_imports: false,
    };
    parse_stylesheet("@import 'a.css';", &config, &mut recorder);
    assert_eq!(recorder.events, vec![Event::Ignored("import".to_string())]);
}

#[test]
fn test_media_block_is_skipped() {
    assert_eq!(
        events("@media screen { rect { fill: red } } g { fill: blue }"),
        vec![
            Event::Ignored("media".to_string()),
            Event::Begin(vec!["g".to_string()]),
            declare("fill", "blue", false),
            Event::End,
        ]
    );
}

#[test]
fn test_unclosed_block_at_eof() {
    assert_eq!(
        events("g { fill: red"),
        vec![
            Event::Begin(vec!["g".to_string()]),
            declare("fill", "red", false),
            Event::Error(ParseErrorKind::UnclosedBlock),
            Event::End,
        ]
    );
}

#[test]
fn test_prelude_without_block() {
    assert_eq!(
        events("g"),
        vec![Event::Error(ParseErrorKind::UnterminatedPrelude)]
    );
}

#[test]
fn test_invalid_utf8_parses_prefix_then_fails() {
    let mut recorder = Recorder::default();
    parse_stylesheet_bytes(
        b"\xEF\xBB\xBFg { fill: red } \xFF h { fill: blue }",
        &ParserConfig::default(),
        &mut recorder,
    );
    assert_eq!(
        recorder.events,
        vec![
            Event::Begin(vec!["g".to_string()]),
            declare("fill", "red", false),
            Event::End,
            Event::Error(ParseErrorKind::InvalidUtf8),
        ]
    );
}

#[test]
fn test_only_one_byte_order_mark_is_skipped() {
    let mut recorder = Recorder::default();
    parse_stylesheet_bytes(
        b"\xEF\xBB\xBF\xEF\xBB\xBFa{b:c}",
        &ParserConfig::default(),
        &mut recorder,
    );
    assert_eq!(
        recorder.events,
        vec![
            Event::Begin(vec!["\u{FEFF}a".to_string()]),
            declare("b", "c", false),
            Event::End,
        ]
    );
}

#[test]
fn test_selector_keys_from_rule() {
    struct Keys(Vec<Option<SelectorKey>>);
    impl CssEventSink for Keys {
        fn begin_rule(&mut self, selectors: &SelectorList) {
            self.0.extend(selectors.iter().map(|s| s.key.clone()));
        }
        fn declare(&mut self, _: &str, _: &str, _: bool) {}
        fn end_rule(&mut self) {}
        fn error(&mut self, _: ParseError) {}
    }

    let mut keys = Keys(Vec::new());
    parse_stylesheet(
        "*.a, div#x.y, g > rect {}",
        &ParserConfig::default(),
        &mut keys,
    );
    assert_eq!(
        keys.0,
        vec![
            SelectorKey::parse(".a"),
            SelectorKey::parse("div.y#x"),
            None
        ]
    );
}

#[test]
fn test_declaration_list() {
    let declarations = parse_declaration_list("fill: red; bogus; stroke: blue !important");
    let names: Vec<_> = declarations
        .iter()
        .map(|d| (d.name.as_str(), d.value.as_str(), d.important))
        .collect();
    assert_eq!(names, vec![("fill", "red", false), ("stroke", "blue", true)]);
}
