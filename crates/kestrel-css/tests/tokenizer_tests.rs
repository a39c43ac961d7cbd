//! Integration tests for the CSS tokenizer.

use kestrel_css::tokenizer::{CSSToken, HashType, NumericType, tokenize};

/// Helper to tokenize a string and return just the tokens
fn tokens(input: &str) -> Vec<CSSToken> {
    tokenize(input).into_iter().map(|t| t.token).collect()
}

#[test]
fn test_whitespace() {
    let tokens = tokens("   \t\n  ");
    assert_eq!(tokens, vec![CSSToken::Whitespace, CSSToken::EOF]);
}

#[test]
fn test_ident() {
    match &tokens("stroke-width")[0] {
        CSSToken::Ident(name) => assert_eq!(name, "stroke-width"),
        other => panic!("Expected Ident token, got {other}"),
    }
}

#[test]
fn test_hash_types() {
    let tokens = tokens("#main #123");
    assert_eq!(tokens[0], CSSToken::hash_id("main"));
    assert_eq!(
        tokens[2],
        CSSToken::Hash {
            value: "123".to_string(),
            hash_type: HashType::Unrestricted
        }
    );
}

#[test]
fn test_numbers() {
    let tokens = tokens("3 2.5 50% 10px");
    assert!(matches!(
        tokens[0],
        CSSToken::Number {
            numeric_type: NumericType::Integer,
            ..
        }
    ));
    assert!(matches!(
        tokens[2],
        CSSToken::Number {
            numeric_type: NumericType::Number,
            ..
        }
    ));
    assert!(matches!(tokens[4], CSSToken::Percentage { value } if (value - 50.0).abs() < f64::EPSILON));
    assert!(matches!(&tokens[6], CSSToken::Dimension { unit, .. } if unit == "px"));
}

#[test]
fn test_strings_and_bad_strings() {
    assert_eq!(tokens("'a\\62 c'")[0], CSSToken::String("abc".to_string()));
    assert_eq!(tokens("\"broken\nrest")[0], CSSToken::BadString);
}

#[test]
fn test_url_forms() {
    assert_eq!(tokens("url(a.css)")[0], CSSToken::Url("a.css".to_string()));
    assert_eq!(tokens("url( 'a.css' )")[0], CSSToken::Function("url".to_string()));
    assert_eq!(tokens("url(a b)")[0], CSSToken::BadUrl);
}

#[test]
fn test_at_keyword_and_punctuation() {
    assert_eq!(
        tokens("@import;{}:,"),
        vec![
            CSSToken::AtKeyword("import".to_string()),
            CSSToken::Semicolon,
            CSSToken::LeftBrace,
            CSSToken::RightBrace,
            CSSToken::Colon,
            CSSToken::Comma,
            CSSToken::EOF,
        ]
    );
}

#[test]
fn test_cdo_cdc() {
    assert_eq!(
        tokens("<!-- -->"),
        vec![CSSToken::CDO, CSSToken::Whitespace, CSSToken::CDC, CSSToken::EOF]
    );
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        tokens("a/* x */b"),
        vec![CSSToken::ident("a"), CSSToken::ident("b"), CSSToken::EOF]
    );
}

#[test]
fn test_spans_cover_source_text() {
    let source = "rect { fill : #f00 }";
    for token in tokenize(source) {
        if let CSSToken::Hash { .. } = token.token {
            assert_eq!(&source[token.span()], "#f00");
        }
    }
}

#[test]
fn test_delim() {
    assert_eq!(tokens("*")[0], CSSToken::Delim('*'));
    assert_eq!(tokens(".")[0], CSSToken::Delim('.'));
}
