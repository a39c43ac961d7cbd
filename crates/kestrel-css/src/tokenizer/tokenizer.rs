use super::token::{CSSToken, HashType, NumericType, SpannedToken};

/// [§ 4.3 Tokenizer Algorithms](https://www.w3.org/TR/css-syntax-3/#tokenizer-algorithms)
///
/// Streaming CSS tokenizer over a borrowed string.
///
/// Tokens are produced on demand, one at a time, each with the byte span it
/// covers in the input. The tokenizer never buffers more than the current
/// token, so memory use does not grow with the size of the stylesheet.
///
/// As an [`Iterator`] it yields every token up to and including a single
/// [`CSSToken::EOF`], then `None`.
pub struct CSSTokenizer<'a> {
    /// The input string being tokenized
    input: &'a str,
    /// Byte offset of the next code point
    position: usize,
    /// UTF-8 length of the last consumed code point, for `reconsume`
    last_len: usize,
    /// Whether EOF has already been handed out by the iterator
    finished: bool,
}

impl<'a> CSSTokenizer<'a> {
    /// Create a new CSS tokenizer with the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            last_len: 0,
            finished: false,
        }
    }

    /// The input being tokenized.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.input
    }

    /// Byte offset of the next unread code point.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    ///
    /// "This section describes how to consume a token from a stream of code points.
    /// It will return a single token of any type."
    ///
    /// Once the input is exhausted every further call returns EOF.
    pub fn next_token(&mut self) -> SpannedToken {
        // "Consume comments."
        self.consume_comments();

        let start = self.position;
        let token = self.consume_token();
        SpannedToken {
            token,
            start,
            end: self.position,
        }
    }

    fn consume_token(&mut self) -> CSSToken {
        // "Consume the next input code point."
        let Some(c) = self.consume() else {
            return CSSToken::EOF;
        };

        match c {
            // "whitespace"
            // "Consume as much whitespace as possible. Return a <whitespace-token>."
            c if is_whitespace(c) => {
                self.consume_whitespace();
                CSSToken::Whitespace
            }

            // "U+0022 QUOTATION MARK (")" / "U+0027 APOSTROPHE (')"
            // "Consume a string token and return it."
            '"' | '\'' => self.consume_string_token(c),

            // "U+0023 NUMBER SIGN (#)"
            '#' => {
                // "If the next input code point is an ident code point or the next
                // two input code points are a valid escape..."
                if self.peek().is_some_and(is_ident_code_point)
                    || is_valid_escape(self.peek(), self.peek_at(1))
                {
                    // "If the next 3 input code points would start an ident sequence,
                    // set the <hash-token>'s type flag to 'id'."
                    let hash_type = if self.would_start_ident_sequence() {
                        HashType::Id
                    } else {
                        HashType::Unrestricted
                    };
                    let value = self.consume_ident_sequence();
                    CSSToken::Hash { value, hash_type }
                } else {
                    CSSToken::Delim('#')
                }
            }

            '(' => CSSToken::LeftParen,
            ')' => CSSToken::RightParen,
            ',' => CSSToken::Comma,
            ':' => CSSToken::Colon,
            ';' => CSSToken::Semicolon,
            '[' => CSSToken::LeftBracket,
            ']' => CSSToken::RightBracket,
            '{' => CSSToken::LeftBrace,
            '}' => CSSToken::RightBrace,

            // "U+002B PLUS SIGN (+)" / "U+002E FULL STOP (.)"
            // "If the input stream starts with a number, reconsume the current
            // input code point, consume a numeric token, and return it."
            '+' | '.' => {
                self.reconsume();
                if self.would_start_number() {
                    self.consume_numeric_token()
                } else {
                    let _ = self.consume();
                    CSSToken::Delim(c)
                }
            }

            // "U+002D HYPHEN-MINUS (-)"
            '-' => {
                self.reconsume();
                if self.would_start_number() {
                    self.consume_numeric_token()
                }
                // "Otherwise, if the next 2 input code points are U+002D U+003E (->)..."
                else if self.starts_with("-->") {
                    self.advance_ascii(3);
                    CSSToken::CDC
                }
                // "Otherwise, if the input stream starts with an ident sequence..."
                else if self.would_start_ident_sequence() {
                    self.consume_ident_like_token()
                } else {
                    let _ = self.consume();
                    CSSToken::Delim('-')
                }
            }

            // "U+003C LESS-THAN SIGN (<)"
            // "If the next 3 input code points are U+0021 U+002D U+002D (!--)..."
            '<' if self.starts_with("!--") => {
                self.advance_ascii(3);
                CSSToken::CDO
            }

            // "U+0040 COMMERCIAL AT (@)"
            '@' => {
                if self.would_start_ident_sequence() {
                    CSSToken::AtKeyword(self.consume_ident_sequence())
                } else {
                    CSSToken::Delim('@')
                }
            }

            // "U+005C REVERSE SOLIDUS (\)"
            '\\' => {
                if is_valid_escape(Some('\\'), self.peek()) {
                    self.reconsume();
                    self.consume_ident_like_token()
                } else {
                    // "This is a parse error."
                    CSSToken::Delim('\\')
                }
            }

            // "digit"
            c if c.is_ascii_digit() => {
                self.reconsume();
                self.consume_numeric_token()
            }

            // "ident-start code point"
            c if is_ident_start_code_point(c) => {
                self.reconsume();
                self.consume_ident_like_token()
            }

            // "anything else"
            c => CSSToken::Delim(c),
        }
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
    fn consume_comments(&mut self) {
        while self.starts_with("/*") {
            self.advance_ascii(2);
            match self.remaining().find("*/") {
                Some(offset) => self.position += offset + 2,
                // An unterminated comment runs to EOF.
                None => self.position = self.input.len(),
            }
        }
    }

    fn consume_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            let _ = self.consume();
        }
    }

    /// [§ 4.3.4 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    fn consume_string_token(&mut self, ending_code_point: char) -> CSSToken {
        let mut value = String::new();

        loop {
            match self.consume() {
                Some(c) if c == ending_code_point => return CSSToken::String(value),

                // "EOF": "This is a parse error. Return the <string-token>."
                None => return CSSToken::String(value),

                // "newline": "This is a parse error. Reconsume the current input
                // code point, create a <bad-string-token>, and return it."
                Some(c) if is_newline(c) => {
                    self.reconsume();
                    return CSSToken::BadString;
                }

                Some('\\') => match self.peek() {
                    None => {}
                    // An escaped newline continues the string.
                    Some(c) if is_newline(c) => {
                        let _ = self.consume();
                    }
                    Some(_) => value.push(self.consume_escaped_code_point()),
                },

                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.3 Consume a numeric token](https://www.w3.org/TR/css-syntax-3/#consume-numeric-token)
    fn consume_numeric_token(&mut self) -> CSSToken {
        let (value, numeric_type) = self.consume_number();

        if self.would_start_ident_sequence() {
            let unit = self.consume_ident_sequence();
            CSSToken::Dimension {
                value,
                numeric_type,
                unit,
            }
        } else if self.peek() == Some('%') {
            let _ = self.consume();
            CSSToken::Percentage { value }
        } else {
            CSSToken::Number {
                value,
                numeric_type,
            }
        }
    }

    /// [§ 4.3.4 Consume an ident-like token](https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token)
    fn consume_ident_like_token(&mut self) -> CSSToken {
        let string = self.consume_ident_sequence();

        if self.peek() != Some('(') {
            return CSSToken::Ident(string);
        }
        let _ = self.consume();

        if !string.eq_ignore_ascii_case("url") {
            return CSSToken::Function(string);
        }

        // "While the next two input code points are whitespace, consume the
        // next input code point."
        while self.peek().is_some_and(is_whitespace) && self.peek_at(1).is_some_and(is_whitespace)
        {
            let _ = self.consume();
        }

        // "If the next one or two input code points are U+0022 QUOTATION MARK,
        // U+0027 APOSTROPHE, or whitespace followed by either, ... return a
        // <function-token> with its value set to string."
        let quote_at = |c: Option<char>| matches!(c, Some('"' | '\''));
        if quote_at(self.peek())
            || (self.peek().is_some_and(is_whitespace) && quote_at(self.peek_at(1)))
        {
            CSSToken::Function(string)
        } else {
            self.consume_url_token()
        }
    }

    /// [§ 4.3.6 Consume a url token](https://www.w3.org/TR/css-syntax-3/#consume-url-token)
    fn consume_url_token(&mut self) -> CSSToken {
        let mut value = String::new();
        self.consume_whitespace();

        loop {
            match self.consume() {
                Some(')') | None => return CSSToken::Url(value),

                Some(c) if is_whitespace(c) => {
                    self.consume_whitespace();
                    return match self.peek() {
                        Some(')') => {
                            let _ = self.consume();
                            CSSToken::Url(value)
                        }
                        None => CSSToken::Url(value),
                        Some(_) => {
                            self.consume_bad_url_remnants();
                            CSSToken::BadUrl
                        }
                    };
                }

                Some(c) if matches!(c, '"' | '\'' | '(') || is_non_printable(c) => {
                    self.consume_bad_url_remnants();
                    return CSSToken::BadUrl;
                }

                Some('\\') => {
                    if is_valid_escape(Some('\\'), self.peek()) {
                        value.push(self.consume_escaped_code_point());
                    } else {
                        self.consume_bad_url_remnants();
                        return CSSToken::BadUrl;
                    }
                }

                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.14 Consume the remnants of a bad url](https://www.w3.org/TR/css-syntax-3/#consume-remnants-of-bad-url)
    fn consume_bad_url_remnants(&mut self) {
        loop {
            match self.consume() {
                Some(')') | None => return,
                Some('\\') if is_valid_escape(Some('\\'), self.peek()) => {
                    let _ = self.consume_escaped_code_point();
                }
                Some(_) => {}
            }
        }
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident_sequence(&mut self) -> String {
        let mut result = String::new();

        loop {
            match self.peek() {
                Some(c) if is_ident_code_point(c) => {
                    let _ = self.consume();
                    result.push(c);
                }
                Some('\\') if is_valid_escape(Some('\\'), self.peek_at(1)) => {
                    let _ = self.consume();
                    result.push(self.consume_escaped_code_point());
                }
                _ => return result,
            }
        }
    }

    /// [§ 4.3.12 Consume a number](https://www.w3.org/TR/css-syntax-3/#consume-number)
    fn consume_number(&mut self) -> (f64, NumericType) {
        let start = self.position;
        let mut numeric_type = NumericType::Integer;

        if matches!(self.peek(), Some('+' | '-')) {
            self.advance_ascii(1);
        }
        self.consume_digits();

        // "If the next 2 input code points are U+002E FULL STOP (.) followed by a digit..."
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance_ascii(1);
            self.consume_digits();
            numeric_type = NumericType::Number;
        }

        // "If the next 2 or 3 input code points are 'e' or 'E', optionally
        // followed by a sign, followed by a digit..."
        if matches!(self.peek(), Some('e' | 'E')) {
            let has_sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if has_sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.advance_ascii(digit_at);
                self.consume_digits();
                numeric_type = NumericType::Number;
            }
        }

        let repr = &self.input[start..self.position];
        (repr.parse().unwrap_or(0.0), numeric_type)
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_ascii(1);
        }
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    fn consume_escaped_code_point(&mut self) -> char {
        match self.consume() {
            Some(c) if c.is_ascii_hexdigit() => {
                let start = self.position - 1;
                // "Consume as many hex digits as possible, but no more than 5."
                for _ in 0..5 {
                    if self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                        self.advance_ascii(1);
                    } else {
                        break;
                    }
                }
                let code_point =
                    u32::from_str_radix(&self.input[start..self.position], 16).unwrap_or(0);
                if self.peek().is_some_and(is_whitespace) {
                    let _ = self.consume();
                }
                // "If this number is zero, or is for a surrogate, or is greater than the
                // maximum allowed code point, return U+FFFD REPLACEMENT CHARACTER."
                match code_point {
                    0 => char::REPLACEMENT_CHARACTER,
                    n => char::from_u32(n).unwrap_or(char::REPLACEMENT_CHARACTER),
                }
            }
            // "EOF": "This is a parse error. Return U+FFFD REPLACEMENT CHARACTER."
            None => char::REPLACEMENT_CHARACTER,
            Some(c) => c,
        }
    }

    /// [§ 4.3.9 Check if three code points would start an ident sequence](https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier)
    fn would_start_ident_sequence(&self) -> bool {
        match self.peek() {
            Some('-') => {
                let second = self.peek_at(1);
                second.is_some_and(|c| is_ident_start_code_point(c) || c == '-')
                    || is_valid_escape(second, self.peek_at(2))
            }
            Some(c) if is_ident_start_code_point(c) => true,
            Some('\\') => is_valid_escape(Some('\\'), self.peek_at(1)),
            _ => false,
        }
    }

    /// [§ 4.3.10 Check if three code points would start a number](https://www.w3.org/TR/css-syntax-3/#starts-with-a-number)
    fn would_start_number(&self) -> bool {
        let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        match self.peek() {
            Some('+' | '-') => {
                digit(self.peek_at(1)) || (self.peek_at(1) == Some('.') && digit(self.peek_at(2)))
            }
            Some('.') => digit(self.peek_at(1)),
            c => digit(c),
        }
    }

    fn remaining(&self) -> &'a str {
        self.input.get(self.position..).unwrap_or_default()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining().starts_with(prefix)
    }

    /// Skip `count` code points already known to be ASCII.
    fn advance_ascii(&mut self, count: usize) {
        self.position = (self.position + count).min(self.input.len());
        self.last_len = 1;
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.remaining().chars().next()?;
        self.last_len = c.len_utf8();
        self.position += self.last_len;
        Some(c)
    }

    /// Put back the last consumed code point.
    fn reconsume(&mut self) {
        self.position -= self.last_len;
        self.last_len = 0;
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }
}

impl Iterator for CSSTokenizer<'_> {
    type Item = SpannedToken;

    fn next(&mut self) -> Option<SpannedToken> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = token.token.is_eof();
        Some(token)
    }
}

/// Tokenize a whole string, EOF included.
#[must_use]
pub fn tokenize(input: &str) -> Vec<SpannedToken> {
    CSSTokenizer::new(input).collect()
}

/// [§ 4.3.8 Check if two code points are a valid escape](https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape)
fn is_valid_escape(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && !second.is_some_and(is_newline)
}

/// [§ 4.2 Definitions - newline](https://www.w3.org/TR/css-syntax-3/#newline)
///
/// Input is not preprocessed, so CR and FF count as newlines directly.
const fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\x0C')
}

/// [§ 4.2 Definitions - whitespace](https://www.w3.org/TR/css-syntax-3/#whitespace)
///
/// "A newline, U+0009 CHARACTER TABULATION, or U+0020 SPACE."
const fn is_whitespace(c: char) -> bool {
    is_newline(c) || matches!(c, '\t' | ' ')
}

/// [§ 4.2 Definitions - non-printable code point](https://www.w3.org/TR/css-syntax-3/#non-printable-code-point)
const fn is_non_printable(c: char) -> bool {
    matches!(c, '\0'..='\x08' | '\x0B' | '\x0E'..='\x1F' | '\x7F')
}

/// [§ 4.2 Definitions - ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
///
/// "A letter, a non-ASCII code point, or U+005F LOW LINE (_)."
const fn is_ident_start_code_point(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// [§ 4.2 Definitions - ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
///
/// "An ident-start code point, a digit, or U+002D HYPHEN-MINUS (-)."
const fn is_ident_code_point(c: char) -> bool {
    is_ident_start_code_point(c) || c.is_ascii_digit() || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<CSSToken> {
        tokenize(input).into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_spans_exclude_comments() {
        let source = "/* lead */ a /* mid */{";
        let tokens = tokenize(source);
        assert_eq!(&source[tokens[0].span()], " ");
        assert_eq!(&source[tokens[1].span()], "a");
        assert_eq!(&source[tokens[3].span()], "{");
        assert!(tokens.last().is_some_and(|t| t.token.is_eof()));
    }

    #[test]
    fn test_iterator_yields_eof_once() {
        let mut tokenizer = CSSTokenizer::new("x");
        assert_eq!(tokenizer.next().map(|t| t.token), Some(CSSToken::ident("x")));
        assert_eq!(tokenizer.next().map(|t| t.token), Some(CSSToken::EOF));
        assert_eq!(tokenizer.next(), None);
    }

    #[test]
    fn test_next_token_after_eof_keeps_returning_eof() {
        let mut tokenizer = CSSTokenizer::new("");
        assert!(tokenizer.next_token().token.is_eof());
        assert!(tokenizer.next_token().token.is_eof());
    }

    #[test]
    fn test_multibyte_ident_span() {
        let source = ".caf\u{e9} {";
        let tokens = tokenize(source);
        assert_eq!(tokens[1].token, CSSToken::ident("caf\u{e9}"));
        assert_eq!(&source[tokens[1].span()], "caf\u{e9}");
    }

    #[test]
    fn test_unterminated_comment_runs_to_eof() {
        assert_eq!(kinds("a /* never closed"), vec![
            CSSToken::ident("a"),
            CSSToken::Whitespace,
            CSSToken::EOF
        ]);
    }

    #[test]
    fn test_escape_out_of_range_is_replacement() {
        assert_eq!(kinds("\\110000"), vec![
            CSSToken::ident("\u{FFFD}"),
            CSSToken::EOF
        ]);
    }
}
