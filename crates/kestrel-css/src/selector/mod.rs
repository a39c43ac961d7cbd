//! CSS selector parsing and cascade keys.
//!
//! Selectors are parsed per [Selectors Level 4](https://www.w3.org/TR/selectors-4/)
//! far enough to tell valid from invalid, and then reduced to a
//! [`SelectorKey`]. Only a single compound selector made of an optional type
//! or `*`, at most one class and at most one id has a key. Everything else
//! (combinators, pseudo-classes, attribute selectors, namespaces, several
//! classes) is valid CSS that the cascade cannot look up, so it gets no key.

use core::fmt;
use core::slice;

use crate::tokenizer::{CSSToken, CSSTokenizer, HashType, SpannedToken};

/// Lookup key for the declaration store.
///
/// Each variant is one shape of simple selector the cascade probes for.
/// The `Display` form is the canonical selector text, e.g. `rect.foo#bar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectorKey {
    /// `*`
    Universal,
    /// `tag`
    Tag(String),
    /// `.class`
    Class(String),
    /// `#id`
    Id(String),
    /// `tag.class`
    TagClass {
        /// Element name.
        tag: String,
        /// Class name.
        class: String,
    },
    /// `tag#id`
    TagId {
        /// Element name.
        tag: String,
        /// Id value.
        id: String,
    },
    /// `.class#id`
    ClassId {
        /// Class name.
        class: String,
        /// Id value.
        id: String,
    },
    /// `tag.class#id`
    TagClassId {
        /// Element name.
        tag: String,
        /// Class name.
        class: String,
        /// Id value.
        id: String,
    },
}

impl SelectorKey {
    /// Length in bytes of the canonical selector text, without allocating it.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        match self {
            Self::Universal => 1,
            Self::Tag(tag) => tag.len(),
            Self::Class(name) | Self::Id(name) => name.len() + 1,
            Self::TagClass { tag, class: other } | Self::TagId { tag, id: other } => {
                tag.len() + other.len() + 1
            }
            Self::ClassId { class, id } => class.len() + id.len() + 2,
            Self::TagClassId { tag, class, id } => tag.len() + class.len() + id.len() + 2,
        }
    }

    /// Parse selector text into a key.
    ///
    /// Returns `None` if the text is not a single selector or has no key.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let tokens: Vec<SpannedToken> = CSSTokenizer::new(text)
            .filter(|token| !token.token.is_eof())
            .collect();
        let list = SelectorList::parse(&tokens, text)?;
        match list.selectors.as_slice() {
            [selector] => selector.key.clone(),
            _ => None,
        }
    }

    /// Build the key for a compound of optional tag, class and id.
    ///
    /// `None` for all three is the universal selector.
    #[must_use]
    pub fn from_parts(tag: Option<&str>, class: Option<&str>, id: Option<&str>) -> Self {
        let owned = |s: &str| s.to_string();
        match (tag.map(owned), class.map(owned), id.map(owned)) {
            (None, None, None) => Self::Universal,
            (Some(tag), None, None) => Self::Tag(tag),
            (None, Some(class), None) => Self::Class(class),
            (None, None, Some(id)) => Self::Id(id),
            (Some(tag), Some(class), None) => Self::TagClass { tag, class },
            (Some(tag), None, Some(id)) => Self::TagId { tag, id },
            (None, Some(class), Some(id)) => Self::ClassId { class, id },
            (Some(tag), Some(class), Some(id)) => Self::TagClassId { tag, class, id },
        }
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Universal => write!(f, "*"),
            Self::Tag(tag) => write!(f, "{tag}"),
            Self::Class(class) => write!(f, ".{class}"),
            Self::Id(id) => write!(f, "#{id}"),
            Self::TagClass { tag, class } => write!(f, "{tag}.{class}"),
            Self::TagId { tag, id } => write!(f, "{tag}#{id}"),
            Self::ClassId { class, id } => write!(f, ".{class}#{id}"),
            Self::TagClassId { tag, class, id } => write!(f, "{tag}.{class}#{id}"),
        }
    }
}

/// One selector of a rule's selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// The selector as written, trimmed.
    pub text: String,
    /// The cascade key, or `None` if the selector has a shape the cascade
    /// does not look up.
    pub key: Option<SelectorKey>,
}

/// [§ 4.1 Selector Lists](https://www.w3.org/TR/selectors-4/#grouping)
///
/// "A selector list is a comma-separated list of selectors."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse a rule prelude.
    ///
    /// Returns `None` if the prelude is empty or any selector in it is
    /// invalid, in which case the whole rule must be dropped.
    #[must_use]
    pub fn parse(tokens: &[SpannedToken], source: &str) -> Option<Self> {
        let mut selectors = Vec::new();
        for part in split_top_level_commas(tokens) {
            let part = trim_whitespace(part);
            let (first, last) = (part.first()?, part.last()?);
            let compounds = parse_complex_selector(part)?;
            selectors.push(Selector {
                text: source
                    .get(first.start..last.end)
                    .unwrap_or_default()
                    .to_string(),
                key: key_for(&compounds),
            });
        }
        Some(Self { selectors })
    }

    /// Iterate over the selectors in source order.
    pub fn iter(&self) -> slice::Iter<'_, Selector> {
        self.selectors.iter()
    }

    /// Number of selectors in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Whether the list has no selectors. A parsed list never does.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl<'a> IntoIterator for &'a SelectorList {
    type Item = &'a Selector;
    type IntoIter = slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    Type(String),
    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,
    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),
    /// Pseudo-classes, pseudo-elements, attribute selectors and namespace
    /// prefixes: valid, but never reduced to a key.
    Unkeyed,
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
type CompoundSelector = Vec<SimpleSelector>;

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Parse a trimmed, non-empty selector into its compound selectors.
/// Combinators only matter for validity here, so they are not kept.
fn parse_complex_selector(tokens: &[SpannedToken]) -> Option<Vec<CompoundSelector>> {
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut current: CompoundSelector = Vec::new();
    let mut awaiting_compound = false;
    let mut index = 0;

    while let Some(token) = tokens.get(index) {
        index += 1;
        let simple = match &token.token {
            // [§ 16.1](https://www.w3.org/TR/selectors-4/#descendant-combinators)
            // "A descendant combinator is whitespace that separates two compound selectors."
            CSSToken::Whitespace => {
                if !current.is_empty() {
                    compounds.push(core::mem::take(&mut current));
                }
                continue;
            }

            // [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
            CSSToken::Delim('>' | '+' | '~') => {
                if !current.is_empty() {
                    compounds.push(core::mem::take(&mut current));
                }
                if compounds.is_empty() || awaiting_compound {
                    return None;
                }
                awaiting_compound = true;
                continue;
            }

            // "A type selector is the name of a document language element type"
            CSSToken::Ident(name) if current.is_empty() => {
                if skip_namespace(tokens, &mut index)? {
                    SimpleSelector::Unkeyed
                } else {
                    SimpleSelector::Type(name.clone())
                }
            }

            CSSToken::Delim('*') if current.is_empty() => {
                if skip_namespace(tokens, &mut index)? {
                    SimpleSelector::Unkeyed
                } else {
                    SimpleSelector::Universal
                }
            }

            // `|name`: element in no namespace.
            CSSToken::Delim('|') if current.is_empty() => {
                match tokens.get(index).map(|t| &t.token) {
                    Some(CSSToken::Ident(_) | CSSToken::Delim('*')) => index += 1,
                    _ => return None,
                }
                SimpleSelector::Unkeyed
            }

            // "The class selector is given as a full stop (. U+002E) immediately
            // followed by an identifier."
            CSSToken::Delim('.') => match tokens.get(index) {
                Some(next) if next.start == token.end => match &next.token {
                    CSSToken::Ident(class) => {
                        index += 1;
                        SimpleSelector::Class(class.clone())
                    }
                    _ => return None,
                },
                _ => return None,
            },

            // "An ID selector is a hash (#, U+0023) immediately followed by the
            // ID value, which is an identifier."
            CSSToken::Hash {
                value,
                hash_type: HashType::Id,
            } => SimpleSelector::Id(value.clone()),

            // [§ 3.6 Pseudo-classes and pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-classes)
            CSSToken::Colon => {
                if matches!(tokens.get(index).map(|t| &t.token), Some(CSSToken::Colon)) {
                    index += 1;
                }
                match tokens.get(index).map(|t| &t.token) {
                    Some(CSSToken::Ident(_)) => index += 1,
                    Some(CSSToken::Function(_)) => index = skip_nested(tokens, index)?,
                    _ => return None,
                }
                SimpleSelector::Unkeyed
            }

            // [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
            CSSToken::LeftBracket => {
                index = skip_nested(tokens, index - 1)?;
                SimpleSelector::Unkeyed
            }

            _ => return None,
        };

        current.push(simple);
        awaiting_compound = false;
    }

    if !current.is_empty() {
        compounds.push(current);
    }
    if awaiting_compound || compounds.is_empty() {
        return None;
    }
    Some(compounds)
}

/// If the token at `index` is a namespace separator `|`, skip it and the
/// name after it. Returns `Some(true)` if a namespace prefix was skipped,
/// `None` if the separator is not followed by a name.
fn skip_namespace(tokens: &[SpannedToken], index: &mut usize) -> Option<bool> {
    if !matches!(tokens.get(*index).map(|t| &t.token), Some(CSSToken::Delim('|'))) {
        return Some(false);
    }
    match tokens.get(*index + 1).map(|t| &t.token) {
        Some(CSSToken::Ident(_) | CSSToken::Delim('*')) => {
            *index += 2;
            Some(true)
        }
        _ => None,
    }
}

/// Skip a function or bracket block starting at `index`. Returns the index
/// after the matching close, or `None` if it never closes.
fn skip_nested(tokens: &[SpannedToken], index: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (offset, token) in tokens.get(index..)?.iter().enumerate() {
        if token.token.opens_block() {
            depth += 1;
        } else if token.token.closes_block() {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(index + offset + 1);
            }
        }
    }
    None
}

/// The key for a selector made of exactly one compound with at most one
/// class and one id.
fn key_for(compounds: &[CompoundSelector]) -> Option<SelectorKey> {
    let [compound] = compounds else {
        return None;
    };

    let (mut tag, mut class, mut id) = (None, None, None);
    for simple in compound {
        match simple {
            SimpleSelector::Type(name) => tag = Some(name.as_str()),
            SimpleSelector::Universal => {}
            SimpleSelector::Class(name) if class.is_none() => class = Some(name.as_str()),
            SimpleSelector::Id(name) if id.is_none() => id = Some(name.as_str()),
            _ => return None,
        }
    }
    Some(SelectorKey::from_parts(tag, class, id))
}

fn split_top_level_commas(tokens: &[SpannedToken]) -> Vec<&[SpannedToken]> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate() {
        match &token.token {
            CSSToken::Comma if depth == 0 => {
                parts.push(tokens.get(start..index).unwrap_or_default());
                start = index + 1;
            }
            t if t.opens_block() => depth += 1,
            t if t.closes_block() => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    parts.push(tokens.get(start..).unwrap_or_default());
    parts
}

fn trim_whitespace(tokens: &[SpannedToken]) -> &[SpannedToken] {
    let start = tokens
        .iter()
        .position(|token| !token.token.is_whitespace())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|token| !token.token.is_whitespace())
        .map_or(start, |index| index + 1);
    tokens.get(start..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> Option<String> {
        SelectorKey::parse(text).map(|key| key.to_string())
    }

    fn list(text: &str) -> Option<SelectorList> {
        let tokens: Vec<SpannedToken> = CSSTokenizer::new(text)
            .filter(|token| !token.token.is_eof())
            .collect();
        SelectorList::parse(&tokens, text)
    }

    #[test]
    fn test_every_key_shape() {
        assert_eq!(key("*").as_deref(), Some("*"));
        assert_eq!(key("rect").as_deref(), Some("rect"));
        assert_eq!(key(".foo").as_deref(), Some(".foo"));
        assert_eq!(key("#bar").as_deref(), Some("#bar"));
        assert_eq!(key("rect.foo").as_deref(), Some("rect.foo"));
        assert_eq!(key("rect#bar").as_deref(), Some("rect#bar"));
        assert_eq!(key(".foo#bar").as_deref(), Some(".foo#bar"));
        assert_eq!(key("rect.foo#bar").as_deref(), Some("rect.foo#bar"));
    }

    #[test]
    fn test_keys_are_canonical() {
        assert_eq!(key("*.foo").as_deref(), Some(".foo"));
        assert_eq!(key("*#a").as_deref(), Some("#a"));
        assert_eq!(key("rect#a.b").as_deref(), Some("rect.b#a"));
        assert_eq!(key("  g  ").as_deref(), Some("g"));
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(key("linearGradient.Sky").as_deref(), Some("linearGradient.Sky"));
    }

    #[test]
    fn test_unkeyed_selectors_are_valid() {
        for text in [
            "g rect",
            "g > rect",
            "a:hover",
            "a::before",
            "rect:not(.a, .b)",
            "[fill]",
            "rect[fill=\"red\"]",
            ".a.b",
            "#a#b",
            "svg|rect",
            "|rect",
        ] {
            let parsed = list(text).unwrap_or_else(|| panic!("{text} should parse"));
            assert_eq!(parsed.len(), 1, "{text}");
            assert_eq!(parsed.iter().next().and_then(|s| s.key.clone()), None, "{text}");
        }
    }

    #[test]
    fn test_invalid_selectors() {
        for text in ["", "  ", "> a", "a >", "a > > b", ". foo", "#1x", "a,", "rect:", "[x", "12"] {
            assert!(list(text).is_none(), "{text:?} should be invalid");
        }
    }

    #[test]
    fn test_selector_list_keeps_order_and_text() {
        let parsed = list("rect.a , g p,#b").unwrap();
        let texts: Vec<&str> = parsed.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["rect.a", "g p", "#b"]);
        assert_eq!(
            parsed.iter().map(|s| s.key.is_some()).collect::<Vec<_>>(),
            vec![true, false, true]
        );
    }

    #[test]
    fn test_serialized_len_matches_display() {
        for text in ["*", "rect", ".foo", "#a", "g.b", "g#c", ".d#e", "svg.f#g"] {
            let key = SelectorKey::parse(text).unwrap();
            assert_eq!(key.serialized_len(), key.to_string().len(), "{text}");
        }
    }
}
