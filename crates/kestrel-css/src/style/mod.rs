//! Style application.
//!
//! Declarations are not matched against elements the way a browser does it.
//! Each element is styled by probing the [`DeclarationStore`] for a fixed
//! sequence of [`SelectorKey`]s built from its tag, classes and id, and
//! merging what is found in that order. Later probes override earlier ones,
//! which stands in for specificity.

mod query;
mod resolved;

pub use query::{AttributeBag, ElementQuery};
pub use resolved::{Origin, ResolvedStyle, ResolvedValue};

use crate::limits::MAX_CSS_SIZE;
use crate::parser::parse_declaration_list;
use crate::selector::SelectorKey;
use crate::store::DeclarationStore;

/// [SVG 1.1 § 6.4](https://www.w3.org/TR/SVG11/styling.html#SVGStylingProperties)
///
/// Attributes that set the property of the same name.
pub const PRESENTATION_ATTRIBUTES: &[&str] = &[
    "alignment-baseline",
    "baseline-shift",
    "clip",
    "clip-path",
    "clip-rule",
    "color",
    "color-interpolation",
    "color-interpolation-filters",
    "color-profile",
    "color-rendering",
    "cursor",
    "direction",
    "display",
    "dominant-baseline",
    "enable-background",
    "fill",
    "fill-opacity",
    "fill-rule",
    "filter",
    "flood-color",
    "flood-opacity",
    "font-family",
    "font-size",
    "font-size-adjust",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-weight",
    "glyph-orientation-horizontal",
    "glyph-orientation-vertical",
    "image-rendering",
    "kerning",
    "letter-spacing",
    "lighting-color",
    "marker-end",
    "marker-mid",
    "marker-start",
    "mask",
    "opacity",
    "overflow",
    "pointer-events",
    "shape-rendering",
    "stop-color",
    "stop-opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-anchor",
    "text-decoration",
    "text-rendering",
    "unicode-bidi",
    "visibility",
    "word-spacing",
    "writing-mode",
];

/// Resolve the style of one element.
///
/// STEP 1: Presentation attributes, as non-important values.
/// STEP 2: `*`.
/// STEP 3: `tag`.
/// STEP 4: For each class, the first of `tag.class#id`, `.class#id` and
///         `tag.class` that has declarations, else `.class`.
/// STEP 5: `#id`.
/// STEP 6: `tag#id`.
/// STEP 7: The inline `style` attribute.
/// STEP 8: The `transform` attribute, outside the cascade.
///
/// Classes are looked up one at a time, so a rule for `.a.b` never
/// applies.
#[must_use]
pub fn apply(store: &DeclarationStore, query: &ElementQuery<'_>) -> ResolvedStyle {
    let mut style = ResolvedStyle::new();
    let tag = query.tag();
    let id = query.id();
    let attributes = query.attributes();

    // STEP 1
    if let Some(bag) = attributes {
        for &name in PRESENTATION_ATTRIBUTES {
            if let Some(value) = bag.lookup(name) {
                let _ = style.merge(name, value, false, Origin::Presentation);
            }
        }
    }

    let mut probe = |key: &SelectorKey| -> bool {
        let Some(properties) = store.lookup(key) else {
            return false;
        };
        for (name, declared) in properties {
            let _ = style.merge(name, &declared.value, declared.important, Origin::Stylesheet);
        }
        true
    };

    // STEP 2
    let _ = probe(&SelectorKey::Universal);

    // STEP 3
    if tag.is_some() {
        let _ = probe(&SelectorKey::from_parts(tag, None, None));
    }

    // STEP 4
    for class in query.classes() {
        let class = Some(class);
        let found = (tag.is_some() && id.is_some()
            && probe(&SelectorKey::from_parts(tag, class, id)))
            || (id.is_some() && probe(&SelectorKey::from_parts(None, class, id)))
            || (tag.is_some() && probe(&SelectorKey::from_parts(tag, class, None)));
        if !found {
            let _ = probe(&SelectorKey::from_parts(None, class, None));
        }
    }

    // STEP 5
    if id.is_some() {
        let _ = probe(&SelectorKey::from_parts(None, None, id));
    }

    // STEP 6
    if tag.is_some() && id.is_some() {
        let _ = probe(&SelectorKey::from_parts(tag, None, id));
    }

    // STEP 7
    let inline = query
        .style_attribute()
        .filter(|inline| inline.len() <= MAX_CSS_SIZE);
    for declaration in inline.map(parse_declaration_list).unwrap_or_default() {
        let _ = style.merge(
            &declaration.name,
            &declaration.value,
            declaration.important,
            Origin::Inline,
        );
    }

    // STEP 8
    style.transform = attributes
        .and_then(|bag| bag.lookup("transform"))
        .map(str::to_string);

    style
}
