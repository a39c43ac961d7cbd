//! The result of styling one element.

use std::collections::BTreeMap;

use serde::Serialize;
use strum_macros::{Display, IntoStaticStr};

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Origin {
    /// An SVG presentation attribute such as `fill="red"`.
    Presentation,
    /// A rule in a stylesheet.
    Stylesheet,
    /// The element's `style` attribute.
    Inline,
}

/// A property value after the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    /// The value text.
    pub value: String,
    /// Whether it was declared `!important`.
    pub important: bool,
    /// Where it came from.
    pub origin: Origin,
}

/// Resolved properties of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedStyle {
    /// Property name → value, ordered by name.
    pub properties: BTreeMap<String, ResolvedValue>,
    /// The element's `transform` attribute, kept apart from the cascade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

impl ResolvedStyle {
    /// An empty style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one declaration. A non-important value never replaces an
    /// important one; otherwise the new value wins.
    ///
    /// Returns whether the value was taken.
    pub fn merge(&mut self, name: &str, value: &str, important: bool, origin: Origin) -> bool {
        if self
            .properties
            .get(name)
            .is_some_and(|existing| existing.important && !important)
        {
            return false;
        }
        let _ = self.properties.insert(
            name.to_string(),
            ResolvedValue {
                value: value.to_string(),
                important,
                origin,
            },
        );
        true
    }

    /// The resolved value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.properties.get(name)
    }

    /// Just the value text of `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|resolved| resolved.value.as_str())
    }

    /// Number of resolved properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no property was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}
