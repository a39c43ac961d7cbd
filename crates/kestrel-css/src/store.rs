//! Per-document declaration store.
//!
//! Maps a [`SelectorKey`] to the properties declared for it. There is one
//! value per key and property: later writes replace earlier ones, except
//! that an `!important` value can only be replaced by another important one.

use std::collections::HashMap;

use serde::Serialize;

use crate::selector::SelectorKey;

/// A stored declaration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyValue {
    /// The value as serialized by the parser.
    pub value: String,
    /// Whether it was declared `!important`.
    pub important: bool,
}

/// Properties declared for one selector key.
pub type PropertyMap = HashMap<String, PropertyValue>;

/// Selector key → property name → value.
#[derive(Debug, Clone, Default)]
pub struct DeclarationStore {
    rules: HashMap<SelectorKey, PropertyMap>,
}

impl DeclarationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
    ///
    /// Record `name: value` for `key`. Returns false if the write was
    /// ignored because the stored value is important and this one is not.
    pub fn define(&mut self, key: &SelectorKey, name: &str, value: &str, important: bool) -> bool {
        let properties = self.rules.entry(key.clone()).or_default();

        match properties.get_mut(name) {
            Some(existing) if existing.important && !important => false,
            Some(existing) => {
                value.clone_into(&mut existing.value);
                existing.important = important;
                true
            }
            None => {
                let _ = properties.insert(
                    name.to_string(),
                    PropertyValue {
                        value: value.to_string(),
                        important,
                    },
                );
                true
            }
        }
    }

    /// All properties declared for `key`.
    #[must_use]
    pub fn lookup(&self, key: &SelectorKey) -> Option<&PropertyMap> {
        self.rules.get(key)
    }

    /// One property declared for `key`.
    #[must_use]
    pub fn get(&self, key: &SelectorKey, name: &str) -> Option<&PropertyValue> {
        self.rules.get(key)?.get(name)
    }

    /// Number of selector keys with at least one declaration.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of stored key/property pairs.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.rules.values().map(HashMap::len).sum()
    }

    /// Iterate over keys and their properties, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&SelectorKey, &PropertyMap)> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> SelectorKey {
        SelectorKey::Class(name.to_string())
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = DeclarationStore::new();
        assert!(store.define(&class("a"), "fill", "red", false));
        assert!(store.define(&class("a"), "fill", "blue", false));
        assert_eq!(store.get(&class("a"), "fill").map(|v| v.value.as_str()), Some("blue"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.property_count(), 1);
    }

    #[test]
    fn test_important_is_sticky() {
        let mut store = DeclarationStore::new();
        assert!(store.define(&class("a"), "fill", "red", true));
        assert!(!store.define(&class("a"), "fill", "blue", false));
        assert_eq!(
            store.get(&class("a"), "fill"),
            Some(&PropertyValue {
                value: "red".to_string(),
                important: true
            })
        );
        assert!(store.define(&class("a"), "fill", "green", true));
        assert_eq!(store.get(&class("a"), "fill").map(|v| v.value.as_str()), Some("green"));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut store = DeclarationStore::new();
        let _ = store.define(&class("a"), "fill", "red", true);
        assert!(store.define(&SelectorKey::Id("a".to_string()), "fill", "blue", false));
        assert_eq!(store.len(), 2);
        assert!(store.lookup(&SelectorKey::Universal).is_none());
    }
}
