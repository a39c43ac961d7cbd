//! The element being styled.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// An element's attributes, as far as styling needs them.
pub trait AttributeBag {
    /// Value of the attribute `name`, if present.
    fn lookup(&self, name: &str) -> Option<&str>;

    /// Number of attributes.
    fn size(&self) -> usize;
}

impl<S: BuildHasher> AttributeBag for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

impl AttributeBag for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

impl<const N: usize> AttributeBag for [(&str, &str); N] {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    fn size(&self) -> usize {
        N
    }
}

impl AttributeBag for Vec<(String, String)> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn size(&self) -> usize {
        self.len()
    }
}

/// Identity of an element for one styling call.
///
/// ```ignore
/// let query = ElementQuery::new("rect")
///     .with_class_attribute("shape  primary")
///     .with_id("r1");
/// ```
#[derive(Clone, Copy, Default)]
pub struct ElementQuery<'a> {
    tag: Option<&'a str>,
    class_attribute: Option<&'a str>,
    id: Option<&'a str>,
    attributes: Option<&'a dyn AttributeBag>,
    retained_style: Option<&'a str>,
}

impl<'a> ElementQuery<'a> {
    /// An element with the given tag name.
    #[must_use]
    pub fn new(tag: &'a str) -> Self {
        Self {
            tag: non_empty(tag),
            ..Self::default()
        }
    }

    /// An element with tag, class and id read from its attributes.
    #[must_use]
    pub fn from_attributes(tag: &'a str, attributes: &'a dyn AttributeBag) -> Self {
        let mut query = Self::new(tag).with_attributes(attributes);
        query.class_attribute = attributes.lookup("class");
        query.id = attributes.lookup("id").and_then(non_empty);
        query
    }

    /// Set the `class` attribute. It is split on ASCII whitespace.
    #[must_use]
    pub const fn with_class_attribute(mut self, class: &'a str) -> Self {
        self.class_attribute = Some(class);
        self
    }

    /// Set the id. An empty id counts as no id.
    #[must_use]
    pub fn with_id(mut self, id: &'a str) -> Self {
        self.id = non_empty(id);
        self
    }

    /// Set the attribute bag used for presentation attributes, the `style`
    /// attribute and `transform`.
    #[must_use]
    pub const fn with_attributes(mut self, attributes: &'a dyn AttributeBag) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Set the `style` attribute kept from load time. Used only when the
    /// attribute bag is absent or empty.
    #[must_use]
    pub const fn with_retained_style(mut self, style: &'a str) -> Self {
        self.retained_style = Some(style);
        self
    }

    /// The tag name.
    #[must_use]
    pub const fn tag(&self) -> Option<&'a str> {
        self.tag
    }

    /// The id.
    #[must_use]
    pub const fn id(&self) -> Option<&'a str> {
        self.id
    }

    /// Class names in attribute order, empty entries skipped.
    pub fn classes(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.class_attribute
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// The attribute bag, if it has any attributes.
    #[must_use]
    pub fn attributes(&self) -> Option<&'a dyn AttributeBag> {
        self.attributes.filter(|bag| bag.size() > 0)
    }

    /// The inline `style` text: from the attribute bag when it has
    /// attributes, otherwise the retained copy.
    #[must_use]
    pub fn style_attribute(&self) -> Option<&'a str> {
        match self.attributes() {
            Some(bag) => bag.lookup("style"),
            None => self.retained_style,
        }
    }
}

impl std::fmt::Debug for ElementQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementQuery")
            .field("tag", &self.tag)
            .field("classes", &self.classes().collect::<Vec<_>>())
            .field("id", &self.id)
            .field("attributes", &self.attributes.map(AttributeBag::size))
            .field("retained_style", &self.retained_style)
            .finish()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|value| !value.is_empty())
}
