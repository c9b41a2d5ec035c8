//! Generic decoded element tree

use crate::error::{QcmlError, Result};

/// An element decoded without knowledge of its target type
///
/// Names are local names; the resolved namespace is kept alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    /// Attributes in source order, values unescaped; namespace declarations
    /// are not included
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated character data, trimmed
    pub text: String,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Builder-style child setter
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Value of an attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of an attribute that must be present
    pub fn required_attr(&self, name: &str) -> Result<&str> {
        self.attr(name).ok_or_else(|| {
            QcmlError::decode(&self.name, format!("missing attribute '{}'", name))
        })
    }

    /// Value of the identifier attribute, matched case-insensitively
    /// (`ID`, `id`, `Id` ...) like the offset index does
    pub fn identifier(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case("id"))
            .map(|(_, v)| v.as_str())
    }

    /// Identifier of an element that must have one
    pub fn required_identifier(&self) -> Result<&str> {
        self.identifier().ok_or_else(|| {
            QcmlError::decode(&self.name, "missing identifier attribute 'ID'")
        })
    }

    /// Optional attribute as an owned string
    pub fn attr_owned(&self, name: &str) -> Option<String> {
        self.attr(name).map(str::to_owned)
    }

    /// First child with the given local name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Walk this element and all descendants, depth first
    pub fn walk(&self, visit: &mut impl FnMut(&Element) -> Result<()>) -> Result<()> {
        visit(self)?;
        for child in &self.children {
            child.walk(visit)?;
        }
        Ok(())
    }
}
