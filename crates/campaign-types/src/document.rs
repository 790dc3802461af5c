//! Structured documents exchanged at the configuration and persistence
//! boundaries.
//!
//! An [`XElement`] is a tree of named nodes. Each node holds string
//! attributes, optional text content, and an ordered child list. The script
//! host uses it both for the one-time campaign configuration and for the
//! save/load snapshot of script-owned state; the schema is defined by whoever
//! writes the document, and the tree guarantees only that what was written
//! reads back identically.
//!
//! The type is `serde`-serializable so any textual format (JSON in the
//! harness) can carry it across process boundaries.

use core::fmt::Display;
use core::str::FromStr;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Errors raised while reading values out of a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The document root has an unexpected name.
    #[error("expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot {
        /// The required root name.
        expected: String,
        /// The name actually present.
        found: String,
    },

    /// A required child element is absent.
    #[error("<{element}> is missing required child <{child}>")]
    MissingChild {
        /// The parent element name.
        element: String,
        /// The missing child name.
        child: String,
    },

    /// A required attribute is absent.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// The element name.
        element: String,
        /// The missing attribute name.
        attribute: String,
    },

    /// An attribute is present but cannot be parsed.
    #[error("<{element}> attribute '{attribute}' has invalid value '{value}': {reason}")]
    InvalidAttribute {
        /// The element name.
        element: String,
        /// The attribute name.
        attribute: String,
        /// The raw value.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// A node in a structured document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XElement {
    /// Element name.
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Self>,
}

impl XElement {
    /// Create an empty element with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Fail with [`DocumentError::UnexpectedRoot`] unless this element has
    /// the given name.
    pub fn expect_name(&self, expected: &str) -> Result<&Self, DocumentError> {
        if self.name == expected {
            Ok(self)
        } else {
            Err(DocumentError::UnexpectedRoot {
                expected: expected.to_owned(),
                found: self.name.clone(),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    /// Set an attribute, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.attributes.insert(key.to_owned(), value.to_string());
        self
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.set(key, value);
        self
    }

    /// Return an attribute value, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Return an attribute value or [`DocumentError::MissingAttribute`].
    pub fn require(&self, key: &str) -> Result<&str, DocumentError> {
        self.get(key).ok_or_else(|| DocumentError::MissingAttribute {
            element: self.name.clone(),
            attribute: key.to_owned(),
        })
    }

    /// Parse an optional attribute.
    ///
    /// Returns `Ok(None)` when the attribute is absent and an error when it
    /// is present but malformed.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, DocumentError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|err| DocumentError::InvalidAttribute {
                        element: self.name.clone(),
                        attribute: key.to_owned(),
                        value: raw.to_owned(),
                        reason: err.to_string(),
                    })
            })
            .transpose()
    }

    /// Parse a required attribute.
    pub fn parse_required<T>(&self, key: &str) -> Result<T, DocumentError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.parse(key)?
            .ok_or_else(|| DocumentError::MissingAttribute {
                element: self.name.clone(),
                attribute: key.to_owned(),
            })
    }

    /// Iterate over all attributes in key order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    // -----------------------------------------------------------------------
    // Text content
    // -----------------------------------------------------------------------

    /// Return the text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Set the text content.
    pub fn set_text(&mut self, text: &str) -> &mut Self {
        self.content = Some(text.to_owned());
        self
    }

    // -----------------------------------------------------------------------
    // Children
    // -----------------------------------------------------------------------

    /// Append an already-built child.
    pub fn push(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Return all children in insertion order.
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Return the first child with the given name.
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Return the first child with the given name or
    /// [`DocumentError::MissingChild`].
    pub fn require_child(&self, name: &str) -> Result<&Self, DocumentError> {
        self.child(name).ok_or_else(|| DocumentError::MissingChild {
            element: self.name.clone(),
            child: name.to_owned(),
        })
    }

    /// Iterate over the children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> XElement {
        XElement::new("campaign-script")
            .with("variant", "mission")
            .with_child(
                XElement::new("objectives")
                    .with_child(
                        XElement::new("objective")
                            .with("id", "destroy-pirate-base")
                            .with("visible", true),
                    )
                    .with_child(XElement::new("objective").with("id", "escort")),
            )
    }

    #[test]
    fn attributes_and_children_are_readable() {
        let root = sample();
        assert_eq!(root.get("variant"), Some("mission"));
        let objectives = root.require_child("objectives").unwrap();
        let ids: Vec<&str> = objectives
            .children_named("objective")
            .filter_map(|o| o.get("id"))
            .collect();
        assert_eq!(ids, vec!["destroy-pirate-base", "escort"]);
    }

    #[test]
    fn parse_reports_missing_and_invalid() {
        let root = sample();
        let first = root
            .require_child("objectives")
            .unwrap()
            .child("objective")
            .unwrap();
        assert_eq!(first.parse::<bool>("visible"), Ok(Some(true)));
        assert_eq!(first.parse::<bool>("hidden"), Ok(None));
        assert!(matches!(
            first.parse_required::<u32>("level"),
            Err(DocumentError::MissingAttribute { .. })
        ));
        assert!(matches!(
            first.parse::<u32>("id"),
            Err(DocumentError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn expect_name_checks_root() {
        let root = sample();
        assert!(root.expect_name("campaign-script").is_ok());
        assert_eq!(
            root.expect_name("script-state"),
            Err(DocumentError::UnexpectedRoot {
                expected: String::from("script-state"),
                found: String::from("campaign-script"),
            })
        );
    }

    #[test]
    fn missing_child_is_reported() {
        let root = XElement::new("empty");
        assert_eq!(
            root.require_child("objectives"),
            Err(DocumentError::MissingChild {
                element: String::from("empty"),
                child: String::from("objectives"),
            })
        );
    }

    #[test]
    fn json_roundtrip_preserves_tree() {
        let mut note = XElement::new("note");
        note.set_text("keep me");
        let root = sample().with_child(note);
        let json = serde_json::to_string(&root).unwrap();
        let restored: XElement = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, root);
        assert_eq!(restored.child("note").and_then(XElement::text), Some("keep me"));
    }
}
