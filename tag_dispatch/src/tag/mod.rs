//! Dispatch tags.
//!
//! A [`Tag`] is the opaque, value-compared identifier used both as a hierarchy
//! node and as a dispatch value. Atomic tags are keywords, symbols, strings,
//! integers, booleans and `nil`; composite tags are vectors of tags, used for
//! multi-argument dispatch where each position is compared independently.
//!
//! Tags have a literal syntax shared by parsing and display:
//!
//! ```text
//! :animal   :zoo/dog   sym   ns/sym   "text"   42   true   nil   [:dog :cat]
//! ```
//!
//! # Module Organization
//!
//! - `parsing`: `FromStr` for the literal syntax
//! - `display`: `fmt::Display` producing the same syntax

mod display;
mod parsing;


use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// An optionally namespaced identifier, shared by keywords and symbols.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    namespace: Option<String>,
    name: String,
}

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Name {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// A hierarchy node or dispatch value.
///
/// Equality is structural: two tags are the same tag iff they are equal values.
/// The derived ordering only exists so tags can key ordered maps; it carries no
/// hierarchy meaning.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Tag {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Keyword(Name),
    Symbol(Name),
    /// Fixed-length tuple of tags, compared position by position in `isa`.
    Vector(Vec<Tag>),
}

impl Tag {
    /// `:name`
    pub fn keyword(name: impl Into<String>) -> Self {
        Tag::Keyword(Name::new(name))
    }

    /// `:namespace/name`
    pub fn ns_keyword(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Tag::Keyword(Name::namespaced(namespace, name))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Tag::Symbol(Name::new(name))
    }

    pub fn ns_symbol(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Tag::Symbol(Name::namespaced(namespace, name))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Tag::Str(s.into())
    }

    pub fn vector(items: impl IntoIterator<Item = Tag>) -> Self {
        Tag::Vector(items.into_iter().collect())
    }

    /// The conventional default dispatch value, `:default`.
    pub fn default_dispatch() -> Self {
        Tag::keyword("default")
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Tag::Vector(_))
    }

    pub fn as_vector(&self) -> Option<&[Tag]> {
        match self {
            Tag::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// The identifier of a keyword or symbol tag.
    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Tag::Keyword(name) | Tag::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl From<bool> for Tag {
    fn from(b: bool) -> Self {
        Tag::Bool(b)
    }
}

impl From<i64> for Tag {
    fn from(n: i64) -> Self {
        Tag::Int(n)
    }
}

impl From<Vec<Tag>> for Tag {
    fn from(items: Vec<Tag>) -> Self {
        Tag::Vector(items)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

impl TryFrom<String> for Tag {
    type Error = DispatchError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
