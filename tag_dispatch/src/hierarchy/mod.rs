//! Tag hierarchies for `isa`-based dispatch.
//!
//! A [`Hierarchy`] is an immutable value recording direct parent edges between
//! tags together with the exact transitive closures in both directions:
//!
//! ```text
//!            :animal
//!            /     \
//!        :mammal   :pet
//!            \     /
//!             :dog          parents[:dog]   = {:mammal, :pet}
//!                           ancestors[:dog] = {:mammal, :pet, :animal}
//!                           descendants[:animal] = {:mammal, :pet, :dog}
//! ```
//!
//! Mutation is functional: [`Hierarchy::derive`] and [`Hierarchy::underive`]
//! return a new value and leave the receiver untouched, so a failed derivation
//! can never corrupt a hierarchy that is already installed somewhere. Shared,
//! mutable hierarchies live in an [`Atom`](crate::atom::Atom) (see
//! [`HierarchyRef`]).
//!
//! # Module Organization
//!
//! - `derive`: edge insertion/removal and closure maintenance
//! - `config`: declarative hierarchy loading from TOML or JSON

pub mod config;
mod derive;


use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::tag::Tag;

/// A shared, mutable hierarchy cell. Its version counter is what multimethod
/// caches are stamped with.
pub type HierarchyRef = Rc<Atom<Hierarchy>>;

/// Create a fresh empty hierarchy cell.
pub fn new_hierarchy_ref() -> HierarchyRef {
    Rc::new(Atom::new(Hierarchy::new()))
}

type TagSets = BTreeMap<Tag, BTreeSet<Tag>>;

static NO_TAGS: BTreeSet<Tag> = BTreeSet::new();

/// Parent/ancestor/descendant relation over tags.
///
/// Equality compares all three maps, which is equivalent to comparing the
/// direct-parent maps since the closures are derived from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ParentMap", try_from = "ParentMap")]
pub struct Hierarchy {
    parents: TagSets,
    ancestors: TagSets,
    descendants: TagSets,
}

/// Serialized form of a hierarchy: only the direct edges. Closures are
/// recomputed on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ParentMap {
    parents: TagSets,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Direct parents of `tag`.
    ///
    /// The three lookups return `None` for a tag the hierarchy never mentions
    /// and an empty set for a known tag with no relation in that direction.
    pub fn parents(&self, tag: &Tag) -> Option<&BTreeSet<Tag>> {
        self.relation(&self.parents, tag)
    }

    /// Transitive parents of `tag`.
    pub fn ancestors(&self, tag: &Tag) -> Option<&BTreeSet<Tag>> {
        self.relation(&self.ancestors, tag)
    }

    /// Transitive children of `tag`.
    pub fn descendants(&self, tag: &Tag) -> Option<&BTreeSet<Tag>> {
        self.relation(&self.descendants, tag)
    }

    /// True if `tag` appears on either end of some edge.
    pub fn contains(&self, tag: &Tag) -> bool {
        self.parents.contains_key(tag) || self.descendants.contains_key(tag)
    }

    fn relation<'a>(&'a self, map: &'a TagSets, tag: &Tag) -> Option<&'a BTreeSet<Tag>> {
        match map.get(tag) {
            Some(set) => Some(set),
            None if self.contains(tag) => Some(&NO_TAGS),
            None => None,
        }
    }

    /// True if `child` is `parent`, has it as an ancestor, or both are vectors
    /// of the same length whose elements satisfy `isa` position by position.
    ///
    /// ```
    /// use tag_dispatch::hierarchy::Hierarchy;
    /// use tag_dispatch::tag::Tag;
    ///
    /// let h = Hierarchy::new()
    ///     .derive(Tag::keyword("dog"), Tag::keyword("animal"))
    ///     .unwrap();
    /// assert!(h.isa(&Tag::keyword("dog"), &Tag::keyword("animal")));
    /// assert!(h.isa(
    ///     &Tag::vector([Tag::keyword("dog"), Tag::keyword("dog")]),
    ///     &Tag::vector([Tag::keyword("animal"), Tag::keyword("dog")]),
    /// ));
    /// assert!(!h.isa(&Tag::keyword("animal"), &Tag::keyword("dog")));
    /// ```
    pub fn isa(&self, child: &Tag, parent: &Tag) -> bool {
        if child == parent {
            return true;
        }
        if self
            .ancestors
            .get(child)
            .is_some_and(|ancestors| ancestors.contains(parent))
        {
            return true;
        }
        match (child, parent) {
            (Tag::Vector(children), Tag::Vector(parents)) => {
                children.len() == parents.len()
                    && children
                        .iter()
                        .zip(parents)
                        .all(|(c, p)| self.isa(c, p))
            }
            _ => false,
        }
    }

    /// Every direct `(tag, parent)` edge, in tag order.
    pub fn edges(&self) -> Vec<(Tag, Tag)> {
        self.parents
            .iter()
            .flat_map(|(tag, parents)| parents.iter().map(move |p| (tag.clone(), p.clone())))
            .collect()
    }

    /// Every tag that appears on either end of an edge.
    pub fn tags(&self) -> BTreeSet<&Tag> {
        self.parents
            .iter()
            .flat_map(|(tag, parents)| std::iter::once(tag).chain(parents))
            .collect()
    }

    fn ancestors_contain(&self, tag: &Tag, candidate: &Tag) -> bool {
        self.ancestors
            .get(tag)
            .is_some_and(|ancestors| ancestors.contains(candidate))
    }
}

impl From<Hierarchy> for ParentMap {
    fn from(h: Hierarchy) -> Self {
        ParentMap { parents: h.parents }
    }
}

impl TryFrom<ParentMap> for Hierarchy {
    type Error = crate::error::DispatchError;

    fn try_from(map: ParentMap) -> Result<Self, Self::Error> {
        Hierarchy::replay(
            map.parents
                .into_iter()
                .flat_map(|(tag, parents)| parents.into_iter().map(move |p| (tag.clone(), p))),
        )
    }
}
