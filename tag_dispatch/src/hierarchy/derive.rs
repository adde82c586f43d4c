//! Edge insertion and removal with exact closure maintenance.

use tracing::debug;

use super::{Hierarchy, TagSets};
use crate::error::{DispatchError, DispatchResult};
use crate::tag::Tag;

impl Hierarchy {
    /// Return a hierarchy in which `parent` is a direct parent of `tag`.
    ///
    /// Deriving an edge that already exists returns an identical hierarchy.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::SelfDerivation`] if `tag == parent`
    /// - [`DispatchError::RedundantDerivation`] if `parent` is already an
    ///   (indirect) ancestor of `tag`
    /// - [`DispatchError::CyclicDerivation`] if `tag` is an ancestor of `parent`
    ///
    /// On error `self` is untouched.
    pub fn derive(&self, tag: Tag, parent: Tag) -> DispatchResult<Hierarchy> {
        if tag == parent {
            return Err(DispatchError::SelfDerivation { tag });
        }
        if self
            .parents
            .get(&tag)
            .is_some_and(|parents| parents.contains(&parent))
        {
            return Ok(self.clone());
        }
        if self.ancestors_contain(&tag, &parent) {
            return Err(DispatchError::RedundantDerivation { tag, parent });
        }
        if self.ancestors_contain(&parent, &tag) {
            return Err(DispatchError::CyclicDerivation { tag, parent });
        }

        debug!(%tag, %parent, "derive");
        let mut next = self.clone();
        next.insert_edge(tag, parent);
        Ok(next)
    }

    /// Return a hierarchy without the direct edge `tag -> parent`.
    ///
    /// The closures are rebuilt from scratch by replaying every remaining
    /// direct edge, so tags reachable along another path keep their ancestry.
    /// Removing an edge that does not exist returns an identical hierarchy.
    pub fn underive(&self, tag: &Tag, parent: &Tag) -> Hierarchy {
        let Some(current) = self.parents.get(tag) else {
            return self.clone();
        };
        if !current.contains(parent) {
            return self.clone();
        }

        debug!(%tag, %parent, "underive");
        let mut parents = self.parents.clone();
        if let Some(remaining) = parents.get_mut(tag) {
            remaining.remove(parent);
            if remaining.is_empty() {
                parents.remove(tag);
            }
        }
        Self::rebuild(parents)
    }

    /// Build a hierarchy from a list of `(tag, parent)` edges, applying the
    /// same checks as [`Hierarchy::derive`].
    pub fn from_edges(edges: impl IntoIterator<Item = (Tag, Tag)>) -> DispatchResult<Hierarchy> {
        edges
            .into_iter()
            .try_fold(Hierarchy::new(), |h, (tag, parent)| h.derive(tag, parent))
    }

    /// Rebuild from edges that may include redundant ones (a direct edge to
    /// an ancestor that is also reachable indirectly). Only self-edges and
    /// cycles are rejected.
    pub(super) fn replay(edges: impl IntoIterator<Item = (Tag, Tag)>) -> DispatchResult<Hierarchy> {
        let mut h = Hierarchy::new();
        for (tag, parent) in edges {
            if tag == parent {
                return Err(DispatchError::SelfDerivation { tag });
            }
            if h.ancestors_contain(&parent, &tag) {
                return Err(DispatchError::CyclicDerivation { tag, parent });
            }
            h.insert_edge(tag, parent);
        }
        Ok(h)
    }

    /// Replay a direct-parent map that is known to be acyclic.
    fn rebuild(parents: TagSets) -> Hierarchy {
        let mut h = Hierarchy::new();
        for (tag, direct) in parents {
            for parent in direct {
                h.insert_edge(tag.clone(), parent);
            }
        }
        h
    }

    /// Insert `tag -> parent` and extend both closures.
    ///
    /// Every tag at or below `tag` gains every tag at or above `parent` as an
    /// ancestor, and vice versa for descendants. Both sides are collected
    /// before either map is touched. The caller guarantees the edge does not
    /// close a cycle.
    fn insert_edge(&mut self, tag: Tag, parent: Tag) {
        let lower = Self::with_related(&tag, &self.descendants);
        let upper = Self::with_related(&parent, &self.ancestors);

        self.parents.entry(tag).or_default().insert(parent);
        extend_all(&mut self.ancestors, &lower, &upper);
        extend_all(&mut self.descendants, &upper, &lower);
    }

    fn with_related(tag: &Tag, closure: &TagSets) -> Vec<Tag> {
        std::iter::once(tag)
            .chain(closure.get(tag).into_iter().flatten())
            .cloned()
            .collect()
    }
}

fn extend_all(map: &mut TagSets, keys: &[Tag], values: &[Tag]) {
    for key in keys {
        map.entry(key.clone())
            .or_default()
            .extend(values.iter().cloned());
    }
}
