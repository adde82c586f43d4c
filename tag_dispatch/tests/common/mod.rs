//! Shared helpers for integration tests
// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use tag_dispatch::{Hierarchy, Tag};

pub fn kw(name: &str) -> Tag {
    Tag::keyword(name)
}

/// `:n0` .. `:n{count-1}`, the node pool for generated hierarchies.
pub fn node(i: usize) -> Tag {
    Tag::keyword(format!("n{}", i))
}

pub const NODES: usize = 8;

pub fn all_nodes() -> Vec<Tag> {
    (0..NODES).map(node).collect()
}

/// Random child -> parent edges over the node pool. Children always have
/// the higher index, so every edge list is acyclic.
pub fn edges_strategy() -> impl Strategy<Value = Vec<(Tag, Tag)>> {
    prop::collection::vec((0..NODES, 0..NODES), 0..24).prop_map(|pairs| {
        pairs
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (node(a.max(b)), node(a.min(b))))
            .collect()
    })
}

/// Derive every edge in order, skipping the ones `derive` rejects.
///
/// Edge order is random, so the result may still hold redundant direct
/// edges (a parent declared before the indirect path to it).
pub fn build(edges: &[(Tag, Tag)]) -> Hierarchy {
    edges.iter().fold(Hierarchy::new(), |h, (tag, parent)| {
        match h.derive(tag.clone(), parent.clone()) {
            Ok(next) => next,
            Err(_) => h,
        }
    })
}

/// Ancestors of `tag` by walking the direct edges of `h` breadth-first.
pub fn reachable(h: &Hierarchy, tag: &Tag) -> BTreeSet<Tag> {
    let edges = h.edges();
    let mut seen = BTreeSet::new();
    let mut frontier = vec![tag.clone()];
    while let Some(current) = frontier.pop() {
        for (child, parent) in &edges {
            if child == &current && seen.insert(parent.clone()) {
                frontier.push(parent.clone());
            }
        }
    }
    seen
}

/// The full `isa` relation over the node pool.
pub fn isa_matrix(h: &Hierarchy) -> Vec<Vec<bool>> {
    let nodes = all_nodes();
    nodes
        .iter()
        .map(|a| nodes.iter().map(|b| h.isa(a, b)).collect())
        .collect()
}

/// :animal <- :mammal <- :dog, :animal <- :pet <- :dog, :cat -> :mammal
pub fn animals() -> Hierarchy {
    Hierarchy::from_edges([
        (kw("mammal"), kw("animal")),
        (kw("pet"), kw("animal")),
        (kw("dog"), kw("mammal")),
        (kw("dog"), kw("pet")),
        (kw("cat"), kw("mammal")),
    ])
    .unwrap_or_else(|e| panic!("animal hierarchy: {}", e))
}
