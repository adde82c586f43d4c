//! Preference resolution and best-match search.

use std::collections::{BTreeMap, BTreeSet};
use std::iter;

use crate::error::{DispatchError, DispatchResult};
use crate::hierarchy::Hierarchy;
use crate::tag::Tag;
use crate::value::NativeFn;

pub(super) type PreferTable = BTreeMap<Tag, BTreeSet<Tag>>;

/// True if `x` or one of its ancestors is preferred over `y` or one of its
/// ancestors, so preferences declared on ancestors are inherited.
///
/// Reads the stored closures rather than walking parents, which would revisit
/// shared ancestors once per path.
pub(super) fn prefers(h: &Hierarchy, table: &PreferTable, x: &Tag, y: &Tag) -> bool {
    if table.is_empty() {
        return false;
    }
    let ys: Vec<&Tag> = iter::once(y).chain(h.ancestors(y).into_iter().flatten()).collect();
    iter::once(x)
        .chain(h.ancestors(x).into_iter().flatten())
        .filter_map(|x| table.get(x))
        .any(|over| ys.iter().any(|y| over.contains(*y)))
}

/// `x` wins over `y` when explicitly preferred or more specific.
pub(super) fn dominates(h: &Hierarchy, table: &PreferTable, x: &Tag, y: &Tag) -> bool {
    prefers(h, table, x, y) || h.isa(x, y)
}

/// Fold every method whose key `value` isa into the single dominant one.
///
/// A candidate replaces the running best when it dominates it; afterwards the
/// best must dominate the candidate, or the two are incomparable and dispatch
/// is ambiguous.
pub(super) fn find_best<'m>(
    name: &str,
    h: &Hierarchy,
    methods: &'m BTreeMap<Tag, NativeFn>,
    table: &PreferTable,
    value: &Tag,
) -> DispatchResult<Option<(&'m Tag, &'m NativeFn)>> {
    let mut best: Option<(&Tag, &NativeFn)> = None;
    for (key, method) in methods {
        if !h.isa(value, key) {
            continue;
        }
        let next = match best {
            Some((best_key, best_method)) if !dominates(h, table, key, best_key) => {
                (best_key, best_method)
            }
            _ => (key, method),
        };
        if !dominates(h, table, next.0, key) {
            return Err(DispatchError::AmbiguousDispatch {
                name: name.to_string(),
                value: value.clone(),
                first: key.clone(),
                second: next.0.clone(),
            });
        }
        best = Some(next);
    }
    Ok(best)
}
