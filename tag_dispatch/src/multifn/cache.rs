//! Version-stamped method cache.

use std::collections::{BTreeMap, HashMap};

use crate::tag::Tag;
use crate::value::NativeFn;

/// Dispatch value -> resolved method, valid only for the hierarchy version it
/// was built against.
///
/// Reseeding copies the method table in, so exact-key dispatch never searches.
pub(super) struct MethodCache {
    entries: HashMap<Tag, NativeFn>,
    hierarchy_version: u64,
}

impl MethodCache {
    pub(super) fn new(methods: &BTreeMap<Tag, NativeFn>, hierarchy_version: u64) -> Self {
        let mut cache = MethodCache {
            entries: HashMap::new(),
            hierarchy_version,
        };
        cache.reseed(methods, hierarchy_version);
        cache
    }

    pub(super) fn reseed(&mut self, methods: &BTreeMap<Tag, NativeFn>, hierarchy_version: u64) {
        self.entries.clear();
        self.entries
            .extend(methods.iter().map(|(k, m)| (k.clone(), m.clone())));
        self.hierarchy_version = hierarchy_version;
    }

    pub(super) fn is_stale(&self, hierarchy_version: u64) -> bool {
        self.hierarchy_version != hierarchy_version
    }

    pub(super) fn get(&self, value: &Tag) -> Option<NativeFn> {
        self.entries.get(value).cloned()
    }

    pub(super) fn insert(&mut self, value: Tag, method: NativeFn) {
        self.entries.insert(value, method);
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}
