//! Multimethods: dispatch on a value computed from the arguments.
//!
//! A [`MultiFn`] owns a dispatch function, a method table keyed by dispatch
//! value, a preference table for breaking ties and a cache of resolved
//! lookups. Calling it:
//!
//! 1. computes the dispatch value from the arguments
//! 2. drops and reseeds the cache if the hierarchy changed since it was built
//! 3. returns the cached method on a hit
//! 4. on a miss, searches the method table for the single dominant key the
//!    dispatch value `isa`, failing on ambiguity, and caches the result
//! 5. falls back to the method under the default dispatch value
//!
//! Cache coherency is tracked with the hierarchy atom's version counter: the
//! cache is valid iff it was built against the version currently installed.
//! The method table, preference table and cache live behind one `RefCell`, so
//! a reader never sees a table update without the matching cache reset.
//!
//! # Module Organization
//!
//! - `cache`: version-stamped method cache
//! - `prefer`: preference walk, dominance and best-match search

mod cache;
mod prefer;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use self::cache::MethodCache;
use self::prefer::PreferTable;
use crate::error::{DispatchError, DispatchResult};
use crate::hierarchy::{new_hierarchy_ref, HierarchyRef};
use crate::tag::Tag;
use crate::value::{NativeFn, Value};

/// Computes the dispatch value from the call arguments.
pub type DispatchFn = Rc<dyn Fn(&[Value]) -> DispatchResult<Tag>>;

struct MethodState {
    methods: BTreeMap<Tag, NativeFn>,
    prefers: PreferTable,
    cache: MethodCache,
}

impl MethodState {
    fn reset_cache(&mut self, hierarchy_version: u64) {
        self.cache.reseed(&self.methods, hierarchy_version);
    }
}

/// A named multimethod.
pub struct MultiFn {
    name: String,
    dispatch_fn: DispatchFn,
    default_dispatch_value: Tag,
    hierarchy: HierarchyRef,
    state: RefCell<MethodState>,
}

impl MultiFn {
    /// Define a multimethod. Equivalent to
    /// `MultiFn::builder(name, dispatch_fn).default_dispatch_value(default).hierarchy(h).build()`.
    pub fn new(
        name: impl Into<String>,
        dispatch_fn: impl Fn(&[Value]) -> DispatchResult<Tag> + 'static,
        default_dispatch_value: Tag,
        hierarchy: HierarchyRef,
    ) -> Self {
        Self::from_parts(
            name.into(),
            Rc::new(dispatch_fn),
            default_dispatch_value,
            hierarchy,
        )
    }

    fn from_parts(
        name: String,
        dispatch_fn: DispatchFn,
        default_dispatch_value: Tag,
        hierarchy: HierarchyRef,
    ) -> Self {
        let version = hierarchy.version();
        let methods = BTreeMap::new();
        let cache = MethodCache::new(&methods, version);
        MultiFn {
            name,
            dispatch_fn,
            default_dispatch_value,
            hierarchy,
            state: RefCell::new(MethodState {
                methods,
                prefers: PreferTable::new(),
                cache,
            }),
        }
    }

    pub fn builder(
        name: impl Into<String>,
        dispatch_fn: impl Fn(&[Value]) -> DispatchResult<Tag> + 'static,
    ) -> MultiFnBuilder {
        MultiFnBuilder {
            name: name.into(),
            dispatch_fn: Rc::new(dispatch_fn),
            default_dispatch_value: Tag::default_dispatch(),
            hierarchy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatch_fn(&self) -> DispatchFn {
        Rc::clone(&self.dispatch_fn)
    }

    pub fn default_dispatch_value(&self) -> &Tag {
        &self.default_dispatch_value
    }

    pub fn hierarchy(&self) -> &HierarchyRef {
        &self.hierarchy
    }

    /// Call the multimethod.
    pub fn invoke(&self, args: &[Value]) -> DispatchResult<Value> {
        let value = (self.dispatch_fn)(args)?;
        match self.get_method(&value)? {
            Some(method) => method(args),
            None => Err(DispatchError::NoMatchingMethod {
                name: self.name.clone(),
                value,
            }),
        }
    }

    /// Register `method` under `dispatch_value`, replacing any previous one.
    pub fn add_method(
        &self,
        dispatch_value: Tag,
        method: impl Fn(&[Value]) -> DispatchResult<Value> + 'static,
    ) {
        self.add_native_method(dispatch_value, Rc::new(method));
    }

    pub fn add_native_method(&self, dispatch_value: Tag, method: NativeFn) {
        debug!(multifn = %self.name, %dispatch_value, "add method");
        let version = self.hierarchy.version();
        let mut state = self.state.borrow_mut();
        state.methods.insert(dispatch_value, method);
        state.reset_cache(version);
    }

    /// Remove the method under `dispatch_value`. Returns whether one existed.
    pub fn remove_method(&self, dispatch_value: &Tag) -> bool {
        let version = self.hierarchy.version();
        let mut state = self.state.borrow_mut();
        let removed = state.methods.remove(dispatch_value).is_some();
        if removed {
            debug!(multifn = %self.name, %dispatch_value, "remove method");
        }
        state.reset_cache(version);
        removed
    }

    /// Prefer `preferred`'s method over `other`'s when both match.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ConflictingPreference`] if `other` is already preferred
    /// over `preferred`, directly or through the hierarchy. The preference
    /// table is left unchanged.
    pub fn prefer_method(&self, preferred: Tag, other: Tag) -> DispatchResult<()> {
        let version = self.hierarchy.version();
        let mut state = self.state.borrow_mut();
        let conflict = self
            .hierarchy
            .with(|h| prefer::prefers(h, &state.prefers, &other, &preferred));
        if conflict {
            return Err(DispatchError::ConflictingPreference {
                name: self.name.clone(),
                preferred,
                other,
            });
        }
        debug!(multifn = %self.name, %preferred, %other, "prefer method");
        state.prefers.entry(preferred).or_default().insert(other);
        state.reset_cache(version);
        Ok(())
    }

    /// Remove every method and preference and empty the cache.
    pub fn reset(&self) {
        debug!(multifn = %self.name, "reset");
        let version = self.hierarchy.version();
        let mut state = self.state.borrow_mut();
        state.methods.clear();
        state.prefers.clear();
        state.reset_cache(version);
    }

    /// Alias of [`MultiFn::reset`].
    pub fn remove_all_methods(&self) {
        self.reset();
    }

    /// Snapshot of the method table.
    pub fn methods(&self) -> BTreeMap<Tag, NativeFn> {
        self.state.borrow().methods.clone()
    }

    /// Snapshot of the preference table: each key is preferred over every tag
    /// in its set.
    pub fn prefers(&self) -> BTreeMap<Tag, BTreeSet<Tag>> {
        self.state.borrow().prefers.clone()
    }

    /// The method that would run for `dispatch_value`, including the default
    /// fallback, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AmbiguousDispatch`] if several methods match and none
    /// dominates.
    pub fn get_method(&self, dispatch_value: &Tag) -> DispatchResult<Option<NativeFn>> {
        if let Some(method) = self.cached(dispatch_value) {
            return Ok(Some(method));
        }
        if let Some(method) = self.find_and_cache_best_method(dispatch_value)? {
            return Ok(Some(method));
        }
        Ok(self
            .state
            .borrow()
            .methods
            .get(&self.default_dispatch_value)
            .cloned())
    }

    /// Number of entries currently cached, including the reseeded method table.
    pub fn cache_len(&self) -> usize {
        self.state.borrow().cache.len()
    }

    fn cached(&self, dispatch_value: &Tag) -> Option<NativeFn> {
        let version = self.hierarchy.version();
        let mut state = self.state.borrow_mut();
        if state.cache.is_stale(version) {
            debug!(multifn = %self.name, version, "hierarchy changed, resetting method cache");
            state.reset_cache(version);
        }
        let hit = state.cache.get(dispatch_value);
        if hit.is_some() {
            trace!(multifn = %self.name, %dispatch_value, "method cache hit");
        }
        hit
    }

    fn find_and_cache_best_method(&self, dispatch_value: &Tag) -> DispatchResult<Option<NativeFn>> {
        let mut retried = false;
        loop {
            let searched_version = self.hierarchy.version();
            let best = {
                let state = self.state.borrow();
                self.hierarchy
                    .with(|h| {
                        prefer::find_best(&self.name, h, &state.methods, &state.prefers, dispatch_value)
                    })?
                    .map(|(key, method)| (key.clone(), Rc::clone(method)))
            };
            let Some((key, method)) = best else {
                trace!(multifn = %self.name, %dispatch_value, "no matching method");
                return Ok(None);
            };

            let current = self.hierarchy.version();
            let mut state = self.state.borrow_mut();
            if current == searched_version && !state.cache.is_stale(current) {
                trace!(multifn = %self.name, %dispatch_value, %key, "cached best method");
                state.cache.insert(dispatch_value.clone(), Rc::clone(&method));
                return Ok(Some(method));
            }

            state.reset_cache(current);
            if retried {
                warn!(
                    multifn = %self.name,
                    %dispatch_value,
                    "hierarchy still changing after retry, returning uncached method"
                );
                return Ok(Some(method));
            }
            trace!(multifn = %self.name, %dispatch_value, "hierarchy changed during search, retrying");
            retried = true;
        }
    }
}

impl fmt::Debug for MultiFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<MultiFn {}>", self.name)
    }
}

/// Optional parameters for [`MultiFn`].
pub struct MultiFnBuilder {
    name: String,
    dispatch_fn: DispatchFn,
    default_dispatch_value: Tag,
    hierarchy: Option<HierarchyRef>,
}

impl MultiFnBuilder {
    /// Dispatch value whose method runs when nothing else matches.
    /// Defaults to `:default`.
    pub fn default_dispatch_value(mut self, tag: Tag) -> Self {
        self.default_dispatch_value = tag;
        self
    }

    /// Hierarchy used for `isa` and preference walks. Defaults to a fresh,
    /// private, empty hierarchy.
    pub fn hierarchy(mut self, hierarchy: HierarchyRef) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    pub fn build(self) -> MultiFn {
        let hierarchy = self.hierarchy.unwrap_or_else(new_hierarchy_ref);
        MultiFn::from_parts(
            self.name,
            self.dispatch_fn,
            self.default_dispatch_value,
            hierarchy,
        )
    }
}

impl fmt::Debug for MultiFnBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiFnBuilder")
            .field("name", &self.name)
            .field("default_dispatch_value", &self.default_dispatch_value)
            .field("hierarchy", &self.hierarchy.is_some())
            .finish()
    }
}
