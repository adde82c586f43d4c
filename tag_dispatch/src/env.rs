//! The top-level dispatch environment.
//!
//! [`DispatchEnv`] owns the shared default hierarchy cell and the standard
//! capability tables. Create one at the top of an application and pass it
//! down; every function here is the "hierarchy omitted" form of the
//! corresponding [`Hierarchy`] operation, implemented as read-current,
//! compute-new, store-new on the default cell.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::capability::Protocols;
use crate::error::DispatchResult;
use crate::hierarchy::config::HierarchyConfig;
use crate::hierarchy::{new_hierarchy_ref, Hierarchy, HierarchyRef};
use crate::multifn::{MultiFn, MultiFnBuilder};
use crate::tag::Tag;
use crate::value::Value;

#[derive(Debug)]
pub struct DispatchEnv {
    hierarchy: HierarchyRef,
    protocols: Rc<Protocols>,
}

impl Default for DispatchEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchEnv {
    pub fn new() -> Self {
        DispatchEnv {
            hierarchy: new_hierarchy_ref(),
            protocols: Protocols::standard(),
        }
    }

    /// An environment whose default hierarchy starts from `config`.
    pub fn with_config(config: &HierarchyConfig) -> DispatchResult<Self> {
        let env = Self::new();
        env.hierarchy.try_swap(|h| config.apply(h))?;
        Ok(env)
    }

    /// The shared default hierarchy cell.
    pub fn hierarchy(&self) -> &HierarchyRef {
        &self.hierarchy
    }

    pub fn protocols(&self) -> &Rc<Protocols> {
        &self.protocols
    }

    /// Derive `tag -> parent` in the default hierarchy.
    pub fn derive(&self, tag: Tag, parent: Tag) -> DispatchResult<()> {
        self.hierarchy
            .try_swap(|h| h.derive(tag, parent))
            .map(|_| ())
    }

    /// Remove `tag -> parent` from the default hierarchy.
    pub fn underive(&self, tag: &Tag, parent: &Tag) -> DispatchResult<()> {
        self.hierarchy.swap(|h| h.underive(tag, parent)).map(|_| ())
    }

    pub fn isa(&self, child: &Tag, parent: &Tag) -> bool {
        self.hierarchy.with(|h| h.isa(child, parent))
    }

    pub fn parents(&self, tag: &Tag) -> Option<BTreeSet<Tag>> {
        self.hierarchy.with(|h| h.parents(tag).cloned())
    }

    pub fn ancestors(&self, tag: &Tag) -> Option<BTreeSet<Tag>> {
        self.hierarchy.with(|h| h.ancestors(tag).cloned())
    }

    pub fn descendants(&self, tag: &Tag) -> Option<BTreeSet<Tag>> {
        self.hierarchy.with(|h| h.descendants(tag).cloned())
    }

    /// A copy of the current default hierarchy.
    pub fn snapshot(&self) -> Hierarchy {
        self.hierarchy.get()
    }

    /// Define a multimethod on the default hierarchy with the `:default`
    /// default dispatch value.
    pub fn define_dispatch(
        &self,
        name: impl Into<String>,
        dispatch_fn: impl Fn(&[Value]) -> DispatchResult<Tag> + 'static,
    ) -> Rc<MultiFn> {
        Rc::new(self.multifn_builder(name, dispatch_fn).build())
    }

    /// A builder preset to the default hierarchy.
    pub fn multifn_builder(
        &self,
        name: impl Into<String>,
        dispatch_fn: impl Fn(&[Value]) -> DispatchResult<Tag> + 'static,
    ) -> MultiFnBuilder {
        MultiFn::builder(name, dispatch_fn).hierarchy(Rc::clone(&self.hierarchy))
    }

    /// Render a value through the `print` table.
    pub fn print(&self, value: &Value) -> DispatchResult<String> {
        self.protocols.print(value)
    }

    pub fn equiv(&self, a: &Value, b: &Value) -> DispatchResult<bool> {
        self.protocols.equiv(a, b)
    }

    /// Call any callable value (function or multimethod).
    pub fn invoke(&self, f: &Value, args: &[Value]) -> DispatchResult<Value> {
        self.protocols.invoke(f, args)
    }
}
