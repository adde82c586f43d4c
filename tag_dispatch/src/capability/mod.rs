//! Capability tables: per-operation single dispatch on a value's type.
//!
//! A [`CapabilityTable`] maps each built-in [`ValueType`] to the function that
//! implements one operation (`print`, `equiv`, `invoke`, ...). Resolution for a
//! value runs in a fixed order:
//!
//! 1. the value's own implementation, for [`HostObject`](crate::value::HostObject)s
//!    that provide one
//! 2. the entry for the value's type
//! 3. the wildcard entry
//! 4. [`DispatchError::MissingImplementation`]
//!
//! Tables are append-only: entries are added or replaced over the lifetime of
//! the process, never removed.
//!
//! # Module Organization
//!
//! - `protocols`: the standard `print`, `equiv` and `invoke` tables

mod protocols;

pub use protocols::Protocols;

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::trace;

use crate::error::{DispatchError, DispatchResult};
use crate::value::{NativeFn, Value, ValueType};

/// Implementations of one operation, keyed by value type.
pub struct CapabilityTable {
    protocol: String,
    entries: RefCell<HashMap<ValueType, NativeFn>>,
    wildcard: RefCell<Option<NativeFn>>,
}

impl CapabilityTable {
    pub fn new(protocol: impl Into<String>) -> Self {
        CapabilityTable {
            protocol: protocol.into(),
            entries: RefCell::new(HashMap::new()),
            wildcard: RefCell::new(None),
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Install the implementation for `ty`, replacing any previous one.
    pub fn extend(&self, ty: ValueType, f: NativeFn) -> &Self {
        self.entries.borrow_mut().insert(ty, f);
        self
    }

    /// Install the wildcard implementation used for types with no entry.
    pub fn extend_default(&self, f: NativeFn) -> &Self {
        *self.wildcard.borrow_mut() = Some(f);
        self
    }

    /// True if `ty` has its own entry (the wildcard does not count).
    pub fn has_entry(&self, ty: ValueType) -> bool {
        self.entries.borrow().contains_key(&ty)
    }

    /// True if resolving `value` would succeed.
    pub fn satisfies(&self, value: &Value) -> bool {
        self.resolve(value).is_ok()
    }

    /// Find the implementation for `value`.
    pub fn resolve(&self, value: &Value) -> DispatchResult<NativeFn> {
        if let Value::Object(obj) = value {
            if let Some(f) = obj.capability(&self.protocol) {
                trace!(protocol = %self.protocol, type_name = obj.type_name(), "instance override");
                return Ok(f);
            }
        }
        if let Some(f) = self.entries.borrow().get(&value.value_type()) {
            return Ok(f.clone());
        }
        if let Some(f) = self.wildcard.borrow().as_ref() {
            return Ok(f.clone());
        }
        Err(DispatchError::MissingImplementation {
            protocol: self.protocol.clone(),
            type_name: value.type_name().to_string(),
            value: value.to_string(),
        })
    }

    /// Resolve on the first argument and call the implementation with all of
    /// `args`.
    pub fn call(&self, args: &[Value]) -> DispatchResult<Value> {
        let Some(target) = args.first() else {
            return Err(DispatchError::Arity {
                name: self.protocol.clone(),
                got: 0,
            });
        };
        let f = self.resolve(target)?;
        f(args)
    }
}

impl std::fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<ValueType> = self.entries.borrow().keys().copied().collect();
        types.sort();
        f.debug_struct("CapabilityTable")
            .field("protocol", &self.protocol)
            .field("types", &types)
            .field("wildcard", &self.wildcard.borrow().is_some())
            .finish()
    }
}
