//! Mutable reference cell with validation and change notification.
//!
//! [`Atom`] is the one primitive the rest of the crate mutates shared state
//! through. Every update is a whole-value replace: the validator sees the
//! candidate state, the cell commits it and bumps its version, and only then
//! are watchers called with the old and new values. No borrow of the cell is
//! held while a validator, update function or watcher runs, so callbacks may
//! freely read or update the same atom.
//!
//! The cell is single-threaded (`RefCell`/`Cell`); share it with `Rc`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{DispatchError, DispatchResult};

type Validator<T> = Rc<dyn Fn(&T) -> bool>;
type Watch<T> = Rc<dyn Fn(&str, &T, &T)>;

pub struct Atom<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    validator: RefCell<Option<Validator<T>>>,
    watches: RefCell<BTreeMap<String, Watch<T>>>,
}

impl<T: Clone> Atom<T> {
    pub fn new(value: T) -> Self {
        Atom {
            value: RefCell::new(value),
            version: Cell::new(0),
            validator: RefCell::new(None),
            watches: RefCell::new(BTreeMap::new()),
        }
    }

    /// A copy of the current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Read the current value in place.
    ///
    /// `f` must not update this atom.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Number of committed updates since creation. Strictly increases on every
    /// successful `reset`/`swap`.
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Replace the value.
    pub fn reset(&self, new_value: T) -> DispatchResult<()> {
        self.commit(new_value).map(|_| ())
    }

    /// Replace the value with `f(current)`, returning the new value.
    pub fn swap(&self, f: impl FnOnce(&T) -> T) -> DispatchResult<T> {
        let next = f(&self.get());
        self.commit(next)
    }

    /// Like [`Atom::swap`], but `f` may fail, in which case nothing changes.
    pub fn try_swap(&self, f: impl FnOnce(&T) -> DispatchResult<T>) -> DispatchResult<T> {
        let next = f(&self.get())?;
        self.commit(next)
    }

    /// Install or clear the validator. A new validator must accept the current
    /// value.
    pub fn set_validator(
        &self,
        validator: Option<impl Fn(&T) -> bool + 'static>,
    ) -> DispatchResult<()> {
        let validator: Option<Validator<T>> = validator.map(|v| Rc::new(v) as Validator<T>);
        if let Some(v) = &validator {
            if !self.with(|current| v(current)) {
                return Err(DispatchError::InvalidReferenceState);
            }
        }
        *self.validator.borrow_mut() = validator;
        Ok(())
    }

    /// Register `f(key, old, new)` to run after every committed update.
    /// Re-using a key replaces the previous watch.
    pub fn add_watch(&self, key: impl Into<String>, f: impl Fn(&str, &T, &T) + 'static) {
        self.watches.borrow_mut().insert(key.into(), Rc::new(f));
    }

    pub fn remove_watch(&self, key: &str) -> bool {
        self.watches.borrow_mut().remove(key).is_some()
    }

    fn commit(&self, next: T) -> DispatchResult<T> {
        let validator = self.validator.borrow().clone();
        if let Some(valid) = validator {
            if !valid(&next) {
                return Err(DispatchError::InvalidReferenceState);
            }
        }

        let old = self.value.replace(next.clone());
        self.version.set(self.version.get() + 1);

        let watches: Vec<(String, Watch<T>)> = self
            .watches
            .borrow()
            .iter()
            .map(|(k, w)| (k.clone(), Rc::clone(w)))
            .collect();
        for (key, watch) in watches {
            watch(key.as_str(), &old, &next);
        }
        Ok(next)
    }
}

impl<T: PartialEq + Clone> Atom<T> {
    /// Replace the value only if it currently equals `expected`.
    pub fn compare_and_set(&self, expected: &T, new_value: T) -> DispatchResult<bool> {
        if !self.with(|current| current == expected) {
            return Ok(false);
        }
        self.commit(new_value).map(|_| true)
    }
}

impl<T: fmt::Debug> fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("value", &self.value.borrow())
            .field("version", &self.version.get())
            .field("watches", &self.watches.borrow().len())
            .finish()
    }
}
