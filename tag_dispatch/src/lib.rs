// Library code reports through `tracing`, never by printing.
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

//! Hierarchy-directed multiple dispatch.
//!
//! - [`tag`]: dispatch values and hierarchy nodes
//! - [`hierarchy`]: the mutable-by-replacement `isa` relation over tags
//! - [`atom`]: the validated, watchable cell shared state lives in
//! - [`multifn`]: multimethod registries with preference and caching
//! - [`capability`]: per-operation type tables with wildcard and instance overrides
//! - [`value`]: the host runtime values everything above dispatches on
//! - [`env`]: the top-level environment holding the default hierarchy
//!
//! ```
//! use tag_dispatch::{dispatch, DispatchEnv, Tag, Value};
//!
//! let env = DispatchEnv::new();
//! env.derive(Tag::keyword("dog"), Tag::keyword("animal")).unwrap();
//!
//! let speak = env.define_dispatch("speak", dispatch::first_arg);
//! speak.add_method(Tag::keyword("animal"), |_| Ok(Value::str("...")));
//! speak.add_method(Tag::keyword("dog"), |_| Ok(Value::str("woof")));
//!
//! let out = speak.invoke(&[Value::keyword("dog")]).unwrap();
//! assert_eq!(out.as_str(), Some("woof"));
//! ```

pub mod atom;
pub mod capability;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod hierarchy;
pub mod multifn;
pub mod tag;
pub mod value;

pub use atom::Atom;
pub use capability::{CapabilityTable, Protocols};
pub use env::DispatchEnv;
pub use error::{DispatchError, DispatchResult};
pub use hierarchy::{new_hierarchy_ref, Hierarchy, HierarchyRef};
pub use multifn::{DispatchFn, MultiFn, MultiFnBuilder};
pub use tag::{Name, Tag};
pub use value::{native, HostObject, NativeFn, Value, ValueType};

/// An empty hierarchy value.
pub fn make_hierarchy() -> Hierarchy {
    Hierarchy::new()
}
