//! Ready-made dispatch functions.
//!
//! Each has the [`DispatchFn`](crate::multifn::DispatchFn) shape and can be
//! passed straight to [`MultiFn::builder`](crate::multifn::MultiFn::builder).

use crate::error::{DispatchError, DispatchResult};
use crate::tag::Tag;
use crate::value::Value;

fn first<'a>(name: &str, args: &'a [Value]) -> DispatchResult<&'a Value> {
    args.first().ok_or_else(|| DispatchError::Arity {
        name: name.to_string(),
        got: 0,
    })
}

/// The first argument, as a tag.
pub fn first_arg(args: &[Value]) -> DispatchResult<Tag> {
    first("first_arg", args)?.to_tag()
}

/// The type of the first argument, as a symbol (`Int`, `Vector`, or a host
/// object's own type name).
pub fn type_of(args: &[Value]) -> DispatchResult<Tag> {
    Ok(Tag::symbol(first("type_of", args)?.type_name()))
}

/// All arguments as a vector tag, for dispatch on several values at once.
pub fn args_vector(args: &[Value]) -> DispatchResult<Tag> {
    args.iter()
        .map(Value::to_tag)
        .collect::<DispatchResult<Vec<_>>>()
        .map(Tag::Vector)
}

/// The types of all arguments as a vector of symbols.
pub fn types_vector(args: &[Value]) -> DispatchResult<Tag> {
    Ok(Tag::vector(args.iter().map(|arg| Tag::symbol(arg.type_name()))))
}
