//! Host runtime values.
//!
//! The dispatch core is consumed by a dynamically typed runtime; this module
//! gives that runtime a concrete shape: a [`Value`] enum, the closed set of
//! [`ValueType`]s capability tables are keyed by, and the [`HostObject`] trait
//! for open-world values that carry their own implementations.

use std::fmt;
use std::rc::Rc;

use crate::error::{DispatchError, DispatchResult};
use crate::multifn::MultiFn;
use crate::tag::{Name, Tag};

/// A callable host function. Arguments are passed as a slice; capability
/// implementations receive the target value as the first argument.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> DispatchResult<Value>>;

/// Wrap a closure as a [`NativeFn`].
pub fn native(f: impl Fn(&[Value]) -> DispatchResult<Value> + 'static) -> NativeFn {
    Rc::new(f)
}

/// A value whose type is not one of the built-in [`ValueType`]s.
pub trait HostObject {
    /// Type name used in diagnostics and by [`Value::type_name`].
    fn type_name(&self) -> &str;

    /// An implementation of `protocol` specific to this instance. Takes
    /// priority over every capability table entry.
    fn capability(&self, _protocol: &str) -> Option<NativeFn> {
        None
    }
}

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Keyword(Name),
    Symbol(Name),
    Vector(Rc<Vec<Value>>),
    Fn(NativeFn),
    MultiFn(Rc<MultiFn>),
    Object(Rc<dyn HostObject>),
}

/// The closed set of built-in value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    Keyword,
    Symbol,
    Vector,
    Fn,
    MultiFn,
    /// Any [`HostObject`], whatever its own type name.
    Object,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Nil => "Nil",
            ValueType::Bool => "Bool",
            ValueType::Int => "Int",
            ValueType::Float => "Float",
            ValueType::Str => "String",
            ValueType::Keyword => "Keyword",
            ValueType::Symbol => "Symbol",
            ValueType::Vector => "Vector",
            ValueType::Fn => "Fn",
            ValueType::MultiFn => "MultiFn",
            ValueType::Object => "Object",
        }
    }
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Value::Keyword(Name::new(name))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(Name::new(name))
    }

    pub fn vector(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Vector(Rc::new(items.into_iter().collect()))
    }

    pub fn func(f: impl Fn(&[Value]) -> DispatchResult<Value> + 'static) -> Self {
        Value::Fn(native(f))
    }

    pub fn object(obj: impl HostObject + 'static) -> Self {
        Value::Object(Rc::new(obj))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Keyword(_) => ValueType::Keyword,
            Value::Symbol(_) => ValueType::Symbol,
            Value::Vector(_) => ValueType::Vector,
            Value::Fn(_) => ValueType::Fn,
            Value::MultiFn(_) => ValueType::MultiFn,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// The built-in type name, or the object's own name for host objects.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Object(obj) => obj.type_name(),
            other => other.value_type().name(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The dispatch tag this value denotes.
    ///
    /// Floats, functions and host objects have no tag form.
    pub fn to_tag(&self) -> DispatchResult<Tag> {
        match self {
            Value::Nil => Ok(Tag::Nil),
            Value::Bool(b) => Ok(Tag::Bool(*b)),
            Value::Int(n) => Ok(Tag::Int(*n)),
            Value::Str(s) => Ok(Tag::Str(s.to_string())),
            Value::Keyword(name) => Ok(Tag::Keyword(name.clone())),
            Value::Symbol(name) => Ok(Tag::Symbol(name.clone())),
            Value::Vector(items) => items
                .iter()
                .map(Value::to_tag)
                .collect::<DispatchResult<Vec<_>>>()
                .map(Tag::Vector),
            Value::Float(_) | Value::Fn(_) | Value::MultiFn(_) | Value::Object(_) => {
                Err(DispatchError::NotATag(self.to_string()))
            }
        }
    }
}

impl From<Tag> for Value {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Nil => Value::Nil,
            Tag::Bool(b) => Value::Bool(b),
            Tag::Int(n) => Value::Int(n),
            Tag::Str(s) => Value::Str(Rc::from(s)),
            Tag::Keyword(name) => Value::Keyword(name),
            Tag::Symbol(name) => Value::Symbol(name),
            Tag::Vector(items) => Value::vector(items.into_iter().map(Value::from)),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

/// Plain rendering used in diagnostics. The extensible, per-type rendering is
/// the `print` capability table.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Keyword(name) => write!(f, ":{}", name),
            Value::Symbol(name) => write!(f, "{}", name),
            Value::Vector(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Fn(_) => write!(f, "#<Fn>"),
            Value::MultiFn(mf) => write!(f, "#<MultiFn {}>", mf.name()),
            Value::Object(obj) => write!(f, "#<{}>", obj.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
