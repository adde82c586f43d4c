//! Standard capability tables.
//!
//! - `print`: reader-syntax rendering; vectors print their elements through
//!   the table again, so instance overrides apply at any depth
//! - `equiv`: value equality; same-type comparison per entry, `false` across
//!   types
//! - `invoke`: calls `Fn` and `MultiFn` values; there is no wildcard, so
//!   invoking anything else is a `MissingImplementation`

use std::rc::{Rc, Weak};

use super::CapabilityTable;
use crate::error::{DispatchError, DispatchResult};
use crate::value::{native, Value, ValueType};

/// The bundle of standard tables a runtime installs once and extends later.
#[derive(Debug)]
pub struct Protocols {
    pub print: CapabilityTable,
    pub equiv: CapabilityTable,
    pub invoke: CapabilityTable,
}

impl Protocols {
    /// Build the standard tables.
    ///
    /// Entries that recurse (vector printing and equality) hold a weak handle
    /// back to the bundle.
    pub fn standard() -> Rc<Protocols> {
        Rc::new_cyclic(|this| {
            let protocols = Protocols {
                print: CapabilityTable::new("print"),
                equiv: CapabilityTable::new("equiv"),
                invoke: CapabilityTable::new("invoke"),
            };
            install_print(&protocols.print, this.clone());
            install_equiv(&protocols.equiv, this.clone());
            install_invoke(&protocols.invoke);
            protocols
        })
    }

    /// Render `value` through the `print` table.
    pub fn print(&self, value: &Value) -> DispatchResult<String> {
        match self.print.call(std::slice::from_ref(value))? {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(DispatchError::custom(format!(
                "print returned a {} instead of a string",
                other.type_name()
            ))),
        }
    }

    /// Compare two values through the `equiv` table.
    pub fn equiv(&self, a: &Value, b: &Value) -> DispatchResult<bool> {
        match self.equiv.call(&[a.clone(), b.clone()])? {
            Value::Bool(result) => Ok(result),
            other => Err(DispatchError::custom(format!(
                "equiv returned a {} instead of a boolean",
                other.type_name()
            ))),
        }
    }

    /// Call `f` with `args` through the `invoke` table.
    pub fn invoke(&self, f: &Value, args: &[Value]) -> DispatchResult<Value> {
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(f.clone());
        call_args.extend_from_slice(args);
        self.invoke.call(&call_args)
    }
}

fn upgrade(this: &Weak<Protocols>) -> DispatchResult<Rc<Protocols>> {
    this.upgrade()
        .ok_or_else(|| DispatchError::custom("standard protocols have been dropped"))
}

fn target(args: &[Value]) -> DispatchResult<&Value> {
    args.first().ok_or(DispatchError::Arity {
        name: "print".to_string(),
        got: 0,
    })
}

fn pair(args: &[Value]) -> DispatchResult<(&Value, &Value)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(DispatchError::Arity {
            name: "equiv".to_string(),
            got: args.len(),
        }),
    }
}

fn install_print(table: &CapabilityTable, this: Weak<Protocols>) {
    // Atoms print the same way as in diagnostics
    for ty in [
        ValueType::Nil,
        ValueType::Bool,
        ValueType::Int,
        ValueType::Float,
        ValueType::Str,
        ValueType::Keyword,
        ValueType::Symbol,
        ValueType::Fn,
        ValueType::MultiFn,
    ] {
        table.extend(ty, native(|args| Ok(Value::str(&target(args)?.to_string()))));
    }

    table.extend(
        ValueType::Vector,
        native(move |args| {
            let Value::Vector(items) = target(args)? else {
                return Err(DispatchError::custom("print: expected a vector"));
            };
            let protocols = upgrade(&this)?;
            let parts = items
                .iter()
                .map(|item| protocols.print(item))
                .collect::<DispatchResult<Vec<_>>>()?;
            Ok(Value::str(&format!("[{}]", parts.join(" "))))
        }),
    );

    table.extend_default(native(|args| {
        Ok(Value::str(&format!("#<{}>", target(args)?.type_name())))
    }));
}

fn install_equiv(table: &CapabilityTable, this: Weak<Protocols>) {
    table.extend(
        ValueType::Nil,
        native(|args| {
            let (_, b) = pair(args)?;
            Ok(Value::Bool(b.is_nil()))
        }),
    );
    table.extend(
        ValueType::Bool,
        native(|args| {
            let result = match pair(args)? {
                (Value::Bool(a), Value::Bool(b)) => a == b,
                _ => false,
            };
            Ok(Value::Bool(result))
        }),
    );
    // Numbers compare across Int and Float
    let numeric = native(|args| {
        let result = match pair(args)? {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                int_equals_float(*a, *b)
            }
            _ => false,
        };
        Ok(Value::Bool(result))
    });
    table.extend(ValueType::Int, numeric.clone());
    table.extend(ValueType::Float, numeric);
    table.extend(
        ValueType::Str,
        native(|args| {
            let result = match pair(args)? {
                (Value::Str(a), Value::Str(b)) => a == b,
                _ => false,
            };
            Ok(Value::Bool(result))
        }),
    );
    table.extend(
        ValueType::Keyword,
        native(|args| {
            let result = match pair(args)? {
                (Value::Keyword(a), Value::Keyword(b)) => a == b,
                _ => false,
            };
            Ok(Value::Bool(result))
        }),
    );
    table.extend(
        ValueType::Symbol,
        native(|args| {
            let result = match pair(args)? {
                (Value::Symbol(a), Value::Symbol(b)) => a == b,
                _ => false,
            };
            Ok(Value::Bool(result))
        }),
    );
    table.extend(
        ValueType::Vector,
        native(move |args| {
            let (Value::Vector(a), Value::Vector(b)) = pair(args)? else {
                return Ok(Value::Bool(false));
            };
            if a.len() != b.len() {
                return Ok(Value::Bool(false));
            }
            let protocols = upgrade(&this)?;
            for (x, y) in a.iter().zip(b.iter()) {
                if !protocols.equiv(x, y)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }),
    );

    // Functions, multimethods and host objects compare by identity
    table.extend_default(native(|args| {
        let result = match pair(args)? {
            (Value::Fn(a), Value::Fn(b)) => Rc::ptr_eq(a, b),
            (Value::MultiFn(a), Value::MultiFn(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        Ok(Value::Bool(result))
    }));
}

/// Exact comparison; casting the integer to `f64` would round above 2^53.
fn int_equals_float(a: i64, b: f64) -> bool {
    // 2^63 is exactly representable, i64::MAX is not
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    b.fract() == 0.0 && (-LIMIT..LIMIT).contains(&b) && b as i64 == a
}

fn install_invoke(table: &CapabilityTable) {
    table.extend(
        ValueType::Fn,
        native(|args| match args.split_first() {
            Some((Value::Fn(f), rest)) => f(rest),
            _ => Err(DispatchError::custom("invoke: expected a function")),
        }),
    );
    table.extend(
        ValueType::MultiFn,
        native(|args| match args.split_first() {
            Some((Value::MultiFn(mf), rest)) => mf.invoke(rest),
            _ => Err(DispatchError::custom("invoke: expected a multimethod")),
        }),
    );
}
