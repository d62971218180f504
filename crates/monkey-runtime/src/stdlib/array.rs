//! Array builtins
//!
//! Arrays are immutable from a program's point of view: every function here
//! returns a new array and leaves its argument untouched. An empty input
//! yields `null`.

use super::{check_arity, BuiltinError, OutputWriter};
use crate::value::Value;

fn expect_array<'a>(builtin: &'static str, value: &'a Value) -> Result<&'a [Value], BuiltinError> {
    match value {
        Value::Array(elements) => Ok(elements.as_slice()),
        other => Err(BuiltinError::ExpectedArray {
            builtin,
            got: other.type_name(),
        }),
    }
}

/// First element, or null for an empty array
pub fn first(args: &[Value], _out: &OutputWriter) -> Result<Value, BuiltinError> {
    check_arity(args, 1)?;
    let elements = expect_array("first", &args[0])?;
    Ok(elements.first().cloned().unwrap_or(Value::NULL))
}

/// Last element, or null for an empty array
pub fn last(args: &[Value], _out: &OutputWriter) -> Result<Value, BuiltinError> {
    check_arity(args, 1)?;
    let elements = expect_array("last", &args[0])?;
    Ok(elements.last().cloned().unwrap_or(Value::NULL))
}

/// Every element but the first, or null for an empty array
pub fn rest(args: &[Value], _out: &OutputWriter) -> Result<Value, BuiltinError> {
    check_arity(args, 1)?;
    let elements = expect_array("rest", &args[0])?;
    match elements.split_first() {
        Some((_, tail)) => Ok(Value::array(tail.to_vec())),
        None => Ok(Value::NULL),
    }
}

/// New array with the element appended
pub fn push(args: &[Value], _out: &OutputWriter) -> Result<Value, BuiltinError> {
    check_arity(args, 2)?;
    let elements = expect_array("push", &args[0])?;
    let mut new_arr = elements.to_vec();
    new_arr.push(args[1].clone());
    Ok(Value::array(new_arr))
}
