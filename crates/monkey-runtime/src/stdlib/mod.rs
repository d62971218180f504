//! Builtin functions
//!
//! Builtins live at fixed indices in [`BUILTINS`]; the compiler registers
//! each under its index and the VM's `GetBuiltin` operand is that index, so
//! the order of the table is part of the bytecode format.

pub mod array;
pub mod io;

use crate::span::Span;
use crate::value::{ErrorValue, Value};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Destination for `puts` output
///
/// Shared so the VM, the evaluator and a test harness can all hold it.
pub type OutputWriter = Rc<RefCell<dyn Write>>;

/// Writer that forwards to the process stdout
pub fn stdout_writer() -> OutputWriter {
    Rc::new(RefCell::new(std::io::stdout()))
}

/// Native function signature
pub type BuiltinFn = fn(&[Value], &OutputWriter) -> Result<Value, BuiltinError>;

/// Handle to a native function
#[derive(Clone, Copy)]
pub struct Builtin {
    /// Position in [`BUILTINS`]
    pub index: u8,
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl Builtin {
    /// Run the builtin; a failure becomes an `Error` value rather than
    /// aborting execution.
    pub fn invoke(&self, args: &[Value], out: &OutputWriter, span: Span) -> Value {
        match (self.func)(args, out) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    target: "monkey::stdlib",
                    builtin = self.name,
                    error = %err,
                    "builtin failed"
                );
                Value::Error(Rc::new(ErrorValue {
                    message: err.to_string(),
                    span: Some(span),
                }))
            }
        }
    }
}

/// Builtin failure, surfaced to programs as an `Error` value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuiltinError {
    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArgumentCount { got: usize, want: usize },
    #[error("argument to `{builtin}` not supported, got {got}")]
    UnsupportedArgument {
        builtin: &'static str,
        got: &'static str,
    },
    #[error("argument to `{builtin}` must be ARRAY, got {got}")]
    ExpectedArray {
        builtin: &'static str,
        got: &'static str,
    },
    #[error("failed to write output: {0}")]
    Output(String),
}

/// Fixed builtin registry, in index order
pub const BUILTINS: &[Builtin] = &[
    Builtin {
        index: 0,
        name: "len",
        func: len,
    },
    Builtin {
        index: 1,
        name: "first",
        func: array::first,
    },
    Builtin {
        index: 2,
        name: "last",
        func: array::last,
    },
    Builtin {
        index: 3,
        name: "rest",
        func: array::rest,
    },
    Builtin {
        index: 4,
        name: "push",
        func: array::push,
    },
    Builtin {
        index: 5,
        name: "puts",
        func: io::puts,
    },
];

/// Find a builtin by name
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

/// Find a builtin by registry index
pub fn get(index: usize) -> Option<Builtin> {
    BUILTINS.get(index).copied()
}

pub(crate) fn check_arity(args: &[Value], want: usize) -> Result<(), BuiltinError> {
    if args.len() != want {
        return Err(BuiltinError::WrongArgumentCount {
            got: args.len(),
            want,
        });
    }
    Ok(())
}

/// Length of a string in UTF-8 bytes, or of an array
pub fn len(args: &[Value], _out: &OutputWriter) -> Result<Value, BuiltinError> {
    check_arity(args, 1)?;
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.len() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
        other => Err(BuiltinError::UnsupportedArgument {
            builtin: "len",
            got: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> OutputWriter {
        Rc::new(RefCell::new(Vec::<u8>::new()))
    }

    #[test]
    fn test_registry_order_is_fixed() {
        let names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["len", "first", "last", "rest", "push", "puts"]);
        for (i, builtin) in BUILTINS.iter().enumerate() {
            assert_eq!(builtin.index as usize, i);
        }
    }

    #[test]
    fn test_len() {
        let out = sink();
        assert_eq!(len(&[Value::string("abc")], &out), Ok(Value::Integer(3)));
        assert_eq!(len(&[Value::string("")], &out), Ok(Value::Integer(0)));
        assert_eq!(
            len(&[Value::array(vec![Value::Integer(1), Value::Integer(2)])], &out),
            Ok(Value::Integer(2))
        );
        assert_eq!(
            len(&[Value::Integer(1)], &out),
            Err(BuiltinError::UnsupportedArgument {
                builtin: "len",
                got: "INTEGER"
            })
        );
    }

    #[test]
    fn test_invoke_turns_failure_into_error_value() {
        let builtin = lookup("len").unwrap();
        let result = builtin.invoke(
            &[Value::Integer(1), Value::Integer(2)],
            &sink(),
            Span::dummy(),
        );
        assert_eq!(
            result,
            Value::error("wrong number of arguments. got=2, want=1")
        );
    }
}
