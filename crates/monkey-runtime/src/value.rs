//! Runtime value representation
//!
//! One value model is shared by the VM and the tree-walking evaluator.
//! Scalars are stored inline; strings, arrays, functions and errors are
//! reference-counted so copying a value onto the operand stack or into an
//! environment never deep-copies.
//!
//! `true`, `false` and `null` are unit-like variants, so every occurrence is
//! the same canonical value: comparing them by variant is identity
//! comparison. [`Value::TRUE`], [`Value::FALSE`] and [`Value::NULL`] name them.

use crate::ast::{BinaryOp, Block, Identifier, UnaryOp};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::interpreter::Env;
use crate::span::Span;
use crate::stdlib::Builtin;
use std::fmt;
use std::rc::Rc;

/// Runtime value
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    String(Rc<str>),
    Bool(bool),
    Null,
    /// Immutable ordered sequence; builtins return new arrays
    Array(Rc<Vec<Value>>),
    /// Compiled function blueprint (lives in the constant pool)
    CompiledFunction(Rc<CompiledFunction>),
    /// Blueprint plus captured free values (VM)
    Closure(Rc<Closure>),
    /// Native function at a fixed registry index
    Builtin(Builtin),
    /// Function closing over an environment (tree-walking evaluator)
    Function(Rc<Function>),
    /// Error produced by a builtin; flows through the program as a value
    Error(Rc<ErrorValue>),
}

impl Value {
    pub const TRUE: Value = Value::Bool(true);
    pub const FALSE: Value = Value::Bool(false);
    pub const NULL: Value = Value::Null;

    /// Canonical boolean for a host `bool`
    pub fn from_bool(b: bool) -> Value {
        if b {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(elements))
    }

    pub fn error(message: impl Into<String>) -> Value {
        Value::Error(Rc::new(ErrorValue {
            message: message.into(),
            span: None,
        }))
    }

    /// Type tag used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::String(_) => "STRING",
            Value::Bool(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
            Value::Function(_) => "FUNCTION",
            Value::Error(_) => "ERROR",
        }
    }

    /// Only `false` and `null` are falsy; integer zero is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Null)
    }

    /// Equality used by `==` / `!=` for operands that are not both integers
    /// or both strings: canonical singletons compare by variant, reference
    /// values by identity.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.index == b.index,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

/// Structural equality, used by tests and the REPL; programs observe
/// [`Value::identical`] instead.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a.message == b.message,
            _ => self.identical(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::CompiledFunction(func) => {
                write!(f, "compiled_function[{}]", func.display_name())
            }
            Value::Closure(closure) => write!(f, "closure[{}]", closure.func.display_name()),
            Value::Builtin(_) => write!(f, "builtin function"),
            Value::Function(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "fn({}) {}", params.join(", "), func.body)
            }
            Value::Error(err) => write!(f, "{}", err),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "Integer({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Null => write!(f, "Null"),
            Value::Array(elements) => f.debug_list().entries(elements.iter()).finish(),
            Value::CompiledFunction(func) => write!(f, "{:?}", func),
            Value::Closure(closure) => f
                .debug_struct("Closure")
                .field("func", &closure.func.display_name())
                .field("free", &closure.free)
                .finish(),
            Value::Builtin(builtin) => write!(f, "Builtin({})", builtin.name),
            // Environments can be cyclic; never print them
            Value::Function(func) => write!(f, "Function({})", func.display_name()),
            Value::Error(err) => write!(f, "Error({:?})", err.message),
        }
    }
}

/// Compiled function blueprint
///
/// Immutable once interned in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Vec<u8>,
    pub num_params: usize,
    /// Parameters plus `let` bindings in the body
    pub num_locals: usize,
    pub name: Option<String>,
}

impl CompiledFunction {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

/// Runtime closure: a blueprint plus free values captured at creation time
#[derive(Debug, Clone)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

/// Evaluator function: parameters and body closing over their defining scope
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Identifier>,
    pub body: Block,
    pub env: Env,
}

impl Function {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

/// Error value with optional source position
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub message: String,
    pub span: Option<Span>,
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) if !span.is_dummy() => write!(
                f,
                "Error: {} at line {} column {}",
                self.message, span.line, span.column
            ),
            _ => write!(f, "Error: {}", self.message),
        }
    }
}

/// Fatal runtime error
///
/// Raised by both engines; execution stops at the first one. Builtin
/// failures are not runtime errors, they become [`Value::Error`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// Operand types not supported by a binary operator
    #[error("unsupported types for {op}: {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
        span: Span,
    },
    /// Operand type not supported by a prefix operator
    #[error("unsupported type for negation: {operand}")]
    UnsupportedNegation { operand: &'static str, span: Span },
    #[error("division by zero")]
    DivideByZero { span: Span },
    /// Operand stack exhausted
    #[error("stack overflow")]
    StackOverflow { span: Span },
    /// Call depth exceeded the frame limit
    #[error("stack overflow: exceeded {max} nested calls")]
    FrameOverflow { max: usize, span: Span },
    #[error("calling non-function: {callee}")]
    NotCallable { callee: &'static str, span: Span },
    #[error("wrong number of arguments: want={expected}, got={got}")]
    WrongArity {
        expected: usize,
        got: usize,
        span: Span,
    },
    #[error("index operator not supported: {target}[{index}]")]
    NotIndexable {
        target: &'static str,
        index: &'static str,
        span: Span,
    },
    /// Name lookup failed at run time (evaluator only)
    #[error("identifier not found: {name}")]
    UndefinedIdentifier { name: String, span: Span },
    /// Malformed bytecode
    #[error("{msg}")]
    InvalidBytecode { msg: String, span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::UnsupportedNegation { span, .. }
            | RuntimeError::DivideByZero { span }
            | RuntimeError::StackOverflow { span }
            | RuntimeError::FrameOverflow { span, .. }
            | RuntimeError::NotCallable { span, .. }
            | RuntimeError::WrongArity { span, .. }
            | RuntimeError::NotIndexable { span, .. }
            | RuntimeError::UndefinedIdentifier { span, .. }
            | RuntimeError::InvalidBytecode { span, .. } => *span,
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::TypeMismatch { .. } | RuntimeError::UnsupportedNegation { .. } => {
                error_codes::TYPE_MISMATCH
            }
            RuntimeError::DivideByZero { .. } => error_codes::DIVIDE_BY_ZERO,
            RuntimeError::StackOverflow { .. } => error_codes::STACK_OVERFLOW,
            RuntimeError::FrameOverflow { .. } => error_codes::FRAME_OVERFLOW,
            RuntimeError::NotCallable { .. } => error_codes::NOT_CALLABLE,
            RuntimeError::WrongArity { .. } => error_codes::ARITY_MISMATCH,
            RuntimeError::NotIndexable { .. } => error_codes::NOT_INDEXABLE,
            RuntimeError::UndefinedIdentifier { .. } => error_codes::UNDEFINED_IDENTIFIER,
            RuntimeError::InvalidBytecode { .. } => error_codes::UNKNOWN_OPCODE,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error_with_code(self.code(), self.to_string(), self.span())
            .with_label("runtime error")
    }
}

impl From<crate::bytecode::DecodeError> for RuntimeError {
    fn from(err: crate::bytecode::DecodeError) -> Self {
        RuntimeError::InvalidBytecode {
            msg: err.to_string(),
            span: Span::dummy(),
        }
    }
}

// === Operator semantics shared by both engines ===

/// Apply a binary operator to two evaluated operands
///
/// Integer pairs get wrapping arithmetic and numeric comparison; string pairs
/// get concatenation (`+` only) and lexicographic comparison. For any other
/// pair `==` and `!=` fall back to [`Value::identical`] and everything else
/// is a type mismatch.
pub fn binary_op(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_op(op, *a, *b, span),
        (Value::String(a), Value::String(b)) => match op {
            BinaryOp::Add => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::string(joined))
            }
            BinaryOp::Eq => Ok(Value::from_bool(a == b)),
            BinaryOp::Ne => Ok(Value::from_bool(a != b)),
            BinaryOp::Lt => Ok(Value::from_bool(a < b)),
            BinaryOp::Gt => Ok(Value::from_bool(a > b)),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                Err(type_mismatch(op, left, right, span))
            }
        },
        _ => match op {
            BinaryOp::Eq => Ok(Value::from_bool(left.identical(right))),
            BinaryOp::Ne => Ok(Value::from_bool(!left.identical(right))),
            _ => Err(type_mismatch(op, left, right, span)),
        },
    }
}

fn integer_op(op: BinaryOp, a: i64, b: i64, span: Span) -> Result<Value, RuntimeError> {
    let value = match op {
        BinaryOp::Add => Value::Integer(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Integer(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Integer(a.wrapping_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivideByZero { span });
            }
            Value::Integer(a.wrapping_div(b))
        }
        BinaryOp::Eq => Value::from_bool(a == b),
        BinaryOp::Ne => Value::from_bool(a != b),
        BinaryOp::Lt => Value::from_bool(a < b),
        BinaryOp::Gt => Value::from_bool(a > b),
    };
    Ok(value)
}

fn type_mismatch(op: BinaryOp, left: &Value, right: &Value, span: Span) -> RuntimeError {
    RuntimeError::TypeMismatch {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
        span,
    }
}

/// Apply a prefix operator
pub fn unary_op(op: UnaryOp, operand: &Value, span: Span) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::from_bool(!operand.is_truthy())),
        UnaryOp::Negate => match operand {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            other => Err(RuntimeError::UnsupportedNegation {
                operand: other.type_name(),
                span,
            }),
        },
    }
}

/// `target[index]`; an out-of-range integer index yields null
pub fn index_value(target: &Value, index: &Value, span: Span) -> Result<Value, RuntimeError> {
    match (target, index) {
        (Value::Array(elements), Value::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or(Value::NULL)),
        _ => Err(RuntimeError::NotIndexable {
            target: target.type_name(),
            index: index.type_name(),
            span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_truthiness() {
        assert!(!Value::FALSE.is_truthy());
        assert!(!Value::NULL.is_truthy());
        assert!(Value::TRUE.is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_identity_vs_structural_equality() {
        let a = Value::array(vec![Value::Integer(1)]);
        let b = Value::array(vec![Value::Integer(1)]);
        assert!(!a.identical(&b));
        assert!(a.identical(&a.clone()));
        assert_eq!(a, b);

        assert!(Value::from_bool(true).identical(&Value::TRUE));
        assert!(Value::NULL.identical(&Value::Null));
        assert!(!Value::Integer(1).identical(&Value::TRUE));
    }

    #[test]
    fn test_display() {
        let arr = Value::array(vec![
            Value::Integer(1),
            Value::string("two"),
            Value::Null,
        ]);
        assert_eq!(arr.to_string(), "[1, two, null]");
        assert_eq!(Value::error("boom").to_string(), "Error: boom");

        let positioned = Value::Error(Rc::new(ErrorValue {
            message: "boom".to_string(),
            span: Some(Span::with_position(0, 1, 3, 7)),
        }));
        assert_eq!(positioned.to_string(), "Error: boom at line 3 column 7");
    }

    #[test]
    fn test_runtime_error_diagnostic() {
        let err = RuntimeError::WrongArity {
            expected: 2,
            got: 1,
            span: Span::dummy(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, error_codes::ARITY_MISMATCH);
        assert_eq!(diag.message, "wrong number of arguments: want=2, got=1");
    }

    #[rstest]
    #[case(BinaryOp::Add, 7, 2, Value::Integer(9))]
    #[case(BinaryOp::Sub, 7, 2, Value::Integer(5))]
    #[case(BinaryOp::Mul, 7, 2, Value::Integer(14))]
    #[case(BinaryOp::Div, 7, 2, Value::Integer(3))]
    #[case(BinaryOp::Div, -7, 2, Value::Integer(-3))]
    #[case(BinaryOp::Lt, 7, 2, Value::FALSE)]
    #[case(BinaryOp::Gt, 7, 2, Value::TRUE)]
    #[case(BinaryOp::Eq, 2, 2, Value::TRUE)]
    #[case(BinaryOp::Ne, 2, 2, Value::FALSE)]
    #[case(BinaryOp::Add, i64::MAX, 1, Value::Integer(i64::MIN))]
    fn test_integer_ops(
        #[case] op: BinaryOp,
        #[case] a: i64,
        #[case] b: i64,
        #[case] expected: Value,
    ) {
        let result = binary_op(op, &Value::Integer(a), &Value::Integer(b), Span::dummy()).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_division_by_zero() {
        let err = binary_op(BinaryOp::Div, &Value::Integer(1), &Value::Integer(0), Span::dummy());
        assert!(matches!(err, Err(RuntimeError::DivideByZero { .. })));
    }

    #[test]
    fn test_string_ops() {
        let a = Value::string("mon");
        let b = Value::string("key");
        assert_eq!(
            binary_op(BinaryOp::Add, &a, &b, Span::dummy()).unwrap(),
            Value::string("monkey")
        );
        assert_eq!(binary_op(BinaryOp::Gt, &a, &b, Span::dummy()).unwrap(), Value::TRUE);
        assert!(matches!(
            binary_op(BinaryOp::Sub, &a, &b, Span::dummy()),
            Err(RuntimeError::TypeMismatch { op: "-", left: "STRING", right: "STRING", .. })
        ));
    }

    #[test]
    fn test_mixed_operands() {
        let one = Value::Integer(1);
        assert_eq!(
            binary_op(BinaryOp::Eq, &one, &Value::TRUE, Span::dummy()).unwrap(),
            Value::FALSE
        );
        assert_eq!(
            binary_op(BinaryOp::Ne, &Value::NULL, &Value::NULL, Span::dummy()).unwrap(),
            Value::FALSE
        );
        let err = binary_op(BinaryOp::Add, &one, &Value::TRUE, Span::dummy()).unwrap_err();
        assert_eq!(err.to_string(), "unsupported types for +: INTEGER and BOOLEAN");
    }

    #[test]
    fn test_unary_ops() {
        assert_eq!(
            unary_op(UnaryOp::Negate, &Value::Integer(5), Span::dummy()).unwrap(),
            Value::Integer(-5)
        );
        assert_eq!(
            unary_op(UnaryOp::Not, &Value::Integer(0), Span::dummy()).unwrap(),
            Value::FALSE
        );
        assert_eq!(unary_op(UnaryOp::Not, &Value::NULL, Span::dummy()).unwrap(), Value::TRUE);
        assert!(matches!(
            unary_op(UnaryOp::Negate, &Value::TRUE, Span::dummy()),
            Err(RuntimeError::UnsupportedNegation { operand: "BOOLEAN", .. })
        ));
    }

    #[rstest]
    #[case(0, Value::Integer(10))]
    #[case(2, Value::Integer(30))]
    #[case(3, Value::NULL)]
    #[case(-1, Value::NULL)]
    fn test_index_value(#[case] index: i64, #[case] expected: Value) {
        let arr = Value::array(vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)]);
        assert_eq!(index_value(&arr, &Value::Integer(index), Span::dummy()).unwrap(), expected);
    }

    #[test]
    fn test_index_non_array() {
        let err = index_value(&Value::Integer(1), &Value::Integer(0), Span::dummy()).unwrap_err();
        assert_eq!(err.to_string(), "index operator not supported: INTEGER[INTEGER]");
    }
}
