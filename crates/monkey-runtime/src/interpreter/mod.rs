//! AST interpreter (tree-walking)
//!
//! Evaluates the AST directly, with environment-based variable storage.
//! - Environments are chained to their enclosing environment
//! - Functions close over the environment they were created in, by
//!   reference: later bindings in that environment are visible to them
//! - Operators, truthiness and builtins behave exactly as in the VM
//! - Call depth is bounded by [`InterpreterConfig::max_depth`]; the native
//!   stack grows as needed, so the limit holds on small host threads too

mod expr;
mod stmt;

use crate::ast::Program;
use crate::stdlib::{self, OutputWriter};
use crate::value::{RuntimeError, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Default maximum call depth
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Shared handle to an environment
pub type Env = Rc<RefCell<Environment>>;

/// One lexical scope of name bindings
#[derive(Default)]
pub struct Environment {
    store: HashMap<String, Value>,
    outer: Option<Env>,
}

impl Environment {
    /// A fresh top-level environment
    pub fn new() -> Env {
        Rc::new(RefCell::new(Self::default()))
    }

    /// A fresh environment nested inside `outer`
    pub fn enclosed(outer: Env) -> Env {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    /// Look a name up here, then in each enclosing environment
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Bind a name in this environment, shadowing any outer binding
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.store.insert(name.into(), value);
    }
}

/// Evaluator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Deepest allowed nesting of function calls
    pub max_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Non-local exit from evaluation
///
/// A `return` unwinds to the nearest function call (or the top level) the
/// same way an error does, so both ride the `Err` side of [`EvalResult`].
#[derive(Debug)]
pub(super) enum ControlFlow {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for ControlFlow {
    fn from(err: RuntimeError) -> Self {
        ControlFlow::Error(err)
    }
}

pub(super) type EvalResult = Result<Value, ControlFlow>;

/// Interpreter state
pub struct Interpreter {
    pub(super) config: InterpreterConfig,
    /// Environment of the code currently being evaluated
    pub(super) env: Env,
    /// Number of function calls in progress
    pub(super) depth: usize,
    /// Output writer for `puts` (defaults to stdout)
    pub(super) output_writer: OutputWriter,
    /// Set when a top-level `return` stopped the last program
    returned: bool,
}

impl Interpreter {
    /// Create an interpreter with an empty global environment
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self {
            config,
            env: Environment::new(),
            depth: 0,
            output_writer: stdlib::stdout_writer(),
            returned: false,
        }
    }

    /// Whether the last [`eval`](Interpreter::eval) ended at a top-level
    /// `return`
    pub fn returned_early(&self) -> bool {
        self.returned
    }

    /// Set the output writer (used by Runtime to redirect `puts` output)
    pub fn set_output_writer(&mut self, writer: OutputWriter) {
        self.output_writer = writer;
    }

    /// Evaluate a program in the global environment
    ///
    /// Bindings persist, so successive calls behave like successive REPL
    /// lines. The result is the value of the last statement; a top-level
    /// `return` stops the program with its value.
    pub fn eval(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let mut last_value = Value::NULL;
        self.returned = false;

        for stmt in &program.statements {
            match self.eval_statement(stmt) {
                Ok(value) => last_value = value,
                Err(ControlFlow::Return(value)) => {
                    self.returned = true;
                    return Ok(value);
                }
                Err(ControlFlow::Error(err)) => {
                    tracing::debug!(
                        target: "monkey::interpreter",
                        error = %err,
                        "evaluation aborted"
                    );
                    return Err(err);
                }
            }
        }

        Ok(last_value)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
