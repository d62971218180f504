//! Monkey runtime API for embedding
//!
//! [`Runtime`] runs source text through the whole pipeline and keeps the
//! session state between calls, so it backs both `monkey run` and the REPL.

use crate::ast::{Program, Stmt};
use crate::bytecode::Bytecode;
use crate::compiler::Compiler;
use crate::diagnostic::Diagnostic;
use crate::interpreter::{Interpreter, InterpreterConfig};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::span::Span;
use crate::stdlib::{self, OutputWriter};
use crate::symbol::SymbolTable;
use crate::value::Value;
use crate::vm::{VmConfig, VM};
use std::fmt;
use std::str::FromStr;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, Vec<Diagnostic>>;

/// Execution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// Compile to bytecode and run on the VM
    #[default]
    Vm,
    /// Walk the AST directly
    Eval,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Vm => write!(f, "vm"),
            Engine::Eval => write!(f, "eval"),
        }
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vm" => Ok(Engine::Vm),
            "eval" => Ok(Engine::Eval),
            other => Err(format!("unknown engine '{}': expected 'vm' or 'eval'", other)),
        }
    }
}

/// Everything a compiled session carries from one evaluation to the next
struct VmSession {
    config: VmConfig,
    symbol_table: SymbolTable,
    constants: Vec<Value>,
    globals: Vec<Value>,
}

enum Backend {
    Vm(VmSession),
    Eval(Interpreter),
}

/// Outcome of running one program
pub(crate) struct Execution {
    pub(crate) value: Value,
    /// The compiled artifact (VM engine only)
    pub(crate) bytecode: Option<Bytecode>,
}

/// Monkey runtime instance
///
/// # Examples
///
/// ```
/// use monkey_runtime::{Engine, Runtime, Value};
///
/// let mut runtime = Runtime::new(Engine::Vm);
/// runtime.eval("let double = fn(x) { x * 2 };").unwrap();
/// assert_eq!(runtime.eval("double(21)").unwrap(), Value::Integer(42));
/// ```
pub struct Runtime {
    backend: Backend,
    output_writer: OutputWriter,
}

impl Runtime {
    /// Create a runtime with default limits
    pub fn new(engine: Engine) -> Self {
        Self::with_config(engine, VmConfig::default(), InterpreterConfig::default())
    }

    pub fn with_config(
        engine: Engine,
        vm_config: VmConfig,
        interpreter_config: InterpreterConfig,
    ) -> Self {
        let backend = match engine {
            Engine::Vm => Backend::Vm(VmSession {
                config: vm_config,
                symbol_table: SymbolTable::with_builtins(),
                constants: Vec::new(),
                globals: Vec::new(),
            }),
            Engine::Eval => Backend::Eval(Interpreter::with_config(interpreter_config)),
        };
        Self {
            backend,
            output_writer: stdlib::stdout_writer(),
        }
    }

    pub fn engine(&self) -> Engine {
        match self.backend {
            Backend::Vm(_) => Engine::Vm,
            Backend::Eval(_) => Engine::Eval,
        }
    }

    /// Redirect `puts` output
    pub fn set_output_writer(&mut self, writer: OutputWriter) {
        self.output_writer = writer;
    }

    /// Lex and parse source text
    pub fn parse(source: &str) -> RuntimeResult<Program> {
        let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
        let (program, parse_diagnostics) = Parser::new(tokens).parse();
        diagnostics.extend(parse_diagnostics);
        if diagnostics.is_empty() {
            Ok(program)
        } else {
            Err(diagnostics)
        }
    }

    /// Compile source text into a standalone artifact without running it
    pub fn compile(source: &str) -> RuntimeResult<Bytecode> {
        let program = Self::parse(source)?;
        Compiler::new()
            .compile(&program)
            .map_err(|err| vec![with_source(err.to_diagnostic(), err.span(), source)])
    }

    /// Evaluate source text, returning the value of its last statement
    ///
    /// A program ending in `let` (or an empty one) evaluates to null, unless
    /// a top-level `return` stopped it first.
    pub fn eval(&mut self, source: &str) -> RuntimeResult<Value> {
        let program = Self::parse(source)?;
        self.execute(&program, source).map(|execution| execution.value)
    }

    /// Evaluate a source file
    pub fn eval_file(&mut self, path: &str) -> RuntimeResult<Value> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            vec![
                Diagnostic::error(format!("Failed to read file: {}", e), Span::dummy())
                    .with_file(path),
            ]
        })?;
        self.eval(&source)
            .map_err(|diags| diags.into_iter().map(|d| d.with_file(path)).collect())
    }

    /// Run an already parsed program against the session state
    ///
    /// Compilation is all-or-nothing: a compile error leaves the symbol
    /// table and constant pool exactly as they were. A runtime fault keeps
    /// any globals assigned before it.
    pub(crate) fn execute(&mut self, program: &Program, source: &str) -> RuntimeResult<Execution> {
        let ends_in_let = matches!(program.statements.last(), None | Some(Stmt::Let(_)));

        match &mut self.backend {
            Backend::Vm(session) => {
                let mut compiler =
                    Compiler::with_state(session.symbol_table.clone(), session.constants.clone());
                let bytecode = compiler
                    .compile(program)
                    .map_err(|err| vec![with_source(err.to_diagnostic(), err.span(), source)])?;
                let (symbol_table, constants) = compiler.into_state();
                session.symbol_table = symbol_table;
                session.constants = constants;

                let globals = std::mem::take(&mut session.globals);
                let mut vm =
                    VM::with_config(bytecode.clone(), session.config).with_globals(globals);
                vm.set_output_writer(self.output_writer.clone());
                let result = vm.run();
                session.globals = vm.take_globals();
                result.map_err(|err| vec![with_source(err.to_diagnostic(), err.span(), source)])?;

                let value = if ends_in_let && !vm.returned_early() {
                    Value::NULL
                } else {
                    vm.last_popped_stack_elem()
                };
                Ok(Execution {
                    value,
                    bytecode: Some(bytecode),
                })
            }
            Backend::Eval(interpreter) => {
                interpreter.set_output_writer(self.output_writer.clone());
                let value = interpreter
                    .eval(program)
                    .map_err(|err| vec![with_source(err.to_diagnostic(), err.span(), source)])?;
                Ok(Execution {
                    value: if ends_in_let && !interpreter.returned_early() {
                        Value::NULL
                    } else {
                        value
                    },
                    bytecode: None,
                })
            }
        }
    }
}

/// Attach the offending source line when the error has a real position
fn with_source(diagnostic: Diagnostic, span: Span, source: &str) -> Diagnostic {
    if span.is_dummy() {
        diagnostic
    } else {
        diagnostic.with_source(source)
    }
}
