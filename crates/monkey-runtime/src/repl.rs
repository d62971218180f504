//! REPL core logic (UI-agnostic)

use crate::bytecode::disassemble;
use crate::diagnostic::Diagnostic;
use crate::runtime::{Engine, Runtime};
use crate::stdlib::OutputWriter;
use crate::value::Value;

/// REPL result type
#[derive(Debug)]
pub struct ReplResult {
    /// The value produced by evaluation (None on error)
    pub value: Option<Value>,
    /// Diagnostics from all phases
    pub diagnostics: Vec<Diagnostic>,
    /// Disassembly of the compiled line, when requested and the VM ran it
    pub disassembly: Option<String>,
}

/// REPL core state
///
/// Maintains persistent state across multiple eval calls:
/// - `let` bindings persist
/// - Errors do not reset state
pub struct ReplCore {
    runtime: Runtime,
    show_disassembly: bool,
    /// Writer installed by the host; survives `reset`
    output_writer: Option<OutputWriter>,
}

impl ReplCore {
    /// Create a new REPL core
    pub fn new(engine: Engine) -> Self {
        Self {
            runtime: Runtime::new(engine),
            show_disassembly: false,
            output_writer: None,
        }
    }

    /// Include the bytecode listing of each line in its result
    pub fn with_disassembly(mut self, enabled: bool) -> Self {
        self.show_disassembly = enabled;
        self
    }

    pub fn engine(&self) -> Engine {
        self.runtime.engine()
    }

    pub fn set_output_writer(&mut self, writer: OutputWriter) {
        self.runtime.set_output_writer(writer.clone());
        self.output_writer = Some(writer);
    }

    /// Evaluate a line of input
    ///
    /// Runs the full pipeline: lex -> parse -> compile -> run (or evaluate).
    pub fn eval_line(&mut self, input: &str) -> ReplResult {
        let program = match Runtime::parse(input) {
            Ok(program) => program,
            Err(diagnostics) => return failure(diagnostics),
        };

        match self.runtime.execute(&program, input) {
            Ok(execution) => ReplResult {
                value: Some(execution.value),
                diagnostics: Vec::new(),
                disassembly: execution
                    .bytecode
                    .filter(|_| self.show_disassembly)
                    .map(|bytecode| disassemble(&bytecode)),
            },
            Err(diagnostics) => failure(diagnostics),
        }
    }

    /// Reset REPL state
    ///
    /// Clears all bindings, keeping the engine and the output writer.
    pub fn reset(&mut self) {
        self.runtime = Runtime::new(self.runtime.engine());
        if let Some(writer) = &self.output_writer {
            self.runtime.set_output_writer(writer.clone());
        }
    }
}

fn failure(diagnostics: Vec<Diagnostic>) -> ReplResult {
    ReplResult {
        value: None,
        diagnostics,
        disassembly: None,
    }
}
