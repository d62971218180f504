//! AST to bytecode compiler
//!
//! Single pass over the AST, emitting stack-based bytecode.
//! - Every expression leaves exactly one value on the stack
//! - Expression statements pop their value; the body of a function ends in
//!   an explicit return
//! - Each function body compiles into its own instruction buffer, one
//!   [`CompilationScope`] per nesting level, mirrored by a symbol-table scope
//! - Jumps are emitted with a placeholder operand and back-patched once the
//!   target offset is known
//!
//! Compilation is all-or-nothing: the first error aborts and no bytecode is
//! produced.

mod expr;
mod stmt;

use crate::ast::*;
use crate::bytecode::{self, Bytecode, Opcode};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::symbol::{Symbol, SymbolScope, SymbolTable};
use crate::value::Value;

/// Placeholder operand for jumps that have not been patched yet
pub(super) const JUMP_PLACEHOLDER: usize = 9999;

/// Largest value of a 1-byte operand
pub(super) const MAX_U8_OPERAND: usize = u8::MAX as usize;
/// Largest value of a 2-byte operand
pub(super) const MAX_U16_OPERAND: usize = u16::MAX as usize;

/// Compile-time failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String, span: Span },
    /// A value does not fit in its instruction operand
    #[error("too many {what}: {value} exceeds the limit of {max}")]
    OperandOverflow {
        what: &'static str,
        value: usize,
        max: usize,
        span: Span,
    },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::UndefinedVariable { span, .. }
            | CompileError::OperandOverflow { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            CompileError::UndefinedVariable { .. } => error_codes::UNDEFINED_VARIABLE,
            CompileError::OperandOverflow { .. } => error_codes::OPERAND_OVERFLOW,
        };
        Diagnostic::error_with_code(code, self.to_string(), self.span()).with_label("compile error")
    }
}

/// An instruction already written to the current scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct EmittedInstruction {
    pub(super) opcode: Opcode,
    pub(super) position: usize,
}

/// Instruction buffer of one function body being compiled
#[derive(Debug, Clone, Default)]
pub(super) struct CompilationScope {
    pub(super) instructions: Vec<u8>,
    pub(super) last: Option<EmittedInstruction>,
    pub(super) previous: Option<EmittedInstruction>,
}

/// Compiler state
pub struct Compiler {
    /// Constant pool shared by every function in the program
    pub(super) constants: Vec<Value>,
    pub(super) symbol_table: SymbolTable,
    /// Stack of function scopes; index 0 is the top level
    pub(super) scopes: Vec<CompilationScope>,
}

impl Compiler {
    /// Create a compiler with the builtins registered
    pub fn new() -> Self {
        Self::with_state(SymbolTable::with_builtins(), Vec::new())
    }

    /// Continue from an earlier compilation's globals and constants
    ///
    /// Used by the REPL so later lines see earlier `let` bindings.
    pub fn with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Self {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Compile a program into a bytecode artifact
    ///
    /// On error the compiler is rolled back to where it was before the call:
    /// no symbols, constants or instructions of the failed program survive.
    pub fn compile(&mut self, program: &Program) -> Result<Bytecode, CompileError> {
        let symbol_table = self.symbol_table.clone();
        let constants_len = self.constants.len();

        let result = program
            .statements
            .iter()
            .try_for_each(|stmt| self.compile_stmt(stmt));
        if let Err(err) = result {
            self.symbol_table = symbol_table;
            self.constants.truncate(constants_len);
            self.scopes = vec![CompilationScope::default()];
            tracing::debug!(target: "monkey::compiler", error = %err, "compilation failed");
            return Err(err);
        }

        let instructions = std::mem::take(&mut self.scopes[0].instructions);
        self.scopes[0] = CompilationScope::default();

        tracing::debug!(
            target: "monkey::compiler",
            statements = program.statements.len(),
            instructions = instructions.len(),
            constants = self.constants.len(),
            "compiled program"
        );

        Ok(Bytecode {
            instructions,
            constants: self.constants.clone(),
        })
    }

    /// Hand back the symbol table and constant pool for the next compilation
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    // === Emission ===

    pub(super) fn current_scope(&mut self) -> &mut CompilationScope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub(super) fn current_instructions(&self) -> &[u8] {
        &self.scopes[self.scopes.len() - 1].instructions
    }

    /// Append an instruction to the current scope, returning its offset
    pub(super) fn emit(&mut self, opcode: Opcode, operands: &[usize]) -> usize {
        let instruction = bytecode::make(opcode, operands);
        let scope = self.current_scope();
        let position = scope.instructions.len();
        scope.instructions.extend_from_slice(&instruction);
        scope.previous = scope.last;
        scope.last = Some(EmittedInstruction { opcode, position });
        position
    }

    pub(super) fn last_instruction_is(&self, opcode: Opcode) -> bool {
        self.scopes[self.scopes.len() - 1]
            .last
            .is_some_and(|last| last.opcode == opcode)
    }

    /// Drop a trailing `Pop` so the value it discarded stays on the stack
    pub(super) fn remove_last_pop(&mut self) {
        let scope = self.current_scope();
        if let Some(last) = scope.last {
            scope.instructions.truncate(last.position);
            scope.last = scope.previous;
        }
    }

    /// Turn a trailing `Pop` into `ReturnValue`; both are one byte long
    pub(super) fn replace_last_pop_with_return(&mut self) {
        let scope = self.current_scope();
        if let Some(last) = scope.last.as_mut() {
            scope.instructions[last.position] = Opcode::ReturnValue as u8;
            last.opcode = Opcode::ReturnValue;
        }
    }

    /// Rewrite the operand of the jump at `position` to `target`
    ///
    /// Only operand bytes change, so every later offset stays valid.
    pub(super) fn patch_jump(
        &mut self,
        opcode: Opcode,
        position: usize,
        target: usize,
        span: Span,
    ) -> Result<(), CompileError> {
        let target = check_operand("bytes of jump distance", target, MAX_U16_OPERAND, span)?;
        let patched = bytecode::make(opcode, &[target]);
        let scope = self.current_scope();
        scope.instructions[position..position + patched.len()].copy_from_slice(&patched);
        Ok(())
    }

    /// Intern a constant, returning its pool index
    pub(super) fn add_constant(&mut self, value: Value, span: Span) -> Result<usize, CompileError> {
        let index = check_operand("constants", self.constants.len(), MAX_U16_OPERAND, span)?;
        self.constants.push(value);
        Ok(index)
    }

    // === Scopes ===

    pub(super) fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.symbol_table.enter_scope();
    }

    /// Pop the innermost function scope, returning its instructions
    pub(super) fn leave_scope(&mut self) -> Vec<u8> {
        self.symbol_table.leave_scope();
        self.scopes
            .pop()
            .map(|scope| scope.instructions)
            .unwrap_or_default()
    }

    /// Emit the load instruction for a resolved symbol
    pub(super) fn load_symbol(&mut self, symbol: &Symbol, span: Span) -> Result<(), CompileError> {
        match symbol.scope {
            SymbolScope::Global => {
                let index = check_operand("globals", symbol.index, MAX_U16_OPERAND, span)?;
                self.emit(Opcode::GetGlobal, &[index]);
            }
            SymbolScope::Local => {
                let index = check_operand("locals", symbol.index, MAX_U8_OPERAND, span)?;
                self.emit(Opcode::GetLocal, &[index]);
            }
            SymbolScope::Builtin => {
                self.emit(Opcode::GetBuiltin, &[symbol.index]);
            }
            SymbolScope::Free => {
                let index =
                    check_operand("captured variables", symbol.index, MAX_U8_OPERAND, span)?;
                self.emit(Opcode::GetFree, &[index]);
            }
            SymbolScope::FunctionSelf => {
                self.emit(Opcode::CurrentClosure, &[]);
            }
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Bound-check an operand before encoding it
pub(super) fn check_operand(
    what: &'static str,
    value: usize,
    max: usize,
    span: Span,
) -> Result<usize, CompileError> {
    if value > max {
        return Err(CompileError::OperandOverflow {
            what,
            value,
            max,
            span,
        });
    }
    Ok(value)
}
