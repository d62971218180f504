//! Monkey Runtime - Core language implementation
//!
//! This library provides the complete Monkey language runtime including:
//! - Lexical analysis and Pratt parsing into an AST
//! - Bytecode compilation with scope resolution and closures
//! - A stack-based virtual machine and a tree-walking evaluator
//! - The builtin function registry and a UI-agnostic REPL core

/// Monkey runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod span;
pub mod stdlib;
pub mod symbol;
pub mod token;
pub mod value;
pub mod vm;

// Re-export commonly used types
pub use bytecode::{Bytecode, DecodeError, Opcode};
pub use compiler::{CompileError, Compiler};
pub use diagnostic::{error_codes, Diagnostic, DiagnosticLevel, DIAG_VERSION};
pub use interpreter::{Interpreter, InterpreterConfig};
pub use lexer::Lexer;
pub use parser::Parser;
pub use repl::{ReplCore, ReplResult};
pub use runtime::{Engine, Runtime, RuntimeResult};
pub use span::Span;
pub use stdlib::{BuiltinError, OutputWriter};
pub use symbol::{Symbol, SymbolScope, SymbolTable};
pub use token::{Token, TokenKind};
pub use value::{RuntimeError, Value};
pub use vm::{VmConfig, VM};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
