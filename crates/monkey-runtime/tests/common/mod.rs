//! Shared test utilities
//!
//! Helpers for running one source text through either engine (or both) and
//! comparing the outcome.

#![allow(dead_code)]

use monkey_runtime::ast::Program;
use monkey_runtime::{
    Bytecode, Compiler, Diagnostic, Engine, Interpreter, Lexer, Parser, Runtime, Value, VM,
};

// Re-export testing utilities
pub use pretty_assertions::{assert_eq, assert_ne};

/// Parse source, panicking on any lexer or parser diagnostic
pub fn parse(source: &str) -> Program {
    let (tokens, lex_diags) = Lexer::new(source).tokenize();
    assert!(lex_diags.is_empty(), "Lexer errors: {:?}", lex_diags);
    let (program, parse_diags) = Parser::new(tokens).parse();
    assert!(parse_diags.is_empty(), "Parser errors: {:?}", parse_diags);
    program
}

/// Compile source, panicking on a compile error
pub fn compile(source: &str) -> Bytecode {
    Compiler::new()
        .compile(&parse(source))
        .unwrap_or_else(|e| panic!("Compilation failed: {}", e))
}

/// Run source on a fresh runtime of the given engine
pub fn run(engine: Engine, source: &str) -> Result<Value, Vec<Diagnostic>> {
    Runtime::new(engine).eval(source)
}

/// Run source on both engines, assert they agree and return the value
pub fn run_both(source: &str) -> Value {
    let vm = run(Engine::Vm, source);
    let eval = run(Engine::Eval, source);
    match (vm, eval) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a, b, "engines disagree on: {}", source);
            a
        }
        (vm, eval) => panic!(
            "expected both engines to succeed on {:?}\n  vm:   {:?}\n  eval: {:?}",
            source, vm, eval
        ),
    }
}

/// First diagnostic code reported for source on the given engine
pub fn error_code(engine: Engine, source: &str) -> String {
    match run(engine, source) {
        Ok(value) => panic!("Expected an error from {:?}, got {:?}", source, value),
        Err(diags) => diags[0].code.clone(),
    }
}

/// Run source directly on a VM, bypassing the runtime facade
pub fn vm_last_popped(source: &str) -> Value {
    let mut vm = VM::new(compile(source));
    vm.run().unwrap_or_else(|e| panic!("VM failed: {}", e));
    vm.last_popped_stack_elem()
}

/// Evaluate source directly on an interpreter
pub fn interp_eval(source: &str) -> Value {
    Interpreter::new()
        .eval(&parse(source))
        .unwrap_or_else(|e| panic!("Evaluation failed: {}", e))
}
