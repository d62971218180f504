//! Run command - execute Monkey source files

use super::{read_source, report_diagnostics};
use anyhow::{anyhow, Result};
use monkey_runtime::bytecode::disassemble;
use monkey_runtime::{Diagnostic, Engine, Runtime, Value};
use std::path::Path;

/// How to run a file
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub engine: Engine,
    /// Print the bytecode listing before running
    pub disasm: bool,
    /// Diagnostics as JSON
    pub json: bool,
}

/// Run a Monkey source file
///
/// Prints the value of the last statement to stdout unless it is null.
pub fn run(path: &Path, options: RunOptions) -> Result<()> {
    let source = read_source(path)?;
    let file = path.display().to_string();
    tracing::debug!(target: "monkey::cli", file = %file, engine = %options.engine, "run");

    if options.disasm {
        match Runtime::compile(&source) {
            Ok(bytecode) => print!("{}", disassemble(&bytecode)),
            Err(diagnostics) => return fail(&file, diagnostics, options.json),
        }
    }

    let mut runtime = Runtime::new(options.engine);
    match runtime.eval(&source) {
        Ok(value) => {
            if !matches!(value, Value::Null) {
                println!("{}", value);
            }
            Ok(())
        }
        Err(diagnostics) => fail(&file, diagnostics, options.json),
    }
}

fn fail(file: &str, diagnostics: Vec<Diagnostic>, json: bool) -> Result<()> {
    let diagnostics: Vec<Diagnostic> = diagnostics
        .into_iter()
        .map(|diag| diag.with_file(file))
        .collect();
    report_diagnostics(&diagnostics, json)?;
    Err(anyhow!("Failed to execute {}", file))
}
