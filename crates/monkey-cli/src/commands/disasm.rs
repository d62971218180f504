//! Disassembly command

use super::{read_source, report_diagnostics};
use anyhow::{anyhow, Result};
use monkey_runtime::bytecode::disassemble;
use monkey_runtime::{Diagnostic, Runtime};
use std::path::Path;

/// Compile the file and print the constant pool and instruction listing
pub fn run(path: &Path) -> Result<()> {
    let source = read_source(path)?;
    let file = path.display().to_string();

    match Runtime::compile(&source) {
        Ok(bytecode) => {
            print!("{}", disassemble(&bytecode));
            Ok(())
        }
        Err(diagnostics) => {
            let diagnostics: Vec<Diagnostic> = diagnostics
                .into_iter()
                .map(|diag| diag.with_file(file.as_str()))
                .collect();
            report_diagnostics(&diagnostics, false)?;
            Err(anyhow!("Failed to compile {}", file))
        }
    }
}
