//! AST dump command - output AST as JSON

use super::read_source;
use anyhow::{anyhow, Result};
use monkey_runtime::ast::VersionedProgram;
use monkey_runtime::Runtime;
use std::path::Path;

/// Parse the file and print its versioned AST to stdout
///
/// Syntax errors are printed to stderr as JSON diagnostics.
pub fn run(path: &Path) -> Result<()> {
    let source = read_source(path)?;
    let file = path.display().to_string();

    let program = match Runtime::parse(&source) {
        Ok(program) => program,
        Err(diagnostics) => {
            for diag in diagnostics {
                eprintln!("{}", diag.with_file(file.as_str()).to_json_string()?);
            }
            return Err(anyhow!("Parse errors in {}", file));
        }
    };

    println!("{}", VersionedProgram::new(program).to_json()?);
    Ok(())
}
