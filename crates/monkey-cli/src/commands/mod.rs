pub mod ast;
pub mod bench;
pub mod disasm;
pub mod repl;
pub mod run;

use anyhow::{Context, Result};
use colored::Colorize;
use monkey_runtime::{Diagnostic, DiagnosticLevel};
use std::fs;
use std::path::Path;

/// Read a source file, naming it in the error
pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file: {}", path.display()))
}

/// Render a diagnostic for a terminal, colored unless disabled globally
pub fn format_diagnostic(diag: &Diagnostic) -> String {
    let text = diag.to_human_string();
    let (header, body) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    let header = match diag.level {
        DiagnosticLevel::Error => header.red().bold(),
        DiagnosticLevel::Warning => header.yellow().bold(),
    };
    format!("{}\n{}", header, body.trim_end())
}

/// Print diagnostics to stderr, as JSON when requested
pub fn report_diagnostics(diagnostics: &[Diagnostic], json: bool) -> Result<()> {
    for diag in diagnostics {
        if json {
            eprintln!("{}", diag.to_json_string()?);
        } else {
            eprintln!("{}", format_diagnostic(diag));
        }
    }
    Ok(())
}
