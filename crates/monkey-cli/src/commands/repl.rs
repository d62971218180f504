//! REPL command implementation

use super::format_diagnostic;
use crate::config::Config;
use anyhow::Result;
use colored::Colorize;
use monkey_runtime::ast::VersionedProgram;
use monkey_runtime::{Engine, Lexer, ReplCore, ReplResult, Runtime, Value};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "> ";

#[derive(Debug, Clone, Copy)]
pub struct ReplOptions {
    pub engine: Engine,
    /// Show tokens, AST and bytecode for every line
    pub verbose: bool,
    pub no_history: bool,
}

/// Run the interactive REPL
pub fn run(options: ReplOptions, config: &Config) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut repl = ReplCore::new(options.engine).with_disassembly(options.verbose);

    let history_path = if options.no_history {
        None
    } else {
        config.history_path()
    };
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path); // missing file on first run
    }

    println!("Hello {}! This is the Monkey programming language!", user_name());
    println!("Feel free to type in commands ({} engine, :help for help)", options.engine);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                match trimmed {
                    ":quit" | ":q" => break,
                    ":help" | ":h" => {
                        print_help();
                        continue;
                    }
                    ":reset" => {
                        repl.reset();
                        println!("Bindings cleared");
                        continue;
                    }
                    _ => {}
                }

                if options.verbose {
                    print_front_end(&line);
                }
                print_result(repl.eval_line(&line));
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use :quit or :q to exit");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                tracing::warn!(target: "monkey::cli", error = %err, "readline failed");
                break;
            }
        }
    }

    if let Some(path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(err) = rl.save_history(&path) {
            tracing::debug!(
                target: "monkey::cli",
                path = %path.display(),
                error = %err,
                "history not saved"
            );
        }
    }

    Ok(())
}

fn print_result(result: ReplResult) {
    for diag in &result.diagnostics {
        println!("{}", format_diagnostic(diag));
    }
    if let Some(listing) = &result.disassembly {
        print!("{}", listing.dimmed());
    }
    match result.value {
        Some(Value::Null) | None => {}
        Some(value @ Value::Error(_)) => println!("{}", value.to_string().red()),
        Some(value) => println!("{}", value),
    }
}

/// Tokens and AST of a line, shown in verbose mode
fn print_front_end(line: &str) {
    let (tokens, _) = Lexer::new(line).tokenize();
    for token in &tokens {
        println!(
            "{}",
            format!(
                "{:>4}:{:<3} {:?} {:?}",
                token.span.line, token.span.column, token.kind, token.lexeme
            )
            .dimmed()
        );
    }
    // syntax errors are reported with the evaluation result
    if let Ok(program) = Runtime::parse(line) {
        if let Ok(json) = VersionedProgram::new(program).to_json() {
            println!("{}", json.dimmed());
        }
    }
}

fn print_help() {
    println!("Monkey REPL Commands:");
    println!("  :quit, :q         Exit the REPL");
    println!("  :reset            Clear all bindings");
    println!("  :help, :h         Show this help message");
    println!();
    println!("Examples:");
    println!("  > let add = fn(a, b) {{ a + b }};");
    println!("  > add(1, 2)");
    println!("  > puts(len([1, 2, 3]))");
}

fn user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "there".to_string())
}
