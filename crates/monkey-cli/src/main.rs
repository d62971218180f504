use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use monkey_runtime::Engine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Monkey programming language compiler, virtual machine and evaluator.
///
/// Programs run on the bytecode VM by default; `--engine eval` selects the
/// tree-walking evaluator instead. Without a subcommand an interactive
/// REPL is started.
///
/// EXAMPLES:
///     monkey                       Start the REPL
///     monkey --engine eval         Start the REPL on the evaluator
///     monkey run main.mk           Run a program
///     monkey disasm main.mk        Show the compiled bytecode
///     monkey bench --engine eval   Time fibonacci(35) on the evaluator
///
/// ENVIRONMENT VARIABLES:
///     MONKEY_ENGINE        Default engine, 'vm' or 'eval'
///     MONKEY_JSON          Set to '1' for JSON diagnostics from `run`
///     MONKEY_HISTORY_FILE  REPL history location (default ~/.monkey/history)
///     MONKEY_NO_HISTORY    Set to '1' to disable REPL history
///     MONKEY_LOG           tracing filter, e.g. 'monkey::vm=trace'
///     NO_COLOR             Set to disable colored output
#[derive(Parser)]
#[command(name = "monkey")]
#[command(version)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// REPL settings when no subcommand is given
    #[command(flatten)]
    repl: ReplArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Monkey source file
    ///
    /// Executes the file and prints the value of its last statement
    /// unless it is null.
    ///
    /// EXAMPLES:
    ///     monkey run main.mk                 Run on the VM
    ///     monkey run main.mk --engine eval   Run on the evaluator
    ///     monkey run main.mk --disasm        Print the bytecode first
    #[command(visible_alias = "r")]
    Run {
        /// Path to the Monkey source file
        file: PathBuf,
        /// Execution engine: vm or eval
        #[arg(long, short = 'e', env = "MONKEY_ENGINE", default_value_t = Engine::Vm)]
        engine: Engine,
        /// Print the disassembled bytecode before running
        #[arg(long)]
        disasm: bool,
        /// Output diagnostics in JSON format
        #[arg(long, env = "MONKEY_JSON")]
        json: bool,
        /// Debug logging on stderr
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Start an interactive REPL
    ///
    /// REPL COMMANDS:
    ///     :help, :h      Show help
    ///     :quit, :q      Exit REPL
    ///     :reset         Clear all bindings
    Repl(ReplArgs),

    /// Dump the AST of a source file as JSON
    Ast {
        /// Path to the Monkey source file
        file: PathBuf,
    },

    /// Compile a source file and print its constants and instructions
    Disasm {
        /// Path to the Monkey source file
        file: PathBuf,
    },

    /// Time a recursive fibonacci on one engine
    Bench {
        /// Execution engine: vm or eval
        #[arg(long, short = 'e', env = "MONKEY_ENGINE", default_value_t = Engine::Vm)]
        engine: Engine,
        /// Fibonacci argument
        #[arg(long, default_value_t = 35)]
        n: i64,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct ReplArgs {
    /// Execution engine: vm or eval
    #[arg(long, short = 'e', env = "MONKEY_ENGINE", default_value_t = Engine::Vm)]
    engine: Engine,
    /// Print tokens, AST and bytecode for every line
    #[arg(long, short = 'v')]
    verbose: bool,
    /// Disable history persistence
    #[arg(long, env = "MONKEY_NO_HISTORY")]
    no_history: bool,
}

impl From<ReplArgs> for commands::repl::ReplOptions {
    fn from(args: ReplArgs) -> Self {
        Self {
            engine: args.engine,
            verbose: args.verbose,
            no_history: args.no_history,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::from_env();

    if config.no_color {
        colored::control::set_override(false);
    }

    let verbose = match &cli.command {
        Some(Commands::Run { verbose, .. }) => *verbose,
        Some(Commands::Repl(args)) => args.verbose,
        None => cli.repl.verbose,
        _ => false,
    };
    init_tracing(&config, verbose);

    match cli.command {
        Some(Commands::Run {
            file,
            engine,
            disasm,
            json,
            verbose: _,
        }) => {
            commands::run::run(&file, commands::run::RunOptions { engine, disasm, json })?;
        }
        Some(Commands::Repl(args)) => commands::repl::run(args.into(), &config)?,
        Some(Commands::Ast { file }) => commands::ast::run(&file)?,
        Some(Commands::Disasm { file }) => commands::disasm::run(&file)?,
        Some(Commands::Bench { engine, n }) => commands::bench::run(engine, n)?,
        None => commands::repl::run(cli.repl.into(), &config)?,
    }

    Ok(())
}

/// Install the stderr subscriber; MONKEY_LOG wins over `--verbose`
fn init_tracing(config: &config::Config, verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = config
        .log_filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!config.no_color)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_engine_flag_parses() {
        let cli = Cli::try_parse_from(["monkey", "run", "main.mk", "--engine", "eval"]).unwrap();
        match cli.command {
            Some(Commands::Run { engine, .. }) => assert_eq!(engine, Engine::Eval),
            _ => panic!("expected run command"),
        }
        assert!(Cli::try_parse_from(["monkey", "run", "main.mk", "--engine", "jit"]).is_err());
    }

    #[test]
    fn test_no_subcommand_is_repl() {
        let cli = Cli::try_parse_from(["monkey", "--engine", "eval", "--no-history"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.repl.engine, Engine::Eval);
        assert!(cli.repl.no_history);
    }

    #[test]
    fn test_repl_subcommand_flags() {
        let cli = Cli::try_parse_from(["monkey", "repl", "-v", "-e", "eval"]).unwrap();
        match cli.command {
            Some(Commands::Repl(args)) => {
                assert!(args.verbose);
                assert_eq!(args.engine, Engine::Eval);
            }
            _ => panic!("expected repl command"),
        }
    }
}
