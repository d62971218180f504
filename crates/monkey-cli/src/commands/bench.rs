//! Fibonacci benchmark command
//!
//! Only execution is timed; lexing, parsing and compiling happen first.

use anyhow::{anyhow, Result};
use monkey_runtime::{Compiler, Engine, Interpreter, Runtime, Value, VM};
use std::time::{Duration, Instant};

const PROGRAM: &str = "
let fibonacci = fn(x) {
  if (x == 0) {
    0
  } else {
    if (x == 1) {
      return 1;
    } else {
      fibonacci(x - 1) + fibonacci(x - 2);
    }
  }
};
";

/// Run `fibonacci(n)` on the engine and print the result with its timing
pub fn run(engine: Engine, n: i64) -> Result<()> {
    let (result, duration) = measure(engine, n)?;
    println!("engine={}, result={}, duration={:?}", engine, result, duration);
    Ok(())
}

fn measure(engine: Engine, n: i64) -> Result<(Value, Duration)> {
    let source = format!("{}fibonacci({});", PROGRAM, n);
    let program =
        Runtime::parse(&source).map_err(|_| anyhow!("benchmark program failed to parse"))?;

    match engine {
        Engine::Vm => {
            let bytecode = Compiler::new().compile(&program)?;
            let mut vm = VM::new(bytecode);
            let start = Instant::now();
            vm.run()?;
            Ok((vm.last_popped_stack_elem(), start.elapsed()))
        }
        Engine::Eval => {
            let mut interpreter = Interpreter::new();
            let start = Instant::now();
            let value = interpreter.eval(&program)?;
            Ok((value, start.elapsed()))
        }
    }
}
