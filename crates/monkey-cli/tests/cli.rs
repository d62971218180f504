//! End-to-end tests for the `monkey` binary
//!
//! Each test writes a source file into a temporary directory and checks
//! stdout, stderr and the exit status.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn create_test_file(content: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("main.mk");
    fs::write(&file_path, content).unwrap();
    (temp_dir, file_path.to_str().unwrap().to_string())
}

/// The binary with every MONKEY_* variable cleared
fn monkey() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("monkey");
    cmd.env_remove("MONKEY_ENGINE")
        .env_remove("MONKEY_JSON")
        .env_remove("MONKEY_LOG")
        .env_remove("MONKEY_HISTORY_FILE")
        .env("MONKEY_NO_HISTORY", "1")
        .env("NO_COLOR", "1");
    cmd
}

// ============================================================================
// monkey run
// ============================================================================

#[test]
fn test_run_prints_last_value() {
    let (_dir, path) = create_test_file("let x = 2;\nx * 21");
    monkey()
        .args(["run", &path])
        .assert()
        .success()
        .stdout("42\n");
}

#[test]
fn test_run_on_both_engines() {
    let (_dir, path) = create_test_file(
        "let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } }; fib(15)",
    );
    for engine in ["vm", "eval"] {
        monkey()
            .args(["run", &path, "--engine", engine])
            .assert()
            .success()
            .stdout("610\n");
    }
}

#[test]
fn test_run_engine_from_environment() {
    let (_dir, path) = create_test_file("[1, 2, 3]");
    monkey()
        .env("MONKEY_ENGINE", "eval")
        .args(["run", &path])
        .assert()
        .success()
        .stdout("[1, 2, 3]\n");

    monkey()
        .env("MONKEY_ENGINE", "jit")
        .args(["run", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'jit'"));
}

#[test]
fn test_engine_flag_overrides_environment() {
    // the engines disagree on a name re-bound after capture
    let (_dir, path) = create_test_file("let x = 1; let f = fn() { x }; let x = 2; f()");
    monkey()
        .env("MONKEY_ENGINE", "eval")
        .args(["run", &path])
        .assert()
        .success()
        .stdout("2\n");
    monkey()
        .env("MONKEY_ENGINE", "eval")
        .args(["run", &path, "--engine", "vm"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_run_null_result_prints_nothing_extra() {
    let (_dir, path) = create_test_file(r#"puts("hello"); let done = true;"#);
    monkey()
        .args(["run", &path])
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn test_run_with_disasm() {
    let (_dir, path) = create_test_file("1 + 2");
    monkey()
        .args(["run", &path, "--disasm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Instructions ==="))
        .stdout(predicate::str::contains("0006 Add"))
        .stdout(predicate::str::ends_with("3\n"));
}

// ============================================================================
// monkey run - failures
// ============================================================================

#[test]
fn test_run_missing_file() {
    monkey()
        .args(["run", "does-not-exist.mk"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read source file"));
}

#[test]
fn test_run_syntax_error() {
    let (_dir, path) = create_test_file("let = 5;");
    monkey()
        .args(["run", &path])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error[MK0101]"));
}

#[test]
fn test_run_runtime_error() {
    let (_dir, path) = create_test_file("let a = 1;\nlet b = a / 0;");
    monkey()
        .args(["run", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("division by zero"))
        .stderr(predicate::str::contains("main.mk"));
}

#[test]
fn test_eval_unbounded_recursion_reports_frame_overflow() {
    let (_dir, path) = create_test_file(
        "let f = fn(x) { if (x == 0) { 0 } else { 1 + f(x - 1) } }; f(100000)",
    );
    monkey()
        .args(["run", &path, "--engine", "eval"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error[MK0304]"));
}

#[test]
fn test_run_json_from_environment() {
    let (_dir, path) = create_test_file("1 / 0");
    monkey()
        .env("MONKEY_JSON", "1")
        .args(["run", &path, "--engine", "eval"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""code": "MK0302""#));
}

#[test]
fn test_run_undefined_variable_json() {
    let (_dir, path) = create_test_file("missing + 1");
    monkey()
        .args(["run", &path, "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""code": "MK0201""#));
}

// ============================================================================
// monkey ast / disasm / bench
// ============================================================================

#[test]
fn test_ast_prints_json() {
    let (_dir, path) = create_test_file("let x = 1;");
    monkey()
        .args(["ast", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ast_version\""));
}

#[test]
fn test_disasm_listing() {
    let (_dir, path) = create_test_file("let x = 1; x");
    monkey()
        .args(["disasm", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("0000 Constant 0"))
        .stdout(predicate::str::contains("0003 SetGlobal 0"))
        .stdout(predicate::str::contains("0006 GetGlobal 0"));
}

#[test]
fn test_disasm_compile_error() {
    let (_dir, path) = create_test_file("y");
    monkey()
        .args(["disasm", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("undefined variable: y"));
}

#[test]
fn test_bench_small() {
    for engine in ["vm", "eval"] {
        monkey()
            .args(["bench", "--engine", engine, "--n", "10"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("engine={}, result=55", engine)));
    }
}

// ============================================================================
// monkey repl
// ============================================================================

#[test]
fn test_repl_reads_stdin() {
    monkey()
        .args(["repl", "--no-history"])
        .write_stdin("let a = 5;\na * 2\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Monkey programming language"))
        .stdout(predicate::str::contains("10"));
}

#[test]
fn test_repl_recovers_from_errors() {
    monkey()
        .args(["repl", "--engine", "eval"])
        .write_stdin("1 +\nlet b = 3;\nb\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("MK0102"))
        .stdout(predicate::str::contains("3"));
}

#[test]
fn test_version_flag() {
    monkey()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("monkey"));
}
