//! Closure behavior on both engines
//!
//! The VM copies free variables into the closure when it is created; the
//! evaluator closes over the defining environment itself. Since bindings
//! are never mutated the two only diverge when a name is re-bound with a
//! second `let` after the closure was made (see the last test).

mod common;

use common::{run, run_both, vm_last_popped};
use monkey_runtime::{Engine, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn ints(values: &[i64]) -> Value {
    Value::array(values.iter().map(|n| Value::Integer(*n)).collect())
}

#[rstest]
#[case(
    "let newClosure = fn(a) { fn() { a; }; }; let closure = newClosure(99); closure();",
    Value::Integer(99)
)]
#[case(
    "let newAdder = fn(a, b) { fn(c) { a + b + c }; }; let adder = newAdder(1, 2); adder(8);",
    Value::Integer(11)
)]
#[case(
    "let newAdder = fn(a, b) { let c = a + b; fn(d) { c + d }; }; let adder = newAdder(1, 2); adder(8);",
    Value::Integer(11)
)]
#[case(
    "let newAdderOuter = fn(a, b) { let c = a + b; fn(d) { let e = d + c; fn(f) { e + f; }; }; };
     let newAdderInner = newAdderOuter(1, 2);
     let adder = newAdderInner(3);
     adder(8);",
    Value::Integer(14)
)]
#[case(
    "let a = 1;
     let newAdderOuter = fn(b) { fn(c) { fn(d) { a + b + c + d }; }; };
     newAdderOuter(2)(3)(8);",
    Value::Integer(14)
)]
#[case(
    "let newClosure = fn(a, b) { let one = fn() { a; }; let two = fn() { b; }; fn() { one() + two(); }; };
     let closure = newClosure(9, 90);
     closure();",
    Value::Integer(99)
)]
fn test_captured_values_outlive_their_frame(#[case] source: &str, #[case] expected: Value) {
    assert_eq!(run_both(source), expected);
}

#[rstest]
#[case(
    "let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } }; countDown(1);",
    Value::Integer(0)
)]
#[case(
    "let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } };
     let wrapper = fn() { countDown(1); };
     wrapper();",
    Value::Integer(0)
)]
#[case(
    "let wrapper = fn() {
         let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } };
         countDown(1);
     };
     wrapper();",
    Value::Integer(0)
)]
#[case(
    "let sum = fn(n) { if (n == 0) { 0 } else { n + sum(n - 1) } }; sum(100)",
    Value::Integer(5050)
)]
fn test_recursion(#[case] source: &str, #[case] expected: Value) {
    assert_eq!(run_both(source), expected);
}

fn fib_iterative(n: i64) -> i64 {
    let (mut a, mut b) = (0i64, 1i64);
    for _ in 0..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(10)]
#[case(15)]
fn test_fibonacci_matches_iterative(#[case] n: i64) {
    let source = format!(
        "let fibonacci = fn(x) {{
             if (x == 0) {{ return 0; }}
             if (x == 1) {{ return 1; }}
             fibonacci(x - 1) + fibonacci(x - 2);
         }};
         fibonacci({});",
        n
    );
    assert_eq!(run_both(&source), Value::Integer(fib_iterative(n)));
}

#[rstest]
#[case("let apply = fn(f, x) { f(x) }; apply(fn(n) { n * 2 }, 21)", Value::Integer(42))]
#[case(
    "let compose = fn(f, g) { fn(x) { g(f(x)) } };
     let inc = fn(x) { x + 1 };
     let double = fn(x) { x * 2 };
     compose(inc, double)(5)",
    Value::Integer(12)
)]
#[case(
    "let map = fn(arr, f) {
         let iter = fn(arr, acc) {
             if (len(arr) == 0) { acc } else { iter(rest(arr), push(acc, f(first(arr)))) }
         };
         iter(arr, []);
     };
     map([1, 2, 3, 4], fn(x) { x * x })",
    ints(&[1, 4, 9, 16])
)]
#[case(
    "let reduce = fn(arr, initial, f) {
         let iter = fn(arr, result) {
             if (len(arr) == 0) { result } else { iter(rest(arr), f(result, first(arr))) }
         };
         iter(arr, initial);
     };
     reduce([1, 2, 3, 4, 5], 0, fn(acc, el) { acc + el })",
    Value::Integer(15)
)]
fn test_higher_order_functions(#[case] source: &str, #[case] expected: Value) {
    assert_eq!(run_both(source), expected);
}

#[test]
fn test_closures_are_distinct_instances() {
    let source = "let make = fn(n) { fn() { n } }; let a = make(1); let b = make(2); [a(), b(), a()]";
    assert_eq!(run_both(source), ints(&[1, 2, 1]));
}

#[test]
fn test_vm_closure_carries_free_values() {
    let closure = vm_last_popped("let make = fn(a, b) { fn() { a + b } }; make(3, 4)");
    match closure {
        Value::Closure(closure) => {
            assert_eq!(closure.free, vec![Value::Integer(3), Value::Integer(4)]);
            assert_eq!(closure.func.num_params, 0);
        }
        other => panic!("Expected a closure, got {:?}", other),
    }
}

#[test]
fn test_rebinding_after_capture_diverges() {
    let source = "let x = 1; let f = fn() { x }; let x = 2; f()";
    // the second `let` gets a fresh global slot in compiled code
    assert_eq!(run(Engine::Vm, source).unwrap(), Value::Integer(1));
    // the evaluator overwrites the binding in the shared environment
    assert_eq!(run(Engine::Eval, source).unwrap(), Value::Integer(2));
}
