//! Stack-based virtual machine
//!
//! Executes a compiled [`Bytecode`] artifact to one terminal value.
//! - The operand stack, the globals store and the frame stack all have a
//!   fixed capacity; exceeding any of them is a fatal fault
//! - Every opcode pops a fixed number of operands and pushes one result
//! - Builtin failures become `Error` values; everything else that goes wrong
//!   aborts execution with a [`RuntimeError`]

pub mod dispatch;
mod frame;

pub use frame::Frame;

use crate::ast::{BinaryOp, UnaryOp};
use crate::bytecode::{self, Bytecode, DecodeError, Opcode};
use crate::span::Span;
use crate::stdlib::{self, OutputWriter};
use crate::value::{self, Closure, CompiledFunction, RuntimeError, Value};
use std::rc::Rc;

/// Default operand stack capacity
pub const STACK_SIZE: usize = 2048;
/// Default globals store capacity
pub const GLOBALS_SIZE: usize = 65536;
/// Default maximum call depth, main frame included
pub const MAX_FRAMES: usize = 1024;

/// VM capacity limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    pub stack_size: usize,
    pub globals_size: usize,
    pub max_frames: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_size: STACK_SIZE,
            globals_size: GLOBALS_SIZE,
            max_frames: MAX_FRAMES,
        }
    }
}

/// Virtual machine state
pub struct VM {
    config: VmConfig,
    constants: Vec<Value>,
    /// Operand stack; slots at and above `sp` hold stale values
    stack: Vec<Value>,
    /// Next free stack slot
    sp: usize,
    globals: Vec<Value>,
    /// Running frame
    frame: Frame,
    /// Suspended callers, outermost first
    frames: Vec<Frame>,
    /// Output writer for `puts` (defaults to stdout)
    output_writer: OutputWriter,
    /// Set when a top-level `return` stopped the program
    returned: bool,
}

impl VM {
    /// Create a VM with default limits and empty globals
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_config(bytecode, VmConfig::default())
    }

    pub fn with_config(bytecode: Bytecode, config: VmConfig) -> Self {
        let main = CompiledFunction {
            instructions: bytecode.instructions,
            num_params: 0,
            num_locals: 0,
            name: Some("<main>".to_string()),
        };
        let main_closure = Rc::new(Closure {
            func: Rc::new(main),
            free: Vec::new(),
        });

        Self {
            config,
            constants: bytecode.constants,
            stack: vec![Value::NULL; config.stack_size],
            sp: 0,
            globals: vec![Value::NULL; config.globals_size],
            frame: Frame::new(main_closure, 0),
            frames: Vec::new(),
            output_writer: stdlib::stdout_writer(),
            returned: false,
        }
    }

    /// Continue with a globals store from an earlier run
    pub fn with_globals(mut self, mut globals: Vec<Value>) -> Self {
        globals.resize(self.config.globals_size, Value::NULL);
        self.globals = globals;
        self
    }

    /// Hand the globals store back so the next run can reuse it
    pub fn take_globals(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.globals)
    }

    /// Set the output writer (used by Runtime to redirect `puts` output)
    pub fn set_output_writer(&mut self, writer: OutputWriter) {
        self.output_writer = writer;
    }

    /// The value most recently popped off the stack
    ///
    /// After a successful [`run`](VM::run) this is the program's result:
    /// the value of its last expression statement.
    pub fn last_popped_stack_elem(&self) -> Value {
        self.stack.get(self.sp).cloned().unwrap_or(Value::NULL)
    }

    /// Whether the last run ended at a top-level `return` rather than by
    /// running off the end of the program
    pub fn returned_early(&self) -> bool {
        self.returned
    }

    /// Current call depth, main frame included
    pub fn frame_depth(&self) -> usize {
        self.frames.len() + 1
    }

    /// Execute the bytecode
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        tracing::debug!(
            target: "monkey::vm",
            instructions = self.frame.instructions().len(),
            constants = self.constants.len(),
            "run"
        );

        let result = self.execute_loop();
        if let Err(err) = &result {
            tracing::debug!(
                target: "monkey::vm",
                error = %err,
                depth = self.frame_depth(),
                ip = self.frame.ip,
                "execution aborted"
            );
        }
        result
    }

    fn execute_loop(&mut self) -> Result<(), RuntimeError> {
        loop {
            let offset = self.frame.ip;
            let instructions = self.frame.instructions();
            if offset >= instructions.len() {
                if self.frames.is_empty() {
                    return Ok(());
                }
                return Err(invalid_bytecode("function body ended without a return"));
            }

            let byte = instructions[offset];
            let opcode =
                dispatch::decode_opcode(byte).ok_or(DecodeError::UnknownOpcode { byte, offset })?;
            if offset + opcode.definition().instruction_len() > instructions.len() {
                return Err(DecodeError::Truncated { opcode, offset }.into());
            }
            self.frame.ip += 1;

            match opcode {
                // ===== Constants =====
                Opcode::Constant => {
                    let index = self.read_u16();
                    let value = self.constants.get(index).cloned().ok_or_else(|| {
                        invalid_bytecode(format!("constant index {} out of range", index))
                    })?;
                    self.push(value)?;
                }
                Opcode::Null => self.push(Value::NULL)?,
                Opcode::True => self.push(Value::TRUE)?,
                Opcode::False => self.push(Value::FALSE)?,

                // ===== Variables =====
                Opcode::GetGlobal => {
                    let index = self.read_u16();
                    let value = self.globals.get(index).cloned().unwrap_or(Value::NULL);
                    self.push(value)?;
                }
                Opcode::SetGlobal => {
                    let index = self.read_u16();
                    let value = self.pop()?;
                    let slot = self.globals.get_mut(index).ok_or_else(|| {
                        invalid_bytecode(format!("global index {} out of range", index))
                    })?;
                    *slot = value;
                }
                Opcode::GetLocal => {
                    let slot = self.frame.base_pointer + self.read_u8();
                    let value = self.stack_slot(slot)?;
                    self.push(value)?;
                }
                Opcode::SetLocal => {
                    let slot = self.frame.base_pointer + self.read_u8();
                    let value = self.pop()?;
                    if slot >= self.sp {
                        return Err(invalid_bytecode(format!("local slot {} out of frame", slot)));
                    }
                    self.stack[slot] = value;
                }
                Opcode::GetFree => {
                    let index = self.read_u8();
                    let value = self.frame.closure.free.get(index).cloned().ok_or_else(|| {
                        invalid_bytecode(format!("free variable {} out of range", index))
                    })?;
                    self.push(value)?;
                }
                Opcode::GetBuiltin => {
                    let index = self.read_u8();
                    let builtin = stdlib::get(index)
                        .ok_or_else(|| invalid_bytecode(format!("unknown builtin {}", index)))?;
                    self.push(Value::Builtin(builtin))?;
                }
                Opcode::CurrentClosure => {
                    let closure = Rc::clone(&self.frame.closure);
                    self.push(Value::Closure(closure))?;
                }

                // ===== Arithmetic and comparison =====
                Opcode::Add => self.execute_binary(BinaryOp::Add)?,
                Opcode::Sub => self.execute_binary(BinaryOp::Sub)?,
                Opcode::Mul => self.execute_binary(BinaryOp::Mul)?,
                Opcode::Div => self.execute_binary(BinaryOp::Div)?,
                Opcode::Equal => self.execute_binary(BinaryOp::Eq)?,
                Opcode::NotEqual => self.execute_binary(BinaryOp::Ne)?,
                Opcode::GreaterThan => self.execute_binary(BinaryOp::Gt)?,
                Opcode::Negate => self.execute_unary(UnaryOp::Negate)?,
                Opcode::Not => self.execute_unary(UnaryOp::Not)?,

                // ===== Control flow =====
                Opcode::Jump => {
                    let target = self.read_u16();
                    self.frame.ip = target;
                }
                Opcode::JumpNotTruthy => {
                    let target = self.read_u16();
                    let condition = self.pop()?;
                    if !condition.is_truthy() {
                        self.frame.ip = target;
                    }
                }

                // ===== Functions =====
                Opcode::Call => {
                    let argc = self.read_u8();
                    self.call(argc)?;
                }
                Opcode::ReturnValue => {
                    let value = self.pop()?;
                    if !self.return_from_frame(value)? {
                        return Ok(());
                    }
                }
                Opcode::Return => {
                    if !self.return_from_frame(Value::NULL)? {
                        return Ok(());
                    }
                }
                Opcode::Closure => {
                    let const_index = self.read_u16();
                    let free_count = self.read_u8();
                    self.push_closure(const_index, free_count)?;
                }

                // ===== Arrays =====
                Opcode::Array => {
                    let count = self.read_u16();
                    let start = self.sp.checked_sub(count).ok_or_else(stack_underflow)?;
                    let elements = self.stack[start..self.sp].to_vec();
                    self.sp = start;
                    self.push(Value::array(elements))?;
                }
                Opcode::Index => {
                    let index = self.pop()?;
                    let target = self.pop()?;
                    let value = value::index_value(&target, &index, Span::dummy())?;
                    self.push(value)?;
                }

                // ===== Stack manipulation =====
                Opcode::Pop => {
                    self.pop()?;
                }
            }
        }
    }

    // === Calling convention ===

    /// Call the value sitting below the top `argc` stack slots
    fn call(&mut self, argc: usize) -> Result<(), RuntimeError> {
        let callee_slot = self.sp.checked_sub(argc + 1).ok_or_else(stack_underflow)?;
        match self.stack[callee_slot].clone() {
            Value::Closure(closure) => self.call_closure(closure, argc),
            Value::Builtin(builtin) => {
                let result = builtin.invoke(
                    &self.stack[callee_slot + 1..self.sp],
                    &self.output_writer,
                    Span::dummy(),
                );
                self.sp = callee_slot;
                self.push(result)
            }
            other => Err(RuntimeError::NotCallable {
                callee: other.type_name(),
                span: Span::dummy(),
            }),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, argc: usize) -> Result<(), RuntimeError> {
        let func = &closure.func;
        if argc != func.num_params {
            return Err(RuntimeError::WrongArity {
                expected: func.num_params,
                got: argc,
                span: Span::dummy(),
            });
        }
        if self.frame_depth() >= self.config.max_frames {
            return Err(RuntimeError::FrameOverflow {
                max: self.config.max_frames,
                span: Span::dummy(),
            });
        }

        let base_pointer = self.sp - argc;
        let locals_end = base_pointer + func.num_locals;
        if locals_end > self.stack.len() {
            return Err(RuntimeError::StackOverflow { span: Span::dummy() });
        }
        // locals declared after the parameters start out null
        for slot in &mut self.stack[self.sp..locals_end] {
            *slot = Value::NULL;
        }

        tracing::trace!(
            target: "monkey::vm",
            function = func.display_name(),
            depth = self.frame_depth() + 1,
            "push frame"
        );

        let caller = std::mem::replace(&mut self.frame, Frame::new(closure, base_pointer));
        self.frames.push(caller);
        self.sp = locals_end;
        Ok(())
    }

    /// Leave the running frame and push `value` for the caller
    ///
    /// Returns `false` when the main frame returned, which halts the VM with
    /// `value` as the last popped element.
    fn return_from_frame(&mut self, value: Value) -> Result<bool, RuntimeError> {
        let Some(caller) = self.frames.pop() else {
            self.push(value)?;
            self.sp -= 1;
            self.returned = true;
            return Ok(false);
        };

        tracing::trace!(
            target: "monkey::vm",
            function = self.frame.closure.func.display_name(),
            depth = self.frame_depth(),
            "pop frame"
        );

        // drops the callee, its arguments and its locals
        self.sp = self.frame.base_pointer.saturating_sub(1);
        self.frame = caller;
        self.push(value)?;
        Ok(true)
    }

    fn push_closure(&mut self, const_index: usize, free_count: usize) -> Result<(), RuntimeError> {
        let func = match self.constants.get(const_index) {
            Some(Value::CompiledFunction(func)) => Rc::clone(func),
            Some(other) => {
                return Err(invalid_bytecode(format!(
                    "not a function: {}",
                    other.type_name()
                )))
            }
            None => {
                return Err(invalid_bytecode(format!(
                    "constant index {} out of range",
                    const_index
                )))
            }
        };

        let start = self.sp.checked_sub(free_count).ok_or_else(stack_underflow)?;
        let free = self.stack[start..self.sp].to_vec();
        self.sp = start;
        self.push(Value::Closure(Rc::new(Closure { func, free })))
    }

    // === Operators ===

    fn execute_binary(&mut self, op: BinaryOp) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = value::binary_op(op, &left, &right, Span::dummy())?;
        self.push(result)
    }

    fn execute_unary(&mut self, op: UnaryOp) -> Result<(), RuntimeError> {
        let operand = self.pop()?;
        let result = value::unary_op(op, &operand, Span::dummy())?;
        self.push(result)
    }

    // === Stack and operand access ===

    #[inline(always)]
    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.sp >= self.stack.len() {
            return Err(RuntimeError::StackOverflow { span: Span::dummy() });
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    /// Pop the top value; the slot keeps it for `last_popped_stack_elem`
    #[inline(always)]
    fn pop(&mut self) -> Result<Value, RuntimeError> {
        if self.sp == 0 {
            return Err(stack_underflow());
        }
        self.sp -= 1;
        Ok(self.stack[self.sp].clone())
    }

    fn stack_slot(&self, slot: usize) -> Result<Value, RuntimeError> {
        if slot >= self.sp {
            return Err(invalid_bytecode(format!("local slot {} out of frame", slot)));
        }
        Ok(self.stack[slot].clone())
    }

    // Operand reads are in bounds: the fetch step checked the instruction length.

    #[inline(always)]
    fn read_u16(&mut self) -> usize {
        let value = bytecode::read_u16(self.frame.instructions(), self.frame.ip);
        self.frame.ip += 2;
        value as usize
    }

    #[inline(always)]
    fn read_u8(&mut self) -> usize {
        let value = bytecode::read_u8(self.frame.instructions(), self.frame.ip);
        self.frame.ip += 1;
        value as usize
    }
}

fn invalid_bytecode(msg: impl Into<String>) -> RuntimeError {
    RuntimeError::InvalidBytecode {
        msg: msg.into(),
        span: Span::dummy(),
    }
}

fn stack_underflow() -> RuntimeError {
    invalid_bytecode("stack underflow")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::make;
    use crate::compiler::Compiler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::cell::RefCell;

    fn compile(source: &str) -> Bytecode {
        let (tokens, _) = Lexer::new(source).tokenize();
        let (program, diags) = Parser::new(tokens).parse();
        assert!(diags.is_empty(), "Parser errors: {:?}", diags);
        Compiler::new().compile(&program).expect("Compilation failed")
    }

    fn run(source: &str) -> Result<Value, RuntimeError> {
        let mut vm = VM::new(compile(source));
        vm.run()?;
        Ok(vm.last_popped_stack_elem())
    }

    #[rstest]
    #[case("1", Value::Integer(1))]
    #[case("1 + 2 * 3", Value::Integer(7))]
    #[case("(5 + 10 * 2 + 15 / 3) * 2 + -10", Value::Integer(50))]
    #[case("1 < 2", Value::TRUE)]
    #[case("1 > 2", Value::FALSE)]
    #[case("(1 < 2) == true", Value::TRUE)]
    #[case("!5", Value::FALSE)]
    #[case("!!0", Value::TRUE)]
    #[case("if (0) { 10 } else { 20 }", Value::Integer(10))]
    #[case("if (1 > 2) { 10 }", Value::NULL)]
    #[case("if ((if (false) { 10 })) { 10 } else { 20 }", Value::Integer(20))]
    #[case(r#""mon" + "key""#, Value::string("monkey"))]
    #[case("[1, 2 * 2, 3 + 3][1]", Value::Integer(4))]
    #[case("[][0]", Value::NULL)]
    #[case("let one = 1; let two = one + one; one + two", Value::Integer(3))]
    fn test_expressions(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(run(source).unwrap(), expected);
    }

    #[rstest]
    #[case("let f = fn() { 5 + 10; }; f()", Value::Integer(15))]
    #[case("let f = fn() { return 99; 100; }; f()", Value::Integer(99))]
    #[case("let f = fn() { }; f()", Value::NULL)]
    #[case("let f = fn(a, b) { let c = a + b; c * 2 }; f(1, 2)", Value::Integer(6))]
    #[case(
        "let g = 50; let f = fn() { let n = 1; g - n }; let h = fn() { let n = 2; g - n }; f() + h()",
        Value::Integer(97)
    )]
    #[case("let f = fn() { 1 }; let g = fn() { f }; g()()", Value::Integer(1))]
    fn test_functions(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(run(source).unwrap(), expected);
    }

    #[test]
    fn test_closures_capture_values() {
        let source = "
            let adder = fn(a) { fn(b) { a + b } };
            let add_two = adder(2);
            add_two(40)
        ";
        assert_eq!(run(source).unwrap(), Value::Integer(42));
    }

    #[test]
    fn test_recursive_fibonacci() {
        let source = "
            let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } };
            fib(15)
        ";
        assert_eq!(run(source).unwrap(), Value::Integer(610));
    }

    #[test]
    fn test_local_recursion_through_closure() {
        let source = "
            let wrapper = fn() {
                let countdown = fn(x) { if (x == 0) { 0 } else { countdown(x - 1) } };
                countdown(3)
            };
            wrapper()
        ";
        assert_eq!(run(source).unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_top_level_return_halts() {
        assert_eq!(run("1; return 2; 3").unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_builtin_errors_are_values() {
        let value = run("len(1)").unwrap();
        assert!(value.is_error());
        assert_eq!(value.to_string(), "Error: argument to `len` not supported, got INTEGER");
    }

    #[test]
    fn test_puts_uses_output_writer() {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let mut vm = VM::new(compile(r#"puts("hi", 1)"#));
        vm.set_output_writer(buffer.clone());
        vm.run().unwrap();
        assert_eq!(vm.last_popped_stack_elem(), Value::NULL);
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "hi\n1\n");
    }

    #[rstest]
    #[case("fn(a) { a }()", "wrong number of arguments: want=1, got=0")]
    #[case("1()", "calling non-function: INTEGER")]
    #[case("1 + true", "unsupported types for +: INTEGER and BOOLEAN")]
    #[case("-true", "unsupported type for negation: BOOLEAN")]
    #[case("1 / 0", "division by zero")]
    #[case("1[0]", "index operator not supported: INTEGER[INTEGER]")]
    fn test_runtime_errors(#[case] source: &str, #[case] message: &str) {
        assert_eq!(run(source).unwrap_err().to_string(), message);
    }

    #[test]
    fn test_unbounded_recursion_overflows() {
        let err = run("let f = fn(x) { f(x + 1) }; f(0)").unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::FrameOverflow { .. } | RuntimeError::StackOverflow { .. }
        ));
    }

    #[test]
    fn test_frame_limit_is_configurable() {
        let bytecode = compile("let f = fn(x) { if (x == 0) { 0 } else { f(x - 1) } }; f(10)");
        let config = VmConfig {
            max_frames: 5,
            ..VmConfig::default()
        };
        let mut vm = VM::with_config(bytecode, config);
        assert!(matches!(
            vm.run(),
            Err(RuntimeError::FrameOverflow { max: 5, .. })
        ));
    }

    #[test]
    fn test_operand_stack_overflow() {
        let config = VmConfig {
            stack_size: 4,
            ..VmConfig::default()
        };
        let mut vm = VM::with_config(compile("[1, 2, 3, 4, 5]"), config);
        assert!(matches!(vm.run(), Err(RuntimeError::StackOverflow { .. })));
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let mut compiler = Compiler::new();
        let parse = |src: &str| {
            let (tokens, _) = Lexer::new(src).tokenize();
            Parser::new(tokens).parse().0
        };

        let first = compiler.compile(&parse("let a = 40;")).unwrap();
        let mut vm = VM::new(first);
        vm.run().unwrap();
        let globals = vm.take_globals();

        let second = compiler.compile(&parse("a + 2")).unwrap();
        let mut vm = VM::new(second).with_globals(globals);
        vm.run().unwrap();
        assert_eq!(vm.last_popped_stack_elem(), Value::Integer(42));
    }

    #[test]
    fn test_unknown_opcode_is_fatal() {
        let bytecode = Bytecode {
            instructions: vec![0xEE],
            constants: vec![],
        };
        let err = VM::new(bytecode).run().unwrap_err();
        assert_eq!(err.to_string(), "unknown opcode 0xee at offset 0");
    }

    #[test]
    fn test_hand_assembled_program() {
        let mut instructions = make(Opcode::Constant, &[0]);
        instructions.extend(make(Opcode::Constant, &[1]));
        instructions.extend(make(Opcode::Sub, &[]));
        instructions.extend(make(Opcode::Pop, &[]));
        let mut vm = VM::new(Bytecode {
            instructions,
            constants: vec![Value::Integer(3), Value::Integer(5)],
        });
        vm.run().unwrap();
        assert_eq!(vm.last_popped_stack_elem(), Value::Integer(-2));
    }
}
