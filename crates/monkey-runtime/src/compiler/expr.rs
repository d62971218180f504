//! Expression compilation

use crate::ast::*;
use crate::bytecode::Opcode;
use crate::compiler::{
    check_operand, CompileError, Compiler, JUMP_PLACEHOLDER, MAX_U16_OPERAND, MAX_U8_OPERAND,
};
use crate::value::{CompiledFunction, Value};
use std::rc::Rc;

impl Compiler {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Literal(lit, span) => self.compile_literal(lit, *span),
            Expr::Identifier(ident) => {
                let symbol = self.symbol_table.resolve(&ident.name).ok_or_else(|| {
                    CompileError::UndefinedVariable {
                        name: ident.name.clone(),
                        span: ident.span,
                    }
                })?;
                self.load_symbol(&symbol, ident.span)
            }
            Expr::Unary(unary) => {
                self.compile_expr(&unary.expr)?;
                let opcode = match unary.op {
                    UnaryOp::Negate => Opcode::Negate,
                    UnaryOp::Not => Opcode::Not,
                };
                self.emit(opcode, &[]);
                Ok(())
            }
            Expr::Binary(binary) => self.compile_binary(binary),
            Expr::If(if_expr) => self.compile_if(if_expr),
            Expr::Function(func) => self.compile_function(func),
            Expr::Call(call) => {
                self.compile_expr(&call.callee)?;
                let argc = check_operand(
                    "call arguments",
                    call.args.len(),
                    MAX_U8_OPERAND,
                    call.span,
                )?;
                for arg in &call.args {
                    self.compile_expr(arg)?;
                }
                self.emit(Opcode::Call, &[argc]);
                Ok(())
            }
            Expr::ArrayLiteral(array) => {
                let count = check_operand(
                    "array elements",
                    array.elements.len(),
                    MAX_U16_OPERAND,
                    array.span,
                )?;
                for element in &array.elements {
                    self.compile_expr(element)?;
                }
                self.emit(Opcode::Array, &[count]);
                Ok(())
            }
            Expr::Index(index) => {
                self.compile_expr(&index.target)?;
                self.compile_expr(&index.index)?;
                self.emit(Opcode::Index, &[]);
                Ok(())
            }
        }
    }

    fn compile_literal(
        &mut self,
        lit: &Literal,
        span: crate::span::Span,
    ) -> Result<(), CompileError> {
        match lit {
            Literal::Integer(n) => {
                let index = self.add_constant(Value::Integer(*n), span)?;
                self.emit(Opcode::Constant, &[index]);
            }
            Literal::String(s) => {
                let index = self.add_constant(Value::string(s.as_str()), span)?;
                self.emit(Opcode::Constant, &[index]);
            }
            Literal::Bool(true) => {
                self.emit(Opcode::True, &[]);
            }
            Literal::Bool(false) => {
                self.emit(Opcode::False, &[]);
            }
        }
        Ok(())
    }

    fn compile_binary(&mut self, binary: &BinaryExpr) -> Result<(), CompileError> {
        // `a < b` is `b > a`
        if binary.op == BinaryOp::Lt {
            self.compile_expr(&binary.right)?;
            self.compile_expr(&binary.left)?;
            self.emit(Opcode::GreaterThan, &[]);
            return Ok(());
        }

        self.compile_expr(&binary.left)?;
        self.compile_expr(&binary.right)?;
        let opcode = match binary.op {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mul,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::Eq => Opcode::Equal,
            BinaryOp::Ne => Opcode::NotEqual,
            BinaryOp::Gt | BinaryOp::Lt => Opcode::GreaterThan,
        };
        self.emit(opcode, &[]);
        Ok(())
    }

    /// Layout:
    /// ```text
    ///     <condition>
    ///     JumpNotTruthy else
    ///     <consequence>
    ///     Jump end
    /// else:
    ///     <alternative> | Null
    /// end:
    /// ```
    fn compile_if(&mut self, if_expr: &IfExpr) -> Result<(), CompileError> {
        self.compile_expr(&if_expr.condition)?;

        let jump_not_truthy = self.emit(Opcode::JumpNotTruthy, &[JUMP_PLACEHOLDER]);
        self.compile_branch(&if_expr.consequence)?;
        let jump = self.emit(Opcode::Jump, &[JUMP_PLACEHOLDER]);

        let else_target = self.current_instructions().len();
        self.patch_jump(Opcode::JumpNotTruthy, jump_not_truthy, else_target, if_expr.span)?;

        match &if_expr.alternative {
            Some(alternative) => self.compile_branch(alternative)?,
            None => {
                self.emit(Opcode::Null, &[]);
            }
        }

        let end_target = self.current_instructions().len();
        self.patch_jump(Opcode::Jump, jump, end_target, if_expr.span)
    }

    /// Compile a branch so it leaves exactly one value on the stack
    fn compile_branch(&mut self, block: &Block) -> Result<(), CompileError> {
        self.compile_block(block)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        } else if !self.last_instruction_is(Opcode::ReturnValue) {
            // empty block or one ending in `let`
            self.emit(Opcode::Null, &[]);
        }
        Ok(())
    }

    fn compile_function(&mut self, func: &FunctionLiteral) -> Result<(), CompileError> {
        self.enter_scope();

        if let Some(name) = &func.name {
            self.symbol_table.define_function_name(name);
        }
        for param in &func.params {
            self.symbol_table.define(&param.name);
        }

        if let Err(err) = self.compile_block(&func.body) {
            self.leave_scope();
            return Err(err);
        }

        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols().to_vec();
        let num_locals = self.symbol_table.num_definitions();
        let instructions = self.leave_scope();

        let free_count = check_operand(
            "captured variables",
            free_symbols.len(),
            MAX_U8_OPERAND,
            func.span,
        )?;
        for symbol in &free_symbols {
            self.load_symbol(symbol, func.span)?;
        }

        tracing::trace!(
            target: "monkey::compiler",
            name = func.name.as_deref().unwrap_or("<anonymous>"),
            params = func.params.len(),
            locals = num_locals,
            free = free_count,
            "compiled function"
        );

        let compiled = CompiledFunction {
            instructions,
            num_params: func.params.len(),
            num_locals,
            name: func.name.clone(),
        };
        let index = self.add_constant(Value::CompiledFunction(Rc::new(compiled)), func.span)?;
        self.emit(Opcode::Closure, &[index, free_count]);
        Ok(())
    }
}
