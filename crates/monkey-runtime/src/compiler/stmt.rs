//! Statement compilation

use crate::ast::*;
use crate::bytecode::Opcode;
use crate::compiler::{check_operand, CompileError, Compiler, MAX_U16_OPERAND, MAX_U8_OPERAND};
use crate::symbol::SymbolScope;

impl Compiler {
    pub(super) fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Let(let_stmt) => self.compile_let(let_stmt),
            Stmt::Return(ret) => {
                self.compile_expr(&ret.value)?;
                self.emit(Opcode::ReturnValue, &[]);
                Ok(())
            }
            Stmt::Expr(expr_stmt) => {
                self.compile_expr(&expr_stmt.expr)?;
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
        }
    }

    /// The value is compiled before the name is bound, so `let x = x` sees
    /// the outer `x`. A function sees itself through its own name instead.
    fn compile_let(&mut self, let_stmt: &LetStmt) -> Result<(), CompileError> {
        self.compile_expr(&let_stmt.value)?;

        let symbol = self.symbol_table.define(&let_stmt.name.name);
        match symbol.scope {
            SymbolScope::Global => {
                let index = check_operand("globals", symbol.index, MAX_U16_OPERAND, let_stmt.span)?;
                self.emit(Opcode::SetGlobal, &[index]);
            }
            _ => {
                let index = check_operand("locals", symbol.index, MAX_U8_OPERAND, let_stmt.span)?;
                self.emit(Opcode::SetLocal, &[index]);
            }
        }
        Ok(())
    }

    pub(super) fn compile_block(&mut self, block: &Block) -> Result<(), CompileError> {
        for stmt in &block.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }
}
