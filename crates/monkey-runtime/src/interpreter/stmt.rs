//! Statement evaluation

use crate::ast::{Block, Stmt};
use crate::interpreter::{ControlFlow, EvalResult, Interpreter};
use crate::value::Value;

impl Interpreter {
    /// Evaluate a statement
    ///
    /// `let` yields null; the value is only observable through the name.
    pub(super) fn eval_statement(&mut self, stmt: &Stmt) -> EvalResult {
        match stmt {
            Stmt::Let(let_stmt) => {
                let value = self.eval_expr(&let_stmt.value)?;
                self.env.borrow_mut().set(let_stmt.name.name.as_str(), value);
                Ok(Value::NULL)
            }
            Stmt::Return(ret) => {
                let value = self.eval_expr(&ret.value)?;
                Err(ControlFlow::Return(value))
            }
            Stmt::Expr(expr_stmt) => self.eval_expr(&expr_stmt.expr),
        }
    }

    /// Evaluate a block in the current environment
    ///
    /// Blocks do not open a scope; only function calls do.
    pub(super) fn eval_block(&mut self, block: &Block) -> EvalResult {
        let mut last_value = Value::NULL;
        for stmt in &block.statements {
            last_value = self.eval_statement(stmt)?;
        }
        Ok(last_value)
    }
}
