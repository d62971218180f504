//! Expression evaluation

use crate::ast::*;
use crate::interpreter::{ControlFlow, Environment, EvalResult, Interpreter};
use crate::span::Span;
use crate::stdlib;
use crate::value::{self, Function, RuntimeError, Value};
use std::rc::Rc;

/// Native stack that must remain before evaluating a nested expression
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each stack segment allocated once the red zone is reached
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

impl Interpreter {
    /// Evaluate an expression
    ///
    /// Monkey calls recurse on the native stack, which is grown on demand so
    /// that `max_depth` is reached before the host thread's stack runs out.
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.eval_expr_inner(expr))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(lit, _) => Ok(eval_literal(lit)),
            Expr::Identifier(ident) => self.eval_identifier(ident),
            Expr::Unary(unary) => {
                let operand = self.eval_expr(&unary.expr)?;
                Ok(value::unary_op(unary.op, &operand, unary.span)?)
            }
            Expr::Binary(binary) => {
                let left = self.eval_expr(&binary.left)?;
                let right = self.eval_expr(&binary.right)?;
                Ok(value::binary_op(binary.op, &left, &right, binary.span)?)
            }
            Expr::If(if_expr) => {
                let condition = self.eval_expr(&if_expr.condition)?;
                if condition.is_truthy() {
                    self.eval_block(&if_expr.consequence)
                } else if let Some(alternative) = &if_expr.alternative {
                    self.eval_block(alternative)
                } else {
                    Ok(Value::NULL)
                }
            }
            Expr::Function(func) => Ok(Value::Function(Rc::new(Function {
                name: func.name.clone(),
                params: func.params.clone(),
                body: func.body.clone(),
                env: Rc::clone(&self.env),
            }))),
            Expr::Call(call) => self.eval_call(call),
            Expr::ArrayLiteral(array) => {
                let elements = array
                    .elements
                    .iter()
                    .map(|element| self.eval_expr(element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(elements))
            }
            Expr::Index(index) => {
                let target = self.eval_expr(&index.target)?;
                let position = self.eval_expr(&index.index)?;
                Ok(value::index_value(&target, &position, index.span)?)
            }
        }
    }

    /// Environment first, then the builtin registry
    fn eval_identifier(&self, ident: &Identifier) -> EvalResult {
        if let Some(value) = self.env.borrow().get(&ident.name) {
            return Ok(value);
        }
        if let Some(builtin) = stdlib::lookup(&ident.name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(RuntimeError::UndefinedIdentifier {
            name: ident.name.clone(),
            span: ident.span,
        }
        .into())
    }

    fn eval_call(&mut self, call: &CallExpr) -> EvalResult {
        let callee = self.eval_expr(&call.callee)?;
        let args = call
            .args
            .iter()
            .map(|arg| self.eval_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match callee {
            Value::Function(func) => self.call_function(&func, args, call.span),
            Value::Builtin(builtin) => Ok(builtin.invoke(&args, &self.output_writer, call.span)),
            other => Err(RuntimeError::NotCallable {
                callee: other.type_name(),
                span: call.span,
            }
            .into()),
        }
    }

    /// Run a function body in a fresh environment enclosed by the one the
    /// function was created in
    fn call_function(&mut self, func: &Function, args: Vec<Value>, span: Span) -> EvalResult {
        if args.len() != func.params.len() {
            return Err(RuntimeError::WrongArity {
                expected: func.params.len(),
                got: args.len(),
                span,
            }
            .into());
        }
        if self.depth >= self.config.max_depth {
            return Err(RuntimeError::FrameOverflow {
                max: self.config.max_depth,
                span,
            }
            .into());
        }

        let call_env = Environment::enclosed(Rc::clone(&func.env));
        {
            let mut env = call_env.borrow_mut();
            for (param, arg) in func.params.iter().zip(args) {
                env.set(param.name.as_str(), arg);
            }
        }

        let caller_env = std::mem::replace(&mut self.env, call_env);
        self.depth += 1;
        let result = self.eval_block(&func.body);
        self.depth -= 1;
        self.env = caller_env;

        match result {
            Err(ControlFlow::Return(value)) => Ok(value),
            other => other,
        }
    }
}

fn eval_literal(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(n) => Value::Integer(*n),
        Literal::String(s) => Value::string(s.as_str()),
        Literal::Bool(b) => Value::from_bool(*b),
    }
}
