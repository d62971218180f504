//! Expression parsing (Pratt parsing)

use crate::ast::*;
use crate::diagnostic::error_codes;
use crate::parser::{Parser, Precedence};
use crate::token::{Token, TokenKind};

impl Parser {
    /// Parse an expression
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.parse_precedence(Precedence::Lowest)
    }

    /// Parse expression with given precedence
    pub(super) fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expr, ()> {
        let mut left = self.parse_prefix()?;

        while precedence < self.current_precedence() {
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    /// Parse prefix expression
    fn parse_prefix(&mut self) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::Int => self.parse_integer(),
            TokenKind::String => self.parse_string(),
            TokenKind::True | TokenKind::False => self.parse_bool(),
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::LeftParen => self.parse_group(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::Minus | TokenKind::Bang => self.parse_unary(),
            TokenKind::If => self.parse_if(),
            TokenKind::Fn => self.parse_function_literal(),
            other => {
                self.error_with_code(
                    error_codes::NO_PREFIX_PARSE,
                    &format!("no prefix parse function for '{}'", other.as_str()),
                );
                Err(())
            }
        }
    }

    /// Parse infix expression
    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::EqualEqual
            | TokenKind::BangEqual
            | TokenKind::Less
            | TokenKind::Greater => self.parse_binary(left),
            TokenKind::LeftParen => self.parse_call(left),
            TokenKind::LeftBracket => self.parse_index(left),
            _ => Ok(left),
        }
    }

    /// Get current token precedence
    pub(super) fn current_precedence(&self) -> Precedence {
        token_precedence(self.peek())
    }

    fn parse_integer(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let span = token.span;
        match token.lexeme.parse::<i64>() {
            Ok(value) => Ok(Expr::Literal(Literal::Integer(value), span)),
            Err(_) => {
                let message = format!("could not parse '{}' as integer", token.lexeme);
                self.diagnostics.push(crate::diagnostic::Diagnostic::error_with_code(
                    error_codes::INVALID_NUMBER,
                    message,
                    span,
                ));
                Err(())
            }
        }
    }

    fn parse_string(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let span = token.span;
        Ok(Expr::Literal(Literal::String(token.lexeme.clone()), span))
    }

    fn parse_bool(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let span = token.span;
        let value = token.kind == TokenKind::True;
        Ok(Expr::Literal(Literal::Bool(value), span))
    }

    fn parse_identifier(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        Ok(Expr::Identifier(Identifier {
            name: token.lexeme.clone(),
            span: token.span,
        }))
    }

    /// `( <expr> )` yields the inner expression; grouping is not a node
    fn parse_group(&mut self) -> Result<Expr, ()> {
        self.consume(TokenKind::LeftParen)?;
        let expr = self.parse_expression()?;
        self.consume(TokenKind::RightParen)?;
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ()> {
        let start = self.consume(TokenKind::LeftBracket)?.span;
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;
        let end = self.tokens[self.current - 1].span;

        Ok(Expr::ArrayLiteral(ArrayLiteral {
            elements,
            span: start.merge(end),
        }))
    }

    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let op_token = self.advance();
        let op_span = op_token.span;
        let op = match op_token.kind {
            TokenKind::Minus => UnaryOp::Negate,
            _ => UnaryOp::Not,
        };

        let expr = self.parse_precedence(Precedence::Prefix)?;
        let span = op_span.merge(expr.span());

        Ok(Expr::Unary(UnaryExpr {
            op,
            expr: Box::new(expr),
            span,
        }))
    }

    fn parse_binary(&mut self, left: Expr) -> Result<Expr, ()> {
        let op_token = self.advance().clone();
        let op = match op_token.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::EqualEqual => BinaryOp::Eq,
            TokenKind::BangEqual => BinaryOp::Ne,
            TokenKind::Less => BinaryOp::Lt,
            _ => BinaryOp::Gt,
        };

        // Left-associative: the right operand binds at this operator's level
        let precedence = token_precedence(&op_token);
        let right = self.parse_precedence(precedence)?;
        let span = left.span().merge(right.span());

        Ok(Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }))
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ()> {
        self.consume(TokenKind::LeftParen)?;
        let args = self.parse_expression_list(TokenKind::RightParen)?;
        let end = self.tokens[self.current - 1].span;
        let span = callee.span().merge(end);

        Ok(Expr::Call(CallExpr {
            callee: Box::new(callee),
            args,
            span,
        }))
    }

    fn parse_index(&mut self, target: Expr) -> Result<Expr, ()> {
        self.consume(TokenKind::LeftBracket)?;
        let index = self.parse_expression()?;
        let end = self.consume(TokenKind::RightBracket)?.span;
        let span = target.span().merge(end);

        Ok(Expr::Index(IndexExpr {
            target: Box::new(target),
            index: Box::new(index),
            span,
        }))
    }

    /// `if ( <condition> ) <block> [else <block>]`
    fn parse_if(&mut self) -> Result<Expr, ()> {
        let start = self.consume(TokenKind::If)?.span;
        self.consume(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen)?;

        let consequence = self.parse_block()?;
        let mut end = consequence.span;

        let alternative = if self.match_token(TokenKind::Else) {
            let block = self.parse_block()?;
            end = block.span;
            Some(block)
        } else {
            None
        };

        Ok(Expr::If(IfExpr {
            condition: Box::new(condition),
            consequence,
            alternative,
            span: start.merge(end),
        }))
    }

    /// `fn ( <params> ) <block>`
    fn parse_function_literal(&mut self) -> Result<Expr, ()> {
        let start = self.consume(TokenKind::Fn)?.span;
        self.consume(TokenKind::LeftParen)?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.consume_identifier("a parameter name")?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen)?;

        let body = self.parse_block()?;
        let span = start.merge(body.span);

        Ok(Expr::Function(FunctionLiteral {
            name: None,
            params,
            body,
            span,
        }))
    }

    /// Comma-separated expressions up to and including `end`
    fn parse_expression_list(&mut self, end: TokenKind) -> Result<Vec<Expr>, ()> {
        let mut items = Vec::new();

        if self.match_token(end) {
            return Ok(items);
        }

        loop {
            items.push(self.parse_expression()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.consume(end)?;
        Ok(items)
    }
}

/// Get precedence for a token
fn token_precedence(token: &Token) -> Precedence {
    match token.kind {
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
        TokenKind::Less | TokenKind::Greater => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash => Precedence::Product,
        TokenKind::LeftParen => Precedence::Call,
        TokenKind::LeftBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}
