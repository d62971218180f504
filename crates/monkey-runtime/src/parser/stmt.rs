//! Statement parsing

use crate::ast::*;
use crate::parser::Parser;
use crate::token::TokenKind;

impl Parser {
    /// Parse a statement
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ()> {
        match self.peek().kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            _ => self.parse_expr_stmt(),
        }
    }

    /// `let <ident> = <expr>;`
    fn parse_let(&mut self) -> Result<Stmt, ()> {
        let start = self.consume(TokenKind::Let)?.span;
        let name = self.consume_identifier("a variable name")?;
        self.consume(TokenKind::Assign)?;

        let mut value = self.parse_expression()?;
        // Named function literals can refer to themselves without a capture
        if let Expr::Function(func) = &mut value {
            func.name = Some(name.name.clone());
        }

        let end = self.statement_end(value.span());
        Ok(Stmt::Let(LetStmt {
            name,
            value,
            span: start.merge(end),
        }))
    }

    /// `return <expr>;`
    fn parse_return(&mut self) -> Result<Stmt, ()> {
        let start = self.consume(TokenKind::Return)?.span;
        let value = self.parse_expression()?;
        let end = self.statement_end(value.span());
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: start.merge(end),
        }))
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ()> {
        let expr = self.parse_expression()?;
        let span = self.statement_end(expr.span());
        Ok(Stmt::Expr(ExprStmt {
            span: expr.span().merge(span),
            expr,
        }))
    }

    /// Consume an optional trailing `;`, returning the span the statement ends at
    fn statement_end(&mut self, fallback: crate::span::Span) -> crate::span::Span {
        if self.check(TokenKind::Semicolon) {
            self.advance().span
        } else {
            fallback
        }
    }

    /// `{ <stmt>* }`
    pub(super) fn parse_block(&mut self) -> Result<Block, ()> {
        let start = self.consume(TokenKind::LeftBrace)?.span;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        let end = self.consume(TokenKind::RightBrace)?.span;
        Ok(Block {
            statements,
            span: start.merge(end),
        })
    }
}
