//! Parsing (tokens to AST)
//!
//! The parser converts a stream of tokens into an Abstract Syntax Tree (AST).
//! Uses Pratt parsing for expressions and recursive descent for statements.
//! Errors are collected rather than returned: after a failed statement the
//! parser resynchronizes at the next statement boundary and keeps going.

mod expr;
mod stmt;

use crate::ast::*;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::token::{Token, TokenKind};

/// Parser state for building AST from tokens
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) diagnostics: Vec<Diagnostic>,
}

/// Operator precedence levels for Pratt parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // ! -
    Call,        // ()
    Index,       // []
}

impl Parser {
    /// Create a new parser for the given tokens
    ///
    /// A missing trailing `Eof` token is tolerated.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse tokens into an AST
    pub fn parse(&mut self) -> (Program, Vec<Diagnostic>) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(_) => self.synchronize(),
            }
        }

        (Program { statements }, std::mem::take(&mut self.diagnostics))
    }

    // === Helper methods ===

    /// Advance to next token and return reference to previous
    pub(super) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Peek at current token
    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Check if current token matches kind
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    /// Match and consume token if it matches
    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume token of given kind or record an error
    pub(super) fn consume(&mut self, kind: TokenKind) -> Result<&Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().kind;
            self.error_with_code(
                error_codes::UNEXPECTED_TOKEN,
                &format!(
                    "expected '{}', found '{}'",
                    kind.as_str(),
                    found.as_str()
                ),
            );
            Err(())
        }
    }

    /// Consume an identifier token
    pub(super) fn consume_identifier(&mut self, context: &str) -> Result<Identifier, ()> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            Ok(Identifier {
                name: token.lexeme.clone(),
                span: token.span,
            })
        } else {
            let found = self.peek().kind;
            self.error_with_code(
                error_codes::UNEXPECTED_TOKEN,
                &format!("expected {} but found '{}'", context, found.as_str()),
            );
            Err(())
        }
    }

    /// Check if at end of token stream
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.tokens[self.current].kind == TokenKind::Eof
    }

    /// Record an error at the current token
    pub(super) fn error_with_code(&mut self, code: &str, message: &str) {
        let span = self.peek().span;
        self.diagnostics
            .push(Diagnostic::error_with_code(code, message, span).with_label("syntax error"));
    }

    /// Skip ahead to the next plausible statement start
    pub(super) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.tokens[self.current - 1].kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Let | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
