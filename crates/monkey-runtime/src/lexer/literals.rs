//! Literal scanning for the lexer

use crate::diagnostic::error_codes;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl Lexer {
    /// Scan a string literal; the token lexeme holds the unescaped contents
    pub(super) fn string(&mut self) -> Token {
        let mut value = String::new();
        let mut bad_escape = None;

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                self.advance();
                self.line += 1;
                self.column = 1;
                value.push('\n');
                continue;
            }

            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }

                let escape_char = self.advance();
                match escape_char {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    other => {
                        // keep scanning to the closing quote, report once
                        bad_escape.get_or_insert(other);
                    }
                }
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return self.error_token_with_code(
                error_codes::UNTERMINATED_STRING,
                "unterminated string literal",
            );
        }

        self.advance(); // closing "

        if let Some(c) = bad_escape {
            return self.error_token_with_code(
                error_codes::INVALID_ESCAPE,
                &format!("invalid escape sequence '\\{}'", c),
            );
        }

        self.make_token(TokenKind::String, &value)
    }

    /// Scan an integer literal
    ///
    /// A digit run glued to letters (`12ab`) is consumed whole and rejected,
    /// as is a literal that does not fit in a signed 64-bit integer.
    pub(super) fn number(&mut self) -> Token {
        let start = self.current - 1;

        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            self.advance();
        }

        let lexeme: String = self.chars[start..self.current].iter().collect();

        if !lexeme.bytes().all(|b| b.is_ascii_digit()) {
            return self.error_token_with_code(
                error_codes::INVALID_NUMBER,
                &format!("invalid number literal '{}'", lexeme),
            );
        }
        if lexeme.parse::<i64>().is_err() {
            return self.error_token_with_code(
                error_codes::INVALID_NUMBER,
                &format!("integer literal '{}' is out of range", lexeme),
            );
        }

        self.make_token(TokenKind::Int, &lexeme)
    }

    /// Scan an identifier or keyword
    pub(super) fn identifier(&mut self) -> Token {
        let start = self.current - 1;

        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let lexeme: String = self.chars[start..self.current].iter().collect();
        let kind = TokenKind::is_keyword(&lexeme).unwrap_or(TokenKind::Identifier);

        self.make_token(kind, &lexeme)
    }
}
