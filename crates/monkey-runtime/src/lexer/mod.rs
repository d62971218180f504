//! Lexical analysis (tokenization)
//!
//! The lexer converts Monkey source code into a stream of tokens with span
//! information. It never stops at the first problem: unrecognized input
//! becomes an `Illegal` token plus a diagnostic, and scanning continues.

use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

mod literals;

/// Lexer state for tokenizing source code
pub struct Lexer {
    /// Original source code
    pub(super) source: String,
    /// Characters of source code
    pub(super) chars: Vec<char>,
    /// Current position in chars
    pub(super) current: usize,
    /// Byte offset of `current` in the source
    pub(super) byte_pos: usize,
    /// Current line number (1-indexed)
    pub(super) line: u32,
    /// Current column number (1-indexed)
    pub(super) column: u32,
    /// Start position of current token, in chars
    pub(super) start_pos: usize,
    /// Start of current token, in bytes
    pub(super) start_byte: usize,
    /// Start line of current token
    pub(super) start_line: u32,
    /// Start column of current token
    pub(super) start_column: u32,
    /// Collected diagnostics
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let chars: Vec<char> = source.chars().collect();
        Self {
            source,
            chars,
            current: 0,
            byte_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_byte: 0,
            start_line: 1,
            start_column: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the source code, returning tokens and any diagnostics
    ///
    /// The token stream always ends with exactly one `Eof` token.
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, std::mem::take(&mut self.diagnostics))
    }

    /// Scan the next token
    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.start_pos = self.current;
        self.start_byte = self.byte_pos;
        self.start_line = self.line;
        self.start_column = self.column;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }

        let c = self.advance();

        match c {
            '(' => self.make_token(TokenKind::LeftParen, "("),
            ')' => self.make_token(TokenKind::RightParen, ")"),
            '{' => self.make_token(TokenKind::LeftBrace, "{"),
            '}' => self.make_token(TokenKind::RightBrace, "}"),
            '[' => self.make_token(TokenKind::LeftBracket, "["),
            ']' => self.make_token(TokenKind::RightBracket, "]"),
            ';' => self.make_token(TokenKind::Semicolon, ";"),
            ',' => self.make_token(TokenKind::Comma, ","),
            '+' => self.make_token(TokenKind::Plus, "+"),
            '-' => self.make_token(TokenKind::Minus, "-"),
            '*' => self.make_token(TokenKind::Star, "*"),
            '/' => self.make_token(TokenKind::Slash, "/"),
            '<' => self.make_token(TokenKind::Less, "<"),
            '>' => self.make_token(TokenKind::Greater, ">"),
            '=' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::EqualEqual, "==")
                } else {
                    self.make_token(TokenKind::Assign, "=")
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::BangEqual, "!=")
                } else {
                    self.make_token(TokenKind::Bang, "!")
                }
            }
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            other => self.illegal(other),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.is_at_end() {
                return;
            }

            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    // === Character navigation ===

    /// Advance to next character and return it
    pub(super) fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        self.byte_pos += c.len_utf8();
        self.column += 1;
        c
    }

    /// Peek at current character without advancing
    pub(super) fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    /// Peek at next character (current + 1)
    pub(super) fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    /// Check if current character matches expected, and advance if so
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    /// Check if we've reached the end of source
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    // === Token creation ===

    fn current_span(&self) -> Span {
        Span::with_position(
            self.start_byte,
            self.byte_pos,
            self.start_line,
            self.start_column,
        )
    }

    /// Create a token with the given kind and lexeme
    pub(super) fn make_token(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, self.current_span())
    }

    /// Create an `Illegal` token and record a diagnostic with a specific code
    pub(super) fn error_token_with_code(&mut self, code: &str, message: &str) -> Token {
        let mut span = self.current_span();
        span.end = span.end.max(span.start + 1);

        let snippet = self.get_line_snippet(self.start_line);
        self.diagnostics.push(
            Diagnostic::error_with_code(code, message, span)
                .with_snippet(snippet)
                .with_label("lexer error"),
        );

        let lexeme: String = self.chars[self.start_pos..self.current].iter().collect();
        Token::new(TokenKind::Illegal, lexeme, span)
    }

    fn illegal(&mut self, c: char) -> Token {
        self.error_token_with_code(
            error_codes::ILLEGAL_CHARACTER,
            &format!("illegal character '{}'", c),
        )
    }

    /// Get the source line for a given line number
    fn get_line_snippet(&self, line: u32) -> String {
        self.source
            .lines()
            .nth(line.saturating_sub(1) as usize)
            .unwrap_or("")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diags) = Lexer::new(source).tokenize();
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            kinds("=+(){}[],;-!*/<> == !="),
            vec![
                TokenKind::Assign,
                TokenKind::Plus,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Minus,
                TokenKind::Bang,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_let_statement() {
        let (tokens, _) = Lexer::new("let five = 5;").tokenize();
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["let", "five", "=", "5", ";", ""]);
        assert_eq!(tokens[0].kind, TokenKind::Let);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Int);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("fn if else return true false"),
            vec![
                TokenKind::Fn,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Return,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_comment_is_skipped() {
        assert_eq!(
            kinds("1 // one\n2"),
            vec![TokenKind::Int, TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let (tokens, _) = Lexer::new("let a = 1;\n  a").tokenize();
        let last = &tokens[tokens.len() - 2];
        assert_eq!(last.lexeme, "a");
        assert_eq!(last.span.line, 2);
        assert_eq!(last.span.column, 3);
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let source = "\"héllo\" + x";
        let (tokens, diags) = Lexer::new(source).tokenize();
        assert!(diags.is_empty());
        assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 8));
        assert_eq!(&source[tokens[2].span.start..tokens[2].span.end], "x");
        // columns still count characters
        assert_eq!(tokens[2].span.column, 11);
    }

    #[test]
    fn test_illegal_character() {
        let (tokens, diags) = Lexer::new("1 @ 2").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, error_codes::ILLEGAL_CHARACTER);
        // scanning continues after the bad character
        assert_eq!(tokens[2].kind, TokenKind::Int);
    }
}
