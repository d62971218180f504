//! Diagnostic system for errors
//!
//! Lexer, parser, compiler, VM and evaluator failures are all reported
//! through the unified `Diagnostic` type, so the CLI and REPL can format
//! them the same way regardless of which stage produced them.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic schema version
pub const DIAG_VERSION: u32 = 1;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Error that prevents the program from running
    Error,
    /// Informational warning
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic schema version
    pub diag_version: u32,
    /// Severity level
    pub level: DiagnosticLevel,
    /// Error code (e.g., "MK0001")
    pub code: String,
    /// Main diagnostic message
    pub message: String,
    /// File path
    pub file: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Length of error span
    pub length: usize,
    /// Source line string
    pub snippet: String,
    /// Short label for caret range
    pub label: String,
    /// Additional notes (optional)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
    /// Suggested fix (optional)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic with code
    pub fn error_with_code(
        code: impl Into<String>,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        let code = code.into();
        let help = error_codes::help_for(&code).map(str::to_string);
        Self {
            diag_version: DIAG_VERSION,
            level: DiagnosticLevel::Error,
            code,
            message: message.into(),
            file: "<input>".to_string(),
            line: span.line.max(1) as usize,
            column: span.column.max(1) as usize,
            length: span.len(),
            snippet: String::new(),
            label: String::new(),
            notes: Vec::new(),
            help,
        }
    }

    /// Create a new error diagnostic (uses generic error code)
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::error_with_code(error_codes::GENERIC_ERROR, message, span)
    }

    /// Set the file path
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Set the snippet (source line)
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Fill the snippet from the full source text using the diagnostic's line
    pub fn with_source(self, source: &str) -> Self {
        match source.lines().nth(self.line.saturating_sub(1)) {
            Some(line) => {
                let line = line.to_string();
                self.with_snippet(line)
            }
            None => self,
        }
    }

    /// Set the label (caret description)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a help message
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Format as human-readable string
    pub fn to_human_string(&self) -> String {
        let mut output = String::new();

        // Header: error[MK0100]: undefined variable: x
        output.push_str(&format!(
            "{}[{}]: {}\n",
            self.level, self.code, self.message
        ));

        // Location: --> script.mk:3:9
        output.push_str(&format!(
            "  --> {}:{}:{}\n",
            self.file, self.line, self.column
        ));

        if !self.snippet.is_empty() {
            output.push_str("   |\n");
            output.push_str(&format!("{:>2} | {}\n", self.line, self.snippet));

            if self.length > 0 {
                let padding = " ".repeat(self.column.saturating_sub(1));
                let carets = "^".repeat(self.length);
                output.push_str(&format!("   | {}{}", padding, carets));

                if !self.label.is_empty() {
                    output.push_str(&format!(" {}", self.label));
                }
                output.push('\n');
            }
        }

        for note in &self.notes {
            output.push_str(&format!("   = note: {}\n", note));
        }

        if let Some(help) = &self.help {
            output.push_str(&format!("   = help: {}\n", help));
        }

        output
    }

    /// Format as JSON string
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.level, self.code, self.message)
    }
}

/// Error code registry
///
/// Ranges:
/// - MK00xx: lexer errors
/// - MK01xx: parser errors
/// - MK02xx: compile errors
/// - MK03xx: runtime errors
/// - MK9xxx: internal errors
pub mod error_codes {
    // MK00xx - Lexer Errors
    pub const ILLEGAL_CHARACTER: &str = "MK0001";
    pub const UNTERMINATED_STRING: &str = "MK0002";
    pub const INVALID_NUMBER: &str = "MK0003";
    pub const INVALID_ESCAPE: &str = "MK0004";

    // MK01xx - Parser Errors
    pub const UNEXPECTED_TOKEN: &str = "MK0101";
    pub const NO_PREFIX_PARSE: &str = "MK0102";

    // MK02xx - Compile Errors
    pub const UNDEFINED_VARIABLE: &str = "MK0201";
    pub const UNKNOWN_OPERATOR: &str = "MK0202";
    pub const OPERAND_OVERFLOW: &str = "MK0203";

    // MK03xx - Runtime Errors
    pub const TYPE_MISMATCH: &str = "MK0301";
    pub const DIVIDE_BY_ZERO: &str = "MK0302";
    pub const STACK_OVERFLOW: &str = "MK0303";
    pub const FRAME_OVERFLOW: &str = "MK0304";
    pub const NOT_CALLABLE: &str = "MK0305";
    pub const ARITY_MISMATCH: &str = "MK0306";
    pub const NOT_INDEXABLE: &str = "MK0307";
    pub const UNDEFINED_IDENTIFIER: &str = "MK0308";

    // MK9xxx - Internal Errors
    pub const INTERNAL_ERROR: &str = "MK9997";
    pub const UNKNOWN_OPCODE: &str = "MK9998";
    pub const GENERIC_ERROR: &str = "MK9999";

    /// Short remediation hint for codes that have one
    pub fn help_for(code: &str) -> Option<&'static str> {
        match code {
            UNTERMINATED_STRING => Some("close the string with a matching `\"`"),
            UNDEFINED_VARIABLE | UNDEFINED_IDENTIFIER => {
                Some("bind the name with `let` before using it")
            }
            ARITY_MISMATCH => Some("pass exactly as many arguments as the function declares"),
            DIVIDE_BY_ZERO => Some("check the divisor before dividing"),
            FRAME_OVERFLOW => Some("make sure recursive calls reach a base case"),
            UNKNOWN_OPCODE => Some("the bytecode is corrupt; this is a compiler bug"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::error("test error", Span::new(0, 5));
        assert_eq!(diag.level, DiagnosticLevel::Error);
        assert_eq!(diag.message, "test error");
        assert_eq!(diag.code, error_codes::GENERIC_ERROR);
        assert_eq!(diag.length, 5);
    }

    #[test]
    fn test_registry_help_is_attached() {
        let diag = Diagnostic::error_with_code(
            error_codes::UNDEFINED_VARIABLE,
            "undefined variable: x",
            Span::new(4, 5),
        );
        assert!(diag.help.is_some());
    }

    #[test]
    fn test_human_format() {
        let diag = Diagnostic::error_with_code(
            error_codes::TYPE_MISMATCH,
            "unsupported types for +: INTEGER and STRING",
            Span::with_position(8, 15, 2, 9),
        )
        .with_file("test.mk")
        .with_source("let a = 1;\nlet b = 1 + \"x\";")
        .with_label("here");

        let output = diag.to_human_string();
        assert!(output.contains("error[MK0301]"));
        assert!(output.contains("test.mk:2:9"));
        assert!(output.contains("let b = 1 + \"x\";"));
        assert!(output.contains("^^^^^^^ here"));
    }

    #[test]
    fn test_json_format() {
        let diag = Diagnostic::error_with_code("MK0101", "unexpected token", Span::new(0, 1));
        let json = diag.to_json_string().unwrap();
        assert!(json.contains("\"level\": \"error\""));
        assert!(json.contains("\"code\": \"MK0101\""));
        assert!(!json.contains("\"notes\""));
    }
}
