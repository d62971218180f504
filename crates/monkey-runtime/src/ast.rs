//! Abstract Syntax Tree (AST) definitions
//!
//! The AST is produced by the parser and consumed, unchanged, by both the
//! bytecode compiler and the tree-walking evaluator. Every node carries the
//! span of the source it came from.
//!
//! `Display` renders the canonical fully-parenthesized form, which is what
//! parser tests compare against.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// AST schema version for JSON dumps
pub const AST_VERSION: u32 = 1;

/// Top-level program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Versioned AST wrapper for JSON serialization
///
/// Tooling (`monkey ast`) dumps this form so consumers can check the schema
/// version before reading the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedProgram {
    /// AST schema version
    pub ast_version: u32,
    /// The actual program AST
    #[serde(flatten)]
    pub program: Program,
}

impl VersionedProgram {
    pub fn new(program: Program) -> Self {
        Self {
            ast_version: AST_VERSION,
            program,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Program> for VersionedProgram {
    fn from(program: Program) -> Self {
        Self::new(program)
    }
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Let(LetStmt),
    Return(ReturnStmt),
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Expr(s) => s.span,
        }
    }
}

/// `let name = value;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetStmt {
    pub name: Identifier,
    pub value: Expr,
    pub span: Span,
}

/// `return value;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Expr,
    pub span: Span,
}

/// Expression evaluated for its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// Brace-delimited statement list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal, Span),
    Identifier(Identifier),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    If(IfExpr),
    Function(FunctionLiteral),
    Call(CallExpr),
    ArrayLiteral(ArrayLiteral),
    Index(IndexExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, span) => *span,
            Expr::Identifier(ident) => ident.span,
            Expr::Unary(u) => u.span,
            Expr::Binary(b) => b.span,
            Expr::If(i) => i.span,
            Expr::Function(f) => f.span,
            Expr::Call(c) => c.span,
            Expr::ArrayLiteral(a) => a.span,
            Expr::Index(i) => i.span,
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Negate,
    /// `!x`
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
    pub span: Span,
}

/// Infix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

/// `if (condition) { ... } else { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfExpr {
    pub condition: Box<Expr>,
    pub consequence: Block,
    pub alternative: Option<Block>,
    pub span: Span,
}

/// `fn(params) { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionLiteral {
    /// Binding name when the literal is the value of a `let`
    pub name: Option<String>,
    pub params: Vec<Identifier>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayLiteral {
    pub elements: Vec<Expr>,
    pub span: Span,
}

/// `target[index]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpr {
    pub target: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

// === Canonical rendering ===

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let(s) => write!(f, "let {} = {};", s.name.name, s.value),
            Stmt::Return(s) => write!(f, "return {};", s.value),
            Stmt::Expr(s) => write!(f, "{}", s.expr),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

impl BinaryOp {
    /// Source spelling of the operator
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Integer(n), _) => write!(f, "{}", n),
            Expr::Literal(Literal::String(s), _) => write!(f, "{:?}", s),
            Expr::Literal(Literal::Bool(b), _) => write!(f, "{}", b),
            Expr::Identifier(ident) => write!(f, "{}", ident.name),
            Expr::Unary(u) => write!(f, "({}{})", u.op, u.expr),
            Expr::Binary(b) => write!(f, "({} {} {})", b.left, b.op, b.right),
            Expr::If(i) => {
                write!(f, "if {} {}", i.condition, i.consequence)?;
                if let Some(alt) = &i.alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Expr::Function(func) => {
                write!(f, "fn")?;
                if let Some(name) = &func.name {
                    write!(f, "<{}>", name)?;
                }
                let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "({}) {}", params.join(", "), func.body)
            }
            Expr::Call(c) => {
                write!(f, "{}(", c.callee)?;
                write_list(f, &c.args)?;
                write!(f, ")")
            }
            Expr::ArrayLiteral(a) => {
                write!(f, "[")?;
                write_list(f, &a.elements)?;
                write!(f, "]")
            }
            Expr::Index(i) => write!(f, "({}[{}])", i.target, i.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier {
            name: name.to_string(),
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_let_statement_rendering() {
        let program = Program {
            statements: vec![Stmt::Let(LetStmt {
                name: ident("myVar"),
                value: Expr::Identifier(ident("anotherVar")),
                span: Span::dummy(),
            })],
        };
        assert_eq!(program.to_string(), "let myVar = anotherVar;");
    }

    #[test]
    fn test_versioned_program_json_roundtrip() {
        let program = Program {
            statements: vec![Stmt::Expr(ExprStmt {
                expr: Expr::Binary(BinaryExpr {
                    op: BinaryOp::Add,
                    left: Box::new(Expr::Literal(Literal::Integer(1), Span::dummy())),
                    right: Box::new(Expr::Literal(Literal::Integer(2), Span::dummy())),
                    span: Span::dummy(),
                }),
                span: Span::dummy(),
            })],
        };
        let versioned = VersionedProgram::new(program.clone());
        let json = versioned.to_json().unwrap();
        assert!(json.contains("\"ast_version\": 1"));

        let back = VersionedProgram::from_json(&json).unwrap();
        assert_eq!(back.program, program);
    }
}
