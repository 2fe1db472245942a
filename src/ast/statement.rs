//! Statement nodes.
use crate::span::Span;

use super::{Expr, Literal};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}
impl Program {
    pub fn new() -> Self {
        Self { statements: vec![] }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub stmt_kind: StmtKind,
    pub span: Span,
}
impl Statement {
    pub fn new(stmt_kind: StmtKind, span: Span) -> Self {
        Self { stmt_kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl(VarDecl),
    Assign(Assign),
    /// An expression evaluated for its side effects.
    Evaluate(Expr),
    Print(Expr),
    Block(Block),
    If(If),
    While(While),
    DoWhile(DoWhile),
    For(For),
    Break,
    Continue,
    Switch(Switch),
    Return(Option<Expr>),
    FuncDef(FuncDef),
    ClassDef(ClassDef),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}
impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

/// A `let`/`var` or `const` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Option<Expr>,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expr,
    pub body: Block,
    pub else_body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhile {
    pub body: Block,
    pub condition: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub init: Option<Box<Statement>>,
    /// A missing condition loops forever.
    pub condition: Option<Expr>,
    pub step: Option<Box<Statement>>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub scrutinee: Expr,
    pub cases: Vec<Case>,
    pub default: Option<Vec<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Literal,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

/// A class declaration. Field layout comes from the symbol table, so only the base class and
/// the method bodies are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub base: Option<String>,
    pub methods: Vec<FuncDef>,
}
