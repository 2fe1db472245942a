//! Expression nodes.
use std::fmt::{self, Display};

use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub expr_kind: ExprKind,
    pub span: Span,
}
impl Expr {
    pub fn new(expr_kind: ExprKind, span: Span) -> Self {
        Self { expr_kind, span }
    }
}
impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.expr_kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    This,
    Member(Box<MemberExpr>),
    Index(Box<IndexExpr>),
    FunctionCall(Box<FunCallExpr>),
    MethodCall(Box<MetCallExpr>),
    Unary(Box<UnExpr>),
    Binary(Box<BinExpr>),
    Ternary(Box<TerExpr>),
}
impl Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ExprKind::*;
        match self {
            Literal(lit) => write!(f, "{}", lit),
            Identifier(id) => write!(f, "{}", id),
            This => f.write_str("this"),
            Member(mem) => write!(f, "{}", mem),
            Index(idx) => write!(f, "{}", idx),
            FunctionCall(fun) => write!(f, "{}", fun),
            MethodCall(met) => write!(f, "{}", met),
            Binary(bin) => write!(f, "{}", bin),
            Unary(un) => write!(f, "{}", un),
            Ternary(ter) => write!(f, "{}", ter),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
}
impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Literal::*;
        match self {
            Integer(i) => write!(f, "{}", i),
            Boolean(true) => f.write_str("true"),
            Boolean(false) => f.write_str("false"),
            String(s) => write!(f, "\"{}\"", s),
            Null => f.write_str("null"),
        }
    }
}

/// A call of a free function by name.
#[derive(Debug, Clone, PartialEq)]
pub struct FunCallExpr {
    pub name: String,
    pub name_span: Span,
    pub args: Vec<Expr>,
}
impl Display for FunCallExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.name, join(&self.args))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetCallExpr {
    pub member: MemberExpr,
    pub args: Vec<Expr>,
}
impl Display for MetCallExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.member, join(&self.args))
    }
}

/// Property access, `lhs.rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub lhs: Expr,
    pub rhs: String,
}
impl Display for MemberExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.lhs, self.rhs)
    }
}

/// Element access, `lhs[rhs]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub lhs: Expr,
    pub rhs: Expr,
}
impl Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", self.lhs, self.rhs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnExpr {
    pub op: UnOp,
    pub rhs: Expr,
}
impl Display for UnExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}{})", self.op, self.rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Negate,
}
impl Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnOp::Not => f.write_str("!"),
            UnOp::Negate => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinExpr {
    pub lhs: Expr,
    pub op: BinOp,
    pub rhs: Expr,
}
impl Display for BinExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} {} {})", self.lhs, self.op, self.rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Equal,
    NotEqual,
    And,
    Or,
}
impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use BinOp::*;
        let ch = match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Remainder => "%",
            LessThan => "<",
            GreaterThan => ">",
            LessThanEqual => "<=",
            GreaterThanEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            And => "&&",
            Or => "||",
        };
        f.write_str(ch)
    }
}

/// The conditional expression, `condition ? then : otherwise`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerExpr {
    pub condition: Expr,
    pub then: Expr,
    pub otherwise: Expr,
}
impl Display for TerExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} ? {} : {})", self.condition, self.then, self.otherwise)
    }
}

fn join(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
