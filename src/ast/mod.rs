//! Abstract Syntax Tree definitions.
//!
//! The tree is produced by the parser and annotated by the type checker, whose findings live
//! in the [`crate::symbols::SymbolTable`]. Every node carries the [`crate::span::Span`] of the
//! source text it was parsed from.
mod expression;
mod statement;

pub use expression::*;
pub use statement::*;
