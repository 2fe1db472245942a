//! Symbols, scopes and storage layout, as recorded by the type checker.
//!
//! The generator only reads from these structures. They also expose the operations the type
//! checker uses to populate them, so that a front end (or a test) can describe a checked
//! program without going through a parser.
mod activation_record;
mod error;
mod symbol;
mod table;
mod types;

pub use activation_record::*;
pub use error::LookupError;
pub use symbol::*;
pub use table::SymbolTable;
pub use types::Type;
