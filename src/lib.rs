//! Lowering of a checked, object-oriented program into linear three-address code.
pub mod ast;
pub mod ext;
pub mod il;
pub mod listing;
pub mod span;
pub mod symbols;

#[cfg(test)]
mod test_utils;
