//! Intermediate code generation.
//!
//! The [`generate`] entry point walks a checked program and drives a [`TacBuilder`], which
//! appends three-address [`Quadruple`]s to a flat listing. Temporaries are recycled through a
//! [`TempAllocator`] and jump targets come from a [`LabelManager`].
mod builder;
mod error;
mod generator;
mod label_manager;
mod tac;
mod temp_allocator;

pub use builder::*;
pub use error::*;
pub use generator::generate;
pub use label_manager::LabelManager;
pub use tac::*;
pub use temp_allocator::TempAllocator;
