//! Weft Compiler Backend
//!
//! This module lowers the normalized parse tree into the flat line-record
//! artifact that engines consume.
//!
//! The pipeline is:
//! 1. Normalized tree from frontend → preprocessor → semantic compiler
//! 2. Statements resolve into value objects (`values`) and line records
//!    collected by the store (`lines`)
//! 3. The store finalizes into an [`Artifact`] with its service, module and
//!    function tables
//!
//! ## Module Organization
//!
//! - `values.rs` - Literal and expression resolution into tagged values
//! - `lines.rs` - The line store, record shape and finished artifact
//! - `preprocessor.rs` - Tree-to-tree pass seam run before lowering
//! - `compiler.rs` - The recursive descent that emits line records

pub mod compiler;
pub mod lines;
pub mod preprocessor;
pub mod values;

pub use compiler::Compiler;
pub use lines::{Artifact, Line, Lines, Method};
pub use preprocessor::{Identity, Preprocessor};
pub use values::{PathSegment, Value, ValueObject};
