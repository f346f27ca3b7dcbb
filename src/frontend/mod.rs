//! Weft Compiler Frontend
//!
//! This module contains all frontend components:
//! - `lexer`: scanning and the indentation pass
//! - `engine`: the table-driven parsing engine and its meta-grammar
//! - `grammar`: the built-in language grammar
//! - `parser`: orchestration of the stages above
//! - `ast`: normalized tree definitions
//! - `normalizer`: raw parse tree to normalized tree
//! - `diagnostics`: error types and terminal rendering

pub mod ast;
pub mod diagnostics;
pub mod engine;
pub mod grammar;
pub mod lexer;
pub mod normalizer;
pub mod parser;

pub use ast::{Node, NodeKind, Tree};
pub use diagnostics::{CompileError, CompileResult};
pub use lexer::Token;
pub use parser::Parser;
