#![forbid(unsafe_code)]
//! Weft Workflow Language Compiler
//!
//! Weft is an indentation-structured language for wiring services into
//! event-driven workflows. This crate provides the compiler front end:
//! grammar generation, the scanner and LR engine, the indentation pass, tree
//! normalization, and the semantic lowering into the flat line-record JSON
//! artifact that execution engines consume.
//!
//! ## Panic Policy
//!
//! Compilation failures are [`diagnostics::CompileError`] values propagated
//! with `?`; nothing in the pipeline panics on bad stories. Tree shapes the
//! grammar guarantees are still checked and surface as the `internal` error
//! code rather than unwraps. The `cli` module additionally enforces
//! `#![deny(clippy::unwrap_used)]`. The sole non-test `expect` is the
//! compile-time-constant interpolation regex. Tests unwrap freely.

pub mod app;
pub mod backend;
pub mod cli;
pub mod frontend;
pub mod version;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::lexer;
pub use frontend::parser;

pub use backend::{Artifact, Compiler};
pub use frontend::Parser;
pub use version::WEFT_VERSION;
