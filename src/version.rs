//! Compiler version metadata.
//!
//! A single constant read from Cargo metadata at compile time, so the CLI
//! banner and the artifact's `version` field can never disagree.

/// The weft compiler version string (for example, `0.1.0-alpha.1`).
///
/// Stamped into every compiled artifact as its `version` field.
pub const WEFT_VERSION: &str = env!("CARGO_PKG_VERSION");
