//! CLI module for the weft compiler
//!
//! ## Commands
//!
//! - `compile [PATH] [OUTPUT]` - Compile stories, optionally emitting the
//!   artifact JSON
//! - `lex [PATH]` - Print the token stream of each story
//! - `grammar` - Print the grammar the parser is built from
//!
//! ## Design
//!
//! Argument parsing is clap's derive layer. Command functions report
//! failures as [`CliError`] instead of exiting; `run()` prints the message
//! and sets the exit status. The one exit outside this layer is the
//! pretty-diagnostic abort for story syntax errors, which renders against
//! the source before terminating.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::version::WEFT_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// A failed command: the message lands on stderr and the process exits
/// nonzero.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
}

impl CliError {
    pub fn failure(message: impl Into<String>) -> Self {
        CliError { message: message.into() }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The weft workflow language compiler
#[derive(Parser, Debug)]
#[command(name = "weft", display_name = "Weft")]
#[command(version = WEFT_VERSION)]
#[command(about = "The weft workflow language compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile stories and check their syntax
    Compile {
        /// Story file or directory of stories
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
        /// Write the artifact JSON here instead of stdout
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Print the compiled artifact as JSON
        #[arg(short = 'j', long)]
        json: bool,
        /// Suppress the success message
        #[arg(short = 's', long)]
        silent: bool,
        /// Report syntax errors as structured errors instead of the pretty
        /// diagnostic
        #[arg(long)]
        debug: bool,
        /// Load the grammar from a file instead of the built-in one
        #[arg(long = "ebnf-file", value_name = "FILE")]
        ebnf_file: Option<PathBuf>,
    },

    /// Print the token stream of each story
    Lex {
        /// Story file or directory of stories
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
        /// Load the grammar from a file instead of the built-in one
        #[arg(long = "ebnf-file", value_name = "FILE")]
        ebnf_file: Option<PathBuf>,
    },

    /// Print the grammar the parser is built from
    Grammar,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// The CLI layer's only `process::exit` site; command failures propagate
/// here as [`CliError`] and become stderr output plus a nonzero status.
pub fn run() {
    let cli = Cli::parse();
    if let Err(error) = execute(cli) {
        eprintln!("{error}");
        process::exit(1);
    }
}

fn execute(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Compile { path, output, json, silent, debug, ebnf_file } => {
            commands::compile(&path, output.as_deref(), json, silent, debug, ebnf_file.as_deref())
        }
        Command::Lex { path, ebnf_file } => commands::lex(&path, ebnf_file.as_deref()),
        Command::Grammar => commands::grammar(),
    }
}
