//! Front-end orchestration.
//!
//! [`Parser`] wires the stages together: grammar text, engine construction,
//! scanning, the indentation pass, the LR drive and tree normalization.
//! Every call builds its engine from scratch; nothing is cached between
//! parses, so a grammar override on disk takes effect immediately.

use std::fs;
use std::path::PathBuf;

use crate::frontend::ast::Tree;
use crate::frontend::diagnostics::{self, CompileError, CompileResult};
use crate::frontend::engine::Engine;
use crate::frontend::grammar;
use crate::frontend::lexer::indent::Indenter;
use crate::frontend::lexer::Token;
use crate::frontend::normalizer;

// ============================================================================
// PARSER
// ============================================================================

/// Entry point for turning source text into a normalized tree.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    /// Replaces the built-in grammar verbatim when set.
    ebnf_file: Option<PathBuf>,
}

impl Parser {
    pub fn new() -> Parser {
        Parser { ebnf_file: None }
    }

    /// Use the grammar in `path` instead of the built-in one.
    ///
    /// The file contents are handed to the engine untouched, so the same
    /// meta-grammar notation applies.
    pub fn with_ebnf_file(path: impl Into<PathBuf>) -> Parser {
        Parser {
            ebnf_file: Some(path.into()),
        }
    }

    /// Parse `source` into a normalized tree.
    ///
    /// A terminating newline is appended so the last statement always closes.
    /// Blank input short-circuits to an empty tree without building an
    /// engine. With `debug` set, syntax errors propagate as structured
    /// values; with it clear they are rendered against the source and the
    /// process exits non-zero.
    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    pub fn parse(&self, source: &str, debug: bool) -> CompileResult<Tree> {
        if source.trim().is_empty() {
            return Ok(Tree::empty());
        }
        let terminated = format!("{source}\n");
        match self.parse_source(&terminated) {
            Err(error) if error.is_syntax() && !debug => diagnostics::abort(source, &error),
            result => result,
        }
    }

    fn parse_source(&self, source: &str) -> CompileResult<Tree> {
        let engine = Engine::new(&self.grammar_text()?)?;
        let tokens = Indenter::new().process(engine.tokenize(source)?)?;
        let raw = engine.parse(tokens)?;
        normalizer::normalize(raw)
    }

    /// Scan `source` into its token stream, indentation pass included.
    ///
    /// No newline is appended and no grammar reduction happens; this is the
    /// inspection surface behind `weft lex`.
    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    pub fn lex(&self, source: &str) -> CompileResult<Vec<Token>> {
        let engine = Engine::new(&self.grammar_text()?)?;
        Indenter::new().process(engine.tokenize(source)?)
    }

    fn grammar_text(&self) -> CompileResult<String> {
        match &self.ebnf_file {
            Some(path) => fs::read_to_string(path).map_err(|err| {
                CompileError::grammar(format!(
                    "can't read grammar file `{}`: {err}",
                    path.display()
                ))
            }),
            None => Ok(grammar::weft_grammar()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
