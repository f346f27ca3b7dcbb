//! Lexer for the Weft workflow language.
//!
//! Tokenization is driven by the grammar: every patterned terminal the
//! grammar declares becomes a matcher here, so the scanner and the parse
//! tables can never disagree about the token vocabulary.
//!
//! ## Module Structure
//!
//! - `tokens` - the Token type
//! - `indent` - INDENT/DEDENT synthesis from `_NL` tokens
//!
//! Matching is longest-match. Ties prefer literal terminals over regexp
//! terminals, then the earlier registration; this is what keeps `if` a
//! keyword while `iffy` stays a NAME, and `int` a TYPE while `integer`
//! stays a NAME.

pub mod indent;
pub mod tokens;

use regex::Regex;

use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::engine::meta::{ExpandedGrammar, Pattern};

pub use tokens::Token;

// ============================================================================
// SCANNER
// ============================================================================

/// Regex scanner compiled from the grammar's terminal declarations.
pub struct Scanner {
    terminals: Vec<CompiledTerminal>,
    ignores: Vec<Regex>,
}

struct CompiledTerminal {
    name: String,
    matcher: Matcher,
}

enum Matcher {
    Literal(String),
    Regex(Regex),
}

impl Scanner {
    /// Compile every patterned terminal. `%declare`d terminals have no
    /// pattern and are skipped; only the indentation pass produces them.
    pub fn new(grammar: &ExpandedGrammar) -> CompileResult<Scanner> {
        let mut terminals = Vec::new();
        for def in &grammar.terminals {
            let Some(pattern) = &def.pattern else { continue };
            let matcher = match pattern {
                Pattern::Literal(text) => Matcher::Literal(text.clone()),
                Pattern::Regex(pattern) => Matcher::Regex(compile_anchored(&def.name, pattern)?),
            };
            terminals.push(CompiledTerminal { name: def.name.clone(), matcher });
        }
        let mut ignores = Vec::new();
        for pattern in &grammar.ignores {
            ignores.push(compile_anchored("%ignore", pattern)?);
        }
        Ok(Scanner { terminals, ignores })
    }

    /// Tokenize `source`, skipping ignored spans.
    pub fn tokenize(&self, source: &str) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        let mut line: u32 = 1;
        let mut column: u32 = 1;
        while pos < source.len() {
            let rest = &source[pos..];
            if let Some((index, length)) = self.best_match(rest) {
                let text = &rest[..length];
                tokens.push(Token::new(self.terminals[index].name.clone(), text, line, column));
                advance(&mut line, &mut column, text);
                pos += length;
                continue;
            }
            if let Some(length) = self.ignored_prefix(rest) {
                advance(&mut line, &mut column, &rest[..length]);
                pos += length;
                continue;
            }
            return Err(CompileError::UnexpectedInput { line, column });
        }
        Ok(tokens)
    }

    /// Longest match wins; on equal length a literal beats a regexp, and an
    /// earlier registration beats a later one.
    fn best_match(&self, rest: &str) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, bool)> = None;
        for (index, terminal) in self.terminals.iter().enumerate() {
            let matched = match &terminal.matcher {
                Matcher::Literal(text) => {
                    rest.starts_with(text.as_str()).then(|| (text.len(), true))
                }
                Matcher::Regex(regex) => regex.find(rest).map(|m| (m.end(), false)),
            };
            let Some((length, literal)) = matched else { continue };
            if length == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_length, best_literal)) => {
                    length > best_length || (length == best_length && literal && !best_literal)
                }
            };
            if better {
                best = Some((index, length, literal));
            }
        }
        best.map(|(index, length, _)| (index, length))
    }

    fn ignored_prefix(&self, rest: &str) -> Option<usize> {
        self.ignores
            .iter()
            .filter_map(|regex| regex.find(rest))
            .map(|m| m.end())
            .filter(|&length| length > 0)
            .max()
    }
}

fn compile_anchored(name: &str, pattern: &str) -> CompileResult<Regex> {
    Regex::new(&format!(r"\A(?:{pattern})")).map_err(|err| {
        CompileError::grammar(format!("terminal `{name}` has an invalid pattern: {err}"))
    })
}

fn advance(line: &mut u32, column: &mut u32, text: &str) {
    for c in text.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}
