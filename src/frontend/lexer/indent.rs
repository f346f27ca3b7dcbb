//! Indentation handling for the Weft lexer.
//!
//! Implements INDENT/DEDENT synthesis as a pass over the scanner's token
//! stream. The `_NL` terminal carries each newline run together with its
//! trailing indentation; this pass compares that indentation against a depth
//! stack and emits `_INDENT`/`_DEDENT` tokens after the `_NL`.

use super::tokens::Token;
use crate::frontend::diagnostics::{CompileError, CompileResult};

pub const INDENT: &str = "_INDENT";
pub const DEDENT: &str = "_DEDENT";
const NEWLINE: &str = "_NL";

/// Indentation tracker, seeded at depth 0. Fresh per parse; no state
/// survives a call.
pub struct Indenter {
    stack: Vec<usize>,
}

impl Indenter {
    pub fn new() -> Indenter {
        Indenter { stack: vec![0] }
    }

    /// Rewrite `tokens`, inserting `_INDENT`/`_DEDENT` around `_NL` tokens
    /// and closing every open level at end of stream.
    ///
    /// Synthetic tokens carry the line the indented content starts on.
    pub fn process(mut self, tokens: Vec<Token>) -> CompileResult<Vec<Token>> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut current_line = 1;
        for token in tokens {
            if token.kind == NEWLINE {
                let width = indent_width(&token.text);
                let line = token.line + newline_count(&token.text);
                current_line = line;
                out.push(token);
                self.balance(width, line, &mut out)?;
            } else {
                current_line = token.line;
                out.push(token);
            }
        }
        while self.stack.len() > 1 {
            self.stack.pop();
            out.push(Token::new(DEDENT, "", current_line, 1));
        }
        Ok(out)
    }

    fn balance(&mut self, width: usize, line: u32, out: &mut Vec<Token>) -> CompileResult<()> {
        let top = self.stack.last().copied().unwrap_or(0);
        if width > top {
            self.stack.push(width);
            out.push(Token::new(INDENT, "", line, 1));
            return Ok(());
        }
        while width < self.stack.last().copied().unwrap_or(0) && self.stack.len() > 1 {
            self.stack.pop();
            out.push(Token::new(DEDENT, "", line, 1));
        }
        let top = self.stack.last().copied().unwrap_or(0);
        if width != top {
            return Err(CompileError::Indentation { line, expected: top, found: width });
        }
        Ok(())
    }
}

impl Default for Indenter {
    fn default() -> Self {
        Indenter::new()
    }
}

/// Width of the indentation after the token's last newline. Tabs count 4
/// columns.
fn indent_width(text: &str) -> usize {
    let tail = match text.rfind('\n') {
        Some(i) => &text[i + 1..],
        None => text,
    };
    let mut width = 0;
    for c in tail.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
    }
    width
}

fn newline_count(text: &str) -> u32 {
    text.matches('\n').count() as u32
}
