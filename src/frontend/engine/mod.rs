//! Runtime parsing engine.
//!
//! `Engine::new` builds everything from grammar text: meta parse, repetition
//! expansion, scanner compilation and LR(1) table construction. Nothing is
//! cached between constructions; a defective grammar fails here, never
//! during a parse.
//!
//! `Engine::parse` runs the LR driver over an indentation-processed token
//! stream and produces raw rule-tagged nodes for the normalizer.

pub mod meta;
pub mod table;

use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::lexer::{Scanner, Token};

use self::table::{Action, Tables, END};

// ============================================================================
// RAW NODES
// ============================================================================

/// A node fresh off the LR driver: rule-tagged, pre-normalization. Raw nodes
/// exist only between the driver and the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub rule: String,
    pub children: Vec<RawChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawChild {
    Node(RawNode),
    Token(Token),
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    scanner: Scanner,
    tables: Tables,
}

impl Engine {
    pub fn new(grammar_text: &str) -> CompileResult<Engine> {
        let expanded = meta::parse(grammar_text)?.expand()?;
        let scanner = Scanner::new(&expanded)?;
        let tables = Tables::build(&expanded)?;
        Ok(Engine { scanner, tables })
    }

    pub fn tokenize(&self, source: &str) -> CompileResult<Vec<Token>> {
        self.scanner.tokenize(source)
    }

    /// Drive the parse over `tokens` plus a synthetic end marker.
    ///
    /// Reductions build raw nodes as they happen: tokens of `_`-prefixed
    /// terminals are dropped, children of `_`-tagged nodes splice into the
    /// parent, and aliased alternatives tag the node with their alias.
    pub fn parse(&self, tokens: Vec<Token>) -> CompileResult<RawNode> {
        let last_line = tokens.last().map(|t| t.line).unwrap_or(1);
        let end_sym = self.tables.symbols.end();

        let mut states: Vec<usize> = vec![0];
        let mut nodes: Vec<RawChild> = Vec::new();
        let mut stream = tokens.into_iter();
        let mut lookahead = stream.next();

        loop {
            let sym = match &lookahead {
                Some(token) => self.tables.symbols.id(&token.kind).ok_or_else(|| {
                    CompileError::internal(format!(
                        "scanner produced undeclared terminal `{}`",
                        token.kind
                    ))
                })?,
                None => end_sym,
            };
            let state = states.last().copied().unwrap_or(0);

            match self.tables.actions[state].get(&sym) {
                Some(&Action::Shift(target)) => {
                    states.push(target);
                    if let Some(token) = lookahead.take() {
                        nodes.push(RawChild::Token(token));
                    }
                    lookahead = stream.next();
                }
                Some(&Action::Reduce(index)) => {
                    let production = &self.tables.productions[index];
                    let arity = production.rhs.len();
                    let keep = nodes
                        .len()
                        .checked_sub(arity)
                        .ok_or_else(|| CompileError::internal("reduce over an empty node stack"))?;
                    let children = nodes.split_off(keep);
                    states.truncate(
                        states
                            .len()
                            .checked_sub(arity)
                            .ok_or_else(|| CompileError::internal("reduce over an empty state stack"))?,
                    );
                    let node = build_node(&production.tag, children);
                    let base = states.last().copied().unwrap_or(0);
                    let target = self.tables.gotos[base].get(&production.lhs).copied().ok_or_else(
                        || {
                            CompileError::internal(format!(
                                "missing goto for `{}` in state {base}",
                                self.tables.symbols.name(production.lhs)
                            ))
                        },
                    )?;
                    states.push(target);
                    nodes.push(RawChild::Node(node));
                }
                Some(&Action::Accept) => {
                    return match nodes.pop() {
                        Some(RawChild::Node(node)) if nodes.is_empty() => Ok(node),
                        _ => Err(CompileError::internal("parse accepted a malformed stack")),
                    };
                }
                None => {
                    let token =
                        lookahead.unwrap_or_else(|| Token::new(END, "", last_line, 1));
                    let expected = self.tables.expected_in(state);
                    return Err(CompileError::UnexpectedToken { token, expected });
                }
            }
        }
    }
}

fn build_node(tag: &str, raw: Vec<RawChild>) -> RawNode {
    let mut children = Vec::with_capacity(raw.len());
    for child in raw {
        match child {
            RawChild::Token(token) if token.is_filtered() => {}
            RawChild::Node(node) if node.rule.starts_with('_') => {
                children.extend(node.children);
            }
            other => children.push(other),
        }
    }
    RawNode { rule: tag.to_string(), children }
}
