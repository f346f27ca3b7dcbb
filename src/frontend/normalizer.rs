//! Tree normalization.
//!
//! Converts raw rule-tagged nodes from the engine into the compiler's typed
//! trees. Most rules map straight through; `arguments` shorthand gets
//! expanded and assignment targets are checked here, before any lowering
//! runs.

use crate::frontend::ast::{Node, NodeKind, Tree};
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::engine::{RawChild, RawNode};

/// Normalize a raw parse tree, bottom-up.
pub fn normalize(raw: RawNode) -> CompileResult<Tree> {
    let kind = NodeKind::from_rule(&raw.rule).ok_or_else(|| {
        CompileError::internal(format!("parser produced unknown rule `{}`", raw.rule))
    })?;
    let mut children = Vec::with_capacity(raw.children.len());
    for child in raw.children {
        match child {
            RawChild::Node(node) => children.push(Node::Tree(normalize(node)?)),
            RawChild::Token(token) => children.push(Node::Token(token)),
        }
    }
    match kind {
        NodeKind::Arguments => Ok(expand_shorthand(children)),
        NodeKind::Assignment => {
            validate_target(&children)?;
            Ok(Tree::new(kind, children))
        }
        _ => Ok(Tree::new(kind, children)),
    }
}

/// `foo(bar)` passes `bar` as an argument named `bar`: a shorthand
/// `arguments` node gets the path's base name inserted as its name token.
fn expand_shorthand(mut children: Vec<Node>) -> Tree {
    if children.len() == 1 {
        if let Some(name) = children[0].as_tree().and_then(Tree::first_token) {
            let token = name.clone();
            children.insert(0, Node::Token(token));
        }
    }
    Tree::new(NodeKind::Arguments, children)
}

/// Assignment targets must be plain variable names; `/` and `-` stay
/// reserved for service paths.
fn validate_target(children: &[Node]) -> CompileResult<()> {
    let token = children
        .first()
        .and_then(Node::as_tree)
        .and_then(Tree::first_token)
        .ok_or_else(|| CompileError::internal("assignment without a target path"))?;
    if token.text.contains('/') {
        return Err(CompileError::VariablesBackslash { token: token.clone() });
    }
    if token.text.contains('-') {
        return Err(CompileError::VariablesDash { token: token.clone() });
    }
    Ok(())
}
