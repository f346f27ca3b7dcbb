//! Value objects: the tree-to-value mapping for literals, composites and
//! expressions.
//!
//! Every argument, condition and assigned value in the IR is one of these
//! objects. Numbers and booleans serialize as bare JSON scalars; everything
//! else carries a `"$OBJECT"` discriminator the execution engine dispatches
//! on:
//!
//! ```text
//! x.profile["name"]   {"$OBJECT": "path", "paths": ["x", "profile", {…string…}]}
//! "hi {name}"         {"$OBJECT": "string", "string": "hi {}", "values": [{…path…}]}
//! [1, 2]              {"$OBJECT": "list", "items": [1, 2]}
//! {a: 1}              {"$OBJECT": "dict", "items": [[{…path…}, 1]]}
//! /^ab/g              {"$OBJECT": "regexp", "regexp": "/^ab/", "flags": "g"}
//! x > 1               {"$OBJECT": "expression", "expression": "{} > {}", "values": […]}
//! uppercase()         {"$OBJECT": "mutation", "mutation": "uppercase", "arguments": []}
//! key: 1              {"$OBJECT": "argument", "name": "key", "argument": 1}
//! ```
//!
//! Resolution is pure and stateless. The grammar guarantees subtree shape;
//! a shape these functions cannot resolve is a contract violation and
//! surfaces as an internal error, never a user-facing diagnostic.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::frontend::ast::{Node, NodeKind, Tree};
use crate::frontend::diagnostics::{CompileError, CompileResult};

/// Matches one `{name}` interpolation inside a string literal.
static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]*)\}").expect("valid pattern"));

// ============================================================================
// VALUE OBJECTS
// ============================================================================

/// A resolved value as it appears in a line's `args`.
///
/// Integers are carried as `i128` so that literals wider than a machine
/// word survive the artifact losslessly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i128),
    Float(f64),
    Bool(bool),
    Object(ValueObject),
}

/// The tagged value objects, discriminated by `"$OBJECT"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "$OBJECT", rename_all = "lowercase")]
pub enum ValueObject {
    Path {
        paths: Vec<PathSegment>,
    },
    String {
        string: String,
        /// One path object per `{name}` occurrence, in scan order. Present
        /// only when the literal interpolates.
        #[serde(skip_serializing_if = "Option::is_none")]
        values: Option<Vec<Value>>,
    },
    List {
        items: Vec<Value>,
    },
    Dict {
        items: Vec<(Value, Value)>,
    },
    Regexp {
        regexp: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },
    Type {
        #[serde(rename = "type")]
        type_name: String,
    },
    Expression {
        expression: String,
        values: Vec<Value>,
    },
    Mutation {
        mutation: String,
        arguments: Vec<Value>,
    },
    Argument {
        name: String,
        argument: Box<Value>,
    },
}

/// One step of a path: a plain field name, or a computed key like `x["y"]`
/// and `x[y]` resolved to a nested value object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Name(String),
    Value(Value),
}

fn malformed(what: &str, tree: &Tree) -> CompileError {
    CompileError::internal(format!("malformed {what} tree: {}", tree.kind))
}

// ============================================================================
// PATHS
// ============================================================================

/// Extract the ordered segments of a path tree.
///
/// The head token contributes its name; each following fragment contributes
/// a plain name (`.field`), a resolved string object (`["key"]`) or a
/// resolved nested path object (`[key]`).
pub fn names(tree: &Tree) -> CompileResult<Vec<PathSegment>> {
    let head = tree.child_token(0).ok_or_else(|| malformed("path", tree))?;
    let mut segments = vec![PathSegment::Name(head.text.clone())];
    for fragment in tree.trees() {
        let segment = match fragment.child(0) {
            Some(Node::Token(token)) => PathSegment::Name(token.text.clone()),
            Some(Node::Tree(sub)) => match sub.kind {
                NodeKind::String => PathSegment::Value(string(sub)?),
                NodeKind::Path => PathSegment::Value(path(sub)?),
                _ => return Err(malformed("path fragment", fragment)),
            },
            None => return Err(malformed("path fragment", fragment)),
        };
        segments.push(segment);
    }
    Ok(segments)
}

/// Wrap a path tree into a path value object.
pub fn path(tree: &Tree) -> CompileResult<Value> {
    Ok(Value::Object(ValueObject::Path {
        paths: names(tree)?,
    }))
}

/// Flatten a service path into its dotted registry name.
///
/// Computed fragments have no registry spelling; a service invoked through
/// one is a contract violation.
pub fn extract_path(tree: &Tree) -> CompileResult<String> {
    let head = tree.child_token(0).ok_or_else(|| malformed("path", tree))?;
    let mut name = head.text.clone();
    for fragment in tree.trees() {
        match fragment.child(0) {
            Some(Node::Token(token)) => {
                name.push('.');
                name.push_str(&token.text);
            }
            _ => {
                return Err(CompileError::internal(
                    "service path with a computed fragment",
                ));
            }
        }
    }
    Ok(name)
}

// ============================================================================
// LITERALS
// ============================================================================

/// Resolve a string literal: quotes stripped, escapes decoded, `{name}`
/// interpolations extracted into positional placeholders.
pub fn string(tree: &Tree) -> CompileResult<Value> {
    let token = tree.child_token(0).ok_or_else(|| malformed("string", tree))?;
    let literal = unescape_string(&token.text);
    let mut fillers = Vec::new();
    for capture in INTERPOLATION.captures_iter(&literal) {
        let name = capture[1].trim().to_string();
        fillers.push(Value::Object(ValueObject::Path {
            paths: vec![PathSegment::Name(name)],
        }));
    }
    let template = INTERPOLATION.replace_all(&literal, "{}").into_owned();
    let values = if fillers.is_empty() {
        None
    } else {
        Some(fillers)
    };
    Ok(Value::Object(ValueObject::String {
        string: template,
        values,
    }))
}

/// Strip the quote delimiters and run the escape decoding twice: the scanner
/// keeps escape sequences intact, so a doubled sequence in source denotes
/// one literal escape in the result.
fn unescape_string(text: &str) -> String {
    let inner = if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    };
    unescape(&unescape(inner))
}

fn unescape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 == chars.len() {
            out.push(c);
            i += 1;
            continue;
        }
        let next = chars[i + 1];
        i += 2;
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' | '\'' | '"' => out.push(next),
            'x' => hex_escape(&chars, &mut i, &mut out, 'x', 2),
            'u' => hex_escape(&chars, &mut i, &mut out, 'u', 4),
            // Unknown escapes keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn hex_escape(chars: &[char], i: &mut usize, out: &mut String, marker: char, width: usize) {
    let digits: String = chars[*i..].iter().take(width).collect();
    if digits.len() == width {
        if let Ok(code) = u32::from_str_radix(&digits, 16) {
            if let Some(decoded) = char::from_u32(code) {
                out.push(decoded);
                *i += width;
                return;
            }
        }
    }
    out.push('\\');
    out.push(marker);
}

/// Resolve a number literal, preserving the integer/float distinction of
/// the source token. A literal too wide for the carried representation
/// (`i128`, finite `f64`) is a user error, not a contract violation.
pub fn number(tree: &Tree) -> CompileResult<Value> {
    let token = tree.child_token(0).ok_or_else(|| malformed("number", tree))?;
    if token.kind == "INT" {
        let parsed = token
            .text
            .parse::<i128>()
            .map_err(|_| CompileError::NumberOverflow { token: token.clone() })?;
        Ok(Value::Int(parsed))
    } else {
        let parsed = token
            .text
            .parse::<f64>()
            .map_err(|_| CompileError::internal(format!("unreadable float: {}", token.text)))?;
        // Overflowing digit runs parse to infinity, which JSON can't carry.
        if !parsed.is_finite() {
            return Err(CompileError::NumberOverflow { token: token.clone() });
        }
        Ok(Value::Float(parsed))
    }
}

pub fn boolean(tree: &Tree) -> CompileResult<Value> {
    let token = tree
        .child_token(0)
        .ok_or_else(|| malformed("boolean", tree))?;
    Ok(Value::Bool(token.kind == "TRUE"))
}

pub fn list(tree: &Tree) -> CompileResult<Value> {
    let mut items = Vec::new();
    for child in tree.trees() {
        items.push(values(child)?);
    }
    Ok(Value::Object(ValueObject::List { items }))
}

/// Resolve an object literal into an ordered dict of key/value pairs. Keys
/// may be string literals or bare paths.
pub fn objects(tree: &Tree) -> CompileResult<Value> {
    let mut items = Vec::new();
    for pair in tree.trees() {
        let key_tree = pair
            .child_tree(0)
            .ok_or_else(|| malformed("key-value", pair))?;
        let key = match key_tree.kind {
            NodeKind::String => string(key_tree)?,
            NodeKind::Path => path(key_tree)?,
            _ => return Err(malformed("dict key", pair)),
        };
        let value_tree = pair
            .child_tree(1)
            .ok_or_else(|| malformed("key-value", pair))?;
        items.push((key, values(value_tree)?));
    }
    Ok(Value::Object(ValueObject::Dict { items }))
}

/// Split a regexp token into its `/pattern/` and trailing flags.
pub fn regular_expression(tree: &Tree) -> CompileResult<Value> {
    let token = tree.child_token(0).ok_or_else(|| malformed("regexp", tree))?;
    let text = &token.text;
    match text.rfind('/') {
        Some(end) if end > 0 => {
            let flags = &text[end + 1..];
            Ok(Value::Object(ValueObject::Regexp {
                regexp: text[..=end].to_string(),
                flags: if flags.is_empty() {
                    None
                } else {
                    Some(flags.to_string())
                },
            }))
        }
        _ => Ok(Value::Object(ValueObject::Regexp {
            regexp: text.clone(),
            flags: None,
        })),
    }
}

pub fn types(tree: &Tree) -> CompileResult<Value> {
    let token = tree.child_token(0).ok_or_else(|| malformed("type", tree))?;
    Ok(Value::Object(ValueObject::Type {
        type_name: token.text.clone(),
    }))
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Resolve any value-shaped tree.
///
/// Dispatches on the tree's own kind first, then on its first child: a
/// wrapped literal resolves through its handler, and a bare identifier
/// token falls through to path resolution over the enclosing tree.
pub fn values(tree: &Tree) -> CompileResult<Value> {
    match tree.kind {
        NodeKind::String => return string(tree),
        NodeKind::Number => return number(tree),
        NodeKind::Boolean => return boolean(tree),
        NodeKind::List => return list(tree),
        NodeKind::Objects => return objects(tree),
        NodeKind::RegularExpression => return regular_expression(tree),
        NodeKind::Types => return types(tree),
        NodeKind::Path => return path(tree),
        _ => {}
    }
    match tree.child(0) {
        Some(Node::Tree(child)) => match child.kind {
            NodeKind::String
            | NodeKind::Number
            | NodeKind::Boolean
            | NodeKind::List
            | NodeKind::Objects
            | NodeKind::RegularExpression
            | NodeKind::Types
            | NodeKind::Path => values(child),
            _ => Err(malformed("value", tree)),
        },
        Some(Node::Token(token)) if token.kind == "NAME" => path(tree),
        _ => Err(malformed("value", tree)),
    }
}

// ============================================================================
// EXPRESSIONS AND CALLS
// ============================================================================

/// Resolve an expression tree.
///
/// A single operand flattens to the resolved operand itself; a binary
/// comparison becomes an expression object whose template embeds the
/// operator between positional placeholders.
pub fn expression(tree: &Tree) -> CompileResult<Value> {
    let operator = tree.children.iter().find_map(|child| match child {
        Node::Token(token) if token.kind == "OPERATOR" => Some(token),
        _ => None,
    });
    match operator {
        Some(op) => {
            let left = tree
                .child_tree(0)
                .ok_or_else(|| malformed("expression", tree))?;
            let right = tree
                .child_tree(2)
                .ok_or_else(|| malformed("expression", tree))?;
            Ok(Value::Object(ValueObject::Expression {
                expression: format!("{{}} {} {{}}", op.text),
                values: vec![values(left)?, values(right)?],
            }))
        }
        None => {
            let operand = tree
                .child_tree(0)
                .ok_or_else(|| malformed("expression", tree))?;
            values(operand)
        }
    }
}

/// Resolve a mutation: a `mutation` node, or the `service_fragment` a
/// known-variable call arrives in. The method name comes from the fragment
/// command when present, the leading name token otherwise.
pub fn mutation(tree: &Tree) -> CompileResult<Value> {
    let name = match tree.node("command") {
        Some(command) => command.first_token(),
        None => tree.first_token(),
    }
    .map(|token| token.text.clone())
    .ok_or_else(|| CompileError::internal("mutation without a name"))?;
    Ok(Value::Object(ValueObject::Mutation {
        mutation: name,
        arguments: arguments(tree)?,
    }))
}

/// Resolve one named argument pair.
pub fn argument(tree: &Tree) -> CompileResult<Value> {
    let name = tree
        .child_token(0)
        .ok_or_else(|| malformed("argument", tree))?
        .text
        .clone();
    let value_tree = tree
        .child_tree(1)
        .ok_or_else(|| malformed("argument", tree))?;
    Ok(Value::Object(ValueObject::Argument {
        name,
        argument: Box::new(values(value_tree)?),
    }))
}

/// Collect every argument pair under `tree`, in source order.
pub fn arguments(tree: &Tree) -> CompileResult<Vec<Value>> {
    tree.find(NodeKind::Arguments)
        .into_iter()
        .map(argument)
        .collect()
}

/// Resolve a typed function parameter. The bare type token is wrapped as an
/// anonymous value first, so typed and named parameters produce the same
/// argument shape.
pub fn typed_argument(tree: &Tree) -> CompileResult<Value> {
    let name = tree
        .child_token(0)
        .ok_or_else(|| malformed("typed argument", tree))?
        .text
        .clone();
    let types_tree = tree
        .child_tree(1)
        .ok_or_else(|| malformed("typed argument", tree))?;
    let anonymous = Tree::new(NodeKind::Values, vec![Node::Tree(types_tree.clone())]);
    Ok(Value::Object(ValueObject::Argument {
        name,
        argument: Box::new(values(&anonymous)?),
    }))
}

/// Collect every typed parameter of a function statement, in source order.
pub fn function_arguments(tree: &Tree) -> CompileResult<Vec<Value>> {
    tree.find(NodeKind::TypedArgument)
        .into_iter()
        .map(typed_argument)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
