//! Syntax tree definitions for Weft.
//!
//! The parser produces rule-tagged trees whose leaves are lexer tokens,
//! following the grammar defined in `frontend/grammar.rs`. Navigation mirrors
//! how the semantic compiler walks these trees: dotted descent for known
//! shapes, deep search for scattered ones.

use crate::frontend::lexer::tokens::Token;

// ============================================================================
// NODE KINDS
// ============================================================================

/// Every grammar rule that can appear as a tree tag, plus [`NodeKind::Empty`]
/// for the tree of an empty program.
///
/// The mapping from rule names is exhaustive: the grammar and this enum move
/// together, and an unmapped rule name is an internal error, not a user error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Start,
    Block,
    Line,
    Simple,
    NestedBlock,
    Imports,
    Assignment,
    AssignmentFragment,
    AbsoluteExpression,
    Expression,
    Mutation,
    Values,
    Path,
    PathFragment,
    Service,
    ServiceBlock,
    ServiceFragment,
    Command,
    CallArgs,
    Arguments,
    Output,
    IfBlock,
    IfStatement,
    ElseifBlock,
    ElseifStatement,
    ElseBlock,
    ElseStatement,
    ForeachBlock,
    ForeachStatement,
    FunctionBlock,
    FunctionStatement,
    TypedArgument,
    Types,
    FunctionOutput,
    WhenBlock,
    WhenStatement,
    TryBlock,
    TryStatement,
    CatchBlock,
    CatchStatement,
    FinallyBlock,
    FinallyStatement,
    ReturnStatement,
    String,
    Number,
    Boolean,
    List,
    Objects,
    KeyValue,
    RegularExpression,
    /// Synthetic root for empty input. Never produced by the grammar.
    Empty,
}

impl NodeKind {
    /// Map a grammar rule name (or alias) onto its kind.
    pub fn from_rule(name: &str) -> Option<NodeKind> {
        let kind = match name {
            "start" => NodeKind::Start,
            "block" => NodeKind::Block,
            "line" => NodeKind::Line,
            "simple" => NodeKind::Simple,
            "nested_block" => NodeKind::NestedBlock,
            "imports" => NodeKind::Imports,
            "assignment" => NodeKind::Assignment,
            "assignment_fragment" => NodeKind::AssignmentFragment,
            "absolute_expression" => NodeKind::AbsoluteExpression,
            "expression" => NodeKind::Expression,
            "mutation" => NodeKind::Mutation,
            "values" => NodeKind::Values,
            "path" => NodeKind::Path,
            "path_fragment" => NodeKind::PathFragment,
            "service" => NodeKind::Service,
            "service_block" => NodeKind::ServiceBlock,
            "service_fragment" => NodeKind::ServiceFragment,
            "command" => NodeKind::Command,
            "call_args" => NodeKind::CallArgs,
            "arguments" => NodeKind::Arguments,
            "output" => NodeKind::Output,
            "if_block" => NodeKind::IfBlock,
            "if_statement" => NodeKind::IfStatement,
            "elseif_block" => NodeKind::ElseifBlock,
            "elseif_statement" => NodeKind::ElseifStatement,
            "else_block" => NodeKind::ElseBlock,
            "else_statement" => NodeKind::ElseStatement,
            "foreach_block" => NodeKind::ForeachBlock,
            "foreach_statement" => NodeKind::ForeachStatement,
            "function_block" => NodeKind::FunctionBlock,
            "function_statement" => NodeKind::FunctionStatement,
            "typed_argument" => NodeKind::TypedArgument,
            "types" => NodeKind::Types,
            "function_output" => NodeKind::FunctionOutput,
            "when_block" => NodeKind::WhenBlock,
            "when_statement" => NodeKind::WhenStatement,
            "try_block" => NodeKind::TryBlock,
            "try_statement" => NodeKind::TryStatement,
            "catch_block" => NodeKind::CatchBlock,
            "catch_statement" => NodeKind::CatchStatement,
            "finally_block" => NodeKind::FinallyBlock,
            "finally_statement" => NodeKind::FinallyStatement,
            "return_statement" => NodeKind::ReturnStatement,
            "string" => NodeKind::String,
            "number" => NodeKind::Number,
            "boolean" => NodeKind::Boolean,
            "list" => NodeKind::List,
            "objects" => NodeKind::Objects,
            "key_value" => NodeKind::KeyValue,
            "regular_expression" => NodeKind::RegularExpression,
            _ => return None,
        };
        Some(kind)
    }

    /// The grammar rule name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Block => "block",
            NodeKind::Line => "line",
            NodeKind::Simple => "simple",
            NodeKind::NestedBlock => "nested_block",
            NodeKind::Imports => "imports",
            NodeKind::Assignment => "assignment",
            NodeKind::AssignmentFragment => "assignment_fragment",
            NodeKind::AbsoluteExpression => "absolute_expression",
            NodeKind::Expression => "expression",
            NodeKind::Mutation => "mutation",
            NodeKind::Values => "values",
            NodeKind::Path => "path",
            NodeKind::PathFragment => "path_fragment",
            NodeKind::Service => "service",
            NodeKind::ServiceBlock => "service_block",
            NodeKind::ServiceFragment => "service_fragment",
            NodeKind::Command => "command",
            NodeKind::CallArgs => "call_args",
            NodeKind::Arguments => "arguments",
            NodeKind::Output => "output",
            NodeKind::IfBlock => "if_block",
            NodeKind::IfStatement => "if_statement",
            NodeKind::ElseifBlock => "elseif_block",
            NodeKind::ElseifStatement => "elseif_statement",
            NodeKind::ElseBlock => "else_block",
            NodeKind::ElseStatement => "else_statement",
            NodeKind::ForeachBlock => "foreach_block",
            NodeKind::ForeachStatement => "foreach_statement",
            NodeKind::FunctionBlock => "function_block",
            NodeKind::FunctionStatement => "function_statement",
            NodeKind::TypedArgument => "typed_argument",
            NodeKind::Types => "types",
            NodeKind::FunctionOutput => "function_output",
            NodeKind::WhenBlock => "when_block",
            NodeKind::WhenStatement => "when_statement",
            NodeKind::TryBlock => "try_block",
            NodeKind::TryStatement => "try_statement",
            NodeKind::CatchBlock => "catch_block",
            NodeKind::CatchStatement => "catch_statement",
            NodeKind::FinallyBlock => "finally_block",
            NodeKind::FinallyStatement => "finally_statement",
            NodeKind::ReturnStatement => "return_statement",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Boolean => "boolean",
            NodeKind::List => "list",
            NodeKind::Objects => "objects",
            NodeKind::KeyValue => "key_value",
            NodeKind::RegularExpression => "regular_expression",
            NodeKind::Empty => "empty",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TREES
// ============================================================================

/// A child of a [`Tree`]: either a nested tree or a lexer token.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Tree(Tree),
    Token(Token),
}

impl Node {
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Node::Tree(tree) => Some(tree),
            Node::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Tree(_) => None,
        }
    }
}

/// A rule-tagged parse tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Tree {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Tree { kind, children }
    }

    /// The tree for an empty program.
    pub fn empty() -> Self {
        Tree { kind: NodeKind::Empty, children: Vec::new() }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Child at `index` if it is a tree.
    pub fn child_tree(&self, index: usize) -> Option<&Tree> {
        self.children.get(index).and_then(Node::as_tree)
    }

    /// Child at `index` if it is a token.
    pub fn child_token(&self, index: usize) -> Option<&Token> {
        self.children.get(index).and_then(Node::as_token)
    }

    /// Iterate the direct children that are trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.children.iter().filter_map(Node::as_tree)
    }

    /// Descend through a dotted path of rule names, taking the first direct
    /// child tree matching each segment.
    ///
    /// `tree.node("service_fragment.command")` finds the `command` node under
    /// the first `service_fragment` child, or `None` anywhere the shape does
    /// not hold.
    pub fn node(&self, path: &str) -> Option<&Tree> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.trees().find(|tree| tree.kind.as_str() == segment)?;
        }
        Some(current)
    }

    /// All trees of `kind` in preorder, including `self`.
    pub fn find(&self, kind: NodeKind) -> Vec<&Tree> {
        let mut found = Vec::new();
        self.collect(kind, &mut found);
        found
    }

    fn collect<'a>(&'a self, kind: NodeKind, found: &mut Vec<&'a Tree>) {
        if self.kind == kind {
            found.push(self);
        }
        for tree in self.trees() {
            tree.collect(kind, found);
        }
    }

    /// The leftmost token anywhere under this tree.
    pub fn first_token(&self) -> Option<&Token> {
        for child in &self.children {
            match child {
                Node::Token(token) => return Some(token),
                Node::Tree(tree) => {
                    if let Some(token) = tree.first_token() {
                        return Some(token);
                    }
                }
            }
        }
        None
    }

    /// Source line of this node, taken from its leftmost token.
    pub fn line(&self) -> Option<u32> {
        self.first_token().map(|token| token.line)
    }
}
