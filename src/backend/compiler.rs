//! Semantic lowering from the normalized parse tree to the line-record IR.
//!
//! A single recursive descent walks the tree once. Block handlers emit their
//! own record, then recurse into the nested block with themselves as parent;
//! sibling chains (`else if`/`else`, `catch`/`finally`) back-patch the
//! previous block's `exit` with the id the previous handler returned. The
//! store's `last()` is consulted only by continuation arguments, never for
//! chain wiring.

use crate::backend::lines::{Artifact, Line, Lines, Method};
use crate::backend::preprocessor::{Identity, Preprocessor};
use crate::backend::values::{self, Value};
use crate::frontend::ast::{Node, NodeKind, Tree};
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::version::WEFT_VERSION;

// ============================================================================
// Compiler
// ============================================================================

/// Lowers one story tree into an [`Artifact`].
///
/// Each compile owns a private line store, so a `Compiler` is built per
/// story and consumed by [`Compiler::compile`].
#[derive(Debug)]
pub struct Compiler<P = Identity> {
    lines: Lines,
    preprocessor: P,
}

impl Compiler<Identity> {
    pub fn new() -> Compiler<Identity> {
        Compiler::with_preprocessor(Identity)
    }
}

impl Default for Compiler<Identity> {
    fn default() -> Self {
        Compiler::new()
    }
}

impl<P: Preprocessor> Compiler<P> {
    /// A compiler that runs `preprocessor` over the tree before lowering.
    pub fn with_preprocessor(preprocessor: P) -> Compiler<P> {
        Compiler { lines: Lines::new(), preprocessor }
    }

    /// Lower `tree` into the flat artifact.
    #[tracing::instrument(skip_all)]
    pub fn compile(mut self, tree: Tree) -> CompileResult<Artifact> {
        let tree = self.preprocessor.process(tree)?;
        self.parse_tree(&tree, None)?;
        Ok(self.lines.finalize(WEFT_VERSION))
    }

    /// Descend into every child tree, carrying `parent` unchanged.
    fn parse_tree(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        for child in tree.trees() {
            self.subtree(child, parent)?;
        }
        Ok(())
    }

    /// Dispatch one node. Statement tags get a handler; wrapper tags fall
    /// through to a transparent descent. Chain members (`else if`, `catch`,
    /// ...) are consumed by their head block and must never arrive here.
    fn subtree(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        match tree.kind {
            NodeKind::Imports => self.imports(tree),
            NodeKind::Assignment => self.assignment(tree, parent),
            NodeKind::AbsoluteExpression => self.expression(tree, parent).map(|_| ()),
            NodeKind::Arguments => self.arguments(tree),
            NodeKind::ReturnStatement => self.return_statement(tree, parent),
            NodeKind::ServiceBlock => self.service_block(tree, parent),
            NodeKind::WhenBlock => self.when_block(tree, parent),
            NodeKind::IfBlock => self.if_block(tree, parent),
            NodeKind::ForeachBlock => self.foreach_block(tree, parent),
            NodeKind::FunctionBlock => self.function_block(tree, parent),
            NodeKind::TryBlock => self.try_block(tree, parent),
            NodeKind::ElseifBlock
            | NodeKind::ElseBlock
            | NodeKind::CatchBlock
            | NodeKind::FinallyBlock => {
                Err(malformed("chain block outside its head", tree))
            }
            _ => self.parse_tree(tree, parent),
        }
    }

    // ========================================================================
    // Simple statements
    // ========================================================================

    /// `import "path" as alias` records a module and emits no line.
    fn imports(&mut self, tree: &Tree) -> CompileResult<()> {
        let alias = tree
            .child_token(1)
            .ok_or_else(|| malformed("import", tree))?
            .text
            .clone();
        let string = tree
            .node("string")
            .and_then(|string| string.child_token(0))
            .ok_or_else(|| malformed("import", tree))?;
        self.lines.set_module(alias, strip_quotes(&string.text));
        Ok(())
    }

    /// Emit an `expression` line. Two shapes arrive here: trees carrying an
    /// `expression` child, and service-shaped trees whose callee turned out
    /// to be a variable (the fragment then reads as a mutation).
    fn expression(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<u32> {
        let line = line_of(tree)?;
        let args = if let Some(expression) = tree.node("expression") {
            expression_args(expression)?
        } else if let Some(fragment) = tree.node("service_fragment") {
            let path = tree.node("path").ok_or_else(|| malformed("expression", tree))?;
            vec![values::path(path)?, values::mutation(fragment)?]
        } else {
            return Err(malformed("expression", tree));
        };
        self.lines.append(line, Line { args, parent, ..Line::new(Method::Expression) })
    }

    /// `target = value`, `target = service call` or `target = var mutation`.
    /// The target is bound into the variable scope in every arm.
    fn assignment(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let path = tree.node("path").ok_or_else(|| malformed("assignment", tree))?;
        let name = values::names(path)?;
        let fragment = tree
            .node("assignment_fragment")
            .ok_or_else(|| malformed("assignment", tree))?;
        if let Some(service) = fragment.node("service") {
            let callee = service.node("path").ok_or_else(|| malformed("service", service))?;
            if self.lines.is_variable(callee)? {
                self.expression(service, parent)?;
            } else {
                self.service(service, None, parent)?;
            }
            self.lines.set_name(name);
            return Ok(());
        }
        let expression = fragment
            .node("expression")
            .ok_or_else(|| malformed("assignment", tree))?;
        let line = line_of(tree)?;
        let args = expression_args(expression)?;
        self.lines.append(
            line,
            Line { args, name: Some(name.clone()), parent, ..Line::new(Method::Set) },
        )?;
        self.lines.set_name(name);
        Ok(())
    }

    /// Continuation arguments on their own line extend the preceding
    /// `execute`; anywhere else they are an error.
    fn arguments(&mut self, tree: &Tree) -> CompileResult<()> {
        let last = match self.lines.last() {
            Some(last) if self.lines.method_of(last) == Some(Method::Execute) => last,
            _ => return Err(CompileError::ArgumentsNoservice { line: line_of(tree)? }),
        };
        self.lines.append_args(last, values::arguments(tree)?)
    }

    /// `return value` is only legal under some block.
    fn return_statement(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let line = line_of(tree)?;
        if parent.is_none() {
            return Err(CompileError::ReturnOutside { line });
        }
        let value = tree.child_tree(0).ok_or_else(|| malformed("return", tree))?;
        let args = vec![values::values(value)?];
        self.lines.append(line, Line { args, parent, ..Line::new(Method::Return) })?;
        Ok(())
    }

    // ========================================================================
    // Invocations and subscriptions
    // ========================================================================

    /// Emit an `execute` line for a service call, or redirect to the
    /// expression path when the callee is a bound variable.
    fn service(
        &mut self,
        tree: &Tree,
        nested_block: Option<&Tree>,
        parent: Option<u32>,
    ) -> CompileResult<u32> {
        self.invocation(Method::Execute, tree, nested_block, parent)
    }

    /// Shared emission for calls and subscriptions. The method is fixed
    /// here, before `append`; records are never retagged afterwards. Only
    /// plain calls redirect on a variable callee.
    fn invocation(
        &mut self,
        method: Method,
        tree: &Tree,
        nested_block: Option<&Tree>,
        parent: Option<u32>,
    ) -> CompileResult<u32> {
        let path = tree.node("path").ok_or_else(|| malformed("service", tree))?;
        if method == Method::Execute && self.lines.is_variable(path)? {
            return self.expression(tree, parent);
        }
        let line = line_of(tree)?;
        let fragment = tree
            .node("service_fragment")
            .ok_or_else(|| malformed("service", tree))?;
        let command = fragment
            .node("command")
            .and_then(Tree::first_token)
            .map(|token| token.text.clone());
        let args = values::arguments(fragment)?;
        let service = values::extract_path(path)?;
        let output = output(fragment.node("output")).unwrap_or_default();
        let enter = nested_block.map(line_of).transpose()?;
        self.lines.execute(line, method, service, command, args, output, enter, parent)
    }

    fn service_block(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let service = tree.node("service").ok_or_else(|| malformed("service block", tree))?;
        let nested = tree.node("nested_block");
        let line = self.service(service, nested, parent)?;
        if let Some(block) = nested {
            self.parse_tree(block, Some(line))?;
        }
        Ok(())
    }

    /// `when` subscribes to an event source: service-shaped subscriptions
    /// compile like calls under method `when`; a bare path becomes a `when`
    /// line carrying the path as its argument, with any declared output
    /// names bound for the nested block.
    fn when_block(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let statement = tree
            .node("when_statement")
            .ok_or_else(|| malformed("when block", tree))?;
        let nested = tree.node("nested_block");
        let line = if let Some(service) = statement.node("service") {
            self.invocation(Method::When, service, nested, parent)?
        } else if let Some(path) = statement.node("path") {
            let line = line_of(tree)?;
            let args = vec![values::path(path)?];
            let output = output(statement.node("output"));
            self.lines
                .append(line, Line { args, output, parent, ..Line::new(Method::When) })?
        } else {
            return Err(malformed("when block", tree));
        };
        if let Some(block) = nested {
            self.parse_tree(block, Some(line))?;
        }
        Ok(())
    }

    // ========================================================================
    // Block statements
    // ========================================================================

    fn if_block(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let line = line_of(tree)?;
        let expression = tree
            .node("if_statement.expression")
            .ok_or_else(|| malformed("if block", tree))?;
        let args = expression_args(expression)?;
        let nested = tree.node("nested_block").ok_or_else(|| malformed("if block", tree))?;
        let enter = line_of(nested)?;
        self.lines.append(
            line,
            Line { args, enter: Some(enter), parent, ..Line::new(Method::If) },
        )?;
        self.parse_tree(nested, Some(line))?;
        // Chain members back-patch the previous sibling's exit and share
        // the enclosing parent.
        let mut previous = line;
        for block in tree.trees() {
            match block.kind {
                NodeKind::ElseifBlock => previous = self.elseif_block(block, previous, parent)?,
                NodeKind::ElseBlock => previous = self.else_block(block, previous, parent)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn elseif_block(
        &mut self,
        tree: &Tree,
        previous: u32,
        parent: Option<u32>,
    ) -> CompileResult<u32> {
        let line = line_of(tree)?;
        self.lines.set_exit(previous, line)?;
        let expression = tree
            .node("elseif_statement.expression")
            .ok_or_else(|| malformed("else if block", tree))?;
        let args = expression_args(expression)?;
        let nested = tree
            .node("nested_block")
            .ok_or_else(|| malformed("else if block", tree))?;
        let enter = line_of(nested)?;
        self.lines.append(
            line,
            Line { args, enter: Some(enter), parent, ..Line::new(Method::Elif) },
        )?;
        self.parse_tree(nested, Some(line))?;
        Ok(line)
    }

    fn else_block(
        &mut self,
        tree: &Tree,
        previous: u32,
        parent: Option<u32>,
    ) -> CompileResult<u32> {
        let line = line_of(tree)?;
        self.lines.set_exit(previous, line)?;
        let nested = tree
            .node("nested_block")
            .ok_or_else(|| malformed("else block", tree))?;
        let enter = line_of(nested)?;
        self.lines
            .append(line, Line { enter: Some(enter), parent, ..Line::new(Method::Else) })?;
        self.parse_tree(nested, Some(line))?;
        Ok(line)
    }

    fn foreach_block(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let line = line_of(tree)?;
        let statement = tree
            .node("foreach_statement")
            .ok_or_else(|| malformed("foreach block", tree))?;
        let path = statement.node("path").ok_or_else(|| malformed("foreach block", tree))?;
        let args = vec![values::path(path)?];
        let output = output(statement.node("output"));
        let nested = tree
            .node("nested_block")
            .ok_or_else(|| malformed("foreach block", tree))?;
        let enter = line_of(nested)?;
        self.lines.append(
            line,
            Line { args, output, enter: Some(enter), parent, ..Line::new(Method::For) },
        )?;
        self.parse_tree(nested, Some(line))?;
        Ok(())
    }

    /// Declares a function: the name registers in the function table, typed
    /// parameters become arguments and the return type rides in `output`
    /// (which, on `function` lines, is a type and not a binding).
    fn function_block(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let line = line_of(tree)?;
        let statement = tree
            .node("function_statement")
            .ok_or_else(|| malformed("function block", tree))?;
        let name = statement
            .child_token(0)
            .ok_or_else(|| malformed("function block", tree))?
            .text
            .clone();
        let args = values::function_arguments(statement)?;
        let output = output(statement.node("function_output.types"));
        let nested = tree
            .node("nested_block")
            .ok_or_else(|| malformed("function block", tree))?;
        let enter = line_of(nested)?;
        self.lines.append(
            line,
            Line {
                args,
                function: Some(name),
                output,
                enter: Some(enter),
                parent,
                ..Line::new(Method::Function)
            },
        )?;
        self.parse_tree(nested, Some(line))?;
        Ok(())
    }

    fn try_block(&mut self, tree: &Tree, parent: Option<u32>) -> CompileResult<()> {
        let line = line_of(tree)?;
        let nested = tree.node("nested_block").ok_or_else(|| malformed("try block", tree))?;
        let enter = line_of(nested)?;
        self.lines
            .append(line, Line { enter: Some(enter), parent, ..Line::new(Method::Try) })?;
        self.parse_tree(nested, Some(line))?;
        let mut previous = line;
        if let Some(block) = tree.node("catch_block") {
            previous = self.catch_block(block, previous, parent)?;
        }
        if let Some(block) = tree.node("finally_block") {
            self.finally_block(block, previous, parent)?;
        }
        Ok(())
    }

    /// `catch` binds its exception names, so they are in scope for the
    /// nested block compiled right after.
    fn catch_block(
        &mut self,
        tree: &Tree,
        previous: u32,
        parent: Option<u32>,
    ) -> CompileResult<u32> {
        let line = line_of(tree)?;
        self.lines.set_exit(previous, line)?;
        let statement = tree
            .node("catch_statement")
            .ok_or_else(|| malformed("catch block", tree))?;
        let output = output(statement.node("output"));
        let nested = tree
            .node("nested_block")
            .ok_or_else(|| malformed("catch block", tree))?;
        let enter = line_of(nested)?;
        self.lines.append(
            line,
            Line { output, enter: Some(enter), parent, ..Line::new(Method::Catch) },
        )?;
        self.parse_tree(nested, Some(line))?;
        Ok(line)
    }

    fn finally_block(
        &mut self,
        tree: &Tree,
        previous: u32,
        parent: Option<u32>,
    ) -> CompileResult<u32> {
        let line = line_of(tree)?;
        self.lines.set_exit(previous, line)?;
        let nested = tree
            .node("nested_block")
            .ok_or_else(|| malformed("finally block", tree))?;
        let enter = line_of(nested)?;
        self.lines
            .append(line, Line { enter: Some(enter), parent, ..Line::new(Method::Finally) })?;
        self.parse_tree(nested, Some(line))?;
        Ok(line)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Arguments for an expression-carrying line: `[value]` for plain and
/// operator expressions, `[value, mutation]` for a literal with a trailing
/// mutation.
fn expression_args(expression: &Tree) -> CompileResult<Vec<Value>> {
    if let Some(mutation) = expression.node("mutation") {
        let literal = expression
            .child_tree(0)
            .ok_or_else(|| malformed("expression", expression))?;
        return Ok(vec![values::values(literal)?, values::mutation(mutation)?]);
    }
    Ok(vec![values::expression(expression)?])
}

/// Declared names under an `output` (or a return type's `types`) node,
/// `None` when the node is absent.
fn output(tree: Option<&Tree>) -> Option<Vec<String>> {
    let names: Vec<String> = tree?
        .children
        .iter()
        .filter_map(Node::as_token)
        .map(|token| token.text.clone())
        .collect();
    if names.is_empty() { None } else { Some(names) }
}

fn line_of(tree: &Tree) -> CompileResult<u32> {
    tree.line().ok_or_else(|| malformed("positionless", tree))
}

fn strip_quotes(text: &str) -> String {
    if text.len() >= 2 { text[1..text.len() - 1].to_string() } else { text.to_string() }
}

fn malformed(what: &str, tree: &Tree) -> CompileError {
    match tree.line() {
        Some(line) => CompileError::internal(format!("malformed {what} tree at line {line}")),
        None => CompileError::internal(format!("malformed {what} tree")),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Parser;
    use serde_json::json;

    fn compile(source: &str) -> Artifact {
        let tree = Parser::new().parse(source, true).unwrap();
        Compiler::new().compile(tree).unwrap()
    }

    fn compile_err(source: &str) -> CompileError {
        let tree = Parser::new().parse(source, true).unwrap();
        Compiler::new().compile(tree).unwrap_err()
    }

    fn lines_json(artifact: &Artifact) -> serde_json::Value {
        serde_json::to_value(&artifact.tree).unwrap()
    }

    #[test]
    fn test_empty_story_produces_an_empty_artifact() {
        let artifact = compile("");
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(
            json,
            json!({
                "tree": {},
                "services": [],
                "entrypoint": null,
                "modules": {},
                "functions": [],
                "version": WEFT_VERSION,
            })
        );
    }

    #[test]
    fn test_set_line_binds_and_carries_the_value() {
        let artifact = compile("a = 1\n");
        assert_eq!(
            lines_json(&artifact),
            json!({
                "1": {"method": "set", "args": [1], "name": ["a"]},
            })
        );
        assert_eq!(artifact.entrypoint, Some(1));
    }

    #[test]
    fn test_if_block_wires_enter_and_parent() {
        let artifact = compile("if x > 1:\n    alpine echo\n");
        assert_eq!(
            lines_json(&artifact),
            json!({
                "1": {
                    "method": "if",
                    "args": [{
                        "$OBJECT": "expression",
                        "expression": "{} > {}",
                        "values": [{"$OBJECT": "path", "paths": ["x"]}, 1],
                    }],
                    "enter": 2,
                },
                "2": {"method": "execute", "service": "alpine", "command": "echo", "parent": 1},
            })
        );
        assert_eq!(artifact.services, vec!["alpine".to_string()]);
    }

    #[test]
    fn test_chained_conditionals_backpatch_exits() {
        let source = "if a:\n    x = 1\nelse if b:\n    x = 2\nelse:\n    x = 3\n";
        let artifact = compile(source);
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "if");
        assert_eq!(json["1"]["enter"], 2);
        assert_eq!(json["1"]["exit"], 3);
        assert_eq!(json["3"]["method"], "elif");
        assert_eq!(json["3"]["args"], json!([{"$OBJECT": "path", "paths": ["b"]}]));
        assert_eq!(json["3"]["exit"], 5);
        assert_eq!(json["5"]["method"], "else");
        assert_eq!(json["5"].get("exit"), None);
        // Chain members share the enclosing parent, not each other.
        assert_eq!(json["3"].get("parent"), None);
        assert_eq!(json["5"].get("parent"), None);
        assert_eq!(json["2"]["parent"], 1);
        assert_eq!(json["4"]["parent"], 3);
        assert_eq!(json["6"]["parent"], 5);
    }

    #[test]
    fn test_try_catch_finally_chain() {
        let source = "try:\n    a = 1\ncatch as error:\n    b = 2\nfinally:\n    c = 3\n";
        let artifact = compile(source);
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "try");
        assert_eq!(json["1"]["exit"], 3);
        assert_eq!(json["3"]["method"], "catch");
        assert_eq!(json["3"]["output"], json!(["error"]));
        assert_eq!(json["3"]["exit"], 5);
        assert_eq!(json["5"]["method"], "finally");
        assert_eq!(json["5"]["enter"], 6);
        assert_eq!(json["4"]["parent"], 3);
    }

    #[test]
    fn test_service_block_parents_its_nested_lines() {
        let source = "alpine server as client\n    when client listen:\n        sink run\n";
        let artifact = compile(source);
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "execute");
        assert_eq!(json["1"]["output"], json!(["client"]));
        assert_eq!(json["1"]["enter"], 2);
        assert_eq!(json["2"]["method"], "when");
        assert_eq!(json["2"]["service"], "client");
        assert_eq!(json["2"]["command"], "listen");
        assert_eq!(json["2"]["parent"], 1);
        assert_eq!(json["3"]["parent"], 2);
        assert_eq!(artifact.services, vec!["alpine".to_string(), "client".to_string(), "sink".to_string()]);
    }

    #[test]
    fn test_when_on_a_bare_path() {
        let artifact = compile("when intents.greeting:\n    bot reply\n");
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "when");
        assert_eq!(json["1"]["args"], json!([{"$OBJECT": "path", "paths": ["intents", "greeting"]}]));
        assert_eq!(json["2"]["parent"], 1);
    }

    #[test]
    fn test_when_path_output_binds_the_event() {
        let artifact = compile("when orders.created as event:\n    x = event\n");
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "when");
        assert_eq!(json["1"]["args"], json!([{"$OBJECT": "path", "paths": ["orders", "created"]}]));
        assert_eq!(json["1"]["output"], json!(["event"]));
        assert_eq!(json["2"]["args"], json!([{"$OBJECT": "path", "paths": ["event"]}]));
        assert_eq!(artifact.services, Vec::<String>::new());
    }

    #[test]
    fn test_assignment_from_a_service_binds_the_target() {
        let artifact = compile("x = alpine echo\ny = x length()\n");
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "execute");
        // The callee became a variable, so the second line reads as a
        // mutation chain rather than a call.
        assert_eq!(json["2"]["method"], "expression");
        assert_eq!(
            json["2"]["args"],
            json!([
                {"$OBJECT": "path", "paths": ["x"]},
                {"$OBJECT": "mutation", "mutation": "length", "arguments": []},
            ])
        );
        assert_eq!(artifact.services, vec!["alpine".to_string()]);
    }

    #[test]
    fn test_function_declaration_registers_and_returns() {
        let source = "function double n:int returns int:\n    return n\n";
        let artifact = compile(source);
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "function");
        assert_eq!(json["1"]["function"], "double");
        assert_eq!(
            json["1"]["args"],
            json!([{
                "$OBJECT": "argument",
                "name": "n",
                "argument": {"$OBJECT": "type", "type": "int"},
            }])
        );
        assert_eq!(json["1"]["output"], json!(["int"]));
        assert_eq!(json["2"]["method"], "return");
        assert_eq!(json["2"]["args"], json!([{"$OBJECT": "path", "paths": ["n"]}]));
        assert_eq!(artifact.functions, vec!["double".to_string()]);
    }

    #[test]
    fn test_foreach_binds_the_loop_output() {
        let artifact = compile("foreach items as item:\n    mixer shake\n");
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "for");
        assert_eq!(json["1"]["args"], json!([{"$OBJECT": "path", "paths": ["items"]}]));
        assert_eq!(json["1"]["output"], json!(["item"]));
        assert_eq!(json["1"]["enter"], 2);
        assert_eq!(json["2"]["parent"], 1);
    }

    #[test]
    fn test_return_at_the_top_level_is_rejected() {
        let error = compile_err("return 1\n");
        assert_eq!(error.code(), "return-outside");
    }

    #[test]
    fn test_continuation_arguments_extend_the_last_execute() {
        let source = "alpine echo\n    message: 'hi'\n";
        let artifact = compile(source);
        let json = lines_json(&artifact);
        assert_eq!(
            json["1"]["args"],
            json!([{
                "$OBJECT": "argument",
                "name": "message",
                "argument": {"$OBJECT": "string", "string": "hi"},
            }])
        );
    }

    #[test]
    fn test_continuation_arguments_without_a_service_fail() {
        let error = compile_err("a = 1\nif a:\n    key: 1\n");
        assert_eq!(error.code(), "arguments-noservice");
    }

    #[test]
    fn test_imports_record_modules_without_emitting() {
        let artifact = compile("import 'lib/http' as http\n");
        assert!(artifact.tree.is_empty());
        assert_eq!(artifact.entrypoint, None);
        assert_eq!(
            serde_json::to_value(&artifact.modules).unwrap(),
            json!({"http": "lib/http"})
        );
    }

    #[test]
    fn test_expression_statement_with_mutation() {
        let artifact = compile("'a b' split(by: ' ')\n");
        let json = lines_json(&artifact);
        assert_eq!(json["1"]["method"], "expression");
        assert_eq!(
            json["1"]["args"],
            json!([
                {"$OBJECT": "string", "string": "a b"},
                {
                    "$OBJECT": "mutation",
                    "mutation": "split",
                    "arguments": [{
                        "$OBJECT": "argument",
                        "name": "by",
                        "argument": {"$OBJECT": "string", "string": " "},
                    }],
                },
            ])
        );
    }

    #[test]
    fn test_service_names_are_deduplicated_in_call_order() {
        let artifact = compile("twitter tweet\nalpine echo\ntwitter follow\n");
        assert_eq!(artifact.services, vec!["twitter".to_string(), "alpine".to_string()]);
    }
}
