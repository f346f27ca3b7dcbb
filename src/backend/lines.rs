//! The line store: the flat IR under construction, plus the compile-scoped
//! registries (variables, services, modules, functions).
//!
//! One store per compile, single writer. Records are appended in source
//! order under their source line number; `exit` is the only field ever
//! mutated after a record is in, and only until [`Lines::finalize`] moves
//! the store into the immutable [`Artifact`].

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::backend::values::{self, PathSegment, Value};
use crate::frontend::ast::Tree;
use crate::frontend::diagnostics::{CompileError, CompileResult};

// ============================================================================
// LINE RECORDS
// ============================================================================

/// The lowered form of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Expression,
    Set,
    Execute,
    When,
    If,
    Elif,
    Else,
    For,
    Function,
    Return,
    Try,
    Catch,
    Finally,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Expression => "expression",
            Method::Set => "set",
            Method::Execute => "execute",
            Method::When => "when",
            Method::If => "if",
            Method::Elif => "elif",
            Method::Else => "else",
            Method::For => "for",
            Method::Function => "function",
            Method::Return => "return",
            Method::Try => "try",
            Method::Catch => "catch",
            Method::Finally => "finally",
        }
    }
}

/// One IR line record. Absent optional fields stay out of the serialized
/// artifact; `args` is omitted when empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub method: Method,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<PathSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
}

impl Line {
    /// A bare record for `method`; fill the rest with struct update syntax.
    pub fn new(method: Method) -> Line {
        Line {
            method,
            args: Vec::new(),
            name: None,
            service: None,
            command: None,
            function: None,
            output: None,
            enter: None,
            exit: None,
            parent: None,
        }
    }
}

// ============================================================================
// THE STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct Lines {
    lines: IndexMap<u32, Line>,
    variables: Vec<Vec<PathSegment>>,
    services: IndexSet<String>,
    modules: IndexMap<String, String>,
    functions: Vec<String>,
}

impl Lines {
    pub fn new() -> Lines {
        Lines::default()
    }

    /// Insert a new record under its source line number and return that id.
    ///
    /// Ids must arrive strictly increasing. A `function` record registers
    /// its function name; `output` names are bound into the variable scope,
    /// except on `function` records where `output` is the declared return
    /// type rather than a binding.
    pub fn append(&mut self, line: u32, record: Line) -> CompileResult<u32> {
        if let Some((&last, _)) = self.lines.last() {
            if line <= last {
                return Err(CompileError::internal(format!(
                    "line {line} appended out of order after {last}"
                )));
            }
        }
        if let Some(function) = &record.function {
            self.functions.push(function.clone());
        }
        let bindings = if record.method == Method::Function {
            None
        } else {
            record.output.clone()
        };
        self.lines.insert(line, record);
        if let Some(names) = bindings {
            self.set_output(line, names)?;
        }
        Ok(line)
    }

    /// `append` specialized for invocations: registers the service name and
    /// emits the record under `method` (`execute` for calls, `when` for
    /// subscriptions).
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &mut self,
        line: u32,
        method: Method,
        service: String,
        command: Option<String>,
        args: Vec<Value>,
        output: Vec<String>,
        enter: Option<u32>,
        parent: Option<u32>,
    ) -> CompileResult<u32> {
        self.services.insert(service.clone());
        self.append(
            line,
            Line {
                args,
                service: Some(service),
                command,
                output: if output.is_empty() { None } else { Some(output) },
                enter,
                parent,
                ..Line::new(method)
            },
        )
    }

    /// Record output bindings on an existing line and bind the names into
    /// the variable scope. `append` routes non-function outputs through
    /// here, so a bound output shadows same-name callees from then on.
    pub fn set_output(&mut self, line: u32, names: Vec<String>) -> CompileResult<()> {
        let record = self
            .lines
            .get_mut(&line)
            .ok_or_else(|| CompileError::internal(format!("no line {line} to set output on")))?;
        record.output = Some(names.clone());
        for name in names {
            self.bind(vec![PathSegment::Name(name)]);
        }
        Ok(())
    }

    /// Bind an assignment target into the variable scope.
    pub fn set_name(&mut self, name: Vec<PathSegment>) {
        self.bind(name);
    }

    fn bind(&mut self, name: Vec<PathSegment>) {
        if !self.variables.contains(&name) {
            self.variables.push(name);
        }
    }

    /// Back-patch line `of` with an exit link to `to`. The caller threads
    /// the preceding sibling block's id; the store never searches for it.
    pub fn set_exit(&mut self, of: u32, to: u32) -> CompileResult<()> {
        let record = self
            .lines
            .get_mut(&of)
            .ok_or_else(|| CompileError::internal(format!("no line {of} to set exit on")))?;
        record.exit = Some(to);
        Ok(())
    }

    /// Whether a callee path names a bound variable. Paths with computed
    /// fragments never do.
    pub fn is_variable(&self, path_tree: &Tree) -> CompileResult<bool> {
        let names = values::names(path_tree)?;
        if names
            .iter()
            .any(|segment| matches!(segment, PathSegment::Value(_)))
        {
            return Ok(false);
        }
        Ok(self.variables.contains(&names))
    }

    /// Extend an existing line's argument list (continuation arguments).
    pub fn append_args(&mut self, line: u32, mut args: Vec<Value>) -> CompileResult<()> {
        let record = self
            .lines
            .get_mut(&line)
            .ok_or_else(|| CompileError::internal(format!("no line {line} to extend")))?;
        record.args.append(&mut args);
        Ok(())
    }

    /// Most recently appended line id, if any.
    pub fn last(&self) -> Option<u32> {
        self.lines.last().map(|(&id, _)| id)
    }

    /// Earliest appended line id, if any.
    pub fn first(&self) -> Option<u32> {
        self.lines.first().map(|(&id, _)| id)
    }

    pub fn method_of(&self, line: u32) -> Option<Method> {
        self.lines.get(&line).map(|record| record.method)
    }

    /// Record a module alias binding.
    pub fn set_module(&mut self, alias: String, path: String) {
        self.modules.insert(alias, path);
    }

    /// The referenced services, deduplicated, in first-reference order.
    pub fn get_services(&self) -> Vec<String> {
        self.services.iter().cloned().collect()
    }

    /// Consume the store into the immutable compile artifact.
    pub fn finalize(self, version: &str) -> Artifact {
        let entrypoint = self.first();
        let services = self.get_services();
        Artifact {
            tree: self.lines,
            services,
            entrypoint,
            modules: self.modules,
            functions: self.functions,
            version: version.to_string(),
        }
    }
}

// ============================================================================
// ARTIFACT
// ============================================================================

/// The boundary contract with the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub tree: IndexMap<u32, Line>,
    pub services: Vec<String>,
    /// First line id; `null` for the empty program.
    pub entrypoint: Option<u32>,
    pub modules: IndexMap<String, String>,
    pub functions: Vec<String>,
    pub version: String,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Node, NodeKind};
    use crate::frontend::lexer::Token;
    use serde_json::json;

    fn path_tree(name: &str) -> Tree {
        Tree::new(
            NodeKind::Path,
            vec![Node::Token(Token::new("NAME", name, 1, 1))],
        )
    }

    #[test]
    fn test_append_keeps_order_and_rejects_regression() {
        let mut lines = Lines::new();
        lines.append(1, Line::new(Method::Set)).unwrap();
        lines.append(3, Line::new(Method::Set)).unwrap();
        assert_eq!(lines.first(), Some(1));
        assert_eq!(lines.last(), Some(3));

        let error = lines.append(2, Line::new(Method::Set)).unwrap_err();
        assert_eq!(error.code(), "internal");
        let error = lines.append(3, Line::new(Method::Set)).unwrap_err();
        assert_eq!(error.code(), "internal");
    }

    #[test]
    fn test_execute_registers_service_once() {
        let mut lines = Lines::new();
        lines
            .execute(
                1,
                Method::Execute,
                "alpine".into(),
                Some("echo".into()),
                vec![],
                vec![],
                None,
                None,
            )
            .unwrap();
        lines
            .execute(
                2,
                Method::Execute,
                "twitter".into(),
                None,
                vec![],
                vec![],
                None,
                None,
            )
            .unwrap();
        lines
            .execute(
                3,
                Method::Execute,
                "alpine".into(),
                None,
                vec![],
                vec![],
                None,
                None,
            )
            .unwrap();
        assert_eq!(lines.get_services(), vec!["alpine", "twitter"]);
    }

    #[test]
    fn test_execute_binds_output_names() {
        let mut lines = Lines::new();
        lines
            .execute(
                1,
                Method::Execute,
                "alpine".into(),
                Some("echo".into()),
                vec![],
                vec!["result".into()],
                None,
                None,
            )
            .unwrap();
        assert!(lines.is_variable(&path_tree("result")).unwrap());
        assert!(!lines.is_variable(&path_tree("other")).unwrap());
    }

    #[test]
    fn test_function_output_is_not_a_binding() {
        let mut lines = Lines::new();
        lines
            .append(
                1,
                Line {
                    function: Some("sum".into()),
                    output: Some(vec!["int".into()]),
                    ..Line::new(Method::Function)
                },
            )
            .unwrap();
        assert_eq!(lines.functions, vec!["sum"]);
        assert!(!lines.is_variable(&path_tree("int")).unwrap());
    }

    #[test]
    fn test_set_name_and_is_variable() {
        let mut lines = Lines::new();
        lines.set_name(vec![PathSegment::Name("color".into())]);
        assert!(lines.is_variable(&path_tree("color")).unwrap());

        // Computed fragments never match.
        let computed = Tree::new(
            NodeKind::Path,
            vec![
                Node::Token(Token::new("NAME", "color", 1, 1)),
                Node::Tree(Tree::new(
                    NodeKind::PathFragment,
                    vec![Node::Tree(path_tree("key"))],
                )),
            ],
        );
        assert!(!lines.is_variable(&computed).unwrap());
    }

    #[test]
    fn test_when_output_binds_on_append() {
        let mut lines = Lines::new();
        lines
            .append(
                1,
                Line {
                    output: Some(vec!["event".into()]),
                    ..Line::new(Method::When)
                },
            )
            .unwrap();
        assert!(lines.is_variable(&path_tree("event")).unwrap());
        let artifact = lines.finalize("0.0.1");
        assert_eq!(artifact.tree[&1].output, Some(vec!["event".to_string()]));
    }

    #[test]
    fn test_set_output_binds_an_existing_line() {
        let mut lines = Lines::new();
        lines.append(1, Line::new(Method::Execute)).unwrap();
        lines.set_output(1, vec!["result".into()]).unwrap();
        assert!(lines.is_variable(&path_tree("result")).unwrap());
        let artifact = lines.finalize("0.0.1");
        assert_eq!(artifact.tree[&1].output, Some(vec!["result".to_string()]));
    }

    #[test]
    fn test_set_output_on_missing_line_is_internal() {
        let mut lines = Lines::new();
        assert_eq!(
            lines.set_output(5, vec!["x".into()]).unwrap_err().code(),
            "internal"
        );
    }

    #[test]
    fn test_set_exit_targets_named_line() {
        let mut lines = Lines::new();
        lines.append(1, Line::new(Method::If)).unwrap();
        lines.append(2, Line::new(Method::Set)).unwrap();
        lines.set_exit(1, 3).unwrap();
        let artifact = lines.finalize("0.0.1");
        assert_eq!(artifact.tree[&1].exit, Some(3));
        assert_eq!(artifact.tree[&2].exit, None);
    }

    #[test]
    fn test_set_exit_on_missing_line_is_internal() {
        let mut lines = Lines::new();
        assert_eq!(lines.set_exit(9, 10).unwrap_err().code(), "internal");
    }

    #[test]
    fn test_append_args_extends_existing_line() {
        let mut lines = Lines::new();
        lines
            .execute(
                1,
                Method::Execute,
                "alpine".into(),
                None,
                vec![Value::Int(1)],
                vec![],
                None,
                None,
            )
            .unwrap();
        lines.append_args(1, vec![Value::Int(2)]).unwrap();
        let artifact = lines.finalize("0.0.1");
        assert_eq!(artifact.tree[&1].args, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_finalize_artifact_shape() {
        let mut lines = Lines::new();
        lines.set_module("http".into(), "modules/http.weft".into());
        lines
            .execute(
                2,
                Method::Execute,
                "alpine".into(),
                Some("echo".into()),
                vec![],
                vec![],
                None,
                None,
            )
            .unwrap();
        let artifact = lines.finalize("0.0.1");
        assert_eq!(
            serde_json::to_value(&artifact).unwrap(),
            json!({
                "tree": {
                    "2": {
                        "method": "execute",
                        "service": "alpine",
                        "command": "echo",
                    },
                },
                "services": ["alpine"],
                "entrypoint": 2,
                "modules": {"http": "modules/http.weft"},
                "functions": [],
                "version": "0.0.1",
            })
        );
    }

    #[test]
    fn test_empty_store_finalizes_without_entrypoint() {
        let artifact = Lines::new().finalize("0.0.1");
        assert_eq!(artifact.entrypoint, None);
        assert!(artifact.tree.is_empty());
        assert_eq!(
            serde_json::to_value(&artifact).unwrap()["entrypoint"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_method_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Method::Elif).unwrap(), json!("elif"));
        assert_eq!(
            serde_json::to_value(Method::Expression).unwrap(),
            json!("expression")
        );
    }
}
