//! End-to-end tests for the weft compile pipeline: source text in, artifact
//! JSON out.

use std::path::Path;

use serde_json::json;

use weft::backend::Compiler;
use weft::diagnostics::CompileError;
use weft::frontend::Parser;
use weft::{Artifact, WEFT_VERSION, app};

fn compile(source: &str) -> Artifact {
    let tree = Parser::new().parse(source, true).unwrap();
    Compiler::new().compile(tree).unwrap()
}

fn compile_json(source: &str) -> serde_json::Value {
    serde_json::to_value(compile(source)).unwrap()
}

/// Structured error from any stage, with pretty-printing disabled.
fn compile_err(source: &str) -> CompileError {
    match Parser::new().parse(source, true) {
        Err(error) => error,
        Ok(tree) => Compiler::new()
            .compile(tree)
            .expect_err("source should not compile"),
    }
}

// ============================================================================
// Artifact shapes
// ============================================================================

#[test]
fn test_known_source_compiles_to_the_exact_artifact() {
    let source = "a = 1\nb = \"hello, {a}\"\nalpine echo(message: b)\n";
    assert_eq!(
        compile_json(source),
        json!({
            "tree": {
                "1": {"method": "set", "args": [1], "name": ["a"]},
                "2": {
                    "method": "set",
                    "args": [{
                        "$OBJECT": "string",
                        "string": "hello, {}",
                        "values": [{"$OBJECT": "path", "paths": ["a"]}],
                    }],
                    "name": ["b"],
                },
                "3": {
                    "method": "execute",
                    "args": [{
                        "$OBJECT": "argument",
                        "name": "message",
                        "argument": {"$OBJECT": "path", "paths": ["b"]},
                    }],
                    "service": "alpine",
                    "command": "echo",
                },
            },
            "services": ["alpine"],
            "entrypoint": 1,
            "modules": {},
            "functions": [],
            "version": WEFT_VERSION,
        })
    );
}

#[test]
fn test_conditional_call_round_trip() {
    let json = compile_json("if x > 1:\n    foo()\n");
    assert_eq!(
        json["tree"]["1"],
        json!({
            "method": "if",
            "args": [{
                "$OBJECT": "expression",
                "expression": "{} > {}",
                "values": [{"$OBJECT": "path", "paths": ["x"]}, 1],
            }],
            "enter": 2,
        })
    );
    assert_eq!(json["tree"]["2"], json!({"method": "execute", "service": "foo", "parent": 1}));
}

#[test]
fn test_wide_integer_literals_reach_the_artifact_verbatim() {
    // Past u64; the JSON writer emits the full digit run as a bare scalar.
    let artifact = compile("x = 99999999999999999999\n");
    let rendered = serde_json::to_string(&artifact).unwrap();
    assert!(rendered.contains("99999999999999999999"));

    let boundary = compile_json("x = 9223372036854775807\n");
    assert_eq!(boundary["tree"]["1"]["args"], json!([9223372036854775807i64]));
}

#[test]
fn test_empty_source_compiles_to_an_empty_tree() {
    let json = compile_json("");
    assert_eq!(json["tree"], json!({}));
    assert_eq!(json["entrypoint"], json!(null));
}

#[test]
fn test_shorthand_argument_expands_to_name_equals_itself() {
    let json = compile_json("alpine echo(msg)\n");
    assert_eq!(
        json["tree"]["1"]["args"],
        json!([{
            "$OBJECT": "argument",
            "name": "msg",
            "argument": {"$OBJECT": "path", "paths": ["msg"]},
        }])
    );
}

#[test]
fn test_bound_names_stop_compiling_as_services() {
    // `x` is a service result on line 1, so the call shape on line 2 reads
    // as a mutation of the variable instead of an invocation.
    let json = compile_json("x = alpine echo\nx upcase()\n");
    assert_eq!(json["tree"]["2"]["method"], "expression");
    assert_eq!(
        json["tree"]["2"]["args"],
        json!([
            {"$OBJECT": "path", "paths": ["x"]},
            {"$OBJECT": "mutation", "mutation": "upcase", "arguments": []},
        ])
    );
    assert_eq!(json["services"], json!(["alpine"]));
}

#[test]
fn test_loop_output_becomes_a_variable() {
    let source = "foreach items as item:\n    item push(value: 1)\n";
    let json = compile_json(source);
    assert_eq!(json["tree"]["1"]["method"], "for");
    assert_eq!(json["tree"]["1"]["output"], json!(["item"]));
    assert_eq!(json["tree"]["2"]["method"], "expression");
    assert_eq!(json["tree"]["2"]["parent"], 1);
}

#[test]
fn test_when_lines_carry_the_when_method() {
    let source = "gateway server as api\n    when api request(path: '/') as req:\n        api write(content: 'ok')\n";
    let json = compile_json(source);
    assert_eq!(json["tree"]["1"]["method"], "execute");
    assert_eq!(json["tree"]["2"]["method"], "when");
    assert_eq!(json["tree"]["2"]["service"], "api");
    assert_eq!(json["tree"]["2"]["command"], "request");
    assert_eq!(json["tree"]["2"]["output"], json!(["req"]));
    assert_eq!(json["tree"]["3"]["parent"], 2);
}

#[test]
fn test_functions_register_and_calls_execute() {
    let source = "function double n:int returns int:\n    return n\ndouble(n: 4)\n";
    let json = compile_json(source);
    assert_eq!(json["functions"], json!(["double"]));
    assert_eq!(json["tree"]["1"]["method"], "function");
    assert_eq!(json["tree"]["1"]["output"], json!(["int"]));
    assert_eq!(json["tree"]["3"]["method"], "execute");
    assert_eq!(json["tree"]["3"]["service"], "double");
}

#[test]
fn test_imports_fill_the_module_table() {
    let json = compile_json("import 'util/strings' as strings\n");
    assert_eq!(json["tree"], json!({}));
    assert_eq!(json["modules"], json!({"strings": "util/strings"}));
}

#[test]
fn test_sibling_blocks_backpatch_exit_links() {
    let source = "\
try:
    a = 1
catch as problem:
    b = 2
finally:
    c = 3
";
    let json = compile_json(source);
    assert_eq!(json["tree"]["1"]["exit"], 3);
    assert_eq!(json["tree"]["3"]["exit"], 5);
    assert_eq!(json["tree"]["3"]["output"], json!(["problem"]));
    assert_eq!(json["tree"]["5"].get("exit"), None);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_error_codes_by_stage() {
    // scanner
    assert_eq!(compile_err("x = $\n").code(), "unexpected-input");
    // LR driver
    assert_eq!(compile_err("x =\n").code(), "unexpected-token");
    // indentation pass
    assert_eq!(compile_err("if x:\n        a = 1\n    b = 2\n").code(), "indentation");
    // normalizer
    assert_eq!(compile_err("a/b = 1\n").code(), "variables-backslash");
    assert_eq!(compile_err("a-b = 1\n").code(), "variables-dash");
    // value builder
    assert_eq!(compile_err(&format!("x = {}\n", "9".repeat(40))).code(), "number-overflow");
    // compiler
    assert_eq!(compile_err("return 1\n").code(), "return-outside");
    assert_eq!(compile_err("a = 1\nkey: 1\n").code(), "arguments-noservice");
}

#[test]
fn test_underscored_names_assign_cleanly() {
    let json = compile_json("a_b = 1\n");
    assert_eq!(json["tree"]["1"]["name"], json!(["a_b"]));
}

#[test]
fn test_identical_input_compiles_identically() {
    let source = "x = 1\nif x > 1:\n    foo()\n";
    assert_eq!(compile_json(source), compile_json(source));
}

// ============================================================================
// Path drivers over the fixture stories
// ============================================================================

#[test]
fn test_fixture_stories_all_compile() {
    let fixtures = Path::new("tests/fixtures");
    let artifacts = app::compile_path(fixtures, None, true).unwrap();
    assert!(artifacts.len() >= 3, "expected the fixture stories to be discovered");
    for artifact in artifacts.values() {
        assert_eq!(artifact.version, WEFT_VERSION);
        assert!(!artifact.tree.is_empty());
    }
}

#[test]
fn test_fixture_greetings_subscribes() {
    let fixtures = Path::new("tests/fixtures/greetings.weft");
    let artifacts = app::compile_path(fixtures, None, true).unwrap();
    let artifact = &artifacts[fixtures];
    let methods: Vec<_> =
        artifact.tree.values().map(|line| line.method.as_str()).collect();
    assert!(methods.contains(&"when"));
}

#[test]
fn test_fixture_orders_declares_its_function() {
    let fixtures = Path::new("tests/fixtures/orders.weft");
    let artifacts = app::compile_path(fixtures, None, true).unwrap();
    assert_eq!(artifacts[fixtures].functions, vec!["total".to_string()]);
}

#[test]
fn test_fixture_modules_imports() {
    let fixtures = Path::new("tests/fixtures/modules.weft");
    let artifacts = app::compile_path(fixtures, None, true).unwrap();
    let modules = &artifacts[fixtures].modules;
    assert_eq!(modules.get("strings").map(String::as_str), Some("util/strings"));
}

#[test]
fn test_lex_path_reports_tokens_for_tooling() {
    let fixtures = Path::new("tests/fixtures/modules.weft");
    let tokens = app::lex_path(fixtures, None).unwrap();
    assert!(tokens[fixtures].iter().any(|token| token.kind == "STRING"));
}
