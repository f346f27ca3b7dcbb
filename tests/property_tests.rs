//! Property-based tests for the weft compiler
//!
//! These tests use proptest to verify invariants across many randomly
//! generated stories, catching edge cases that hand-written tests might
//! miss. Case counts are kept low because every parse builds a fresh
//! grammar engine.

use proptest::prelude::*;

use weft::backend::Compiler;
use weft::frontend::Parser;
use weft::Artifact;

fn compile(source: &str) -> Artifact {
    let tree = Parser::new().parse(source, true).expect("parse failed");
    Compiler::new().compile(tree).expect("compile failed")
}

// Strategy for weft identifiers, avoiding keywords and type names
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_filter("Not a keyword", |name| {
        !matches!(
            name.as_str(),
            "if" | "else"
                | "foreach"
                | "function"
                | "when"
                | "try"
                | "catch"
                | "finally"
                | "return"
                | "returns"
                | "import"
                | "as"
                | "true"
                | "false"
                | "int"
                | "string"
                | "boolean"
                | "number"
                | "list"
                | "object"
                | "regexp"
                | "any"
        )
    })
}

// Strategy for one flat statement: an assignment or a service call
fn statement_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (name_strategy(), any::<u16>()).prop_map(|(name, value)| format!("{name} = {value}")),
        (name_strategy(), name_strategy())
            .prop_map(|(service, command)| format!("{service} {command}")),
    ]
}

fn story_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(statement_strategy(), 1..10)
        .prop_map(|statements| format!("{}\n", statements.join("\n")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: line ids are unique, strictly increasing, and the
    /// entrypoint is the first of them.
    #[test]
    fn generated_stories_emit_ordered_lines(story in story_strategy()) {
        let artifact = compile(&story);
        let ids: Vec<u32> = artifact.tree.keys().copied().collect();
        prop_assert!(!ids.is_empty());
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(artifact.entrypoint, Some(ids[0]));
    }

    /// Property: the service table never repeats a name.
    #[test]
    fn generated_stories_deduplicate_services(story in story_strategy()) {
        let artifact = compile(&story);
        let mut seen = std::collections::HashSet::new();
        for service in &artifact.services {
            prop_assert!(seen.insert(service.clone()), "service {} repeated", service);
        }
    }

    /// Property: compiling the same story twice yields the same artifact.
    #[test]
    fn compilation_is_deterministic(story in story_strategy()) {
        let first = serde_json::to_value(compile(&story)).expect("serialize failed");
        let second = serde_json::to_value(compile(&story)).expect("serialize failed");
        prop_assert_eq!(first, second);
    }

    /// Property: once a name is assigned, a call shape on it compiles as an
    /// expression line, not an invocation.
    #[test]
    fn bound_names_shadow_services(
        name in name_strategy(),
        command in name_strategy(),
    ) {
        let story = format!("{name} = 1\n{name} {command}\n");
        let artifact = compile(&story);
        prop_assert_eq!(artifact.tree[&2].method.as_str(), "expression");
        prop_assert!(artifact.services.is_empty());
    }

    /// Property: interpolating a single name produces a `{}` template with
    /// exactly one path value.
    #[test]
    fn interpolation_extracts_one_path(name in name_strategy()) {
        let story = format!("m = \"hi {{{name}}}\"\n");
        let artifact = compile(&story);
        let json = serde_json::to_value(&artifact.tree[&1]).expect("serialize failed");
        prop_assert_eq!(&json["args"][0]["string"], "hi {}");
        prop_assert_eq!(&json["args"][0]["values"][0]["paths"][0], name.as_str());
    }
}
