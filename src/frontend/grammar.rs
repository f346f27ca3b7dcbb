//! Grammar assembly for the Weft language.
//!
//! [`Grammar`] accumulates declarations and renders them as grammar text for
//! the engine; [`weft_grammar`] registers the language and returns the built
//! text. No validation happens at this layer: malformed declarations surface
//! when the parsing engine is constructed from the text.
//!
//! Registration order is load-bearing for terminals: the scanner resolves
//! equal-length regexp matches by registration order, which is what keeps
//! `int` a TYPE rather than a NAME.

// ============================================================================
// GRAMMAR BUILDER
// ============================================================================

#[derive(Debug, Default)]
pub struct Grammar {
    start: Option<String>,
    terminals: Vec<(String, String)>,
    declares: Vec<String>,
    ignores: Vec<String>,
    rules: Vec<(String, String)>,
}

impl Grammar {
    pub fn new() -> Grammar {
        Grammar::default()
    }

    /// Name the start rule; its declaration is rendered first.
    pub fn start(&mut self, rule: &str) {
        self.start = Some(rule.to_string());
    }

    /// Append a terminal with a `/regex/` or `"literal"` body.
    pub fn terminal(&mut self, name: &str, pattern: &str) {
        self.terminals.push((name.to_string(), pattern.to_string()));
    }

    /// Append a `%declare` line for postlex-only terminals.
    pub fn declare(&mut self, names: &[&str]) {
        self.declares.push(names.join(" "));
    }

    /// Append a `%ignore` line.
    pub fn ignore(&mut self, pattern: &str) {
        self.ignores.push(pattern.to_string());
    }

    /// Append a rule with `|`-joined alternatives.
    pub fn rule(&mut self, name: &str, alternatives: &[&str]) {
        self.rules.push((name.to_string(), alternatives.join(" | ")));
    }

    /// Render the accumulated declarations, start rule first, one per line.
    pub fn build(&self) -> String {
        let mut lines = Vec::new();
        if let Some(start) = &self.start {
            if let Some((name, body)) = self.rules.iter().find(|(name, _)| name == start) {
                lines.push(format!("{name}: {body}"));
            }
        }
        for (name, body) in &self.rules {
            if Some(name) != self.start.as_ref() {
                lines.push(format!("{name}: {body}"));
            }
        }
        for (name, body) in &self.terminals {
            lines.push(format!("{name}: {body}"));
        }
        for names in &self.declares {
            lines.push(format!("%declare {names}"));
        }
        for pattern in &self.ignores {
            lines.push(format!("%ignore {pattern}"));
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

// ============================================================================
// THE WEFT LANGUAGE
// ============================================================================

/// Build the grammar text for the Weft language.
///
/// `ELSE`, `TRY`, `CATCH` and `FINALLY` stay visible terminals: statements
/// like `else :` consist of nothing but keywords and punctuation, and the
/// kept keyword token is what carries the statement's source line into IR
/// emission.
pub fn weft_grammar() -> String {
    let mut g = Grammar::new();
    g.start("start");

    g.rule("start", &["_NL? block*"]);
    g.rule(
        "block",
        &[
            "line",
            "if_block",
            "foreach_block",
            "function_block",
            "try_block",
            "when_block",
            "service_block",
        ],
    );
    g.rule("line", &["simple _NL"]);
    g.rule(
        "simple",
        &["assignment", "absolute_expression", "return_statement", "imports", "cont_arg"],
    );
    g.rule("nested_block", &["_INDENT block+ _DEDENT"]);

    g.rule("imports", &["_IMPORT string _AS NAME"]);
    g.rule("assignment", &["path _EQUALS assignment_fragment"]);
    g.rule("assignment_fragment", &["expression", "service"]);

    g.rule("absolute_expression", &["expression"]);
    g.rule("expression", &["values", "values OPERATOR values", "_literal mutation"]);
    g.rule("mutation", &["NAME call_args"]);
    g.rule("_literal", &["string", "number", "boolean", "list", "objects", "regular_expression"]);
    g.rule("values", &["_literal", "path"]);
    g.rule("path", &["NAME path_fragment*"]);
    g.rule("path_fragment", &["_DOT NAME", "_OSB string _CSB", "_OSB path _CSB"]);

    g.rule("service", &["path service_fragment"]);
    g.rule("service_block", &["service _NL nested_block", "service _NL"]);
    g.rule(
        "service_fragment",
        &[
            "command call_args output",
            "command call_args",
            "command output",
            "command",
            "call_args output",
            "call_args",
        ],
    );
    g.rule("command", &["NAME"]);
    g.rule("call_args", &["_LP _RP", "_LP _call_items _RP"]);
    g.rule("_call_items", &["arguments", "_call_items _COMMA arguments"]);
    g.rule("arguments", &["NAME _COLON values", "path"]);
    g.rule("cont_arg", &["NAME _COLON values -> arguments"]);
    g.rule("output", &["_AS _name_list"]);
    g.rule("_name_list", &["NAME", "_name_list _COMMA NAME"]);

    g.rule("if_block", &["if_statement _NL nested_block elseif_block* else_block?"]);
    g.rule("if_statement", &["_IF expression _COLON"]);
    g.rule("elseif_block", &["elseif_statement _NL nested_block"]);
    g.rule("elseif_statement", &["ELSE _IF expression _COLON"]);
    g.rule("else_block", &["else_statement _NL nested_block"]);
    g.rule("else_statement", &["ELSE _COLON"]);

    g.rule("foreach_block", &["foreach_statement _NL nested_block"]);
    g.rule("foreach_statement", &["_FOREACH path output _COLON", "_FOREACH path _COLON"]);

    g.rule("function_block", &["function_statement _NL nested_block"]);
    g.rule("function_statement", &["_FUNCTION NAME typed_argument* function_output? _COLON"]);
    g.rule("typed_argument", &["NAME _COLON types"]);
    g.rule("types", &["TYPE"]);
    g.rule("function_output", &["_RETURNS types"]);

    g.rule("when_block", &["when_statement _NL nested_block", "when_statement _NL"]);
    g.rule(
        "when_statement",
        &["_WHEN service _COLON", "_WHEN path output _COLON", "_WHEN path _COLON"],
    );

    g.rule("try_block", &["try_statement _NL nested_block catch_block? finally_block?"]);
    g.rule("try_statement", &["TRY _COLON"]);
    g.rule("catch_block", &["catch_statement _NL nested_block"]);
    g.rule("catch_statement", &["CATCH output _COLON", "CATCH _COLON"]);
    g.rule("finally_block", &["finally_statement _NL nested_block"]);
    g.rule("finally_statement", &["FINALLY _COLON"]);

    g.rule("return_statement", &["_RETURN values"]);

    g.rule("string", &["STRING"]);
    g.rule("number", &["INT", "FLOAT"]);
    g.rule("boolean", &["TRUE", "FALSE"]);
    g.rule("list", &["_OSB _CSB", "_OSB _list_items _CSB"]);
    g.rule("_list_items", &["values", "_list_items _COMMA values"]);
    g.rule("objects", &["_LCB _RCB", "_LCB _kv_items _RCB"]);
    g.rule("_kv_items", &["key_value", "_kv_items _COMMA key_value"]);
    g.rule("key_value", &["string _COLON values", "path _COLON values"]);
    g.rule("regular_expression", &["REGEXP"]);

    g.terminal("_NL", r"/(?:\r?\n[ \t]*(?:#[^\n]*)?)+/");
    g.terminal("_IMPORT", "\"import\"");
    g.terminal("_FUNCTION", "\"function\"");
    g.terminal("_IF", "\"if\"");
    g.terminal("ELSE", "\"else\"");
    g.terminal("_FOREACH", "\"foreach\"");
    g.terminal("_AS", "\"as\"");
    g.terminal("_RETURNS", "\"returns\"");
    g.terminal("_WHEN", "\"when\"");
    g.terminal("TRY", "\"try\"");
    g.terminal("CATCH", "\"catch\"");
    g.terminal("FINALLY", "\"finally\"");
    g.terminal("_RETURN", "\"return\"");
    g.terminal("TRUE", "\"true\"");
    g.terminal("FALSE", "\"false\"");
    g.terminal("TYPE", "/int|string|boolean|number|list|object|regexp|any/");
    g.terminal("FLOAT", r"/[0-9]+\.[0-9]+/");
    g.terminal("INT", "/[0-9]+/");
    g.terminal("STRING", r#"/"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'/"#);
    g.terminal("REGEXP", r"/\/(?:\\.|[^\/\\ \t\r\n])+\/[a-z]*/");
    g.terminal("NAME", r"/[a-zA-Z_][a-zA-Z0-9_\/-]*/");
    g.terminal("OPERATOR", r"/==|!=|<=|>=|<|>|\+|-|\*|\/|%/");
    g.terminal("_EQUALS", "\"=\"");
    g.terminal("_COLON", "\":\"");
    g.terminal("_COMMA", "\",\"");
    g.terminal("_DOT", "\".\"");
    g.terminal("_OSB", "\"[\"");
    g.terminal("_CSB", "\"]\"");
    g.terminal("_LCB", "\"{\"");
    g.terminal("_RCB", "\"}\"");
    g.terminal("_LP", "\"(\"");
    g.terminal("_RP", "\")\"");

    g.declare(&["_INDENT", "_DEDENT"]);
    g.ignore(r"/[ \t]+/");
    g.ignore(r"/#[^\n]*/");

    g.build()
}
