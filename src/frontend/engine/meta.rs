//! Grammar-text meta parser.
//!
//! The parsing engine is constructed at runtime from grammar text, never from
//! generated code. This module turns that text into terminal and rule
//! definitions, then expands `?`/`*`/`+` repetitions into plain BNF
//! productions for the table builder.
//!
//! Meta syntax, one declaration per line (a line starting with `|` continues
//! the previous rule):
//!
//! ```text
//! start: _NL? block*
//! cont_arg: NAME _COLON values -> arguments
//! NAME: /[a-zA-Z_][a-zA-Z0-9_\/-]*/
//! _COLON: ":"
//! %declare _INDENT _DEDENT
//! %ignore /[ \t]+/
//! ```

use std::collections::HashSet;

use crate::frontend::diagnostics::{CompileError, CompileResult};

// ============================================================================
// DEFINITIONS
// ============================================================================

/// A parsed grammar: declarations in registration order, repetitions intact.
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarSpec {
    pub terminals: Vec<TerminalDef>,
    pub rules: Vec<RuleDef>,
    /// Regex patterns skipped between tokens.
    pub ignores: Vec<String>,
    /// Name of the first declared rule.
    pub start: String,
}

/// One terminal declaration. `pattern` is `None` for `%declare`d terminals,
/// which are produced only by the indentation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalDef {
    pub name: String,
    pub pattern: Option<Pattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Literal(String),
    Regex(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleDef {
    pub name: String,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub items: Vec<SymbolRef>,
    /// `-> name` alias: the node this alternative produces is tagged `name`.
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRef {
    pub name: String,
    pub suffix: Option<Suffix>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    Optional,
    Star,
    Plus,
}

/// A grammar after repetition expansion: pure BNF, ready for LR construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedGrammar {
    pub terminals: Vec<TerminalDef>,
    pub ignores: Vec<String>,
    pub start: String,
    pub productions: Vec<Production>,
    terminal_names: HashSet<String>,
}

/// One BNF production. `rule` names the producing rule; nodes it builds are
/// tagged `alias` when present, `rule` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub rule: String,
    pub symbols: Vec<String>,
    pub alias: Option<String>,
}

impl ExpandedGrammar {
    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.terminal_names.contains(symbol)
    }
}

impl Production {
    /// Render as `rule: sym sym sym` for conflict messages.
    pub fn display(&self) -> String {
        if self.symbols.is_empty() {
            format!("{}: <empty>", self.rule)
        } else {
            format!("{}: {}", self.rule, self.symbols.join(" "))
        }
    }
}

// ============================================================================
// META PARSE
// ============================================================================

/// Parse grammar text into declarations.
pub fn parse(text: &str) -> CompileResult<GrammarSpec> {
    let mut terminals = Vec::new();
    let mut rules: Vec<RuleDef> = Vec::new();
    let mut ignores = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for line in join_continuations(text)? {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if let Some(rest) = line.strip_prefix("%declare") {
            for name in rest.split_whitespace() {
                if !is_terminal_name(name) {
                    return Err(CompileError::grammar(format!(
                        "%declare takes terminal names, got `{name}`"
                    )));
                }
                declare_once(&mut seen, name)?;
                terminals.push(TerminalDef { name: name.to_string(), pattern: None });
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("%ignore") {
            match parse_pattern(rest.trim())? {
                Pattern::Regex(pattern) => ignores.push(pattern),
                Pattern::Literal(_) => {
                    return Err(CompileError::grammar("%ignore takes a /regex/ pattern"));
                }
            }
            continue;
        }

        let (name, body) = split_declaration(line)?;
        if is_terminal_name(name) {
            declare_once(&mut seen, name)?;
            let pattern = parse_pattern(body)?;
            terminals.push(TerminalDef { name: name.to_string(), pattern: Some(pattern) });
        } else {
            declare_once(&mut seen, name)?;
            let alternatives = parse_alternatives(name, body)?;
            rules.push(RuleDef { name: name.to_string(), alternatives });
        }
    }

    let start = match rules.first() {
        Some(rule) => rule.name.clone(),
        None => return Err(CompileError::grammar("grammar declares no rules")),
    };
    Ok(GrammarSpec { terminals, rules, ignores, start })
}

/// Join lines whose first non-blank character is `|` onto the previous line.
fn join_continuations(text: &str) -> CompileResult<Vec<String>> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with('|') {
            match lines.last_mut() {
                Some(previous) => {
                    previous.push(' ');
                    previous.push_str(line.trim());
                }
                None => {
                    return Err(CompileError::grammar(
                        "continuation line with nothing to continue",
                    ));
                }
            }
        } else {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

/// Terminal names are uppercase past any leading underscores; rule names are
/// lowercase.
fn is_terminal_name(name: &str) -> bool {
    name.trim_start_matches('_')
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn declare_once(seen: &mut HashSet<String>, name: &str) -> CompileResult<()> {
    if !is_identifier(name) {
        return Err(CompileError::grammar(format!("invalid declaration name `{name}`")));
    }
    if !seen.insert(name.to_string()) {
        return Err(CompileError::grammar(format!("`{name}` is declared twice")));
    }
    Ok(())
}

/// Split `name : body`. The name is scanned from the front so that `:`
/// characters inside regex bodies are never confused with the separator.
fn split_declaration(line: &str) -> CompileResult<(&str, &str)> {
    let name_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let (name, rest) = line.split_at(name_end);
    let rest = rest.trim_start();
    match rest.strip_prefix(':') {
        Some(body) if !name.is_empty() => Ok((name, body.trim())),
        _ => Err(CompileError::grammar(format!("malformed declaration: `{line}`"))),
    }
}

fn parse_pattern(body: &str) -> CompileResult<Pattern> {
    if body.len() >= 2 && body.starts_with('/') && body.ends_with('/') {
        return Ok(Pattern::Regex(body[1..body.len() - 1].to_string()));
    }
    if body.len() >= 2 && body.starts_with('"') && body.ends_with('"') {
        return Ok(Pattern::Literal(body[1..body.len() - 1].to_string()));
    }
    Err(CompileError::grammar(format!(
        "terminal body must be a /regex/ or a \"literal\", got `{body}`"
    )))
}

fn parse_alternatives(rule: &str, body: &str) -> CompileResult<Vec<Alternative>> {
    let mut alternatives = Vec::new();
    for alt_text in body.split('|') {
        let (items_text, alias) = match alt_text.rsplit_once("->") {
            Some((items, alias)) => {
                let alias = alias.trim();
                if !is_identifier(alias) {
                    return Err(CompileError::grammar(format!(
                        "invalid alias `{alias}` in rule `{rule}`"
                    )));
                }
                (items, Some(alias.to_string()))
            }
            None => (alt_text, None),
        };
        let mut items = Vec::new();
        for word in items_text.split_whitespace() {
            items.push(parse_symbol(rule, word)?);
        }
        if items.is_empty() {
            return Err(CompileError::grammar(format!("empty alternative in rule `{rule}`")));
        }
        alternatives.push(Alternative { items, alias });
    }
    Ok(alternatives)
}

fn parse_symbol(rule: &str, word: &str) -> CompileResult<SymbolRef> {
    let (name, suffix) = match word.chars().last() {
        Some('?') => (&word[..word.len() - 1], Some(Suffix::Optional)),
        Some('*') => (&word[..word.len() - 1], Some(Suffix::Star)),
        Some('+') => (&word[..word.len() - 1], Some(Suffix::Plus)),
        _ => (word, None),
    };
    if !is_identifier(name) {
        return Err(CompileError::grammar(format!(
            "invalid symbol `{word}` in rule `{rule}`"
        )));
    }
    Ok(SymbolRef { name: name.to_string(), suffix })
}

// ============================================================================
// REPETITION EXPANSION
// ============================================================================

impl GrammarSpec {
    /// Expand `x?`/`x*`/`x+` into references to generated rules and validate
    /// that every referenced symbol is defined.
    ///
    /// Generated rules are `__x_opt`, `__x_star` and `__x_plus`, created once
    /// per base symbol; `*` and `+` are left-recursive. Their names start
    /// with `_`, so the parse driver splices their children into the parent.
    pub fn expand(&self) -> CompileResult<ExpandedGrammar> {
        let mut productions = Vec::new();
        let mut generated: Vec<Production> = Vec::new();
        let mut generated_names: HashSet<String> = HashSet::new();

        for rule in &self.rules {
            for alternative in &rule.alternatives {
                let mut symbols = Vec::new();
                for item in &alternative.items {
                    match item.suffix {
                        None => symbols.push(item.name.clone()),
                        Some(suffix) => {
                            let name = generate_repetition(
                                &item.name,
                                suffix,
                                &mut generated,
                                &mut generated_names,
                            );
                            symbols.push(name);
                        }
                    }
                }
                productions.push(Production {
                    rule: rule.name.clone(),
                    symbols,
                    alias: alternative.alias.clone(),
                });
            }
        }
        productions.append(&mut generated);

        let terminal_names: HashSet<String> =
            self.terminals.iter().map(|t| t.name.clone()).collect();
        let mut defined: HashSet<&str> =
            terminal_names.iter().map(String::as_str).collect();
        defined.extend(productions.iter().map(|p| p.rule.as_str()));
        for production in &productions {
            for symbol in &production.symbols {
                if !defined.contains(symbol.as_str()) {
                    return Err(CompileError::grammar(format!(
                        "rule `{}` references undefined symbol `{symbol}`",
                        production.rule
                    )));
                }
            }
        }

        Ok(ExpandedGrammar {
            terminals: self.terminals.clone(),
            ignores: self.ignores.clone(),
            start: self.start.clone(),
            productions,
            terminal_names,
        })
    }
}

fn generate_repetition(
    base: &str,
    suffix: Suffix,
    generated: &mut Vec<Production>,
    generated_names: &mut HashSet<String>,
) -> String {
    let tag = match suffix {
        Suffix::Optional => "opt",
        Suffix::Star => "star",
        Suffix::Plus => "plus",
    };
    let name = format!("__{base}_{tag}");
    if generated_names.insert(name.clone()) {
        let prod = |symbols: Vec<String>| Production {
            rule: name.clone(),
            symbols,
            alias: None,
        };
        match suffix {
            Suffix::Optional => {
                generated.push(prod(vec![]));
                generated.push(prod(vec![base.to_string()]));
            }
            Suffix::Star => {
                generated.push(prod(vec![]));
                generated.push(prod(vec![name.clone(), base.to_string()]));
            }
            Suffix::Plus => {
                generated.push(prod(vec![base.to_string()]));
                generated.push(prod(vec![name.clone(), base.to_string()]));
            }
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_terminals_rules_and_directives() {
        let text = "\
start: thing*
thing: NAME _COLON
NAME: /[a-z]+/
_COLON: \":\"
%declare _INDENT _DEDENT
%ignore /[ \\t]+/
";
        let spec = parse(text).unwrap();
        assert_eq!(spec.start, "start");
        assert_eq!(spec.rules.len(), 2);
        assert_eq!(spec.terminals.len(), 4);
        assert_eq!(spec.terminals[0].pattern, Some(Pattern::Regex("[a-z]+".into())));
        assert_eq!(spec.terminals[1].pattern, Some(Pattern::Literal(":".into())));
        assert_eq!(spec.terminals[2].pattern, None);
        assert_eq!(spec.ignores, vec!["[ \\t]+".to_string()]);
    }

    #[test]
    fn test_parses_alias_and_suffixes() {
        let spec = parse("a: B? c+ -> other\nc: B\nB: \"b\"").unwrap();
        let alt = &spec.rules[0].alternatives[0];
        assert_eq!(alt.alias.as_deref(), Some("other"));
        assert_eq!(alt.items[0].suffix, Some(Suffix::Optional));
        assert_eq!(alt.items[1].suffix, Some(Suffix::Plus));
        assert_eq!(alt.items[1].name, "c");
    }

    #[test]
    fn test_joins_continuation_lines() {
        let text = "a: B\n | C\nB: \"b\"\nC: \"c\"";
        let spec = parse(text).unwrap();
        assert_eq!(spec.rules[0].alternatives.len(), 2);
    }

    #[test]
    fn test_colon_inside_regex_body_is_not_a_separator() {
        let spec = parse("a: NL\nNL: /(?:\\r?\\n)+/").unwrap();
        assert_eq!(
            spec.terminals[0].pattern,
            Some(Pattern::Regex("(?:\\r?\\n)+".into()))
        );
    }

    #[test]
    fn test_duplicate_declaration_fails() {
        let err = parse("a: B\na: B\nB: \"b\"").unwrap_err();
        assert_eq!(err.code(), "grammar");
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_empty_alternative_fails() {
        let err = parse("a: B |\nB: \"b\"").unwrap_err();
        assert!(err.to_string().contains("empty alternative"));
    }

    #[test]
    fn test_expansion_generates_left_recursive_helpers() {
        let spec = parse("a: B* C?\nB: \"b\"\nC: \"c\"").unwrap();
        let expanded = spec.expand().unwrap();
        let names: Vec<&str> = expanded.productions.iter().map(|p| p.rule.as_str()).collect();
        assert_eq!(names, vec!["a", "__B_star", "__B_star", "__C_opt", "__C_opt"]);
        assert_eq!(expanded.productions[0].symbols, vec!["__B_star", "__C_opt"]);
        // star: empty | recursive
        assert!(expanded.productions[1].symbols.is_empty());
        assert_eq!(expanded.productions[2].symbols, vec!["__B_star", "B"]);
        assert!(expanded.is_terminal("B"));
        assert!(!expanded.is_terminal("a"));
    }

    #[test]
    fn test_expansion_deduplicates_generated_rules() {
        let spec = parse("a: B* B*\nB: \"b\"").unwrap();
        let expanded = spec.expand().unwrap();
        let star_count = expanded
            .productions
            .iter()
            .filter(|p| p.rule == "__B_star")
            .count();
        assert_eq!(star_count, 2);
    }

    #[test]
    fn test_undefined_symbol_fails_at_expansion() {
        let spec = parse("a: missing\nB: \"b\"").unwrap();
        let err = spec.expand().unwrap_err();
        assert!(err.to_string().contains("undefined symbol `missing`"));
    }
}
