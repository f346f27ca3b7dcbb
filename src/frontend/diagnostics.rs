//! Diagnostics and error reporting for Weft.
//!
//! Provides terminal-friendly error messages with source highlighting.

use thiserror::Error;

use crate::frontend::lexer::tokens::Token;

/// Result alias used throughout the compiler.
pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// COMPILE ERRORS
// ============================================================================

/// Any error the compiler can raise, carrying whatever source context the
/// raising stage has.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The grammar itself is unusable (malformed rule, missing terminal,
    /// parse-table conflict). Raised while building the parsing engine.
    #[error("invalid grammar: {message}")]
    Grammar { message: String },

    /// The scanner found no terminal matching the input at this position.
    #[error("unexpected input at line {line}, column {column}")]
    UnexpectedInput { line: u32, column: u32 },

    /// The parser received a token no rule admits at this point.
    #[error("unexpected token `{}` on line {}", .token.text, .token.line)]
    UnexpectedToken { token: Token, expected: Vec<String> },

    /// A line is indented to a depth that matches no open block.
    #[error("inconsistent indentation on line {line}: expected {expected} spaces, got {found}")]
    Indentation { line: u32, expected: usize, found: usize },

    /// Assignment target contains `/`.
    #[error("variable names can't contain `/`: `{}`", .token.text)]
    VariablesBackslash { token: Token },

    /// Assignment target contains `-`.
    #[error("variable names can't contain `-`: `{}`", .token.text)]
    VariablesDash { token: Token },

    /// A bare argument list with no service call on the preceding line.
    #[error("arguments must follow a service call (line {line})")]
    ArgumentsNoservice { line: u32 },

    /// `return` outside of any block.
    #[error("`return` can't be used at the top level (line {line})")]
    ReturnOutside { line: u32 },

    /// An integer literal wider than the artifact's number representation.
    #[error("number `{}` is too large", .token.text)]
    NumberOverflow { token: Token },

    /// A grammar-guaranteed tree shape did not hold. Always a compiler bug.
    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompileError {
    pub fn grammar(message: impl Into<String>) -> Self {
        CompileError::Grammar { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal { message: message.into() }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Grammar { .. } => "grammar",
            CompileError::UnexpectedInput { .. } => "unexpected-input",
            CompileError::UnexpectedToken { .. } => "unexpected-token",
            CompileError::Indentation { .. } => "indentation",
            CompileError::VariablesBackslash { .. } => "variables-backslash",
            CompileError::VariablesDash { .. } => "variables-dash",
            CompileError::ArgumentsNoservice { .. } => "arguments-noservice",
            CompileError::ReturnOutside { .. } => "return-outside",
            CompileError::NumberOverflow { .. } => "number-overflow",
            CompileError::Internal { .. } => "internal",
        }
    }

    /// Whether this is a front-end syntax error. `Parser::parse` turns this
    /// class into a terminal message in non-debug mode; everything else is
    /// always propagated to the caller.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            CompileError::Grammar { .. }
                | CompileError::UnexpectedInput { .. }
                | CompileError::UnexpectedToken { .. }
                | CompileError::Indentation { .. }
        )
    }

    /// Best-known source position, if the raising stage had one.
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            CompileError::UnexpectedInput { line, column } => Some((*line, *column)),
            CompileError::UnexpectedToken { token, .. }
            | CompileError::VariablesBackslash { token }
            | CompileError::VariablesDash { token }
            | CompileError::NumberOverflow { token } => Some((token.line, token.column)),
            CompileError::Indentation { line, .. }
            | CompileError::ArgumentsNoservice { line }
            | CompileError::ReturnOutside { line } => Some((*line, 1)),
            CompileError::Grammar { .. } | CompileError::Internal { .. } => None,
        }
    }

    fn kind_str(&self) -> &'static str {
        match self {
            CompileError::Grammar { .. }
            | CompileError::UnexpectedInput { .. }
            | CompileError::UnexpectedToken { .. }
            | CompileError::Indentation { .. } => "syntax error",
            CompileError::Internal { .. } => "internal error",
            _ => "error",
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Render an error with source context into a displayable message.
///
/// `source` is the text that was being compiled; positions index into it.
pub fn message(source: &str, error: &CompileError) -> String {
    use std::fmt::Write;

    // Color codes
    let red = "\x1b[31m";
    let cyan = "\x1b[36m";
    let bold = "\x1b[1m";
    let reset = "\x1b[0m";

    let mut out = String::new();
    let _ = write!(
        out,
        "{bold}{red}{kind}{reset}{bold}: {message}{reset}",
        kind = error.kind_str(),
        message = error,
    );

    if let Some((line, column)) = error.position() {
        let line_text = source.lines().nth(line as usize - 1).unwrap_or("");
        let width = line.to_string().len();
        let caret_len = match error {
            CompileError::UnexpectedToken { token, .. }
            | CompileError::NumberOverflow { token } => token.text.chars().count().max(1),
            _ => 1,
        };

        let _ = write!(out, "\n  {cyan}-->{reset} line {line}, column {column}");
        let _ = write!(out, "\n  {cyan}{:>width$} |{reset}", "", width = width);
        let _ = write!(out, "\n  {cyan}{line} |{reset} {line_text}");
        let _ = write!(
            out,
            "\n  {cyan}{:>width$} |{reset} {}{red}{}{reset}",
            "",
            " ".repeat(column.saturating_sub(1) as usize),
            "^".repeat(caret_len),
            width = width,
        );
    }

    if let CompileError::UnexpectedToken { expected, .. } = error {
        if !expected.is_empty() {
            let _ = write!(
                out,
                "\n  {cyan}= note:{reset} expected one of: {}",
                expected.join(", ")
            );
        }
    }

    out
}

/// Render `error` and terminate the process.
///
/// Reached only from the top-level parse entry in non-debug mode; every other
/// path propagates structured errors to the caller.
pub fn abort(source: &str, error: &CompileError) -> ! {
    eprintln!("{}", message(source, error));
    std::process::exit(1)
}
