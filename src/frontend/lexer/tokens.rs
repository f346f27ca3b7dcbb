//! Token types for the Weft lexer.
//!
//! Terminals are declared at runtime from the grammar text, so a token's kind
//! is the declared terminal name (`"NAME"`, `"_NL"`, ...) rather than a closed
//! enum. Kinds starting with `_` are structural: the parser consumes them but
//! filters them out of the tree it builds.

// ============================================================================
// TOKEN
// ============================================================================

/// A single lexed token.
///
/// `line` and `column` are 1-based source coordinates. For `_NL` tokens, which
/// can span several physical newlines, `line` is the line the token starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Terminal name as declared in the grammar (`"NAME"`, `"OPERATOR"`, ...).
    pub kind: String,
    /// Matched source text.
    pub text: String,
    /// 1-based line of the first matched character.
    pub line: u32,
    /// 1-based column of the first matched character.
    pub column: u32,
}

impl Token {
    pub fn new(kind: impl Into<String>, text: impl Into<String>, line: u32, column: u32) -> Self {
        Token { kind: kind.into(), text: text.into(), line, column }
    }

    /// Whether this token is filtered out of parse trees (`_`-prefixed kind).
    pub fn is_filtered(&self) -> bool {
        self.kind.starts_with('_')
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.kind, self.text)
    }
}
