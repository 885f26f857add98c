//! Grammar value type and the embedded fallback grammar.

/// Grammar used when the configured grammar file cannot be read.
///
/// Accepts an optional analysis channel, then requires the assistant start
/// marker and the final channel marker followed by at least one character.
pub const FALLBACK_GRAMMAR: &str = r#"root ::= analysis? start final .+
analysis ::= "<|channel|>analysis<|message|>" ( [^<] | "<" [^|] | "<|" [^e] )* "<|end|>"
start ::= "<|start|>assistant"
final ::= "<|channel|>final<|message|>""#;

/// Where a [`Grammar`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarOrigin {
    /// Read from the configured file.
    File,
    /// The embedded [`FALLBACK_GRAMMAR`].
    Fallback,
    /// Supplied directly by the caller.
    Static,
}

/// An immutable GBNF grammar string.
///
/// No syntax validation is performed; the text is passed to the upstream
/// engine as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    text: String,
    origin: GrammarOrigin,
}

impl Grammar {
    pub fn new(text: impl Into<String>, origin: GrammarOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    /// The embedded fallback grammar.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_GRAMMAR, GrammarOrigin::Fallback)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub const fn origin(&self) -> GrammarOrigin {
        self.origin
    }
}
