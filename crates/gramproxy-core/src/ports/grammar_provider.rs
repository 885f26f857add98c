//! Grammar provider port.

use async_trait::async_trait;

use crate::domain::{Grammar, GrammarOrigin};

/// Supplies the grammar to inject into chat completion requests.
///
/// Called once per request that needs a grammar. Implementations must not
/// fail: when the preferred source is unavailable they return a fallback.
#[async_trait]
pub trait GrammarProvider: Send + Sync {
    /// Load the current grammar.
    async fn load(&self) -> Grammar;
}

/// A provider that always returns the same grammar text.
#[derive(Debug, Clone)]
pub struct StaticGrammarProvider {
    text: String,
}

impl StaticGrammarProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl GrammarProvider for StaticGrammarProvider {
    async fn load(&self) -> Grammar {
        Grammar::new(self.text.clone(), GrammarOrigin::Static)
    }
}
