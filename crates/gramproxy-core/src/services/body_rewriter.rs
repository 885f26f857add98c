//! Grammar injection for chat completion request bodies.
//!
//! The rewriter is deliberately forgiving: anything it cannot understand
//! is forwarded byte-for-byte, and the decision is reported through the
//! [`InterceptEventSink`] rather than surfaced to the caller.

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::ChatCompletionRequest;
use crate::ports::{GrammarProvider, InterceptEvent, InterceptEventSink};

/// Why a body was forwarded without modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// The body did not decode as a chat completion request.
    NotChatCompletion,
    /// `options.grammar` was already set.
    GrammarAlreadyPresent,
    /// Encoding the modified request failed.
    ReencodeFailed,
}

/// Outcome of [`BodyRewriter::rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyRewrite {
    /// The grammar was injected; this is the new body.
    Injected(Bytes),
    /// The original bytes, unchanged.
    Passthrough {
        body: Bytes,
        reason: PassthroughReason,
    },
}

impl BodyRewrite {
    /// The body to forward.
    pub const fn body(&self) -> &Bytes {
        match self {
            Self::Injected(body) | Self::Passthrough { body, .. } => body,
        }
    }

    pub fn into_body(self) -> Bytes {
        match self {
            Self::Injected(body) | Self::Passthrough { body, .. } => body,
        }
    }

    pub const fn is_injected(&self) -> bool {
        matches!(self, Self::Injected(_))
    }
}

/// Injects a grammar into chat completion request bodies that lack one.
#[derive(Clone)]
pub struct BodyRewriter {
    grammar: Arc<dyn GrammarProvider>,
    events: Arc<dyn InterceptEventSink>,
}

impl BodyRewriter {
    pub fn new(grammar: Arc<dyn GrammarProvider>, events: Arc<dyn InterceptEventSink>) -> Self {
        Self { grammar, events }
    }

    /// Rewrite a buffered request body.
    ///
    /// The grammar provider is only consulted when a grammar will actually
    /// be injected. Applying this to its own output is a no-op.
    pub async fn rewrite(&self, original: Bytes) -> BodyRewrite {
        let mut request: ChatCompletionRequest = match serde_json::from_slice(&original) {
            Ok(request) => request,
            Err(e) => {
                self.events.emit(InterceptEvent::NotChatCompletion {
                    reason: e.to_string(),
                });
                return BodyRewrite::Passthrough {
                    body: original,
                    reason: PassthroughReason::NotChatCompletion,
                };
            }
        };

        if request.has_grammar() {
            self.events.emit(InterceptEvent::GrammarAlreadyPresent);
            return BodyRewrite::Passthrough {
                body: original,
                reason: PassthroughReason::GrammarAlreadyPresent,
            };
        }

        let grammar = self.grammar.load().await;
        request.insert_grammar_if_absent(grammar.as_str());

        match serde_json::to_vec(&request) {
            Ok(encoded) => {
                self.events.emit(InterceptEvent::GrammarInjected {
                    origin: grammar.origin(),
                    original_len: original.len(),
                    rewritten_len: encoded.len(),
                });
                BodyRewrite::Injected(Bytes::from(encoded))
            }
            Err(e) => {
                self.events.emit(InterceptEvent::ReencodeFailed {
                    reason: e.to_string(),
                });
                BodyRewrite::Passthrough {
                    body: original,
                    reason: PassthroughReason::ReencodeFailed,
                }
            }
        }
    }
}
