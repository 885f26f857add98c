//! Interception event sink.
//!
//! The rewriter never fails a request; decode, re-encode and grammar-read
//! problems are degraded to a passthrough. This port makes those decisions
//! observable without tying the core to a particular logging setup.
//!
//! # Implementations
//!
//! - `NoopEventSink` - For tests and contexts that don't care
//! - `TracingEventSink` - Logs each event through `tracing`

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::domain::GrammarOrigin;

/// Something noteworthy that happened while intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptEvent {
    /// The grammar file could not be read; the embedded grammar was used.
    GrammarFallback { path: PathBuf, reason: String },
    /// The POST body did not decode as a chat completion request.
    NotChatCompletion { reason: String },
    /// The request already carried a grammar option.
    GrammarAlreadyPresent,
    /// A grammar was injected and the body replaced.
    GrammarInjected {
        origin: GrammarOrigin,
        original_len: usize,
        rewritten_len: usize,
    },
    /// Re-encoding after injection failed; the original body was kept.
    ReencodeFailed { reason: String },
    /// The inbound body could not be read (or was too large).
    BodyRejected { reason: String },
}

/// Receives [`InterceptEvent`]s.
///
/// Implementations must not block.
pub trait InterceptEventSink: Send + Sync {
    fn emit(&self, event: InterceptEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl NoopEventSink {
    pub const fn new() -> Self {
        Self
    }
}

impl InterceptEventSink for NoopEventSink {
    fn emit(&self, _event: InterceptEvent) {}
}

/// Logs events through `tracing`.
///
/// Grammar fallbacks, re-encode failures and rejected bodies are warnings;
/// everything else is debug/trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub const fn new() -> Self {
        Self
    }
}

impl InterceptEventSink for TracingEventSink {
    fn emit(&self, event: InterceptEvent) {
        match event {
            InterceptEvent::GrammarFallback { path, reason } => {
                warn!(
                    path = %path.display(),
                    %reason,
                    "Could not read grammar file, using embedded grammar"
                );
            }
            InterceptEvent::NotChatCompletion { reason } => {
                debug!(%reason, "Body is not a chat completion request, forwarding unchanged");
            }
            InterceptEvent::GrammarAlreadyPresent => {
                trace!("Request already carries a grammar option");
            }
            InterceptEvent::GrammarInjected {
                origin,
                original_len,
                rewritten_len,
            } => {
                debug!(?origin, original_len, rewritten_len, "Injected grammar into request");
            }
            InterceptEvent::ReencodeFailed { reason } => {
                warn!(%reason, "Failed to re-encode request, forwarding original body");
            }
            InterceptEvent::BodyRejected { reason } => {
                warn!(%reason, "Rejected request body");
            }
        }
    }
}
