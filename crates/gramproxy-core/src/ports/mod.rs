//! Port definitions (trait abstractions) for collaborators of the rewriter.
//!
//! Ports contain no implementation details beyond trivial defaults
//! (`StaticGrammarProvider`, `NoopEventSink`, `TracingEventSink`).

pub mod event_sink;
pub mod grammar_provider;

pub use event_sink::{InterceptEvent, InterceptEventSink, NoopEventSink, TracingEventSink};
pub use grammar_provider::{GrammarProvider, StaticGrammarProvider};
