//! Core of gramproxy: chat completion request types, the grammar provider,
//! and the body rewriter that injects `options.grammar`.
//!
//! This crate has no HTTP framework dependencies. The axum adapter lives in
//! `gramproxy-server`, the binary in `gramproxy-cli`.
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{ConfigError, ConfigOverrides, ProxyConfig};
pub use domain::{
    ChatCompletionRequest, ChatMessage, FALLBACK_GRAMMAR, GRAMMAR_OPTION_KEY, Grammar,
    GrammarOrigin, MessageContent, Nullable, ToolCall, ToolDefinition,
};
pub use ports::{
    GrammarProvider, InterceptEvent, InterceptEventSink, NoopEventSink, StaticGrammarProvider,
    TracingEventSink,
};
pub use services::{
    BodyRewrite, BodyRewriter, FileGrammarProvider, PassthroughReason, resolve_grammar_path,
};
