//! Domain types for chat completion requests and grammars.

pub mod chat;
pub mod grammar;

pub use chat::{
    ChatCompletionRequest, ChatMessage, FunctionDefinition, GRAMMAR_OPTION_KEY, MessageContent,
    Nullable, ToolCall, ToolCallFunction, ToolDefinition,
};
pub use grammar::{FALLBACK_GRAMMAR, Grammar, GrammarOrigin};
