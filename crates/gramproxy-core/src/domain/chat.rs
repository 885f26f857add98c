//! OpenAI-compatible chat completion request types.
//!
//! Only the fields the rewriter needs to reason about are modeled. Every
//! struct keeps the remaining fields in a flattened `extra` map so that a
//! decode/re-encode round trip forwards vendor extensions untouched.
//!
//! Apart from `model` and `messages`, modeled fields are optional. A field
//! the client left out stays out, and an explicit `null` is written back as
//! `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Key under `options` that carries the GBNF grammar for the upstream engine.
pub const GRAMMAR_OPTION_KEY: &str = "grammar";

/// An optional field that also remembers an explicit `null`.
///
/// `None` means the key was absent, `Some(None)` means it was `null`.
#[allow(clippy::option_option)]
pub type Nullable<T> = Option<Option<T>>;

/// Maps any present value, `null` included, to `Some`.
///
/// Used with `#[serde(default)]` so that an absent key stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// =============================================================================
// Tool Calling Types
// =============================================================================

/// Tool definition for function calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool type - always "function" in practice.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub r#type: Nullable<String>,
    /// Function definition.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub function: Nullable<FunctionDefinition>,
    /// Fields not modeled above.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Function definition within a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Nullable<String>,
    /// Description of what the function does.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Nullable<String>,
    /// JSON Schema for function parameters. An explicit `null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Nullable<String>,
    /// Tool type - always "function" in practice.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub r#type: Nullable<String>,
    /// Function call details.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub function: Nullable<ToolCallFunction>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Function call details within a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Name of the function to call.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Nullable<String>,
    /// JSON string of arguments (string-encoded, not nested JSON).
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub arguments: Nullable<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", flatten)]
    pub extra: BTreeMap<String, Value>,
}

// =============================================================================
// Chat Completion Request Types
// =============================================================================

/// Message content as sent by clients.
///
/// `Absent` and `Null` are kept apart so that re-encoding writes back
/// exactly what the client sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Multi-part content (text/image parts), kept opaque.
    Parts(Vec<Value>),
    /// Explicit `null`, typical for assistant turns that only carry tool calls.
    Null,
    /// Field was not present.
    #[default]
    #[serde(skip)]
    Absent,
}

impl MessageContent {
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant", or "tool".
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub role: Nullable<String>,
    /// Message content.
    #[serde(default, skip_serializing_if = "MessageContent::is_absent")]
    pub content: MessageContent,
    /// Optional participant name.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Nullable<String>,
    /// Tool call ID this message is responding to (role="tool" only).
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Nullable<String>,
    /// Tool calls made by assistant (role="assistant" only).
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub tool_calls: Nullable<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Request to a chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model name to use.
    pub model: String,
    /// Array of chat messages.
    pub messages: Vec<ChatMessage>,
    /// Tool definitions for function calling.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub tools: Nullable<Vec<ToolDefinition>>,
    /// Tool choice: "auto", "none", "required", or a specific tool.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    /// Whether to stream the response.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub stream: Nullable<bool>,
    /// Engine-specific options (Ollama-style); carries the grammar.
    ///
    /// A `null` map decodes as `None`; it is replaced before re-encoding
    /// whenever a grammar is injected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    /// Top-level fields not modeled above (temperature, max_tokens, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ChatCompletionRequest {
    /// Returns the options map, creating it empty if absent.
    pub fn ensure_options(&mut self) -> &mut Map<String, Value> {
        self.options.get_or_insert_with(Map::new)
    }

    /// Whether a grammar option is already set (with any value).
    pub fn has_grammar(&self) -> bool {
        self.options
            .as_ref()
            .is_some_and(|options| options.contains_key(GRAMMAR_OPTION_KEY))
    }

    /// Inserts `grammar` under `options.grammar` unless a grammar is already present.
    ///
    /// Returns `true` if the request was modified.
    pub fn insert_grammar_if_absent(&mut self, grammar: &str) -> bool {
        let options = self.ensure_options();
        if options.contains_key(GRAMMAR_OPTION_KEY) {
            return false;
        }
        options.insert(
            GRAMMAR_OPTION_KEY.to_string(),
            Value::String(grammar.to_string()),
        );
        true
    }
}
