//! Chat message types.
//!
//! These are the role-tagged entries kept in a [`Conversation`](crate::Conversation)
//! and the tagged [`ModelResponse`] a transport hands back to the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// The caller.
    User,
    /// The model.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A function call emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the called function.
    pub name: String,
    /// Raw, unparsed JSON arguments.
    pub arguments: String,
}

impl FunctionCall {
    /// Create a new function call.
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: Role,
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Author name (function results).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Function call made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    fn with_content(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_content(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_content(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_content(Role::Assistant, content)
    }

    /// Create an assistant message carrying a function call.
    pub fn assistant_function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// Convert a model response into the assistant entry that records it.
    #[must_use]
    pub fn from_response(response: &ModelResponse) -> Self {
        match response {
            ModelResponse::Message { text } => Self::assistant(text.clone()),
            ModelResponse::FunctionCall(call) => Self::assistant_function_call(call.clone()),
        }
    }
}

/// What the model answered: exactly one of prose or a function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ModelResponse {
    /// Free-form text.
    Message {
        /// The text.
        text: String,
    },
    /// A call to one of the offered functions.
    FunctionCall(FunctionCall),
}

impl ModelResponse {
    /// Create a text response.
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    /// Create a function call response.
    pub fn function_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::FunctionCall(FunctionCall::new(name, arguments))
    }

    /// Text for logging and plain chat: the message, or the serialized call.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            ModelResponse::Message { text } => text.clone(),
            ModelResponse::FunctionCall(call) => serde_json::json!({
                "name": call.name,
                "arguments": call.arguments,
            })
            .to_string(),
        }
    }
}

/// A user prompt: plain text or a structured JSON message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prompt(JsonValue);

impl Prompt {
    /// Create a text prompt.
    pub fn text(text: impl Into<String>) -> Self {
        Self(JsonValue::String(text.into()))
    }

    /// Create a structured prompt.
    #[must_use]
    pub fn structured(value: JsonValue) -> Self {
        Self(value)
    }

    /// The prompt as JSON.
    #[must_use]
    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }

    /// The prompt as message text; structured prompts are pretty-printed.
    #[must_use]
    pub fn to_text(&self) -> String {
        match &self.0 {
            JsonValue::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<JsonValue> for Prompt {
    fn from(value: JsonValue) -> Self {
        Self::structured(value)
    }
}
