//! Function declarations offered to the model.
//!
//! A [`FunctionDefinition`] is the provider-facing form of a schema contract:
//! a name, a description, and a JSON Schema for the arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Complete function definition sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDefinition {
    /// Function name (must be a valid identifier).
    pub name: String,

    /// Human-readable description of what the function does.
    pub description: String,

    /// JSON Schema for the function's arguments.
    pub parameters: JsonValue,
}

impl FunctionDefinition {
    /// Create a new function definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// How the model may call the offered functions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCallMode {
    /// The model chooses among all offered functions (or answers in prose).
    #[default]
    Auto,
    /// The model must not call a function.
    None,
    /// The model must call exactly this function.
    Named(String),
}

impl FunctionCallMode {
    /// Force a specific function.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The forced function name, if any.
    #[must_use]
    pub fn forced_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Convert to the OpenAI `function_call` request value.
    #[must_use]
    pub fn to_openai(&self) -> JsonValue {
        match self {
            Self::Auto => JsonValue::String("auto".to_string()),
            Self::None => JsonValue::String("none".to_string()),
            Self::Named(name) => serde_json::json!({ "name": name }),
        }
    }
}

/// Per-request options passed to [`ChatTransport::chat`](crate::ChatTransport::chat).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Functions offered to the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionDefinition>,
    /// How the model may call them. Ignored when no functions are offered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallMode>,
}

impl ChatOptions {
    /// Options for a plain, unconstrained exchange.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Offer functions in the given call mode.
    #[must_use]
    pub fn with_functions(functions: Vec<FunctionDefinition>, mode: FunctionCallMode) -> Self {
        Self {
            functions,
            function_call: Some(mode),
        }
    }

    /// Whether any functions are offered.
    #[must_use]
    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }

    /// The forced function name, if any.
    #[must_use]
    pub fn forced_name(&self) -> Option<&str> {
        self.function_call.as_ref().and_then(FunctionCallMode::forced_name)
    }
}
