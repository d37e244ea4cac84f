//! OpenAI chat completions wire types.
//!
//! Function calling uses the `functions` / `function_call` request fields,
//! which every OpenAI-compatible endpoint still accepts.

use mindshape_core::{
    ChatMessage, ChatOptions, FunctionCall, FunctionDefinition, ModelResponse, ModelSettings,
    TransportError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ============================================================================
// Request Types
// ============================================================================

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model to use.
    pub model: String,
    /// Messages in the conversation.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// User identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Offered functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDefinition>>,
    /// Function call strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<JsonValue>,
}

impl ChatCompletionRequest {
    /// Build a request from settings and messages.
    pub fn new(settings: &ModelSettings, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: settings.model.clone(),
            messages,
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_tokens: settings.max_tokens,
            stop: settings.stop.clone(),
            presence_penalty: settings.presence_penalty,
            frequency_penalty: settings.frequency_penalty,
            seed: settings.seed,
            user: settings.user.clone(),
            functions: None,
            function_call: None,
        }
    }

    /// Attach the functions offered by `options`, if any.
    #[must_use]
    pub fn with_options(mut self, options: &ChatOptions) -> Self {
        if options.has_functions() {
            self.functions = Some(options.functions.clone());
            self.function_call = options.function_call.as_ref().map(|mode| mode.to_openai());
        }
        self
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Model that answered.
    #[serde(default)]
    pub model: Option<String>,
    /// Completion choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// The generated message.
    pub message: ResponseMessage,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Author role.
    #[serde(default)]
    pub role: Option<String>,
    /// Text content.
    #[serde(default)]
    pub content: Option<String>,
    /// Function call, when the model chose one.
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

impl ResponseMessage {
    /// Convert to the transport's tagged response. A function call wins over
    /// text; a message with neither is an [`TransportError::EmptyResponse`].
    pub fn into_model_response(self) -> Result<ModelResponse, TransportError> {
        if let Some(call) = self.function_call {
            return Ok(ModelResponse::FunctionCall(call));
        }
        match self.content {
            Some(text) if !text.is_empty() => Ok(ModelResponse::message(text)),
            _ => Err(TransportError::EmptyResponse),
        }
    }
}

/// Token usage.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u64,
}

/// Error envelope returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIError {
    /// Error details.
    pub error: OpenAIErrorDetail,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorDetail {
    /// Human-readable message.
    pub message: String,
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error code.
    #[serde(default)]
    pub code: Option<JsonValue>,
}
