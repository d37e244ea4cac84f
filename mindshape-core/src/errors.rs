//! Error types for mindshape.
//!
//! Two families live here:
//!
//! - [`Problem`]: a typed, non-exceptional failure of the structured output
//!   negotiation (the schema could not be built, the model answered with
//!   something that is not JSON, the JSON does not fit the contract, ...).
//!   Problems are values carried by [`Outcome`](crate::Outcome).
//! - [`TransportError`]: the completion provider could not be reached or
//!   answered with an error. These are propagated untouched with `?`.
//!
//! [`MindshapeError`] unifies both for callers that prefer a single `Result`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Category of a structured output problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// The caller's schema could not be translated into a contract.
    SchemaBuild,
    /// The model output is not valid JSON.
    Parse,
    /// The model answered with prose instead of the required function call.
    ShapeMismatch,
    /// The parsed JSON does not satisfy the contract.
    Validation,
    /// The model called a function that was not offered.
    Dispatch,
}

impl ProblemKind {
    /// Whether this kind can never be recovered by asking the model again.
    ///
    /// A broken schema is a caller bug and an unknown function name is a
    /// contract violation at the dispatch level; neither is retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProblemKind::SchemaBuild | ProblemKind::Dispatch)
    }

    /// Get all problem kinds.
    #[must_use]
    pub fn all() -> &'static [ProblemKind] {
        &[
            ProblemKind::SchemaBuild,
            ProblemKind::Parse,
            ProblemKind::ShapeMismatch,
            ProblemKind::Validation,
            ProblemKind::Dispatch,
        ]
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemKind::SchemaBuild => write!(f, "schema-build-failure"),
            ProblemKind::Parse => write!(f, "parse-failure"),
            ProblemKind::ShapeMismatch => write!(f, "shape-mismatch"),
            ProblemKind::Validation => write!(f, "validation-failure"),
            ProblemKind::Dispatch => write!(f, "dispatch-failure"),
        }
    }
}

/// A single field-level validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON pointer to the offending value (`""` for the root).
    pub path: String,
    /// The offending value.
    pub value: JsonValue,
    /// Human readable validation message.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(path: impl Into<String>, value: JsonValue, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value,
            message: message.into(),
        }
    }

    /// Path for display purposes, `/` for the root.
    #[must_use]
    pub fn display_path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_path(), self.message)
    }
}

/// The raw model input a problem was produced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RawInput {
    /// Unparsed text.
    Text(String),
    /// Parsed JSON that failed later checks.
    Json(JsonValue),
}

impl fmt::Display for RawInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawInput::Text(text) => f.write_str(text),
            RawInput::Json(value) => write!(f, "{}", value),
        }
    }
}

/// A typed failure of one structured request/validate cycle.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Problem {
    /// What went wrong.
    pub kind: ProblemKind,
    /// Summary message.
    pub message: String,
    /// Field-level errors (populated for validation failures).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<FieldError>,
    /// The input that caused the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawInput>,
}

impl Problem {
    /// Create a problem without detail.
    pub fn new(kind: ProblemKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: Vec::new(),
            raw: None,
        }
    }

    /// Create a schema build failure.
    pub fn schema_build(message: impl Into<String>) -> Self {
        Self::new(ProblemKind::SchemaBuild, message)
    }

    /// Create a parse failure for the given raw text.
    pub fn parse(message: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self::new(ProblemKind::Parse, message).with_raw(RawInput::Text(raw_text.into()))
    }

    /// Create a shape mismatch for a prose answer.
    pub fn shape_mismatch(message: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self::new(ProblemKind::ShapeMismatch, message).with_raw(RawInput::Text(raw_text.into()))
    }

    /// Create a validation failure with field-level errors.
    pub fn validation(detail: Vec<FieldError>, raw: JsonValue) -> Self {
        let message = match detail.len() {
            1 => "1 field failed validation".to_string(),
            n => format!("{} fields failed validation", n),
        };
        Self {
            kind: ProblemKind::Validation,
            message,
            detail,
            raw: Some(RawInput::Json(raw)),
        }
    }

    /// Create a dispatch failure for an unknown function name.
    pub fn dispatch(name: impl Into<String>, offered: &[String]) -> Self {
        let name = name.into();
        Self::new(
            ProblemKind::Dispatch,
            format!(
                "model called unknown function '{}' (offered: {})",
                name,
                offered.join(", ")
            ),
        )
        .with_raw(RawInput::Text(name))
    }

    /// Attach the raw input.
    #[must_use]
    pub fn with_raw(mut self, raw: RawInput) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Whether this problem can never be healed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Errors raised by a chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success HTTP response.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Rate limited by the provider.
    #[error("Rate limited")]
    RateLimited {
        /// Suggested wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Could not connect to the provider.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The provider answered with something we cannot decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider answered without a message or a function call.
    #[error("Received a response without a function call or content")]
    EmptyResponse,

    /// The transport is misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::RateLimited { .. } | Self::Timeout | Self::Connection(_) => true,
            Self::InvalidResponse(_)
            | Self::EmptyResponse
            | Self::Configuration(_)
            | Self::Other(_) => false,
        }
    }

    /// Suggested wait before retrying, if the provider sent one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status, if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// The main error type for mindshape operations.
#[derive(Debug, Error)]
pub enum MindshapeError {
    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Structured output could not be obtained.
    #[error(transparent)]
    Problem(#[from] Problem),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MindshapeError {
    /// The problem, if this error is one.
    #[must_use]
    pub fn as_problem(&self) -> Option<&Problem> {
        match self {
            Self::Problem(problem) => Some(problem),
            _ => None,
        }
    }
}

/// Result type alias using [`MindshapeError`].
pub type Result<T> = std::result::Result<T, MindshapeError>;
