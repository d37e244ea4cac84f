//! Errors raised while turning a schema into a contract.

use mindshape_core::Problem;
use thiserror::Error;

/// Why a schema could not be translated.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema root is not an object schema.
    #[error("schema root must be of type \"object\", found {found}")]
    NotAnObject {
        /// What the root declared instead.
        found: String,
    },

    /// The schema does not compile as JSON Schema.
    #[error("invalid JSON Schema: {0}")]
    Compile(String),

    /// The schema could not be serialized.
    #[error("schema serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SchemaError {
    /// Create a compile error.
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }
}

impl From<SchemaError> for Problem {
    fn from(err: SchemaError) -> Self {
        Problem::schema_build(err.to_string())
    }
}
