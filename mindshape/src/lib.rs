//! # mindshape
//!
//! Get schema-conforming data out of a chat completion model.
//!
//! Declare the shape you want as a Rust type (or a JSON Schema), and
//! mindshape turns it into a function-calling contract, validates what the
//! model sends back, and, when healing is enabled, feeds every validation
//! error back to the model until it gets it right or the attempt limit is
//! reached.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mindshape::prelude::*;
//! use mindshape::schemars;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, JsonSchema)]
//! #[schemars(crate = "mindshape::schemars")]
//! struct Customer {
//!     name: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut mind = mind(MindConfig::from_env()?)?;
//!     let customer = mind
//!         .chat("A fictional customer", &Contract::<Customer>::of())
//!         .await?
//!         .into_result()?;
//!     println!("{customer:?}");
//!     Ok(())
//! }
//! ```
//!
//! Deriving [`JsonSchema`] through this crate's re-export needs the
//! `#[schemars(crate = "mindshape::schemars")]` attribute; depending on
//! `schemars` directly does not.
//!
//! ## Architecture
//!
//! - [`core`] - problems, outcomes, messages, the transport capability
//! - [`schema`] - contracts and the schema translator
//! - [`output`] - the structured chat engine and function invocation
//! - [`healing`] - the bounded self-healing controller
//! - [`openai`] - the OpenAI chat completions transport
//!
//! ## Testing without a network
//!
//! ```rust
//! use mindshape::prelude::*;
//! use mindshape::MockTransport;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new()
//!     .with_function_call("structured_response", r#"{"city": "Oslo"}"#);
//! let mut mind = mind_with_transport(transport, &MindOptions::new());
//!
//! let contract = Contract::<serde_json::Value>::from_json_schema(json!({
//!     "type": "object",
//!     "properties": {"city": {"type": "string"}},
//!     "required": ["city"]
//! }));
//! let outcome = mind.chat("Where?", &contract).await.unwrap();
//! assert_eq!(outcome.value(), Some(&json!({"city": "Oslo"})));
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod mind;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Core types, messages, and error handling.
pub use mindshape_core as core;

/// Contracts and the schema translator.
pub use mindshape_schema as schema;

/// Structured chat engine and function invocation.
pub use mindshape_output as output;

/// Self-healing controller.
pub use mindshape_healing as healing;

/// OpenAI transport.
pub use mindshape_openai as openai;

/// Schema derivation.
pub use schemars::{self, JsonSchema};

// ============================================================================
// Flat Re-exports
// ============================================================================

// Errors and outcomes
pub use mindshape_core::{
    ChatResult, FieldError, MindshapeError, Outcome, Problem, ProblemKind, RawInput, Result,
    TransportError,
};

// Messages and transport
pub use mindshape_core::{
    ChatMessage, ChatOptions, ChatTransport, Conversation, FunctionCallMode, FunctionDefinition,
    MockTransport, ModelResponse, ModelSettings, Prompt, Role,
};

// Schema
pub use mindshape_schema::{translate, Contract, ContractSpec, ObjectJsonSchema, SchemaBuilder};

// Engine
pub use mindshape_output::{
    FunctionInvocation, FunctionSet, OutputMode, StructuredChat, StructuredMind,
};

// Healing
pub use mindshape_healing::{HealingChat, HealingConfig, HealingObserver, HealingStrategy, Mode};

// Transport
pub use mindshape_openai::{OpenAIChatClient, OpenAIConfig, RetryConfig};

// Setup
pub use config::{MindConfig, MindOptions};
pub use mind::{mind, mind_from_env, mind_with_transport, Mind};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        mind, mind_with_transport, ChatTransport, Contract, FunctionInvocation, FunctionSet,
        HealingChat, HealingStrategy, JsonSchema, Mind, MindConfig, MindOptions, Mode, OpenAIChatClient, Outcome,
        OutputMode, Problem, ProblemKind, Prompt, StructuredChat, StructuredMind,
    };
}
