//! # mindshape-output
//!
//! The structured chat engine: one request/validate cycle against a schema
//! contract, over any [`ChatTransport`](mindshape_core::ChatTransport).
//!
//! - [`StructuredChat`]: the engine, in [`OutputMode::Function`] (forced
//!   function call) or [`OutputMode::Prompted`] (JSON-only instructions)
//! - [`FunctionSet`] / [`FunctionInvocation`]: let the model pick among
//!   several named contracts
//! - [`StructuredMind`]: the capability trait shared with the healing
//!   controller
//! - [`parser`]: lenient JSON extraction for prompted replies
//!
//! The engine never retries. A failed cycle comes back as an
//! [`Outcome::Problem`](mindshape_core::Outcome::Problem) and recovery is
//! left to the caller (or to `mindshape-healing`).

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod engine;
pub mod functions;
pub mod mind;
pub mod mode;
pub mod parser;
pub mod prompts;

pub use engine::StructuredChat;
pub use functions::{FunctionInvocation, FunctionSet, FunctionSpec};
pub use mind::StructuredMind;
pub use mode::OutputMode;
pub use parser::{extract_json_from_text, parse_reply, ParseError, RESPONSE_ENVELOPE_KEY};
pub use prompts::{
    DEFAULT_SYSTEM_MESSAGE, PROMPTED_SYSTEM_MESSAGE, STRUCTURED_RESPONSE_DESCRIPTION,
    STRUCTURED_RESPONSE_FUNCTION,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        FunctionInvocation, FunctionSet, OutputMode, StructuredChat, StructuredMind,
    };
}
