//! # mindshape-core
//!
//! Core types shared by every mindshape crate.
//!
//! - **Errors**: [`Problem`] and [`ProblemKind`] for structured output failures,
//!   [`TransportError`] for provider failures
//! - **Outcome**: [`Outcome`], the value-or-problem result of one structured call
//! - **Messages**: chat history entries and the tagged [`ModelResponse`]
//! - **Functions**: [`FunctionDefinition`] and call modes offered to the model
//! - **Transport**: the [`ChatTransport`] capability and a scripted [`MockTransport`]
//! - **Settings**: [`ModelSettings`] forwarded with every request
//!
//! ## Example
//!
//! ```rust
//! use mindshape_core::{ChatOptions, ChatTransport, MockTransport};
//!
//! # tokio_test::block_on(async {
//! let mut transport = MockTransport::new().with_message("Hello!");
//! transport.set_system_message("You're a helpful AI Assistant");
//! let reply = transport.chat("Hi", &ChatOptions::plain()).await.unwrap();
//! assert_eq!(reply.to_text(), "Hello!");
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod errors;
pub mod functions;
pub mod history;
pub mod messages;
pub mod mock;
pub mod outcome;
pub mod settings;
pub mod transport;

pub use errors::{
    FieldError, MindshapeError, Problem, ProblemKind, RawInput, Result, TransportError,
};
pub use functions::{ChatOptions, FunctionCallMode, FunctionDefinition};
pub use history::Conversation;
pub use messages::{ChatMessage, FunctionCall, ModelResponse, Prompt, Role};
pub use mock::{MockCall, MockCallKind, MockReply, MockTransport};
pub use outcome::{ChatResult, Outcome};
pub use settings::{ModelSettings, DEFAULT_MODEL};
pub use transport::{BoxedTransport, ChatTransport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ChatMessage, ChatOptions, ChatResult, ChatTransport, Conversation, FieldError,
        FunctionCallMode, FunctionDefinition, MindshapeError, ModelResponse, ModelSettings,
        Outcome, Problem, ProblemKind, Prompt, Result, TransportError,
    };
}
