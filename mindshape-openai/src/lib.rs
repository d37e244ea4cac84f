//! # mindshape-openai
//!
//! An OpenAI-compatible [`ChatTransport`](mindshape_core::ChatTransport).
//!
//! [`OpenAIChatClient`] keeps the conversation history, offers functions via
//! the `functions` / `function_call` request fields, retries transient
//! failures with exponential backoff, and supports buffering and incognito
//! exchanges.
//!
//! ## Example
//!
//! ```ignore
//! use mindshape_core::{ChatOptions, ChatTransport};
//! use mindshape_openai::OpenAIChatClient;
//!
//! let mut client = OpenAIChatClient::from_env()?;
//! client.set_system_message("You're a helpful AI Assistant");
//! let reply = client.chat("Hello!", &ChatOptions::plain()).await?;
//! println!("{}", reply.to_text());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod config;
pub mod retry;
pub mod types;

pub use client::{OpenAIChatClient, DEFAULT_TIMEOUT};
pub use config::{OpenAIConfig, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use retry::{with_retry, RetryConfig};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{OpenAIChatClient, OpenAIConfig, RetryConfig};
}
