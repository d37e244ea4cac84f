//! The chat transport capability.
//!
//! A [`ChatTransport`] owns a conversation and performs one model round trip
//! per call. The structured output engine is written against this trait only,
//! so any provider (or a test double) can sit underneath it.

use crate::errors::TransportError;
use crate::functions::ChatOptions;
use crate::messages::ModelResponse;
use async_trait::async_trait;

/// A stateful chat client.
#[async_trait]
pub trait ChatTransport: Send {
    /// Set the system message of the kept conversation.
    ///
    /// Implementations must be idempotent: repeated calls leave a single
    /// system entry holding the latest text.
    fn set_system_message(&mut self, text: &str);

    /// Send a user message within the kept conversation.
    ///
    /// When `options` offers functions the model may (or, in named mode,
    /// must) answer with a function call instead of text.
    async fn chat(
        &mut self,
        message: &str,
        options: &ChatOptions,
    ) -> Result<ModelResponse, TransportError>;

    /// Send a single exchange outside the kept conversation.
    ///
    /// Only the system message (the override, or the current one) and the
    /// user message are sent; the history is left untouched.
    async fn incognito_chat(
        &mut self,
        message: &str,
        system_override: Option<&str>,
    ) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Box<T> {
    fn set_system_message(&mut self, text: &str) {
        (**self).set_system_message(text);
    }

    async fn chat(
        &mut self,
        message: &str,
        options: &ChatOptions,
    ) -> Result<ModelResponse, TransportError> {
        (**self).chat(message, options).await
    }

    async fn incognito_chat(
        &mut self,
        message: &str,
        system_override: Option<&str>,
    ) -> Result<String, TransportError> {
        (**self).incognito_chat(message, system_override).await
    }
}

/// Boxed transport for dynamic dispatch.
pub type BoxedTransport = Box<dyn ChatTransport>;
