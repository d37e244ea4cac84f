//! The capability shared by the plain engine and the healing controller.

use async_trait::async_trait;
use mindshape_core::{ChatResult, ChatTransport, Prompt, TransportError};
use mindshape_schema::Contract;
use serde::de::DeserializeOwned;

use crate::engine::StructuredChat;
use crate::functions::{FunctionInvocation, FunctionSet};

/// Something that can answer with schema-conforming values.
///
/// Implemented by [`StructuredChat`] (no recovery) and by the healing
/// controller, so callers can pick a strategy at construction time and
/// write the rest of their code against this trait.
#[async_trait]
pub trait StructuredMind: Send {
    /// Ask for a value matching `contract` in the configured output mode.
    async fn chat<T>(&mut self, message: Prompt, contract: &Contract<T>) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static;

    /// Ask for a value matching `contract` through a forced function call.
    async fn structured_chat<T>(
        &mut self,
        message: Prompt,
        contract: &Contract<T>,
    ) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static;

    /// Let the model call one of `functions`, optionally forcing one.
    async fn invoke(
        &mut self,
        message: Prompt,
        functions: &FunctionSet,
        forced: Option<&str>,
    ) -> ChatResult<FunctionInvocation>;

    /// Send a message without any contract.
    async fn plain_chat(&mut self, message: Prompt) -> Result<String, TransportError>;
}

#[async_trait]
impl<C: ChatTransport> StructuredMind for StructuredChat<C> {
    async fn chat<T>(&mut self, message: Prompt, contract: &Contract<T>) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        StructuredChat::chat(self, message, contract).await
    }

    async fn structured_chat<T>(
        &mut self,
        message: Prompt,
        contract: &Contract<T>,
    ) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        StructuredChat::structured_chat(self, message, contract).await
    }

    async fn invoke(
        &mut self,
        message: Prompt,
        functions: &FunctionSet,
        forced: Option<&str>,
    ) -> ChatResult<FunctionInvocation> {
        StructuredChat::invoke(self, message, functions, forced).await
    }

    async fn plain_chat(&mut self, message: Prompt) -> Result<String, TransportError> {
        StructuredChat::plain_chat(self, message).await
    }
}
