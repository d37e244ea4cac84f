//! Scripted transport for testing.
//!
//! ```rust
//! use mindshape_core::{MockTransport, ModelResponse};
//!
//! let transport = MockTransport::new()
//!     .with_function_call("structured_response", r#"{"age": 30}"#)
//!     .with_message("Thanks!");
//! ```

use crate::errors::TransportError;
use crate::functions::ChatOptions;
use crate::history::Conversation;
use crate::messages::{ChatMessage, ModelResponse};
use crate::transport::ChatTransport;
use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::debug;

/// Reply returned when the script runs out.
pub const DEFAULT_MOCK_REPLY: &str = "Mock response";

/// One scripted reply.
#[derive(Debug)]
pub enum MockReply {
    /// Answer with this response.
    Response(ModelResponse),
    /// Fail with this error.
    Error(TransportError),
}

/// Which transport method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCallKind {
    /// [`ChatTransport::chat`].
    Chat,
    /// [`ChatTransport::incognito_chat`].
    Incognito,
}

/// A recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Which method was called.
    pub kind: MockCallKind,
    /// The user message.
    pub message: String,
    /// Options passed to `chat` (plain for incognito calls).
    pub options: ChatOptions,
    /// System override passed to `incognito_chat`.
    pub system_override: Option<String>,
}

impl MockCall {
    /// Whether functions were offered on this call.
    #[must_use]
    pub fn offered_functions(&self) -> Vec<&str> {
        self.options
            .functions
            .iter()
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// A transport answering from a queue of scripted replies.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: VecDeque<MockReply>,
    calls: Vec<MockCall>,
    history: Conversation,
}

impl MockTransport {
    /// Create a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    #[must_use]
    pub fn with_response(mut self, response: ModelResponse) -> Self {
        self.replies.push_back(MockReply::Response(response));
        self
    }

    /// Queue a text reply.
    #[must_use]
    pub fn with_message(self, text: impl Into<String>) -> Self {
        self.with_response(ModelResponse::message(text))
    }

    /// Queue a function call reply.
    #[must_use]
    pub fn with_function_call(
        self,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        self.with_response(ModelResponse::function_call(name, arguments))
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn with_error(mut self, error: TransportError) -> Self {
        self.replies.push_back(MockReply::Error(error));
        self
    }

    /// Queue a response on an existing mock.
    pub fn push_response(&mut self, response: ModelResponse) {
        self.replies.push_back(MockReply::Response(response));
    }

    /// Recorded calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    /// Recorded `chat` calls only.
    #[must_use]
    pub fn chat_calls(&self) -> Vec<&MockCall> {
        self.calls
            .iter()
            .filter(|c| c.kind == MockCallKind::Chat)
            .collect()
    }

    /// Number of scripted replies not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replies.len()
    }

    /// The kept conversation.
    #[must_use]
    pub fn history(&self) -> &Conversation {
        &self.history
    }

    fn next_reply(&mut self) -> Result<ModelResponse, TransportError> {
        match self.replies.pop_front() {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Error(error)) => Err(error),
            None => {
                debug!("Mock script exhausted, using the default reply");
                Ok(ModelResponse::message(DEFAULT_MOCK_REPLY))
            }
        }
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    fn set_system_message(&mut self, text: &str) {
        self.history.set_system_message(text);
    }

    async fn chat(
        &mut self,
        message: &str,
        options: &ChatOptions,
    ) -> Result<ModelResponse, TransportError> {
        self.calls.push(MockCall {
            kind: MockCallKind::Chat,
            message: message.to_string(),
            options: options.clone(),
            system_override: None,
        });
        self.history.push_user(message);
        let response = self.next_reply()?;
        self.history.push(ChatMessage::from_response(&response));
        Ok(response)
    }

    async fn incognito_chat(
        &mut self,
        message: &str,
        system_override: Option<&str>,
    ) -> Result<String, TransportError> {
        self.calls.push(MockCall {
            kind: MockCallKind::Incognito,
            message: message.to_string(),
            options: ChatOptions::plain(),
            system_override: system_override.map(str::to_string),
        });
        Ok(self.next_reply()?.to_text())
    }
}
