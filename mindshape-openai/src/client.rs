//! OpenAI chat completions transport.

use crate::config::OpenAIConfig;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, OpenAIError};
use async_trait::async_trait;
use mindshape_core::{
    ChatMessage, ChatOptions, ChatTransport, Conversation, ModelResponse, ModelSettings,
    TransportError,
};
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout applied when the settings carry none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A stateful OpenAI chat client.
///
/// Keeps the conversation history, sends it with every [`chat`](ChatTransport::chat)
/// and appends the assistant reply. While buffering is enabled, user turns are
/// recorded but no request is made.
#[derive(Debug, Clone)]
pub struct OpenAIChatClient {
    client: Client,
    config: OpenAIConfig,
    history: Conversation,
    buffering: bool,
}

impl OpenAIChatClient {
    /// Create a client for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(OpenAIConfig::new(api_key))
    }

    /// Create from `OPENAI_API_KEY` (and `OPENAI_BASE_URL`, if set).
    pub fn from_env() -> Result<Self, TransportError> {
        Ok(Self::from_config(OpenAIConfig::from_env()?))
    }

    /// Create from a full configuration.
    pub fn from_config(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            history: Conversation::new(),
            buffering: false,
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the organization ID.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.config.organization = Some(org.into());
        self
    }

    /// Set the generation settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Enable or disable buffering.
    pub fn buffer(&mut self, enable: bool) -> &mut Self {
        self.buffering = enable;
        self
    }

    /// Whether buffering is enabled.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    /// Append an assistant turn without asking the model.
    pub fn set_agent_message(&mut self, text: impl Into<String>) {
        self.history.push_assistant(text);
    }

    /// The kept conversation.
    #[must_use]
    pub fn history(&self) -> &Conversation {
        &self.history
    }

    /// Mutable access to the kept conversation.
    pub fn history_mut(&mut self) -> &mut Conversation {
        &mut self.history
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    fn handle_error_response(status: u16, body: &str, headers: &HeaderMap) -> TransportError {
        if status == 429 {
            return TransportError::RateLimited {
                retry_after: Self::parse_retry_after(headers),
            };
        }

        match serde_json::from_str::<OpenAIError>(body) {
            Ok(err) => TransportError::http(status, err.error.message),
            Err(_) => TransportError::http(status, body),
        }
    }

    fn map_send_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::connection(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::http(status.as_u16(), err.to_string())
        } else {
            TransportError::Other(err.into())
        }
    }

    async fn send_once(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TransportError> {
        let timeout = self.config.settings.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let mut request = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .timeout(timeout);

        if let Some(ref org) = self.config.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.json(body).send().await.map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Provider returned an error");
            return Err(Self::handle_error_response(status, &body, &headers));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::invalid_response(e.to_string()))
    }

    async fn request(
        &self,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
    ) -> Result<ModelResponse, TransportError> {
        self.config.validate()?;

        let body = ChatCompletionRequest::new(&self.config.settings, messages).with_options(options);
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            functions = options.functions.len(),
            "Sending chat completion request"
        );

        let response = with_retry(&self.config.retry, || self.send_once(&body)).await?;

        if let Some(usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage"
            );
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(TransportError::EmptyResponse)?;
        debug!(finish_reason = ?choice.finish_reason, "Received chat completion");

        choice.message.into_model_response()
    }
}

#[async_trait]
impl ChatTransport for OpenAIChatClient {
    fn set_system_message(&mut self, text: &str) {
        self.history.set_system_message(text);
    }

    async fn chat(
        &mut self,
        message: &str,
        options: &ChatOptions,
    ) -> Result<ModelResponse, TransportError> {
        self.history.push_user(message);

        if self.buffering {
            debug!(history = self.history.len(), "Buffering, request deferred");
            return Ok(ModelResponse::message(""));
        }

        let response = self
            .request(self.history.messages().to_vec(), options)
            .await?;
        self.history.push(ChatMessage::from_response(&response));
        Ok(response)
    }

    async fn incognito_chat(
        &mut self,
        message: &str,
        system_override: Option<&str>,
    ) -> Result<String, TransportError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_override.or_else(|| self.history.system_message()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(message));

        let response = self.request(messages, &ChatOptions::plain()).await?;
        Ok(response.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindshape_core::{FunctionCallMode, FunctionDefinition, Role};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAIChatClient {
        OpenAIChatClient::new("sk-test")
            .with_base_url(server.uri())
            .with_retry(
                RetryConfig::new()
                    .max_retries(2)
                    .initial_delay(Duration::from_millis(1))
                    .max_delay(Duration::from_millis(5)),
            )
    }

    fn completion(message: JsonValue) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-3.5-turbo",
            "choices": [{"index": 0, "message": message, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        }))
    }

    async fn request_bodies(server: &MockServer) -> Vec<JsonValue> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[test]
    fn test_builder() {
        let client = OpenAIChatClient::new("sk-test")
            .with_base_url("https://custom.api.com/v1")
            .with_organization("org-123")
            .with_settings(ModelSettings::new().model("gpt-4"));

        assert_eq!(client.config().base_url, "https://custom.api.com/v1");
        assert_eq!(client.config().organization.as_deref(), Some("org-123"));
        assert_eq!(client.config().settings.model, "gpt-4");
        assert!(!client.is_buffering());
    }

    #[tokio::test]
    async fn test_chat_sends_history_and_records_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(completion(json!({"role": "assistant", "content": "Hello!"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        client.set_system_message("Be brief");
        let reply = client.chat("Hi", &ChatOptions::plain()).await.unwrap();

        assert_eq!(reply, ModelResponse::message("Hello!"));
        let roles: Vec<Role> = client.history().messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);

        let bodies = request_bodies(&server).await;
        assert_eq!(
            bodies[0]["messages"],
            json!([
                {"role": "system", "content": "Be brief"},
                {"role": "user", "content": "Hi"}
            ])
        );
        assert_eq!(bodies[0]["model"], "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_chat_with_forced_function() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion(json!({
                "role": "assistant",
                "content": null,
                "function_call": {"name": "pickHat", "arguments": "{\"hat\":\"fedora\"}"}
            })))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let options = ChatOptions::with_functions(
            vec![FunctionDefinition::new("pickHat", "Pick a hat", json!({"type": "object"}))],
            FunctionCallMode::named("pickHat"),
        );
        let reply = client.chat("Which hat?", &options).await.unwrap();

        assert_eq!(reply, ModelResponse::function_call("pickHat", "{\"hat\":\"fedora\"}"));
        let last = client.history().messages().last().unwrap();
        assert_eq!(last.function_call.as_ref().unwrap().name, "pickHat");

        let bodies = request_bodies(&server).await;
        assert_eq!(bodies[0]["functions"][0]["name"], "pickHat");
        assert_eq!(bodies[0]["function_call"], json!({"name": "pickHat"}));
    }

    #[tokio::test]
    async fn test_buffering_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(json!({"role": "assistant", "content": "Done"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        client.buffer(true);
        let staged = client.chat("first", &ChatOptions::plain()).await.unwrap();
        assert_eq!(staged, ModelResponse::message(""));
        client.set_agent_message("noted");

        client.buffer(false);
        client.chat("second", &ChatOptions::plain()).await.unwrap();

        let bodies = request_bodies(&server).await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0]["messages"],
            json!([
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "noted"},
                {"role": "user", "content": "second"}
            ])
        );
    }

    #[tokio::test]
    async fn test_incognito_leaves_history_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(json!({"role": "assistant", "content": "fixed"})))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        client.set_system_message("main system");
        let reply = client
            .incognito_chat("repair this", Some("repair system"))
            .await
            .unwrap();

        assert_eq!(reply, "fixed");
        assert_eq!(client.history().len(), 1);

        let bodies = request_bodies(&server).await;
        assert_eq!(
            bodies[0]["messages"],
            json!([
                {"role": "system", "content": "repair system"},
                {"role": "user", "content": "repair this"}
            ])
        );
        assert!(bodies[0].get("functions").is_none());
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(completion(json!({"role": "assistant", "content": "ok"})))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let reply = client.chat("Hi", &ChatOptions::plain()).await.unwrap();

        assert_eq!(reply, ModelResponse::message("ok"));
        assert_eq!(request_bodies(&server).await.len(), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "bad field", "type": "invalid_request_error", "code": null}
            })))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client.chat("Hi", &ChatOptions::plain()).await.unwrap_err();

        match err {
            TransportError::Http { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad field");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(request_bodies(&server).await.len(), 1);
        assert_eq!(client.history().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client.chat("Hi", &ChatOptions::plain()).await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::RateLimited {
                retry_after: Some(d)
            } if d == Duration::ZERO
        ));
        assert_eq!(request_bodies(&server).await.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client.chat("Hi", &ChatOptions::plain()).await.unwrap_err();
        assert!(matches!(err, TransportError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let mut client = OpenAIChatClient::new("");
        let err = client.chat("Hi", &ChatOptions::plain()).await.unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }
}
