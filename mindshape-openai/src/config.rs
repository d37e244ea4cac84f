//! Connection settings for the OpenAI transport.

use crate::retry::RetryConfig;
use mindshape_core::{ModelSettings, TransportError};
use serde::{Deserialize, Serialize};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the endpoint.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Everything needed to talk to an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Bearer token.
    #[serde(default)]
    pub api_key: String,
    /// Base URL, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional organization header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Generation settings sent with every request.
    #[serde(default)]
    pub settings: ModelSettings,
    /// Transport-level retry.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl OpenAIConfig {
    /// Create a configuration for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            organization: None,
            settings: ModelSettings::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Read `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, TransportError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            TransportError::Configuration(format!("{API_KEY_ENV} environment variable not set"))
        })?;
        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        Ok(config)
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the organization ID.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Set the generation settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fail early on settings no request could succeed with.
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.api_key.trim().is_empty() {
            return Err(TransportError::Configuration("API key is empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(TransportError::Configuration("base URL is empty".to_string()));
        }
        Ok(())
    }

    /// The chat completions endpoint.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindshape_core::DEFAULT_MODEL;

    #[test]
    fn test_builder() {
        let config = OpenAIConfig::new("sk-test")
            .with_base_url("http://localhost:8080/v1/")
            .with_organization("org-1")
            .with_settings(ModelSettings::new().model("gpt-4"));

        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.organization.as_deref(), Some("org-1"));
        assert_eq!(config.settings.model, "gpt-4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = OpenAIConfig::default().validate().unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: OpenAIConfig =
            serde_json::from_str(r#"{"api_key": "sk", "retry": {"max_retries": 2}}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.settings.model, DEFAULT_MODEL);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.multiplier, 2.0);
    }
}
