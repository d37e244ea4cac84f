//! One-call setup configuration.

use mindshape_core::{MindshapeError, Result};
use mindshape_healing::{HealingConfig, HealingStrategy, Mode};
use mindshape_openai::{OpenAIConfig, API_KEY_ENV, BASE_URL_ENV};
use mindshape_output::OutputMode;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the model.
pub const MODEL_ENV: &str = "MINDSHAPE_MODEL";

/// Environment variable setting the healing limit.
pub const AUTO_HEALING_ENV: &str = "MINDSHAPE_AUTO_HEALING";

/// Environment variable selecting the output mode.
pub const OUTPUT_MODE_ENV: &str = "MINDSHAPE_OUTPUT_MODE";

/// Environment variable selecting the healing strategy.
pub const HEALING_STRATEGY_ENV: &str = "MINDSHAPE_HEALING_STRATEGY";

/// How the structured layer behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindOptions {
    /// Healing attempts per call. Zero disables healing.
    pub auto_healing: u32,
    /// How failed attempts are repaired.
    pub strategy: HealingStrategy,
    /// How the contract is presented to the model.
    pub mode: OutputMode,
    /// Replaces the output mode's default system message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

impl MindOptions {
    /// Create default options: no healing, function mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the healing limit.
    #[must_use]
    pub fn auto_healing(mut self, limit: u32) -> Self {
        self.auto_healing = limit;
        self
    }

    /// Set the healing strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: HealingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the output mode.
    #[must_use]
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the system message.
    #[must_use]
    pub fn system_message(mut self, text: impl Into<String>) -> Self {
        self.system_message = Some(text.into());
        self
    }

    /// The healing strategy these options describe.
    #[must_use]
    pub fn healing_mode(&self) -> Mode {
        match self.auto_healing {
            0 => Mode::Plain,
            limit => HealingConfig::new(limit).with_strategy(self.strategy).into(),
        }
    }
}

/// Transport and structured-layer settings.
///
/// ```rust
/// use mindshape::MindConfig;
///
/// let config: MindConfig = serde_json::from_str(r#"{
///     "openai": {"api_key": "sk-test", "settings": {"model": "gpt-4"}},
///     "mind": {"auto_healing": 2}
/// }"#).unwrap();
/// assert_eq!(config.openai.settings.model, "gpt-4");
/// assert_eq!(config.mind.auto_healing, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindConfig {
    /// Provider connection.
    pub openai: OpenAIConfig,
    /// Structured layer.
    pub mind: MindOptions,
}

impl MindConfig {
    /// Create a configuration for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            openai: OpenAIConfig::new(api_key),
            mind: MindOptions::default(),
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Uses `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`,
    /// `MINDSHAPE_MODEL`, `MINDSHAPE_AUTO_HEALING`, `MINDSHAPE_HEALING_STRATEGY`
    /// and `MINDSHAPE_OUTPUT_MODE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_ENV).ok_or_else(|| {
            MindshapeError::Configuration(format!("{API_KEY_ENV} environment variable not set"))
        })?;
        let mut config = Self::new(api_key);

        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.openai.base_url = url;
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.openai.settings.model = model;
        }
        if let Some(limit) = lookup(AUTO_HEALING_ENV) {
            config.mind.auto_healing = limit.trim().parse().map_err(|_| {
                MindshapeError::Configuration(format!(
                    "{AUTO_HEALING_ENV} must be a non-negative integer, got '{limit}'"
                ))
            })?;
        }
        if let Some(strategy) = lookup(HEALING_STRATEGY_ENV) {
            config.mind.strategy = strategy
                .trim()
                .parse()
                .map_err(MindshapeError::Configuration)?;
        }
        if let Some(mode) = lookup(OUTPUT_MODE_ENV) {
            config.mind.mode = mode.trim().parse().map_err(MindshapeError::Configuration)?;
        }

        Ok(config)
    }

    /// Set the structured-layer options.
    #[must_use]
    pub fn with_mind(mut self, mind: MindOptions) -> Self {
        self.mind = mind;
        self
    }

    /// Set the provider connection.
    #[must_use]
    pub fn with_openai(mut self, openai: OpenAIConfig) -> Self {
        self.openai = openai;
        self
    }
}
