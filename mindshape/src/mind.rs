//! Ready-made structured mind.

use crate::config::{MindConfig, MindOptions};
use mindshape_core::{ChatTransport, MindshapeError, Result};
use mindshape_healing::HealingChat;
use mindshape_openai::OpenAIChatClient;
use mindshape_output::StructuredChat;
use tracing::debug;

/// A healing controller over a transport, OpenAI by default.
pub type Mind<C = OpenAIChatClient> = HealingChat<C>;

/// Build a [`Mind`] talking to OpenAI.
///
/// ```rust
/// use mindshape::{mind, MindConfig, MindOptions};
///
/// let config = MindConfig::new("sk-test").with_mind(MindOptions::new().auto_healing(2));
/// let mind = mind(config).unwrap();
/// assert_eq!(mind.limit(), 2);
/// ```
pub fn mind(config: MindConfig) -> Result<Mind> {
    config
        .openai
        .validate()
        .map_err(|e| MindshapeError::Configuration(e.to_string()))?;
    Ok(mind_with_transport(
        OpenAIChatClient::from_config(config.openai),
        &config.mind,
    ))
}

/// Build a [`Mind`] from environment variables.
///
/// See [`MindConfig::from_env`].
pub fn mind_from_env() -> Result<Mind> {
    mind(MindConfig::from_env()?)
}

/// Build a [`Mind`] over any transport.
pub fn mind_with_transport<C: ChatTransport>(transport: C, options: &MindOptions) -> Mind<C> {
    let mut engine = StructuredChat::with_mode(transport, options.mode);
    if let Some(text) = &options.system_message {
        engine = engine.with_system_message(text);
    }
    debug!(
        mode = %options.mode,
        auto_healing = options.auto_healing,
        "Structured mind ready"
    );
    HealingChat::new(engine, options.healing_mode())
}
