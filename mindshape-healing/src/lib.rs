//! # mindshape-healing
//!
//! Bounded self-healing for structured output.
//!
//! [`HealingChat`] wraps the structured chat engine. When the model's answer
//! fails validation it sends a diagnostic prompt listing each failing field
//! (path, offending value, validator message) next to the schema, lets the
//! model write a fix plan, and re-runs the original call. With
//! [`HealingStrategy::Incognito`] it instead sends the failed data, errors
//! and schema as a one-shot request outside the conversation and reads the
//! repaired JSON from the reply. Attempts are capped by the configured
//! limit; the last problem is returned unchanged once the cap is reached.
//!
//! Unhealable problems (a broken schema, an unknown function name) are
//! returned on the first attempt.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod controller;
pub mod diagnostic;
pub mod mode;

pub use controller::HealingChat;
pub use diagnostic::{diagnostic_prompt, recovery_prompt, RECOVERY_SYSTEM_MESSAGE, RETRY_PROMPT};
pub use mode::{
    HealingConfig, HealingObserver, HealingState, HealingStrategy, Mode, DEFAULT_HEALABLE,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{HealingChat, HealingConfig, HealingObserver, HealingStrategy, Mode};
}
