//! Output mode definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the engine asks the model for structured output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Declare the contract as a function and force the model to call it.
    ///
    /// The provider constrains the reply to a function call, so the only
    /// remaining failure modes are bad arguments.
    #[default]
    Function,

    /// Embed the contract in the prompt and ask for JSON-only text.
    ///
    /// Works with any completion model. The reply may be wrapped in prose or
    /// markdown fences, which the parser strips.
    Prompted,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Function => write!(f, "function"),
            OutputMode::Prompted => write!(f, "prompted"),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" | "function_call" | "tool" => Ok(OutputMode::Function),
            "prompted" | "json" => Ok(OutputMode::Prompted),
            _ => Err(format!("Unknown output mode: {}", s)),
        }
    }
}
