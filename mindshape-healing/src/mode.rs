//! Healing strategy configuration.

use mindshape_core::ProblemKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Notified after each healing exchange with the attempt number and the
/// model's reply: the correction plan when diagnosing, the repaired JSON
/// text when recovering incognito.
pub trait HealingObserver: Send + Sync {
    /// Called once per healing attempt, starting at 1.
    fn on_healing(&self, attempt: u32, plan: &str);
}

impl<F> HealingObserver for F
where
    F: Fn(u32, &str) + Send + Sync,
{
    fn on_healing(&self, attempt: u32, plan: &str) {
        self(attempt, plan)
    }
}

/// Problem kinds healed unless configured otherwise.
pub const DEFAULT_HEALABLE: &[ProblemKind] = &[
    ProblemKind::Validation,
    ProblemKind::Parse,
    ProblemKind::ShapeMismatch,
];

/// How a failed attempt is repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealingStrategy {
    /// Ask the model to diagnose the errors in the conversation, then re-run
    /// the structured call.
    #[default]
    Diagnose,
    /// Send the failed data, errors and schema as a one-shot request that
    /// bypasses the conversation, and read the repaired JSON from the reply.
    ///
    /// Falls back to [`Diagnose`](Self::Diagnose) for an unforced function
    /// call over several functions, where no single target is known.
    Incognito,
}

impl fmt::Display for HealingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealingStrategy::Diagnose => write!(f, "diagnose"),
            HealingStrategy::Incognito => write!(f, "incognito"),
        }
    }
}

impl std::str::FromStr for HealingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "diagnose" => Ok(HealingStrategy::Diagnose),
            "incognito" | "recover" => Ok(HealingStrategy::Incognito),
            _ => Err(format!("Unknown healing strategy: {}", s)),
        }
    }
}

/// Settings for the healing strategy.
#[derive(Clone)]
pub struct HealingConfig {
    limit: u32,
    strategy: HealingStrategy,
    observer: Option<Arc<dyn HealingObserver>>,
    healable: Vec<ProblemKind>,
}

impl HealingConfig {
    /// Heal up to `limit` times per call.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            strategy: HealingStrategy::default(),
            observer: None,
            healable: DEFAULT_HEALABLE.to_vec(),
        }
    }

    /// Set the repair strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: HealingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: impl HealingObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Set the progress observer from a shared handle.
    #[must_use]
    pub fn with_observer_arc(mut self, observer: Arc<dyn HealingObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Choose which problem kinds are healed.
    ///
    /// Fatal kinds (`SchemaBuild`, `Dispatch`) are ignored.
    #[must_use]
    pub fn with_healable(mut self, kinds: impl IntoIterator<Item = ProblemKind>) -> Self {
        self.healable = kinds.into_iter().filter(|k| !k.is_fatal()).collect();
        self
    }

    /// Maximum healing attempts per call.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The repair strategy.
    #[must_use]
    pub fn strategy(&self) -> HealingStrategy {
        self.strategy
    }

    /// The observer, if any.
    #[must_use]
    pub fn observer(&self) -> Option<&Arc<dyn HealingObserver>> {
        self.observer.as_ref()
    }

    /// Whether problems of this kind are healed.
    #[must_use]
    pub fn heals(&self, kind: ProblemKind) -> bool {
        !kind.is_fatal() && self.healable.contains(&kind)
    }
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for HealingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealingConfig")
            .field("limit", &self.limit)
            .field("strategy", &self.strategy)
            .field("observer", &self.observer.is_some())
            .field("healable", &self.healable)
            .finish()
    }
}

/// Recovery strategy, chosen at construction.
#[derive(Debug, Clone, Default)]
pub enum Mode {
    /// Surface every problem immediately.
    #[default]
    Plain,
    /// Feed problems back to the model and retry, up to a limit.
    Healing(HealingConfig),
}

impl Mode {
    /// Healing with the given limit and default settings.
    #[must_use]
    pub fn healing(limit: u32) -> Self {
        Mode::Healing(HealingConfig::new(limit))
    }

    /// Maximum healing attempts per call (0 in plain mode).
    #[must_use]
    pub fn limit(&self) -> u32 {
        match self {
            Mode::Plain => 0,
            Mode::Healing(config) => config.limit(),
        }
    }

    /// The healing config, if healing.
    #[must_use]
    pub fn config(&self) -> Option<&HealingConfig> {
        match self {
            Mode::Plain => None,
            Mode::Healing(config) => Some(config),
        }
    }
}

impl From<HealingConfig> for Mode {
    fn from(config: HealingConfig) -> Self {
        Mode::Healing(config)
    }
}

/// Per-call attempt counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealingState {
    attempt: u32,
    limit: u32,
}

impl HealingState {
    /// A fresh counter.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self { attempt: 0, limit }
    }

    /// Healing attempts made so far in the current call.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The configured limit.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether another attempt is allowed.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.attempt < self.limit
    }

    /// Record an attempt and return its number. Never exceeds the limit.
    pub fn advance(&mut self) -> u32 {
        if self.can_retry() {
            self.attempt += 1;
        }
        self.attempt
    }

    /// Start over.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
