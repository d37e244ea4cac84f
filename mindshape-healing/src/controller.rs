//! The self-healing controller.
//!
//! [`HealingChat`] wraps a [`StructuredChat`] engine. When an attempt comes
//! back with a healable problem it repairs it with the configured
//! [`HealingStrategy`]: either a diagnostic exchange in the conversation
//! followed by the same structured call, or a one-shot incognito recovery
//! request. The loop is bounded by the configured limit and the attempt
//! counter is reset whenever a call returns, whatever the result.

use async_trait::async_trait;
use mindshape_core::{ChatResult, ChatTransport, Outcome, Problem, Prompt, TransportError};
use mindshape_output::{
    parse_reply, FunctionInvocation, FunctionSet, OutputMode, StructuredChat, StructuredMind,
};
use mindshape_schema::{translate, Contract};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::diagnostic::{diagnostic_prompt, recovery_prompt, RECOVERY_SYSTEM_MESSAGE, RETRY_PROMPT};
use crate::mode::{HealingObserver, HealingState, HealingStrategy, Mode};

/// One structured call that can be repeated or repaired.
#[async_trait]
trait Attempt: Send + Sync {
    type Output: Send;

    async fn run<C: ChatTransport>(
        &self,
        engine: &mut StructuredChat<C>,
        message: Prompt,
    ) -> ChatResult<Self::Output>;

    /// The schema the reply must satisfy.
    fn schema(&self) -> Option<JsonValue>;

    /// Whether a recovery reply can be read back into an output.
    fn recoverable(&self) -> bool {
        true
    }

    /// Read a one-shot recovery reply.
    fn recover(&self, reply: &str) -> Outcome<Self::Output>;
}

struct ContractAttempt<'a, T> {
    contract: &'a Contract<T>,
    force_function: bool,
}

#[async_trait]
impl<'a, T> Attempt for ContractAttempt<'a, T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    async fn run<C: ChatTransport>(
        &self,
        engine: &mut StructuredChat<C>,
        message: Prompt,
    ) -> ChatResult<T> {
        if self.force_function {
            engine.structured_chat(message, self.contract).await
        } else {
            engine.chat(message, self.contract).await
        }
    }

    fn schema(&self) -> Option<JsonValue> {
        translate(self.contract).ok().map(|spec| spec.schema().clone())
    }

    fn recover(&self, reply: &str) -> Outcome<T> {
        let spec = match translate(self.contract) {
            Ok(spec) => spec,
            Err(problem) => return Outcome::Problem(problem),
        };
        match parse_reply(reply) {
            Ok(value) => spec.decode(value).into(),
            Err(e) => Outcome::Problem(e.into_problem(reply)),
        }
    }
}

struct InvokeAttempt<'a> {
    functions: &'a FunctionSet,
    forced: Option<&'a str>,
}

impl InvokeAttempt<'_> {
    /// The function a recovery reply would be arguments for.
    fn target(&self) -> Option<&str> {
        match self.forced {
            Some(name) => Some(name),
            None => match self.functions.names().as_slice() {
                [only] => Some(*only),
                _ => None,
            },
        }
    }

    fn schema_of(&self, name: &str) -> Option<JsonValue> {
        let function = self.functions.get(name)?;
        translate(&function.contract)
            .ok()
            .map(|spec| spec.schema().clone())
    }
}

#[async_trait]
impl<'a> Attempt for InvokeAttempt<'a> {
    type Output = FunctionInvocation;

    async fn run<C: ChatTransport>(
        &self,
        engine: &mut StructuredChat<C>,
        message: Prompt,
    ) -> ChatResult<FunctionInvocation> {
        engine.invoke(message, self.functions, self.forced).await
    }

    /// The target function's schema, or every schema keyed by function name.
    fn schema(&self) -> Option<JsonValue> {
        match self.target() {
            Some(name) => self.schema_of(name),
            None => Some(JsonValue::Object(
                self.functions
                    .names()
                    .into_iter()
                    .filter_map(|name| self.schema_of(name).map(|s| (name.to_string(), s)))
                    .collect(),
            )),
        }
    }

    fn recoverable(&self) -> bool {
        self.target().is_some()
    }

    fn recover(&self, reply: &str) -> Outcome<FunctionInvocation> {
        let Some(name) = self.target() else {
            return Outcome::Problem(Problem::shape_mismatch(
                "no single function to recover arguments for",
                reply,
            ));
        };
        let Some(function) = self.functions.get(name) else {
            return Outcome::Problem(Problem::schema_build(format!(
                "function '{}' is not declared",
                name
            )));
        };
        let spec = match translate(&function.contract) {
            Ok(spec) => spec,
            Err(problem) => return Outcome::Problem(problem),
        };
        let arguments = match parse_reply(reply) {
            Ok(value) => value,
            Err(e) => return Outcome::Problem(e.into_problem(reply)),
        };
        match spec.validate(&arguments) {
            Ok(()) => Outcome::Success(FunctionInvocation::new(name, arguments)),
            Err(detail) => Outcome::Problem(Problem::validation(detail, arguments)),
        }
    }
}

/// Structured chat with bounded automatic recovery.
///
/// # Example
///
/// ```rust
/// use mindshape_core::MockTransport;
/// use mindshape_healing::HealingChat;
/// use mindshape_schema::Contract;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let transport = MockTransport::new()
///     .with_function_call("structured_response", r#"{"n": -1}"#)
///     .with_message("n must be positive, I will use 4")
///     .with_function_call("structured_response", r#"{"n": 4}"#);
///
/// let mut mind = HealingChat::healing(transport, 2);
/// let contract = Contract::<serde_json::Value>::from_json_schema(json!({
///     "type": "object",
///     "properties": {"n": {"type": "integer", "minimum": 1}},
///     "required": ["n"]
/// }));
///
/// let outcome = mind.chat("Pick a positive number", &contract).await.unwrap();
/// assert_eq!(outcome.value(), Some(&json!({"n": 4})));
/// assert_eq!(mind.attempt(), 0);
/// # });
/// ```
#[derive(Debug)]
pub struct HealingChat<C> {
    engine: StructuredChat<C>,
    mode: Mode,
    state: HealingState,
}

impl<C: ChatTransport> HealingChat<C> {
    /// Wrap an engine with the given strategy.
    pub fn new(engine: StructuredChat<C>, mode: Mode) -> Self {
        let state = HealingState::new(mode.limit());
        Self {
            engine,
            mode,
            state,
        }
    }

    /// A controller that never heals, over a function-mode engine.
    pub fn plain(transport: C) -> Self {
        Self::new(StructuredChat::new(transport), Mode::Plain)
    }

    /// A healing controller over a function-mode engine.
    pub fn healing(transport: C, limit: u32) -> Self {
        Self::new(StructuredChat::new(transport), Mode::healing(limit))
    }

    /// Replace the strategy.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<Mode>) -> Self {
        self.mode = mode.into();
        self.state = HealingState::new(self.mode.limit());
        self
    }

    /// Set the healing observer.
    ///
    /// Has no effect on a plain controller; pass a
    /// [`HealingConfig`](crate::HealingConfig) to [`with_mode`](Self::with_mode)
    /// to enable healing and observe it.
    #[must_use]
    pub fn with_observer(mut self, observer: impl HealingObserver + 'static) -> Self {
        if let Mode::Healing(config) = &mut self.mode {
            *config = config.clone().with_observer(observer);
        }
        self
    }

    /// Healing attempts made in the call currently running (0 between calls).
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.state.attempt()
    }

    /// Maximum healing attempts per call.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.state.limit()
    }

    /// The strategy.
    #[must_use]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// The engine's output mode.
    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        self.engine.mode()
    }

    /// Borrow the engine.
    pub fn engine(&self) -> &StructuredChat<C> {
        &self.engine
    }

    /// Mutably borrow the engine.
    pub fn engine_mut(&mut self) -> &mut StructuredChat<C> {
        &mut self.engine
    }

    /// Unwrap the engine.
    pub fn into_engine(self) -> StructuredChat<C> {
        self.engine
    }

    /// Ask for a value matching `contract` in the engine's output mode.
    pub async fn chat<T>(
        &mut self,
        message: impl Into<Prompt>,
        contract: &Contract<T>,
    ) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let attempt = ContractAttempt {
            contract,
            force_function: false,
        };
        self.run(message.into(), &attempt).await
    }

    /// Ask for a value matching `contract` through a forced function call.
    pub async fn structured_chat<T>(
        &mut self,
        message: impl Into<Prompt>,
        contract: &Contract<T>,
    ) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let attempt = ContractAttempt {
            contract,
            force_function: true,
        };
        self.run(message.into(), &attempt).await
    }

    /// Let the model call one of `functions`, healing bad arguments.
    ///
    /// Retries keep the same function set and forced name. An unknown
    /// function name is never healed.
    pub async fn invoke(
        &mut self,
        message: impl Into<Prompt>,
        functions: &FunctionSet,
        forced: Option<&str>,
    ) -> ChatResult<FunctionInvocation> {
        let attempt = InvokeAttempt { functions, forced };
        self.run(message.into(), &attempt).await
    }

    /// Send a message without any contract.
    pub async fn plain_chat(
        &mut self,
        message: impl Into<Prompt>,
    ) -> Result<String, TransportError> {
        self.engine.plain_chat(message).await
    }

    async fn run<A: Attempt>(&mut self, message: Prompt, attempt: &A) -> ChatResult<A::Output> {
        self.state.reset();
        let result = self.heal_loop(message, attempt).await;
        self.state.reset();
        result
    }

    async fn heal_loop<A: Attempt>(
        &mut self,
        message: Prompt,
        attempt: &A,
    ) -> ChatResult<A::Output> {
        let mut outcome = attempt.run(&mut self.engine, message).await?;
        loop {
            let problem = match outcome {
                Outcome::Success(value) => {
                    if self.state.attempt() > 0 {
                        info!(attempt = self.state.attempt(), "Healing succeeded");
                    }
                    return Ok(Outcome::Success(value));
                }
                Outcome::Problem(problem) => problem,
            };

            let Mode::Healing(config) = &self.mode else {
                return Ok(Outcome::Problem(problem));
            };
            if !config.heals(problem.kind) {
                debug!(kind = %problem.kind, "Problem is not healable");
                return Ok(Outcome::Problem(problem));
            }
            if !self.state.can_retry() {
                warn!(
                    kind = %problem.kind,
                    limit = self.state.limit(),
                    "Healing attempts exhausted"
                );
                return Ok(Outcome::Problem(problem));
            }

            let strategy = match config.strategy() {
                HealingStrategy::Incognito if !attempt.recoverable() => {
                    debug!("No single target function, diagnosing instead");
                    HealingStrategy::Diagnose
                }
                strategy => strategy,
            };
            let number = self.state.advance();
            info!(
                attempt = number,
                limit = self.state.limit(),
                kind = %problem.kind,
                strategy = %strategy,
                "Healing structured output"
            );
            let schema = attempt.schema();

            outcome = match strategy {
                HealingStrategy::Diagnose => {
                    let diagnostic = diagnostic_prompt(&problem, schema.as_ref());
                    debug!(prompt = %diagnostic, "Sending diagnostic prompt");
                    let plan = self.engine.plain_chat(diagnostic).await?;
                    debug!(plan = %plan, "Received correction plan");

                    if let Some(observer) = config.observer() {
                        observer.on_healing(number, &plan);
                    }
                    attempt
                        .run(&mut self.engine, Prompt::text(RETRY_PROMPT))
                        .await?
                }
                HealingStrategy::Incognito => {
                    let recovery = recovery_prompt(&problem, schema.as_ref());
                    debug!(prompt = %recovery, "Sending recovery prompt");
                    let reply = self
                        .engine
                        .transport_mut()
                        .incognito_chat(&recovery, Some(RECOVERY_SYSTEM_MESSAGE))
                        .await?;
                    debug!(reply = %reply, "Received recovery reply");

                    if let Some(observer) = config.observer() {
                        observer.on_healing(number, &reply);
                    }
                    attempt.recover(&reply)
                }
            };
        }
    }
}

#[async_trait]
impl<C: ChatTransport> StructuredMind for HealingChat<C> {
    async fn chat<T>(&mut self, message: Prompt, contract: &Contract<T>) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        HealingChat::chat(self, message, contract).await
    }

    async fn structured_chat<T>(
        &mut self,
        message: Prompt,
        contract: &Contract<T>,
    ) -> ChatResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        HealingChat::structured_chat(self, message, contract).await
    }

    async fn invoke(
        &mut self,
        message: Prompt,
        functions: &FunctionSet,
        forced: Option<&str>,
    ) -> ChatResult<FunctionInvocation> {
        HealingChat::invoke(self, message, functions, forced).await
    }

    async fn plain_chat(&mut self, message: Prompt) -> Result<String, TransportError> {
        HealingChat::plain_chat(self, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::HealingConfig;
    use mindshape_core::{MockCallKind, MockTransport, ProblemKind};
    use mindshape_output::STRUCTURED_RESPONSE_FUNCTION;
    use mindshape_schema::{JsonSchema, SchemaBuilder};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Reading {
        sensor: String,
        /// Fill level in percent
        #[schemars(range(min = 0, max = 100))]
        percent: u8,
    }

    const INVALID: &str = r#"{"sensor": "s1", "percent": 250}"#;
    const VALID: &str = r#"{"sensor": "s1", "percent": 42}"#;

    fn recorder() -> (Arc<Mutex<Vec<(u32, String)>>>, impl HealingObserver + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = move |attempt: u32, plan: &str| {
            sink.lock().unwrap().push((attempt, plan.to_string()));
        };
        (seen, observer)
    }

    fn always_invalid(limit: u32) -> MockTransport {
        let mut transport =
            MockTransport::new().with_function_call(STRUCTURED_RESPONSE_FUNCTION, INVALID);
        for i in 0..limit {
            transport = transport
                .with_message(format!("plan {}", i + 1))
                .with_function_call(STRUCTURED_RESPONSE_FUNCTION, INVALID);
        }
        transport
    }

    fn is_diagnostic(call: &mindshape_core::MockCall) -> bool {
        !call.options.has_functions()
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[tokio::test]
    async fn test_bounded_attempts(#[case] limit: u32) {
        let (seen, observer) = recorder();
        let mut mind = HealingChat::healing(always_invalid(limit), limit).with_observer(observer);

        let outcome = mind.chat("Read the sensor", &Contract::<Reading>::of()).await.unwrap();

        let problem = outcome.problem().unwrap();
        assert_eq!(problem.kind, ProblemKind::Validation);
        assert_eq!(problem.detail[0].path, "/percent");
        assert_eq!(mind.attempt(), 0);

        let calls = mind.engine().transport().calls();
        let diagnostics = calls.iter().filter(|c| is_diagnostic(c)).count();
        let structured = calls.len() - diagnostics;
        assert_eq!(diagnostics, limit as usize);
        assert_eq!(structured, limit as usize + 1);

        let attempts: Vec<u32> = seen.lock().unwrap().iter().map(|(n, _)| *n).collect();
        assert_eq!(attempts, (1..=limit).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_heals_on_second_attempt() {
        let (seen, observer) = recorder();
        let transport = MockTransport::new()
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, INVALID)
            .with_message("percent must be at most 100; use 42")
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, VALID);
        let mut mind = HealingChat::healing(transport, 3).with_observer(observer);

        let outcome = mind.chat("Read the sensor", &Contract::<Reading>::of()).await.unwrap();

        assert_eq!(
            outcome.value(),
            Some(&Reading {
                sensor: "s1".into(),
                percent: 42
            })
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, "percent must be at most 100; use 42".to_string())]
        );
        assert_eq!(mind.attempt(), 0);
    }

    #[tokio::test]
    async fn test_diagnostic_and_retry_prompts() {
        let transport = MockTransport::new()
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, INVALID)
            .with_message("plan")
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, VALID);
        let mut mind = HealingChat::healing(transport, 1);
        mind.chat("Read the sensor", &Contract::<Reading>::of()).await.unwrap();

        let calls = mind.engine().transport().calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].message.contains("Path: /percent"));
        assert!(calls[1].message.contains("Value: 250"));
        assert!(calls[1].message.contains("JSON schema:"));
        assert!(calls[1].message.contains("Fill level in percent"));
        assert!(calls[1].message.contains("\"maximum\""));
        assert!(calls[1].offered_functions().is_empty());
        assert_eq!(calls[2].message, RETRY_PROMPT);
        assert_eq!(calls[2].options.forced_name(), Some(STRUCTURED_RESPONSE_FUNCTION));
    }

    fn incognito(limit: u32) -> HealingConfig {
        HealingConfig::new(limit).with_strategy(HealingStrategy::Incognito)
    }

    #[tokio::test]
    async fn test_incognito_recovery() {
        let (seen, observer) = recorder();
        let transport = MockTransport::new()
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, INVALID)
            .with_message(format!("```json\n{}\n```", VALID));
        let mut mind =
            HealingChat::plain(transport).with_mode(incognito(2).with_observer(observer));

        let outcome = mind.chat("Read the sensor", &Contract::<Reading>::of()).await.unwrap();
        assert_eq!(
            outcome.value(),
            Some(&Reading {
                sensor: "s1".into(),
                percent: 42
            })
        );
        assert_eq!(mind.attempt(), 0);
        assert_eq!(seen.lock().unwrap()[0].0, 1);

        let transport = mind.engine().transport();
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].kind, MockCallKind::Incognito);
        assert_eq!(calls[1].system_override.as_deref(), Some(RECOVERY_SYSTEM_MESSAGE));
        assert!(calls[1].message.starts_with("DATA:\n"));
        assert!(calls[1].message.contains("Path: /percent"));
        assert!(calls[1].message.contains("JSON SCHEMA:"));
        assert!(calls[1].message.contains("Fill level in percent"));
        assert!(calls[1].message.ends_with("RESPONSE:"));

        // system, user, first function call; recovery never lands in history
        assert_eq!(transport.history().len(), 3);
    }

    #[tokio::test]
    async fn test_incognito_recovery_bounded() {
        let (seen, observer) = recorder();
        let transport = MockTransport::new()
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, INVALID)
            .with_message("I could not fix it")
            .with_message(r#"{"sensor": "s1", "percent": 300}"#);
        let mut mind =
            HealingChat::plain(transport).with_mode(incognito(2).with_observer(observer));

        let outcome = mind.chat("Read the sensor", &Contract::<Reading>::of()).await.unwrap();
        let problem = outcome.problem().unwrap();
        assert_eq!(problem.kind, ProblemKind::Validation);
        assert_eq!(problem.detail[0].value, json!(300));

        let calls = mind.engine().transport().calls();
        let kinds: Vec<MockCallKind> = calls.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![MockCallKind::Chat, MockCallKind::Incognito, MockCallKind::Incognito]
        );
        assert!(calls[2].message.starts_with("DATA:\nI could not fix it\n"));

        let attempts: Vec<u32> = seen.lock().unwrap().iter().map(|(n, _)| *n).collect();
        assert_eq!(attempts, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_incognito_invoke_forced() {
        let functions = FunctionSet::new()
            .with_function(
                "pickHat",
                "Pick a hat",
                Contract::from(
                    SchemaBuilder::new()
                        .enum_values("hat", "Hat", &["cap", "fedora"], true)
                        .build(),
                ),
            )
            .with_function(
                "pickColor",
                "Pick a color",
                Contract::from(SchemaBuilder::new().string("color", "Color", true).build()),
            );
        let transport = MockTransport::new()
            .with_function_call("pickHat", r#"{"hat": "helmet"}"#)
            .with_message(r#"{"hat": "cap"}"#);
        let mut mind = HealingChat::plain(transport).with_mode(incognito(1));

        let outcome = mind.invoke("Dress me", &functions, Some("pickHat")).await.unwrap();
        let invocation = outcome.value().unwrap();
        assert_eq!(invocation.name(), "pickHat");
        assert_eq!(invocation.arguments(), &json!({"hat": "cap"}));

        let calls = mind.engine().transport().calls();
        assert_eq!(calls[1].kind, MockCallKind::Incognito);
        assert!(calls[1].message.contains("\"fedora\""));
        assert!(!calls[1].message.contains("\"color\""));
    }

    #[tokio::test]
    async fn test_incognito_without_target_diagnoses() {
        let functions = FunctionSet::new()
            .with_function(
                "pickHat",
                "Pick a hat",
                Contract::from(
                    SchemaBuilder::new()
                        .enum_values("hat", "Hat", &["cap", "fedora"], true)
                        .build(),
                ),
            )
            .with_function(
                "pickColor",
                "Pick a color",
                Contract::from(SchemaBuilder::new().string("color", "Color", true).build()),
            );
        let transport = MockTransport::new()
            .with_function_call("pickHat", r#"{"hat": "helmet"}"#)
            .with_message("use cap")
            .with_function_call("pickHat", r#"{"hat": "cap"}"#);
        let mut mind = HealingChat::plain(transport).with_mode(incognito(1));

        let outcome = mind.invoke("Dress me", &functions, None).await.unwrap();
        assert!(outcome.is_success());

        let calls = mind.engine().transport().calls();
        assert!(calls.iter().all(|c| c.kind == MockCallKind::Chat));
        assert!(calls[1].message.contains("\"pickHat\""));
        assert!(calls[1].message.contains("\"pickColor\""));
    }

    #[test]
    fn test_observer_on_plain_keeps_plain() {
        let (_, observer) = recorder();
        let mind = HealingChat::plain(MockTransport::new()).with_observer(observer);

        assert!(matches!(mind.mode(), Mode::Plain));
        assert_eq!(mind.limit(), 0);
    }

    #[tokio::test]
    async fn test_plain_mode_never_heals() {
        let mut mind = HealingChat::plain(always_invalid(2));
        let outcome = mind.chat("x", &Contract::<Reading>::of()).await.unwrap();

        assert_eq!(outcome.problem_kind(), Some(ProblemKind::Validation));
        assert_eq!(mind.engine().transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_limit_never_heals() {
        let mut mind = HealingChat::healing(always_invalid(1), 0);
        let outcome = mind.chat("x", &Contract::<Reading>::of()).await.unwrap();

        assert_eq!(outcome.problem_kind(), Some(ProblemKind::Validation));
        assert_eq!(mind.engine().transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_schema_build_not_healed() {
        let mut mind = HealingChat::healing(MockTransport::new(), 3);
        let contract = Contract::<serde_json::Value>::from_json_schema(json!({"type": "number"}));

        let outcome = mind.chat("x", &contract).await.unwrap();
        assert_eq!(outcome.problem_kind(), Some(ProblemKind::SchemaBuild));
        assert!(mind.engine().transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_not_healed() {
        let functions = FunctionSet::new().with_function(
            "pickHat",
            "Pick a hat",
            Contract::from(SchemaBuilder::new().string("hat", "Hat", true).build()),
        );
        let transport = MockTransport::new().with_function_call("pickShoe", "{}");
        let mut mind = HealingChat::healing(transport, 3);

        let outcome = mind.invoke("x", &functions, Some("pickHat")).await.unwrap();
        assert_eq!(outcome.problem_kind(), Some(ProblemKind::Dispatch));
        assert_eq!(mind.engine().transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_heals_with_same_forced_name() {
        let functions = FunctionSet::new()
            .with_function(
                "pickHat",
                "Pick a hat",
                Contract::from(
                    SchemaBuilder::new()
                        .enum_values("hat", "Hat", &["cap", "fedora"], true)
                        .build(),
                ),
            )
            .with_function(
                "pickColor",
                "Pick a color",
                Contract::from(SchemaBuilder::new().string("color", "Color", true).build()),
            );
        let transport = MockTransport::new()
            .with_function_call("pickHat", r#"{"hat": "helmet"}"#)
            .with_message("helmet is not allowed, use cap")
            .with_function_call("pickHat", r#"{"hat": "cap"}"#);
        let mut mind = HealingChat::healing(transport, 2);

        let outcome = mind.invoke("Dress me", &functions, Some("pickHat")).await.unwrap();
        assert_eq!(outcome.value().map(|i| i.arguments().clone()), Some(json!({"hat": "cap"})));

        let calls = mind.engine().transport().calls();
        assert_eq!(calls[2].options.forced_name(), Some("pickHat"));
        assert_eq!(calls[2].offered_functions(), vec!["pickHat", "pickColor"]);
    }

    #[tokio::test]
    async fn test_shape_mismatch_healed_by_default() {
        let transport = MockTransport::new()
            .with_message("The sensor reads 42 percent.")
            .with_message("I must call the function")
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, VALID);
        let mut mind = HealingChat::healing(transport, 1);

        let outcome = mind.chat("x", &Contract::<Reading>::of()).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_healable_set_restricts_kinds() {
        let transport = MockTransport::new().with_message("The sensor reads 42 percent.");
        let config = HealingConfig::new(2).with_healable([ProblemKind::Validation]);
        let mut mind = HealingChat::plain(transport).with_mode(config);

        let outcome = mind.chat("x", &Contract::<Reading>::of()).await.unwrap();
        assert_eq!(outcome.problem_kind(), Some(ProblemKind::ShapeMismatch));
        assert_eq!(mind.engine().transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_prompted_mode_heals_parse_failure() {
        let transport = MockTransport::new()
            .with_message("The sensor reads 42 percent.")
            .with_message("I will answer in JSON")
            .with_message(r#"{"__AI_RESPONSE": {"sensor": "s1", "percent": 42}}"#);
        let engine = StructuredChat::prompted(transport);
        let mut mind = HealingChat::new(engine, Mode::healing(1));

        let outcome = mind.chat("x", &Contract::<Reading>::of()).await.unwrap();
        assert_eq!(outcome.value().map(|r| r.percent), Some(42));
        assert_eq!(mind.output_mode(), OutputMode::Prompted);
    }

    #[tokio::test]
    async fn test_transport_error_resets_counter() {
        let transport = MockTransport::new()
            .with_function_call(STRUCTURED_RESPONSE_FUNCTION, INVALID)
            .with_error(TransportError::Timeout);
        let mut mind = HealingChat::healing(transport, 3);

        let err = mind.chat("x", &Contract::<Reading>::of()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
        assert_eq!(mind.attempt(), 0);
    }

    #[tokio::test]
    async fn test_independent_calls_start_clean() {
        let (seen, observer) = recorder();
        let mut transport = always_invalid(1);
        transport.push_response(mindshape_core::ModelResponse::function_call(
            STRUCTURED_RESPONSE_FUNCTION,
            INVALID,
        ));
        transport.push_response(mindshape_core::ModelResponse::message("second plan"));
        transport.push_response(mindshape_core::ModelResponse::function_call(
            STRUCTURED_RESPONSE_FUNCTION,
            VALID,
        ));
        let mut mind = HealingChat::healing(transport, 1).with_observer(observer);

        let first = mind.chat("x", &Contract::<Reading>::of()).await.unwrap();
        assert!(!first.is_success());
        let second = mind.chat("x", &Contract::<Reading>::of()).await.unwrap();
        assert!(second.is_success());

        let attempts: Vec<u32> = seen.lock().unwrap().iter().map(|(n, _)| *n).collect();
        assert_eq!(attempts, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_plain_chat_passthrough() {
        let mut mind = HealingChat::healing(MockTransport::new().with_message("hello"), 1);
        assert_eq!(mind.plain_chat("hi").await.unwrap(), "hello");
        assert_eq!(mind.engine().transport().calls()[0].kind, MockCallKind::Chat);
    }

    #[tokio::test]
    async fn test_through_structured_mind() {
        async fn ask<M: StructuredMind>(mind: &mut M) -> ChatResult<Reading> {
            mind.structured_chat(Prompt::text("x"), &Contract::<Reading>::of()).await
        }

        let mut mind = HealingChat::healing(always_invalid(0), 0);
        let outcome = ask(&mut mind).await.unwrap();
        assert_eq!(outcome.problem_kind(), Some(ProblemKind::Validation));
    }
}
