//! The structured chat engine.
//!
//! [`StructuredChat`] drives exactly one request/validate cycle per call and
//! never retries. Every exchange goes through the wrapped transport and so
//! lands in its conversation history.

use mindshape_core::{
    ChatOptions, ChatResult, ChatTransport, FunctionCallMode, ModelResponse, Outcome, Problem,
    Prompt, TransportError,
};
use mindshape_schema::{translate, Contract, ContractSpec};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::functions::{FunctionInvocation, FunctionSet, TranslatedFunctions};
use crate::mode::OutputMode;
use crate::parser::{parse_arguments, parse_reply};
use crate::prompts::{
    prompted_request, DEFAULT_SYSTEM_MESSAGE, PROMPTED_SYSTEM_MESSAGE,
    STRUCTURED_RESPONSE_DESCRIPTION, STRUCTURED_RESPONSE_FUNCTION,
};

/// Obtains schema-conforming values from a chat transport.
///
/// # Example
///
/// ```rust
/// use mindshape_core::{MockTransport, Outcome};
/// use mindshape_output::StructuredChat;
/// use mindshape_schema::{Contract, JsonSchema};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, JsonSchema)]
/// struct Answer {
///     value: i64,
/// }
///
/// # tokio_test::block_on(async {
/// let transport = MockTransport::new()
///     .with_function_call("structured_response", r#"{"value": 42}"#);
/// let mut engine = StructuredChat::new(transport);
///
/// let outcome = engine.chat("What is the answer?", &Contract::<Answer>::of()).await.unwrap();
/// assert_eq!(outcome.value().map(|a| a.value), Some(42));
/// # });
/// ```
#[derive(Debug)]
pub struct StructuredChat<C> {
    transport: C,
    mode: OutputMode,
}

impl<C: ChatTransport> StructuredChat<C> {
    /// Create an engine in function mode with the default system message.
    pub fn new(transport: C) -> Self {
        Self::with_mode(transport, OutputMode::Function)
    }

    /// Create an engine in prompted mode with the JSON-only system message.
    pub fn prompted(transport: C) -> Self {
        Self::with_mode(transport, OutputMode::Prompted)
    }

    /// Create an engine in the given mode, installing that mode's system message.
    pub fn with_mode(mut transport: C, mode: OutputMode) -> Self {
        let system = match mode {
            OutputMode::Function => DEFAULT_SYSTEM_MESSAGE,
            OutputMode::Prompted => PROMPTED_SYSTEM_MESSAGE,
        };
        transport.set_system_message(system);
        Self { transport, mode }
    }

    /// Replace the system message.
    #[must_use]
    pub fn with_system_message(mut self, text: &str) -> Self {
        self.transport.set_system_message(text);
        self
    }

    /// The output mode.
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &C {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut C {
        &mut self.transport
    }

    /// Unwrap the transport.
    pub fn into_transport(self) -> C {
        self.transport
    }

    /// Ask for a value matching `contract`, using the engine's output mode.
    pub async fn chat<T: DeserializeOwned>(
        &mut self,
        message: impl Into<Prompt>,
        contract: &Contract<T>,
    ) -> ChatResult<T> {
        match self.mode {
            OutputMode::Function => self.structured_chat(message, contract).await,
            OutputMode::Prompted => self.prompted_chat(message, contract).await,
        }
    }

    /// Ask for a value matching `contract` through a forced function call.
    pub async fn structured_chat<T: DeserializeOwned>(
        &mut self,
        message: impl Into<Prompt>,
        contract: &Contract<T>,
    ) -> ChatResult<T> {
        let spec = match translate(contract) {
            Ok(spec) => spec,
            Err(problem) => return Ok(Outcome::Problem(problem)),
        };
        let functions = TranslatedFunctions::single(
            STRUCTURED_RESPONSE_FUNCTION,
            STRUCTURED_RESPONSE_DESCRIPTION,
            spec.clone(),
        );

        let invocation = self
            .call_functions(
                &message.into().to_text(),
                &functions,
                Some(STRUCTURED_RESPONSE_FUNCTION),
            )
            .await?;

        Ok(match invocation {
            Outcome::Success(invocation) => decode(&spec, invocation.arguments),
            Outcome::Problem(problem) => Outcome::Problem(problem),
        })
    }

    async fn prompted_chat<T: DeserializeOwned>(
        &mut self,
        message: impl Into<Prompt>,
        contract: &Contract<T>,
    ) -> ChatResult<T> {
        let spec = match translate(contract) {
            Ok(spec) => spec,
            Err(problem) => return Ok(Outcome::Problem(problem)),
        };

        let prompt = prompted_request(message.into().as_json(), spec.schema());
        debug!(prompt = %prompt, "Sending prompted request");
        let response = self.transport.chat(&prompt, &ChatOptions::plain()).await?;
        debug!(response = ?response, "Received model response");

        let outcome = match response {
            ModelResponse::Message { text } => match parse_reply(&text) {
                Ok(value) => decode(&spec, value),
                Err(e) => Outcome::Problem(e.into_problem(&text)),
            },
            call @ ModelResponse::FunctionCall(_) => Outcome::Problem(Problem::shape_mismatch(
                "model called a function instead of answering with JSON",
                call.to_text(),
            )),
        };
        Ok(log_problem(outcome))
    }

    /// Let the model call one of `functions`.
    ///
    /// With `forced` set the model is told to call exactly that function;
    /// otherwise it picks. A forced name that is not in `functions`, or an
    /// empty set, is a schema build problem and no request is made.
    pub async fn invoke(
        &mut self,
        message: impl Into<Prompt>,
        functions: &FunctionSet,
        forced: Option<&str>,
    ) -> ChatResult<FunctionInvocation> {
        if functions.is_empty() {
            return Ok(Outcome::Problem(Problem::schema_build(
                "no functions were offered",
            )));
        }
        if let Some(name) = forced {
            if !functions.contains(name) {
                return Ok(Outcome::Problem(Problem::schema_build(format!(
                    "forced function '{}' is not declared (declared: {})",
                    name,
                    functions.names().join(", ")
                ))));
            }
        }
        let translated = match functions.translate_all() {
            Ok(translated) => translated,
            Err(problem) => return Ok(Outcome::Problem(problem)),
        };

        self.call_functions(&message.into().to_text(), &translated, forced)
            .await
    }

    /// Send a message without any contract.
    pub async fn plain_chat(
        &mut self,
        message: impl Into<Prompt>,
    ) -> Result<String, TransportError> {
        let text = message.into().to_text();
        debug!(prompt = %text, "Sending plain request");
        let response = self.transport.chat(&text, &ChatOptions::plain()).await?;
        Ok(response.to_text())
    }

    async fn call_functions(
        &mut self,
        text: &str,
        functions: &TranslatedFunctions,
        forced: Option<&str>,
    ) -> ChatResult<FunctionInvocation> {
        let mode = forced.map_or(FunctionCallMode::Auto, |name| FunctionCallMode::named(name));
        let options = ChatOptions::with_functions(functions.definitions(), mode);

        debug!(prompt = %text, forced = ?forced, "Sending function request");
        let response = self.transport.chat(text, &options).await?;
        debug!(response = ?response, "Received model response");

        Ok(log_problem(dispatch(response, functions, forced)))
    }
}

/// Check a model response against the offered functions.
fn dispatch(
    response: ModelResponse,
    functions: &TranslatedFunctions,
    forced: Option<&str>,
) -> Outcome<FunctionInvocation> {
    let call = match response {
        ModelResponse::Message { text } => {
            return Outcome::Problem(Problem::shape_mismatch(
                "model answered with text instead of calling a function",
                text,
            ))
        }
        ModelResponse::FunctionCall(call) => call,
    };

    if let Some(expected) = forced {
        if call.name != expected {
            warn!(
                function = %call.name,
                expected = %expected,
                "Model ignored the forced function"
            );
        }
    }

    let Some(spec) = functions.get(&call.name) else {
        return Outcome::Problem(Problem::dispatch(call.name, &functions.names()));
    };

    let arguments = match parse_arguments(&call.arguments) {
        Ok(arguments) => arguments,
        Err(e) => return Outcome::Problem(e.into_problem(&call.arguments)),
    };

    match spec.validate(&arguments) {
        Ok(()) => Outcome::Success(FunctionInvocation::new(call.name, arguments)),
        Err(detail) => Outcome::Problem(Problem::validation(detail, arguments)),
    }
}

fn decode<T: DeserializeOwned>(spec: &ContractSpec, value: serde_json::Value) -> Outcome<T> {
    log_problem(spec.decode(value).into())
}

fn log_problem<T>(outcome: Outcome<T>) -> Outcome<T> {
    if let Outcome::Problem(problem) = &outcome {
        warn!(
            kind = %problem.kind,
            fields = problem.detail.len(),
            "Structured output problem: {}",
            problem.message
        );
    }
    outcome
}
