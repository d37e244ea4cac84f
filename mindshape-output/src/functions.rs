//! Named, schema-backed functions the model may call.

use indexmap::IndexMap;
use mindshape_core::{FieldError, FunctionDefinition, Problem};
use mindshape_schema::{translate, Contract, ContractSpec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One offered function: what it is for and what its arguments look like.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    /// Description shown to the model.
    pub description: String,
    /// Argument contract.
    pub contract: Contract<JsonValue>,
}

/// An ordered set of functions offered to the model.
///
/// # Example
///
/// ```rust
/// use mindshape_output::FunctionSet;
/// use mindshape_schema::{Contract, SchemaBuilder};
///
/// let functions = FunctionSet::new()
///     .with_function(
///         "pickHat",
///         "Pick a hat for the occasion",
///         Contract::from(SchemaBuilder::new().string("hat", "Hat style", true).build()),
///     )
///     .with_function(
///         "pickColor",
///         "Pick a color",
///         Contract::from(SchemaBuilder::new().string("color", "Color name", true).build()),
///     );
///
/// assert_eq!(functions.names(), vec!["pickHat", "pickColor"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FunctionSet {
    functions: IndexMap<String, FunctionSpec>,
}

impl FunctionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function.
    #[must_use]
    pub fn with_function<T>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        contract: Contract<T>,
    ) -> Self {
        self.add(name, description, contract);
        self
    }

    /// Add a function, replacing any previous one with the same name.
    pub fn add<T>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        contract: Contract<T>,
    ) {
        self.functions.insert(
            name.into(),
            FunctionSpec {
                description: description.into(),
                contract: contract.erase(),
            },
        );
    }

    /// Look up a function.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    /// Whether a function is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Function names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    /// Number of functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Translate every contract, failing on the first broken one.
    pub(crate) fn translate_all(&self) -> Result<TranslatedFunctions, Problem> {
        let mut specs = IndexMap::with_capacity(self.functions.len());
        for (name, function) in &self.functions {
            let spec = translate(&function.contract).map_err(|p| {
                Problem::schema_build(format!("function '{}': {}", name, p.message))
            })?;
            specs.insert(name.clone(), (function.description.clone(), spec));
        }
        Ok(TranslatedFunctions { specs })
    }
}

/// Translated contracts keyed by function name.
#[derive(Debug)]
pub(crate) struct TranslatedFunctions {
    specs: IndexMap<String, (String, ContractSpec)>,
}

impl TranslatedFunctions {
    /// A single-entry set built from an already translated spec.
    pub(crate) fn single(name: &str, description: &str, spec: ContractSpec) -> Self {
        let mut specs = IndexMap::with_capacity(1);
        specs.insert(name.to_string(), (description.to_string(), spec));
        Self { specs }
    }

    pub(crate) fn definitions(&self) -> Vec<FunctionDefinition> {
        self.specs
            .iter()
            .map(|(name, (description, spec))| spec.function_definition(name, description))
            .collect()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ContractSpec> {
        self.specs.get(name).map(|(_, spec)| spec)
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }
}

/// A validated function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInvocation {
    /// The called function.
    pub name: String,
    /// Arguments, already checked against the function's contract.
    pub arguments: JsonValue,
}

impl FunctionInvocation {
    /// Create an invocation.
    pub fn new(name: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// The called function.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The validated arguments.
    #[must_use]
    pub fn arguments(&self) -> &JsonValue {
        &self.arguments
    }

    /// Deserialize the arguments into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, Problem> {
        serde_json::from_value(self.arguments.clone()).map_err(|e| {
            Problem::validation(
                vec![FieldError::new("", self.arguments.clone(), e.to_string())],
                self.arguments.clone(),
            )
        })
    }

    /// Split into name and arguments.
    #[must_use]
    pub fn into_parts(self) -> (String, JsonValue) {
        (self.name, self.arguments)
    }
}
