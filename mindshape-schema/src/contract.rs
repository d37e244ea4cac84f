//! Schema contracts and their translation.
//!
//! A [`Contract`] is the caller's description of the expected output shape.
//! [`translate`] turns it into a [`ContractSpec`]: the cleaned JSON Schema
//! sent to the model plus a compiled validator for checking what comes back.

use jsonschema::{Draft, JSONSchema};
use mindshape_core::{FieldError, FunctionDefinition, Problem};
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::definition::ObjectJsonSchema;
use crate::error::SchemaError;
use crate::transform::{ensure_object_root, strip_metadata};

type SchemaFn = fn() -> Result<JsonValue, serde_json::Error>;

#[derive(Clone)]
enum Source {
    Derived(SchemaFn),
    Raw(JsonValue),
    Object(ObjectJsonSchema),
}

/// Expected output shape, typed by the value it decodes into.
///
/// # Example
///
/// ```rust
/// use mindshape_schema::{translate, Contract};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Weather {
///     city: String,
///     celsius: f64,
/// }
///
/// let spec = translate(&Contract::<Weather>::of()).unwrap();
/// assert_eq!(spec.schema()["type"], "object");
/// ```
pub struct Contract<T = JsonValue> {
    source: Source,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Contract<T> {
    fn with_source(source: Source) -> Self {
        Self {
            source,
            _marker: PhantomData,
        }
    }

    /// Use a hand-written JSON Schema.
    #[must_use]
    pub fn from_json_schema(schema: JsonValue) -> Self {
        Self::with_source(Source::Raw(schema))
    }

    /// Use a schema assembled with [`SchemaBuilder`](crate::SchemaBuilder).
    #[must_use]
    pub fn from_object_schema(schema: ObjectJsonSchema) -> Self {
        Self::with_source(Source::Object(schema))
    }

    /// Forget the target type, keeping the schema.
    #[must_use]
    pub fn erase(self) -> Contract<JsonValue> {
        Contract::with_source(self.source)
    }

    /// The schema before cleanup.
    pub fn raw_schema(&self) -> Result<JsonValue, SchemaError> {
        match &self.source {
            Source::Derived(generate) => Ok(generate()?),
            Source::Raw(schema) => Ok(schema.clone()),
            Source::Object(schema) => Ok(schema.to_json()?),
        }
    }
}

impl<T: JsonSchema> Contract<T> {
    /// Derive the schema from `T`.
    #[must_use]
    pub fn of() -> Self {
        Self::with_source(Source::Derived(derived_schema::<T>))
    }
}

impl<T: DeserializeOwned> Contract<T> {
    /// Validate `value` against this contract and deserialize it.
    pub fn decode(&self, value: JsonValue) -> Result<T, Problem> {
        translate(self)?.decode(value)
    }
}

impl<T> Clone for Contract<T> {
    fn clone(&self) -> Self {
        Self::with_source(self.source.clone())
    }
}

impl<T> fmt::Debug for Contract<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Derived(_) => "derived",
            Source::Raw(_) => "json",
            Source::Object(_) => "object",
        };
        f.debug_struct("Contract")
            .field("source", &source)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl From<ObjectJsonSchema> for Contract<JsonValue> {
    fn from(schema: ObjectJsonSchema) -> Self {
        Self::from_object_schema(schema)
    }
}

impl From<JsonValue> for Contract<JsonValue> {
    fn from(schema: JsonValue) -> Self {
        Self::from_json_schema(schema)
    }
}

fn derived_schema<T: JsonSchema>() -> Result<JsonValue, serde_json::Error> {
    let generator = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    serde_json::to_value(generator.into_root_schema_for::<T>())
}

/// A translated contract: cleaned schema plus compiled validator.
#[derive(Clone)]
pub struct ContractSpec {
    schema: JsonValue,
    validator: Arc<JSONSchema>,
}

impl ContractSpec {
    /// Build a spec from a JSON Schema value.
    pub fn from_schema(mut schema: JsonValue) -> Result<Self, SchemaError> {
        strip_metadata(&mut schema);
        ensure_object_root(&schema)?;
        let validator = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| SchemaError::compile(e.to_string()))?;
        Ok(Self {
            schema,
            validator: Arc::new(validator),
        })
    }

    /// The cleaned schema sent to the model.
    #[must_use]
    pub fn schema(&self) -> &JsonValue {
        &self.schema
    }

    /// Check a value, collecting every field-level error.
    pub fn validate(&self, instance: &JsonValue) -> Result<(), Vec<FieldError>> {
        self.validator.validate(instance).map_err(|errors| {
            errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    let message = e.to_string();
                    FieldError::new(path, e.instance.into_owned(), message)
                })
                .collect()
        })
    }

    /// Whether a value satisfies the contract.
    #[must_use]
    pub fn is_valid(&self, instance: &JsonValue) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate and deserialize.
    ///
    /// A value that passes the schema but still fails to deserialize into
    /// `T` is reported as a validation problem on the root.
    pub fn decode<T: DeserializeOwned>(&self, value: JsonValue) -> Result<T, Problem> {
        if let Err(detail) = self.validate(&value) {
            return Err(Problem::validation(detail, value));
        }
        serde_json::from_value::<T>(value.clone()).map_err(|e| {
            Problem::validation(vec![FieldError::new("", value.clone(), e.to_string())], value)
        })
    }

    /// Offer this contract to the model as a callable function.
    #[must_use]
    pub fn function_definition(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> FunctionDefinition {
        FunctionDefinition::new(name, description, self.schema.clone())
    }
}

impl fmt::Debug for ContractSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractSpec")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ContractSpec {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
    }
}

/// Translate a contract into a [`ContractSpec`].
///
/// The same contract always yields the same spec. Failures are
/// `SchemaBuild` problems.
pub fn translate<T>(contract: &Contract<T>) -> Result<ContractSpec, Problem> {
    let spec = contract
        .raw_schema()
        .and_then(ContractSpec::from_schema)
        .map_err(|e| {
            warn!(error = %e, "Schema translation failed");
            Problem::from(e)
        })?;
    debug!(schema = %spec.schema, "Translated contract");
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindshape_core::ProblemKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;

    #[allow(dead_code)]
    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Method {
        Get,
        Post,
    }

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Request {
        /// Target URL.
        url: String,
        method: Method,
        #[schemars(range(min = 200, max = 599))]
        expected_status: u16,
        note: Option<String>,
    }

    #[test]
    fn test_derived_schema_is_cleaned() {
        let spec = translate(&Contract::<Request>::of()).unwrap();
        let schema = spec.schema();
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["url"]["description"], "Target URL.");
        assert_eq!(schema["properties"]["method"]["enum"], json!(["get", "post"]));
        assert_eq!(schema["properties"]["expected_status"]["minimum"], json!(200.0));
    }

    #[test]
    fn test_property_order_follows_declaration() {
        let spec = translate(&Contract::<Request>::of()).unwrap();
        let keys: Vec<_> = spec.schema()["properties"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["url", "method", "expected_status", "note"]);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let first = translate(&Contract::<Request>::of()).unwrap();
        let second = translate(&Contract::<Request>::of()).unwrap();
        assert_eq!(
            serde_json::to_string(first.schema()).unwrap(),
            serde_json::to_string(second.schema()).unwrap()
        );
    }

    #[test]
    fn test_satisfying_value_round_trips() {
        let contract = Contract::<Request>::of();
        let value = json!({
            "url": "https://example.com",
            "method": "post",
            "expected_status": 200,
            "note": null
        });
        let spec = translate(&contract).unwrap();
        assert!(spec.validate(&value).is_ok());

        let decoded = contract.decode(value).unwrap();
        assert_eq!(decoded.method, Method::Post);
        assert_eq!(decoded.expected_status, 200);
    }

    #[test]
    fn test_field_errors_carry_path_and_value() {
        let spec = translate(&Contract::<Request>::of()).unwrap();
        let value = json!({"url": "x", "method": "delete", "expected_status": 100});
        let errors = spec.validate(&value).unwrap_err();

        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"/method"));
        assert!(paths.contains(&"/expected_status"));
        let status = errors.iter().find(|e| e.path == "/expected_status").unwrap();
        assert_eq!(status.value, json!(100));
    }

    #[test]
    fn test_missing_required_is_root_error() {
        let spec = translate(&Contract::<Request>::of()).unwrap();
        let errors = spec.validate(&json!({"method": "get", "expected_status": 200})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "");
        assert!(errors[0].message.contains("url"));
    }

    #[test]
    fn test_decode_reports_validation_problem() {
        let problem = Contract::<Request>::of()
            .decode(json!({"url": 1, "method": "get", "expected_status": 200}))
            .unwrap_err();
        assert_eq!(problem.kind, ProblemKind::Validation);
        assert_eq!(problem.detail[0].path, "/url");
    }

    #[rstest]
    #[case::string_root(json!({"type": "string"}))]
    #[case::untyped_root(json!({"properties": {}}))]
    #[case::bad_keyword(json!({"type": "object", "properties": {"a": {"type": 12}}}))]
    fn test_schema_build_failures(#[case] schema: JsonValue) {
        let problem = translate(&Contract::<JsonValue>::from_json_schema(schema)).unwrap_err();
        assert_eq!(problem.kind, ProblemKind::SchemaBuild);
    }

    #[test]
    fn test_builder_contract() {
        let schema = crate::SchemaBuilder::new()
            .enum_values("hat", "Hat style", &["fedora", "beanie"], true)
            .build();
        let spec = translate(&Contract::from(schema)).unwrap();
        assert!(spec.is_valid(&json!({"hat": "beanie"})));
        assert!(!spec.is_valid(&json!({"hat": "helmet"})));
        assert!(!spec.is_valid(&json!({})));
    }

    #[test]
    fn test_function_definition() {
        let spec = translate(&Contract::<Request>::of()).unwrap();
        let def = spec.function_definition("structured_response", "Deliver the response");
        assert_eq!(def.name, "structured_response");
        assert_eq!(&def.parameters, spec.schema());
    }
}
