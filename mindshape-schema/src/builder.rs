//! Manual schema construction.
//!
//! For types that derive [`schemars::JsonSchema`] use
//! [`Contract::of`](crate::Contract::of) instead; these builders cover
//! schemas assembled at runtime.

use serde_json::Value as JsonValue;

use crate::definition::ObjectJsonSchema;
use crate::error::SchemaError;

/// Fluent builder for an object schema.
///
/// # Example
///
/// ```rust
/// use mindshape_schema::{PropertySchema, SchemaBuilder};
///
/// let schema = SchemaBuilder::new()
///     .string("name", "The user's name", true)
///     .property("age", PropertySchema::integer("The user's age").with_minimum(0), false)
///     .enum_values("status", "User status", &["active", "inactive"], true)
///     .description("User information")
///     .build();
///
/// assert_eq!(schema.property_count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    schema: ObjectJsonSchema,
}

impl SchemaBuilder {
    /// Create a new empty schema builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property built with [`PropertySchema`].
    #[must_use]
    pub fn property(mut self, name: &str, property: PropertySchema, required: bool) -> Self {
        self.schema.add_property(name, property.build(), required);
        self
    }

    /// Add a raw JSON property.
    #[must_use]
    pub fn raw(mut self, name: &str, schema: JsonValue, required: bool) -> Self {
        self.schema.add_property(name, schema, required);
        self
    }

    /// Add a string property.
    #[must_use]
    pub fn string(self, name: &str, desc: &str, required: bool) -> Self {
        self.property(name, PropertySchema::string(desc), required)
    }

    /// Add an integer property.
    #[must_use]
    pub fn integer(self, name: &str, desc: &str, required: bool) -> Self {
        self.property(name, PropertySchema::integer(desc), required)
    }

    /// Add a number property.
    #[must_use]
    pub fn number(self, name: &str, desc: &str, required: bool) -> Self {
        self.property(name, PropertySchema::number(desc), required)
    }

    /// Add a boolean property.
    #[must_use]
    pub fn boolean(self, name: &str, desc: &str, required: bool) -> Self {
        self.property(name, PropertySchema::boolean(desc), required)
    }

    /// Add a string enum property.
    #[must_use]
    pub fn enum_values(self, name: &str, desc: &str, values: &[&str], required: bool) -> Self {
        self.property(name, PropertySchema::string(desc).with_enum(values), required)
    }

    /// Add an array property.
    #[must_use]
    pub fn array(self, name: &str, desc: &str, items: JsonValue, required: bool) -> Self {
        self.property(name, PropertySchema::array(desc, items), required)
    }

    /// Add a nested object property.
    pub fn object(
        mut self,
        name: &str,
        desc: &str,
        schema: ObjectJsonSchema,
        required: bool,
    ) -> Result<Self, SchemaError> {
        let nested = schema.with_description(desc).to_json()?;
        self.schema.add_property(name, nested, required);
        Ok(self)
    }

    /// Set the schema description.
    #[must_use]
    pub fn description(mut self, desc: &str) -> Self {
        self.schema.description = Some(desc.to_string());
        self
    }

    /// Reject properties that are not declared.
    #[must_use]
    pub fn deny_additional(mut self) -> Self {
        self.schema.additional_properties = Some(false);
        self
    }

    /// Build the object schema.
    #[must_use]
    pub fn build(self) -> ObjectJsonSchema {
        self.schema
    }
}

/// Builder for a single property schema.
#[derive(Debug, Clone, Default)]
pub struct PropertySchema {
    schema_type: String,
    description: Option<String>,
    enum_values: Option<Vec<String>>,
    format: Option<String>,
    minimum: Option<JsonValue>,
    maximum: Option<JsonValue>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    items: Option<Box<JsonValue>>,
    nullable: bool,
}

impl PropertySchema {
    fn typed(schema_type: &str, description: impl Into<String>) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Create a string property schema.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    /// Create an integer property schema.
    #[must_use]
    pub fn integer(description: impl Into<String>) -> Self {
        Self::typed("integer", description)
    }

    /// Create a number property schema.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self::typed("number", description)
    }

    /// Create a boolean property schema.
    #[must_use]
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::typed("boolean", description)
    }

    /// Create an array property schema.
    #[must_use]
    pub fn array(description: impl Into<String>, items: JsonValue) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array", description)
        }
    }

    /// Restrict a string to the given values.
    #[must_use]
    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set a string format (`email`, `date-time`, `uri`, ...).
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the inclusive minimum.
    #[must_use]
    pub fn with_minimum(mut self, min: impl Into<JsonValue>) -> Self {
        self.minimum = Some(min.into());
        self
    }

    /// Set the inclusive maximum.
    #[must_use]
    pub fn with_maximum(mut self, max: impl Into<JsonValue>) -> Self {
        self.maximum = Some(max.into());
        self
    }

    /// Set minimum string length.
    #[must_use]
    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Set maximum string length.
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Set a regex pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Also accept `null`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Build the property schema as a JSON value.
    #[must_use]
    pub fn build(self) -> JsonValue {
        let schema_type = if self.nullable {
            serde_json::json!([self.schema_type, "null"])
        } else {
            JsonValue::String(self.schema_type)
        };
        let mut obj = serde_json::json!({ "type": schema_type });

        if let Some(desc) = self.description {
            obj["description"] = JsonValue::String(desc);
        }
        if let Some(values) = self.enum_values {
            obj["enum"] = JsonValue::Array(values.into_iter().map(JsonValue::String).collect());
        }
        if let Some(format) = self.format {
            obj["format"] = JsonValue::String(format);
        }
        if let Some(min) = self.minimum {
            obj["minimum"] = min;
        }
        if let Some(max) = self.maximum {
            obj["maximum"] = max;
        }
        if let Some(min) = self.min_length {
            obj["minLength"] = JsonValue::from(min);
        }
        if let Some(max) = self.max_length {
            obj["maxLength"] = JsonValue::from(max);
        }
        if let Some(pat) = self.pattern {
            obj["pattern"] = JsonValue::String(pat);
        }
        if let Some(items) = self.items {
            obj["items"] = *items;
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{translate, Contract};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_schema_builder() {
        let schema = SchemaBuilder::new()
            .string("name", "The name", true)
            .integer("age", "The age", false)
            .description("A person")
            .build();

        assert_eq!(schema.schema_type, "object");
        assert_eq!(schema.property_count(), 2);
        assert!(schema.is_required("name"));
        assert!(!schema.is_required("age"));
        assert_eq!(schema.description.as_deref(), Some("A person"));
    }

    #[test]
    fn test_property_constraints() {
        let prop = PropertySchema::integer("Status code")
            .with_minimum(200)
            .with_maximum(599)
            .build();
        assert_eq!(
            prop,
            json!({"type": "integer", "description": "Status code", "minimum": 200, "maximum": 599})
        );

        let email = PropertySchema::string("Email").with_format("email").build();
        assert_eq!(email["format"], "email");
    }

    #[test]
    fn test_nullable_property() {
        let prop = PropertySchema::string("Nickname").nullable().build();
        assert_eq!(prop["type"], json!(["string", "null"]));
    }

    fn accepts(schema: ObjectJsonSchema, instance: JsonValue) -> bool {
        translate(&Contract::from(schema)).unwrap().is_valid(&instance)
    }

    #[test]
    fn test_nested_object() {
        let address = SchemaBuilder::new()
            .string("street", "Street name", true)
            .build();
        let schema = SchemaBuilder::new()
            .object("address", "Postal address", address, true)
            .unwrap()
            .deny_additional()
            .build();

        assert_eq!(
            schema.get_property("address").unwrap(),
            &json!({
                "type": "object",
                "properties": {"street": {"type": "string", "description": "Street name"}},
                "required": ["street"],
                "description": "Postal address"
            })
        );
        assert!(accepts(schema.clone(), json!({"address": {"street": "Main"}})));
        assert!(!accepts(schema.clone(), json!({"address": {}})));
        assert!(!accepts(schema, json!({"address": {"street": 5}})));
    }

    #[test]
    fn test_boolean_property() {
        let schema = SchemaBuilder::new().boolean("active", "Is active", true).build();

        assert_eq!(
            schema.get_property("active").unwrap(),
            &json!({"type": "boolean", "description": "Is active"})
        );
        assert!(accepts(schema.clone(), json!({"active": false})));
        assert!(!accepts(schema, json!({"active": "yes"})));
    }

    #[test]
    fn test_array_property() {
        let schema = SchemaBuilder::new()
            .array("tags", "Tags", json!({"type": "string"}), true)
            .build();

        assert_eq!(
            schema.get_property("tags").unwrap(),
            &json!({"type": "array", "description": "Tags", "items": {"type": "string"}})
        );
        assert!(accepts(schema.clone(), json!({"tags": ["a", "b"]})));
        assert!(accepts(schema.clone(), json!({"tags": []})));
        assert!(!accepts(schema.clone(), json!({"tags": ["a", 1]})));
        assert!(!accepts(schema, json!({"tags": "a"})));
    }

    #[test]
    fn test_raw_property() {
        let schema = SchemaBuilder::new()
            .raw("score", json!({"type": "number", "multipleOf": 0.5}), false)
            .build();

        assert_eq!(
            schema.get_property("score").unwrap(),
            &json!({"type": "number", "multipleOf": 0.5})
        );
        assert!(!schema.is_required("score"));
        assert!(accepts(schema.clone(), json!({})));
        assert!(accepts(schema.clone(), json!({"score": 2.5})));
        assert!(!accepts(schema, json!({"score": 2.2})));
    }

    #[test]
    fn test_deny_additional() {
        let open = SchemaBuilder::new().string("name", "Name", true).build();
        let closed = SchemaBuilder::new()
            .string("name", "Name", true)
            .deny_additional()
            .build();

        assert_eq!(
            closed.to_json().unwrap()["additionalProperties"],
            json!(false)
        );
        assert!(open.to_json().unwrap().get("additionalProperties").is_none());
        assert!(accepts(open, json!({"name": "a", "extra": 1})));
        assert!(accepts(closed.clone(), json!({"name": "a"})));
        assert!(!accepts(closed, json!({"name": "a", "extra": 1})));
    }

    #[test]
    fn test_pattern_and_length() {
        let sku = PropertySchema::string("SKU")
            .with_pattern("^[A-Z]{3}-[0-9]+$")
            .with_min_length(5)
            .with_max_length(8);
        assert_eq!(
            sku.clone().build(),
            json!({
                "type": "string",
                "description": "SKU",
                "minLength": 5,
                "maxLength": 8,
                "pattern": "^[A-Z]{3}-[0-9]+$"
            })
        );

        let schema = SchemaBuilder::new().property("sku", sku, true).build();
        assert!(accepts(schema.clone(), json!({"sku": "ABC-12"})));
        assert!(!accepts(schema.clone(), json!({"sku": "abc-12"})));
        assert!(!accepts(schema.clone(), json!({"sku": "AB-1"})));
        assert!(!accepts(schema, json!({"sku": "ABC-123456"})));
    }

    #[test]
    fn test_nullable_accepts_null() {
        let schema = SchemaBuilder::new()
            .property("nickname", PropertySchema::string("Nickname").nullable(), true)
            .build();

        assert!(accepts(schema.clone(), json!({"nickname": null})));
        assert!(accepts(schema.clone(), json!({"nickname": "Bo"})));
        assert!(!accepts(schema, json!({"nickname": 3})));
    }
}
