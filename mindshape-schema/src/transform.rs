//! Cleanup applied to every schema before it becomes a contract.

use serde_json::Value as JsonValue;

use crate::error::SchemaError;

/// Root keywords that providers reject or ignore.
pub const STRIPPED_KEYWORDS: &[&str] = &["$schema", "$id"];

/// Remove provider-incompatible metadata from the schema root.
///
/// Drops the meta-schema marker and self id, plus `definitions` / `$defs`
/// when they are empty.
pub fn strip_metadata(schema: &mut JsonValue) {
    let Some(obj) = schema.as_object_mut() else {
        return;
    };
    for keyword in STRIPPED_KEYWORDS {
        obj.remove(*keyword);
    }
    for key in ["definitions", "$defs"] {
        let empty = obj
            .get(key)
            .and_then(JsonValue::as_object)
            .is_some_and(|defs| defs.is_empty());
        if empty {
            obj.remove(key);
        }
    }
}

/// Check that the root describes an object.
pub fn ensure_object_root(schema: &JsonValue) -> Result<(), SchemaError> {
    match schema.get("type") {
        Some(JsonValue::String(t)) if t == "object" => Ok(()),
        Some(other) => Err(SchemaError::NotAnObject {
            found: other.to_string(),
        }),
        None => Err(SchemaError::NotAnObject {
            found: "a schema without a type".to_string(),
        }),
    }
}
