//! Payload validation against generated variants.
//!
//! A variant doubles as the description of an API payload: required fields
//! must be present and non-null, optional fields may be missing or null.

use serde_json::{json, Map, Value};

use crate::error::{SchemaError, ValidateError};
use crate::types::{Requiredness, TypeRef, VariantSchema};

/// Render a variant as a JSON Schema.
///
/// When `strict` is true, sets `additionalProperties: false` so that fields
/// outside the variant are rejected.
pub fn variant_json_schema(variant: &VariantSchema, strict: bool) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &variant.fields {
        properties.insert(field.name.clone(), type_schema(&field.ty));
        if field.requiredness == Requiredness::Required {
            required.push(Value::String(field.name.clone()));
        }
    }

    let mut schema = json!({
        "title": variant.name,
        "type": "object",
        "properties": properties,
        "required": required,
    });
    if strict {
        schema["additionalProperties"] = Value::Bool(false);
    }
    schema
}

/// Validate a payload against a variant.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` listing every violation, or
/// `ValidateError::InvalidSchema` if the rendered schema is rejected.
pub fn validate(payload: &Value, variant: &VariantSchema, strict: bool) -> Result<(), ValidateError> {
    let schema = variant_json_schema(variant, strict);
    validate_against_schema(&schema, payload)
}

/// Validate a payload against an already-rendered schema.
///
/// Use this when validating many payloads against one variant.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

/// JSON Schema for a resolved type. Unknown types are unconstrained.
fn type_schema(ty: &TypeRef) -> Value {
    let mut schema = match json_type(ty.simple_name()) {
        Some("array") => {
            let mut schema = json!({ "type": "array" });
            if let Some(item) = ty.args.first() {
                schema["items"] = type_schema(item);
            }
            schema
        }
        Some("object") => {
            let mut schema = json!({ "type": "object" });
            // Map<K, V>: keys are always strings in JSON, constrain values only
            if let Some(value) = ty.args.last() {
                schema["additionalProperties"] = type_schema(value);
            }
            schema
        }
        Some(name) => json!({ "type": name }),
        None => json!({}),
    };

    if ty.nullable {
        if let Some(Value::String(name)) = schema.get("type").cloned() {
            schema["type"] = json!([name, "null"]);
        }
    }
    schema
}

fn json_type(simple_name: &str) -> Option<&'static str> {
    match simple_name {
        "String" | "Char" | "CharSequence" | "UUID" => Some("string"),
        "Int" | "Long" | "Short" | "Byte" | "BigInteger" | "int" | "long" | "short" | "byte" => {
            Some("integer")
        }
        "Double" | "Float" | "Number" | "BigDecimal" | "double" | "float" => Some("number"),
        "Boolean" | "boolean" => Some("boolean"),
        "List" | "Set" | "Collection" | "Iterable" | "Array" => Some("array"),
        "Map" => Some("object"),
        _ => None,
    }
}
