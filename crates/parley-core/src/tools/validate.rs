//! Conservative JSON-schema argument validation.
//!
//! Checks the subset of JSON Schema the tool contracts actually declare:
//! top-level `type: object`, `required` property presence, and primitive
//! `type` tags on declared properties. Undeclared extra arguments pass --
//! the executor's job is to catch calls a tool cannot possibly serve, not
//! to re-implement a full schema validator.

use serde_json::Value;

/// Validate tool-call arguments against a declared input schema.
///
/// Returns the first violation found, phrased for folding into the second
/// reasoning pass (the model sees it and can recover).
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !arguments.is_object() {
        return Err(format!(
            "arguments must be an object, got {}",
            type_name(arguments)
        ));
    }

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if arguments.get(name).is_none() {
                return Err(format!("missing required argument '{name}'"));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            let Some(value) = arguments.get(name) else {
                continue;
            };
            let Some(expected) = property.get("type").and_then(Value::as_str) else {
                continue;
            };
            if !type_matches(expected, value) {
                return Err(format!(
                    "argument '{name}' must be of type {expected}, got {}",
                    type_name(value)
                ));
            }
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type tags are not ours to enforce.
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "days": {"type": "integer"}
            },
            "required": ["city"]
        })
    }

    #[test]
    fn test_valid_arguments_pass() {
        assert!(validate_arguments(&weather_schema(), &json!({"city": "Paris"})).is_ok());
        assert!(
            validate_arguments(&weather_schema(), &json!({"city": "Paris", "days": 3})).is_ok()
        );
    }

    #[test]
    fn test_missing_required_rejected() {
        let err = validate_arguments(&weather_schema(), &json!({"days": 3})).unwrap_err();
        assert_eq!(err, "missing required argument 'city'");
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = validate_arguments(&weather_schema(), &json!({"city": 42})).unwrap_err();
        assert!(err.contains("'city' must be of type string"));

        let err =
            validate_arguments(&weather_schema(), &json!({"city": "Paris", "days": "three"}))
                .unwrap_err();
        assert!(err.contains("'days' must be of type integer"));
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = validate_arguments(&weather_schema(), &json!("Paris")).unwrap_err();
        assert!(err.contains("must be an object"));
    }

    #[test]
    fn test_undeclared_extras_pass() {
        assert!(
            validate_arguments(&weather_schema(), &json!({"city": "Paris", "extra": true}))
                .is_ok()
        );
    }

    #[test]
    fn test_number_accepts_float_but_integer_rejects_it() {
        let schema = json!({
            "type": "object",
            "properties": {
                "amount": {"type": "number"},
                "count": {"type": "integer"}
            }
        });
        assert!(validate_arguments(&schema, &json!({"amount": 1.5})).is_ok());
        let err = validate_arguments(&schema, &json!({"count": 1.5})).unwrap_err();
        assert!(err.contains("'count' must be of type integer"));
    }

    #[test]
    fn test_empty_schema_accepts_anything() {
        assert!(validate_arguments(&json!({}), &json!({"a": 1})).is_ok());
        assert!(validate_arguments(&json!({}), &json!(null)).is_ok());
    }
}
