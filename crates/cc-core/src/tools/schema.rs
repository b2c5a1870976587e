//! Minimal JSON-Schema-subset validation for tool parameters.
//!
//! Only what §4.10 needs: `type: object` with a `required` field list. Tools
//! that need richer constraints validate further inside their own handler.

/// Validate `params` against `schema`. An empty or absent schema (`{}` or
/// `null`) always passes.
pub fn validate_against_schema(params: &serde_json::Value, schema: &serde_json::Value) -> Result<(), String> {
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };
    if schema_obj.is_empty() {
        return Ok(());
    }

    if let Some(expected_type) = schema_obj.get("type").and_then(|v| v.as_str()) {
        if expected_type == "object" && !params.is_object() {
            return Err("expected params to be an object".to_string());
        }
    }

    if let Some(required) = schema_obj.get("required").and_then(|v| v.as_array()) {
        let params_obj = params.as_object().ok_or("expected params to be an object")?;
        for field in required {
            let Some(field_name) = field.as_str() else { continue };
            if !params_obj.contains_key(field_name) {
                return Err(format!("missing required field: {field_name}"));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_schema_always_passes() {
        assert!(validate_against_schema(&serde_json::json!({}), &serde_json::json!({})).is_ok());
    }

    #[test]
    fn missing_required_field_fails() {
        let schema = serde_json::json!({ "type": "object", "required": ["to", "body"] });
        let result = validate_against_schema(&serde_json::json!({ "to": "x" }), &schema);
        assert!(result.is_err());
    }

    #[test]
    fn present_required_fields_pass() {
        let schema = serde_json::json!({ "type": "object", "required": ["to", "body"] });
        let result = validate_against_schema(&serde_json::json!({ "to": "x", "body": "y" }), &schema);
        assert!(result.is_ok());
    }
}
