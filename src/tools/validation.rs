//! Validate tool schemas at registration and arguments before execution.

/// Validate tool arguments against a JSON Schema.
///
/// Performs top-level validation: schema type check, required field presence,
/// property type verification and string enum membership. Returns `Ok(())`
/// when valid, `Err(message)` describing the first violation found.
pub fn validate_arguments(
    args: &serde_json::Value,
    schema: &serde_json::Value,
) -> Result<(), String> {
    if let Some(schema_type) = schema.get("type").and_then(|v| v.as_str()) {
        if schema_type == "object" && !args.is_object() {
            return Err(format!(
                "expected object arguments, got {}",
                json_type_name(args)
            ));
        }
    }

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        let obj = match args.as_object() {
            Some(obj) => obj,
            None => return Ok(()),
        };
        for field in required {
            if let Some(name) = field.as_str() {
                if !obj.contains_key(name) {
                    return Err(format!("missing required field '{name}'"));
                }
            }
        }
    }

    if let (Some(properties), Some(obj)) = (
        schema.get("properties").and_then(|v| v.as_object()),
        args.as_object(),
    ) {
        for (key, value) in obj {
            let Some(prop_schema) = properties.get(key) else {
                continue;
            };
            if let Some(expected_type) = prop_schema.get("type").and_then(|v| v.as_str()) {
                if !value_matches_type(value, expected_type) {
                    return Err(format!(
                        "field '{}' expected type '{}', got {}",
                        key,
                        expected_type,
                        json_type_name(value)
                    ));
                }
            }
            if let Some(allowed) = prop_schema.get("enum").and_then(|v| v.as_array()) {
                if !allowed.contains(value) {
                    return Err(format!("field '{key}' must be one of {}", render_enum(allowed)));
                }
            }
        }
    }

    Ok(())
}

/// Check that a parameter schema is a well-formed object schema.
///
/// Every required name must be a declared property, and enum lists must be
/// non-empty arrays of strings.
pub fn validate_schema(schema: &serde_json::Value) -> Result<(), String> {
    if schema.get("type").and_then(|v| v.as_str()) != Some("object") {
        return Err("parameter schema must have type 'object'".to_string());
    }
    let properties = match schema.get("properties") {
        None => return Ok(()),
        Some(value) => value
            .as_object()
            .ok_or_else(|| "'properties' must be an object".to_string())?,
    };

    for (name, prop) in properties {
        if !prop.is_object() {
            return Err(format!("property '{name}' must be a schema object"));
        }
        if let Some(values) = prop.get("enum") {
            let values = values
                .as_array()
                .ok_or_else(|| format!("enum of '{name}' must be an array"))?;
            if values.is_empty() || !values.iter().all(|v| v.is_string()) {
                return Err(format!("enum of '{name}' must list at least one string"));
            }
        }
    }

    if let Some(required) = schema.get("required") {
        let required = required
            .as_array()
            .ok_or_else(|| "'required' must be an array".to_string())?;
        for field in required {
            let name = field
                .as_str()
                .ok_or_else(|| "'required' entries must be strings".to_string())?;
            if !properties.contains_key(name) {
                return Err(format!("required field '{name}' is not a declared property"));
            }
        }
    }

    Ok(())
}

fn render_enum(values: &[serde_json::Value]) -> String {
    values
        .iter()
        .filter_map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
