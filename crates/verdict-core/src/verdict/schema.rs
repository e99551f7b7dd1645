//! JSON Schema validation for raw evaluator responses.
//!
//! The schema only fixes the response shape. Outcome membership is checked
//! separately so the error can name the offending value.

use std::sync::OnceLock;

const VERDICT_SCHEMA_JSON: &str = include_str!("../../schema/verdict.schema.json");

static VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn validator() -> Result<&'static jsonschema::Validator, String> {
    VALIDATOR
        .get_or_init(|| {
            serde_json::from_str::<serde_json::Value>(VERDICT_SCHEMA_JSON)
                .map_err(|e| format!("verdict schema is not JSON: {e}"))
                .and_then(|schema| {
                    jsonschema::options()
                        .build(&schema)
                        .map_err(|e| format!("verdict schema does not compile: {e}"))
                })
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a raw evaluator response against the verdict schema.
///
/// Returns the list of violations when the shape is wrong.
pub fn validate_verdict_shape(response: &serde_json::Value) -> Result<(), Vec<String>> {
    let compiled = validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = compiled
        .iter_errors(response)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{} at {}", e, path)
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_shapes_pass() {
        assert!(validate_verdict_shape(&json!({"outcome": "keep", "reasoning": "fine"})).is_ok());
        assert!(validate_verdict_shape(&json!({"outcome": "remove"})).is_ok());
        assert!(validate_verdict_shape(&json!({"outcome": "limit", "confidence": 0.4})).is_ok());
    }

    #[test]
    fn test_missing_outcome_fails() {
        let errors = validate_verdict_shape(&json!({"reasoning": "no outcome"})).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_wrong_types_fail() {
        assert!(validate_verdict_shape(&json!({"outcome": 3})).is_err());
        assert!(validate_verdict_shape(&json!({"outcome": "keep", "reasoning": ["a"]})).is_err());
        assert!(validate_verdict_shape(&json!(["keep"])).is_err());
        assert!(validate_verdict_shape(&json!("keep")).is_err());
    }
}
