//! Verification of evaluator responses.
//!
//! Evaluators return untyped JSON. Nothing is written to the ledger until the
//! response has been turned into a [`Verdict`]:
//! 1. Shape check against the embedded schema
//! 2. Outcome must be exactly `keep`, `limit` or `remove`
//! 3. Missing reasoning becomes an empty string

mod extract;
mod schema;

pub use extract::extract_json_object;
pub use schema::validate_verdict_shape;

use serde_json::Value;

use crate::types::Outcome;
use crate::ModerationError;

/// A verified evaluator response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    pub reasoning: String,
}

impl Verdict {
    /// Verify a raw evaluator response.
    pub fn from_value(response: &Value) -> Result<Self, ModerationError> {
        validate_verdict_shape(response).map_err(|errors| {
            ModerationError::Evaluation(format!(
                "Malformed moderation response: {}",
                errors.join("; ")
            ))
        })?;

        let raw_outcome = response
            .get("outcome")
            .and_then(Value::as_str)
            .ok_or_else(|| ModerationError::Evaluation("Missing moderation outcome".to_string()))?;

        let outcome = raw_outcome.parse::<Outcome>().map_err(|_| {
            ModerationError::Evaluation(format!(
                "Invalid moderation outcome from AI: '{}'",
                raw_outcome
            ))
        })?;

        let reasoning = response
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self { outcome, reasoning })
    }

    /// Parse and verify a textual completion.
    pub fn from_text(text: &str) -> Result<Self, ModerationError> {
        Self::from_value(&parse_response_text(text)?)
    }
}

/// Parse the JSON object carried by an LLM completion.
pub fn parse_response_text(text: &str) -> Result<Value, ModerationError> {
    let json = extract_json_object(text).ok_or_else(|| {
        ModerationError::Evaluation("Moderation response contains no JSON object".to_string())
    })?;

    serde_json::from_str(json).map_err(|e| {
        ModerationError::Evaluation(format!("Moderation response is not valid JSON: {}", e))
    })
}
