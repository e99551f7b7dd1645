//! The consensus evaluator boundary.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::providers::ProviderError;

/// Errors raised by a consensus evaluator.
#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error(
        "Evaluators diverged: {agreeing} of {validators} validators matched leader outcome {leader_outcome}, {required} required"
    )]
    Divergence {
        leader_outcome: String,
        agreeing: usize,
        validators: usize,
        required: usize,
    },

    #[error("Evaluation run failed: {0}")]
    Execution(String),

    #[error("Evaluation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ProviderError> for ConsensusError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(after) => ConsensusError::Timeout(after),
            other => ConsensusError::Execution(other.to_string()),
        }
    }
}

/// Produces an agreed-upon moderation response for a post and a guideline.
///
/// # Contract
/// - Runs a nondeterministic judgment several times internally
/// - Returns a response only when the runs agree: `outcome` must match
///   exactly, `reasoning` may differ in wording
/// - Fails with [`ConsensusError::Divergence`] instead of returning an
///   unreliable answer
/// - Any retry or timeout policy lives inside the implementation; callers
///   never retry
///
/// The returned value is untyped. Callers must verify it before trusting it.
#[async_trait]
pub trait ConsensusEvaluator: Send + Sync {
    async fn evaluate(&self, content: &str, guideline_text: &str) -> Result<Value, ConsensusError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "consensus-evaluator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_timeout_maps_to_timeout() {
        let err = ConsensusError::from(ProviderError::Timeout(Duration::from_secs(3)));
        assert!(matches!(err, ConsensusError::Timeout(d) if d == Duration::from_secs(3)));

        let err = ConsensusError::from(ProviderError::AuthError);
        assert!(matches!(err, ConsensusError::Execution(_)));
    }

    #[test]
    fn test_divergence_message() {
        let err = ConsensusError::Divergence {
            leader_outcome: "remove".to_string(),
            agreeing: 1,
            validators: 2,
            required: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("remove"));
        assert!(msg.contains("1 of 2"));
    }
}
