//! Comparative consensus over repeated LLM evaluations.
//!
//! One evaluation is the leader; the remaining runs are validators that
//! check whether they reach the same outcome. Runs execute concurrently.
//!
//! # Equivalence
//! Two runs agree when their raw `outcome` values are identical. The
//! `reasoning` text is never compared. The outcome is compared raw, before
//! verification, so an agreed but invalid outcome is still rejected later
//! by the workflow.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

use verdict_core::verdict::parse_response_text;

use crate::config::ConsensusConfig;
use crate::evaluator::{ConsensusError, ConsensusEvaluator};
use crate::prompts::{moderation_request, MODERATION_SYSTEM_PROMPT, OUTCOME_EQUIVALENCE_PRINCIPLE};
use crate::providers::{ChatMessage, LlmProvider, ProviderError};
use crate::RuntimeError;

/// LLM-backed [`ConsensusEvaluator`] using the outcome equivalence principle.
pub struct ComparativeConsensus {
    provider: Arc<dyn LlmProvider>,
    config: ConsensusConfig,
}

impl ComparativeConsensus {
    /// Create an evaluator; the configuration is validated up front.
    pub fn new(provider: Arc<dyn LlmProvider>, config: ConsensusConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    /// The principle runs are compared under.
    pub fn principle(&self) -> &'static str {
        OUTCOME_EQUIVALENCE_PRINCIPLE
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// One evaluation run, with retries for transient provider errors.
    async fn run_once(&self, run: usize, request: &str) -> Result<Value, ConsensusError> {
        let messages = vec![
            ChatMessage::system(MODERATION_SYSTEM_PROMPT),
            ChatMessage::user(request),
        ];

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.retry_min_delay)
            .with_max_times(self.config.max_retries);

        let attempt = || async {
            self.provider
                .complete(messages.clone(), &self.config.completion)
                .await
        };

        let completion = tokio::time::timeout(
            self.config.run_timeout,
            attempt
                .retry(backoff)
                .when(ProviderError::is_transient)
                .notify(|err: &ProviderError, delay| {
                    tracing::warn!(run, error = %err, delay = ?delay, "Retrying evaluation run");
                }),
        )
        .await
        .map_err(|_| ConsensusError::Timeout(self.config.run_timeout))??;

        tracing::debug!(
            run,
            provider = self.provider.name(),
            model = %completion.model,
            tokens = completion.usage.total(),
            "Evaluation run completed"
        );

        parse_response_text(&completion.content)
            .map_err(|e| ConsensusError::Execution(format!("run {}: {}", run, e)))
    }
}

#[async_trait]
impl ConsensusEvaluator for ComparativeConsensus {
    async fn evaluate(&self, content: &str, guideline_text: &str) -> Result<Value, ConsensusError> {
        let request = moderation_request(content, guideline_text);

        let mut runs = join_all((0..self.config.runs).map(|run| self.run_once(run, &request)))
            .await
            .into_iter();

        let leader = runs
            .next()
            .ok_or_else(|| ConsensusError::Execution("no evaluation runs configured".to_string()))??;

        let mut agreeing = 0;
        for (index, validator) in runs.enumerate() {
            match validator {
                Ok(response) if outcomes_equivalent(&leader, &response) => agreeing += 1,
                Ok(response) => {
                    tracing::info!(
                        run = index + 1,
                        leader = %outcome_label(&leader),
                        validator = %outcome_label(&response),
                        "Validator disagreed with leader"
                    );
                }
                Err(e) => {
                    tracing::warn!(run = index + 1, error = %e, "Validator run failed");
                }
            }
        }

        let validators = self.config.validators();
        let required = self.config.required_agreement();
        if agreeing < required {
            return Err(ConsensusError::Divergence {
                leader_outcome: outcome_label(&leader),
                agreeing,
                validators,
                required,
            });
        }

        tracing::info!(
            outcome = %outcome_label(&leader),
            agreeing,
            validators,
            "Consensus reached"
        );
        Ok(leader)
    }

    fn name(&self) -> &str {
        "comparative-consensus"
    }
}

/// Runs agree when both carry the same raw `outcome`.
fn outcomes_equivalent(leader: &Value, validator: &Value) -> bool {
    match (leader.get("outcome"), validator.get("outcome")) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn outcome_label(response: &Value) -> String {
    match response.get("outcome") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<missing>".to_string(),
    }
}
