//! The moderation workflow: Validate -> Evaluate -> Verify -> Commit.
//!
//! Each stage consumes the output of the previous one. Commit is the only
//! stage that writes, so a failure anywhere earlier leaves the stores exactly
//! as they were. The state lock is never held across the Evaluate await.

use parking_lot::RwLock;
use serde_json::Value;
use tracing::Instrument;

use verdict_core::{Identity, ModerationError, ModerationResult, ModerationState, Verdict};

use crate::evaluator::ConsensusEvaluator;

/// A request to moderate one post against one guideline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationRequest {
    pub post_id: String,
    pub post_content: String,
    pub guideline_id: String,
}

impl ModerationRequest {
    pub fn new(
        post_id: impl Into<String>,
        post_content: impl Into<String>,
        guideline_id: impl Into<String>,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            post_content: post_content.into(),
            guideline_id: guideline_id.into(),
        }
    }
}

/// Output of Validate: the request plus the guideline text it refers to.
#[derive(Debug)]
struct Validated {
    request: ModerationRequest,
    guideline_text: String,
}

/// Output of Evaluate: the raw, untrusted evaluator response.
#[derive(Debug)]
struct Evaluated {
    request: ModerationRequest,
    response: Value,
}

/// Output of Verify: a typed verdict ready to be committed.
#[derive(Debug)]
struct Verified {
    request: ModerationRequest,
    verdict: Verdict,
}

/// Runs one moderation call against shared contract state.
pub struct ModerationWorkflow<'a> {
    state: &'a RwLock<ModerationState>,
    evaluator: &'a dyn ConsensusEvaluator,
}

impl<'a> ModerationWorkflow<'a> {
    pub fn new(state: &'a RwLock<ModerationState>, evaluator: &'a dyn ConsensusEvaluator) -> Self {
        Self { state, evaluator }
    }

    /// Run every stage and return the committed result.
    pub async fn run(
        &self,
        caller: &Identity,
        request: ModerationRequest,
    ) -> Result<ModerationResult, ModerationError> {
        let span = tracing::info_span!(
            "moderate",
            post_id = %request.post_id,
            guideline_id = %request.guideline_id
        );

        async move {
            let validated = self.validate(request)?;
            let evaluated = self.evaluate(validated).await?;
            let verified = verify(evaluated)?;
            Ok(self.commit(caller, verified))
        }
        .instrument(span)
        .await
    }

    /// Guideline must exist, then post id and content must be non-blank.
    fn validate(&self, request: ModerationRequest) -> Result<Validated, ModerationError> {
        let guideline_text = {
            let state = self.state.read();
            state
                .guidelines
                .get(&request.guideline_id)
                .map(|guideline| guideline.text.clone())
        }
        .ok_or_else(|| ModerationError::NotFound(request.guideline_id.clone()))?;

        verdict_core::validation::require_non_blank(
            &[request.post_id.as_str(), request.post_content.as_str()],
            "Post ID and content cannot be empty",
        )?;

        tracing::debug!(post_id = %request.post_id, "Moderation request validated");
        Ok(Validated {
            request,
            guideline_text,
        })
    }

    /// The only suspension point. Boundary failures keep their message.
    async fn evaluate(&self, validated: Validated) -> Result<Evaluated, ModerationError> {
        let Validated {
            request,
            guideline_text,
        } = validated;

        let response = self
            .evaluator
            .evaluate(&request.post_content, &guideline_text)
            .await
            .map_err(|e| {
                tracing::warn!(
                    post_id = %request.post_id,
                    evaluator = self.evaluator.name(),
                    error = %e,
                    "Evaluator failed"
                );
                ModerationError::Evaluation(e.to_string())
            })?;

        Ok(Evaluated { request, response })
    }

    fn commit(&self, caller: &Identity, verified: Verified) -> ModerationResult {
        let Verified { request, verdict } = verified;

        let result = ModerationResult {
            post_id: request.post_id,
            guideline_id: request.guideline_id,
            post_content: request.post_content,
            outcome: verdict.outcome,
            reasoning: verdict.reasoning,
            moderator_address: caller.clone(),
        };

        self.state
            .write()
            .results
            .upsert(&result.post_id, &result.guideline_id, result.clone());

        tracing::info!(
            post_id = %result.post_id,
            guideline_id = %result.guideline_id,
            outcome = %result.outcome,
            moderator = %result.moderator_address,
            "Moderation committed"
        );
        result
    }
}

/// Outcome must be one of keep, limit or remove.
fn verify(evaluated: Evaluated) -> Result<Verified, ModerationError> {
    let Evaluated { request, response } = evaluated;

    let verdict = Verdict::from_value(&response).inspect_err(|e| {
        tracing::warn!(post_id = %request.post_id, error = %e, "Evaluator response rejected");
    })?;

    Ok(Verified { request, verdict })
}
