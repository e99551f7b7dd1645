//! The content moderation contract.
//!
//! [`ContentModeration`] owns the guideline store and the moderation ledger.
//! Writes go through [`add_guideline`](ContentModeration::add_guideline) and
//! [`moderate_content`](ContentModeration::moderate_content); every reader
//! returns an owned copy, so callers never observe a half-applied write.

use parking_lot::RwLock;
use std::sync::Arc;

use verdict_core::{
    AllResults, Guideline, GuidelineMap, Identity, LedgerSnapshot, ModerationError,
    ModerationResult, ModerationState, PageResult, PostResults,
};

use crate::evaluator::ConsensusEvaluator;
use crate::workflow::{ModerationRequest, ModerationWorkflow};
use crate::RuntimeError;

/// Guideline registry plus verdict ledger, judged by an injected evaluator.
pub struct ContentModeration {
    state: RwLock<ModerationState>,
    evaluator: Arc<dyn ConsensusEvaluator>,
}

impl ContentModeration {
    /// Create an empty contract.
    pub fn new(evaluator: Arc<dyn ConsensusEvaluator>) -> Self {
        Self::with_state(ModerationState::new(), evaluator)
    }

    /// Create a contract over existing state, e.g. a restored snapshot.
    pub fn with_state(state: ModerationState, evaluator: Arc<dyn ConsensusEvaluator>) -> Self {
        Self {
            state: RwLock::new(state),
            evaluator,
        }
    }

    pub fn builder() -> ContentModerationBuilder {
        ContentModerationBuilder::new()
    }

    /// Register a new guideline. Ids are write-once.
    pub fn add_guideline(
        &self,
        caller: &Identity,
        guideline_id: &str,
        text: &str,
    ) -> Result<(), ModerationError> {
        self.state
            .write()
            .guidelines
            .add(guideline_id, text, caller.clone())
            .inspect_err(|e| {
                tracing::debug!(guideline_id, error = %e, "Guideline rejected");
            })?;

        tracing::info!(guideline_id, creator = %caller, "Guideline added");
        Ok(())
    }

    /// Judge a post against a guideline and record the verdict.
    ///
    /// A later call for the same `(post_id, guideline_id)` replaces the
    /// earlier result. Any failure leaves the ledger untouched.
    pub async fn moderate_content(
        &self,
        caller: &Identity,
        post_id: &str,
        post_content: &str,
        guideline_id: &str,
    ) -> Result<(), ModerationError> {
        let workflow = ModerationWorkflow::new(&self.state, self.evaluator.as_ref());
        workflow
            .run(
                caller,
                ModerationRequest::new(post_id, post_content, guideline_id),
            )
            .await?;
        Ok(())
    }

    pub fn get_all_guidelines(&self) -> GuidelineMap {
        self.state.read().guidelines.list_all()
    }

    pub fn get_guideline(&self, guideline_id: &str) -> Option<Guideline> {
        self.state.read().guidelines.get(guideline_id).cloned()
    }

    pub fn get_moderation_result(
        &self,
        post_id: &str,
        guideline_id: &str,
    ) -> Option<ModerationResult> {
        self.state.read().results.get(post_id, guideline_id).cloned()
    }

    /// Every result for one post, keyed by guideline id. Empty if none.
    pub fn get_post_moderation_results(&self, post_id: &str) -> PostResults {
        self.state.read().results.get_for_post(post_id)
    }

    pub fn get_all_moderation_results(&self) -> AllResults {
        self.state.read().results.get_all()
    }

    /// One page of results, newest first. Pages are 1-based.
    pub fn get_moderation_results_paginated(&self, page: i64, per_page: i64) -> PageResult {
        self.state.read().results.paginate(page, per_page)
    }

    /// Point-in-time copy of both stores.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.state.read())
    }
}

/// Builder for [`ContentModeration`].
pub struct ContentModerationBuilder {
    evaluator: Option<Arc<dyn ConsensusEvaluator>>,
    state: ModerationState,
}

impl ContentModerationBuilder {
    pub fn new() -> Self {
        Self {
            evaluator: None,
            state: ModerationState::new(),
        }
    }

    /// Set the consensus evaluator.
    pub fn evaluator(mut self, evaluator: Arc<dyn ConsensusEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Start from existing state instead of empty stores.
    pub fn state(mut self, state: ModerationState) -> Self {
        self.state = state;
        self
    }

    pub fn build(self) -> Result<ContentModeration, RuntimeError> {
        let evaluator = self.evaluator.ok_or(RuntimeError::EvaluatorNotConfigured)?;
        Ok(ContentModeration::with_state(self.state, evaluator))
    }
}

impl Default for ContentModerationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
