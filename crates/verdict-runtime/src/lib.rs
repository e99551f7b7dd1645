//! # verdict-runtime
//!
//! The async side of the verdict ledger.
//!
//! `verdict-core` owns the stores and every deterministic rule. This crate
//! adds the part that cannot be deterministic: a consensus evaluator that
//! asks an LLM for a moderation outcome several times and only answers when
//! the runs agree.
//!
//! ## Layout
//!
//! - [`contract`]: [`ContentModeration`], the public surface
//! - [`workflow`]: one moderation call, Validate -> Evaluate -> Verify -> Commit
//! - [`evaluator`]: the [`ConsensusEvaluator`] boundary
//! - [`consensus`]: [`ComparativeConsensus`], the LLM-backed evaluator
//! - [`providers`]: LLM provider abstraction
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verdict_runtime::{ComparativeConsensus, ConsensusConfig, ContentModeration};
//! use verdict_runtime::providers::AnthropicProvider;
//!
//! let provider = Arc::new(AnthropicProvider::from_env()?);
//! let evaluator = ComparativeConsensus::new(provider, ConsensusConfig::default())?;
//! let contract = ContentModeration::new(Arc::new(evaluator));
//!
//! let admin = "0xadmin".into();
//! contract.add_guideline(&admin, "no-dogs", "No dog content")?;
//! contract
//!     .moderate_content(&admin, "post-1", "Look at my puppy", "no-dogs")
//!     .await?;
//! ```

pub mod config;
pub mod consensus;
pub mod contract;
pub mod evaluator;
pub mod prompts;
pub mod providers;
pub mod workflow;

pub use config::ConsensusConfig;
pub use consensus::ComparativeConsensus;
pub use contract::{ContentModeration, ContentModerationBuilder};
pub use evaluator::{ConsensusError, ConsensusEvaluator};
pub use workflow::{ModerationRequest, ModerationWorkflow};

use thiserror::Error;

use providers::ProviderError;

/// Errors from wiring up the runtime.
///
/// Errors from contract operations are [`verdict_core::ModerationError`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Consensus evaluator not configured")]
    EvaluatorNotConfigured,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
