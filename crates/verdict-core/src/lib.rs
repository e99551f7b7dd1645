//! # verdict-core
//!
//! Deterministic state for guideline-based content moderation.
//!
//! This crate holds everything about the verdict ledger that does not need an
//! evaluator:
//! - Which guidelines exist, and who registered them?
//! - What verdict was recorded for a post under a guideline?
//! - Is an evaluator response acceptable as a verdict?
//!
//! ## Key Guarantees
//!
//! 1. **Append-only guidelines**: ids are unique and a guideline never changes
//! 2. **Last write wins**: one result per (post, guideline) pair, no history
//! 3. **Insertion order**: guidelines and posts enumerate first-created-first-listed
//! 4. **No LLM calls**: evaluation lives in `verdict-runtime`
//!
//! ## Example
//!
//! ```rust,ignore
//! use verdict_core::{Identity, ModerationState, Verdict};
//!
//! let mut state = ModerationState::new();
//! state.guidelines.add("no-dogs", "Posts must not mention dogs", Identity::new("0xabc"))?;
//!
//! let verdict = Verdict::from_value(&serde_json::json!({"outcome": "remove"}))?;
//! let page = state.results.paginate(1, 20);
//! ```

pub mod snapshot;
pub mod store;
pub mod types;
pub mod validation;
pub mod verdict;

// Re-export main types at crate root
pub use snapshot::{LedgerSnapshot, SnapshotError};
pub use store::{AllResults, GuidelineMap, GuidelineStore, ModerationLedger, ModerationState, PostResults};
pub use types::{Guideline, Identity, ModerationResult, Outcome, PageResult, UnknownOutcome};
pub use verdict::Verdict;

use thiserror::Error;

/// Errors returned by contract operations.
///
/// Every error aborts the call that raised it; no state is changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    #[error("Guideline ID already exists: {0}")]
    DuplicateId(String),

    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Guideline not found: {0}")]
    NotFound(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}
