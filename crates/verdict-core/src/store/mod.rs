//! Contract state: the guideline store and the moderation ledger.
//!
//! Both stores are owned by a single [`ModerationState`] value that is created
//! empty and handed to whoever hosts the contract. Nothing here is global.

mod guidelines;
mod ledger;

pub use guidelines::{GuidelineMap, GuidelineStore};
pub use ledger::{AllResults, ModerationLedger, PostResults};

/// All state held by one contract instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationState {
    pub guidelines: GuidelineStore,
    pub results: ModerationLedger,
}

impl ModerationState {
    /// Create empty state.
    pub fn new() -> Self {
        Self::default()
    }
}
