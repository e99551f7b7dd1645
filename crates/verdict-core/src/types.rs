//! Shared data types for the verdict ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of the caller that issued a write operation.
///
/// Identities are recorded, never authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Moderation decision for a post under one guideline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Content is appropriate and follows the guideline
    Keep,
    /// Content is borderline and should have reduced visibility
    Limit,
    /// Content clearly violates the guideline
    Remove,
}

impl Outcome {
    /// All outcomes, in severity order.
    pub const ALL: [Outcome; 3] = [Outcome::Keep, Outcome::Limit, Outcome::Remove];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Keep => "keep",
            Outcome::Limit => "limit",
            Outcome::Remove => "remove",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not exactly `keep`, `limit` or `remove`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOutcome(pub String);

impl fmt::Display for UnknownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown moderation outcome '{}'", self.0)
    }
}

impl std::error::Error for UnknownOutcome {}

impl FromStr for Outcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Outcome::Keep),
            "limit" => Ok(Outcome::Limit),
            "remove" => Ok(Outcome::Remove),
            other => Err(UnknownOutcome(other.to_string())),
        }
    }
}

/// A community guideline. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guideline {
    /// Primary key, unique within the guideline store
    pub id: String,

    /// Guideline text handed to the evaluator
    pub text: String,

    /// Caller that registered the guideline
    pub creator_address: Identity,
}

/// The verdict for one (post, guideline) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub post_id: String,
    pub guideline_id: String,

    /// Content exactly as it was evaluated
    pub post_content: String,

    pub outcome: Outcome,

    /// Evaluator explanation; empty when the evaluator gave none
    pub reasoning: String,

    /// Caller that requested the moderation
    pub moderator_address: Identity,
}

/// One page of moderation results, newest first.
///
/// `page` and `per_page` echo the request unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub results: Vec<ModerationResult>,
    pub total: usize,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: usize,
}
