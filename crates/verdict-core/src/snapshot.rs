//! Portable snapshots of contract state.
//!
//! The ledger itself has no storage format; hosts that need to persist state
//! between processes capture a [`LedgerSnapshot`] and restore it later.
//! Restoring re-checks the invariants the stores normally enforce on write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::store::{AllResults, GuidelineMap, GuidelineStore, ModerationLedger, ModerationState};

/// Current snapshot format.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Errors from loading or restoring snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to access snapshot file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse snapshot JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),

    #[error("Inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// Serializable copy of a [`ModerationState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub guidelines: GuidelineMap,
    pub moderation_results: AllResults,
}

impl LedgerSnapshot {
    /// Capture the current state.
    pub fn capture(state: &ModerationState) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: Utc::now(),
            guidelines: state.guidelines.list_all(),
            moderation_results: state.results.get_all(),
        }
    }

    /// Rebuild state, preserving guideline and result order.
    pub fn restore(self) -> Result<ModerationState, SnapshotError> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.format_version));
        }

        let mut guidelines = GuidelineStore::new();
        for (key, guideline) in self.guidelines {
            if key != guideline.id {
                return Err(SnapshotError::Inconsistent(format!(
                    "guideline stored under '{}' has id '{}'",
                    key, guideline.id
                )));
            }
            guidelines
                .add(&guideline.id, &guideline.text, guideline.creator_address)
                .map_err(|e| SnapshotError::Inconsistent(e.to_string()))?;
        }

        let mut results = ModerationLedger::new();
        for (post_id, post_results) in self.moderation_results {
            for (guideline_id, result) in post_results {
                if result.post_id != post_id || result.guideline_id != guideline_id {
                    return Err(SnapshotError::Inconsistent(format!(
                        "result stored under ({}, {}) is for ({}, {})",
                        post_id, guideline_id, result.post_id, result.guideline_id
                    )));
                }
                if !guidelines.contains(&guideline_id) {
                    return Err(SnapshotError::Inconsistent(format!(
                        "result for post '{}' references unknown guideline '{}'",
                        post_id, guideline_id
                    )));
                }
                results.upsert(&post_id, &guideline_id, result);
            }
        }

        Ok(ModerationState {
            guidelines,
            results,
        })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Write the snapshot to a JSON file, replacing it.
    ///
    /// The JSON goes to a sibling `.tmp` file first and is renamed over
    /// `path`, so an interrupted write never leaves a truncated snapshot.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let json = self.to_json()?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, json)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}
