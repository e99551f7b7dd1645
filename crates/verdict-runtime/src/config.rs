//! Runtime configuration.
//!
//! Durations are written as humantime strings (`"30s"`, `"1m 30s"`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::providers::CompletionConfig;
use crate::RuntimeError;

/// Configuration for [`ComparativeConsensus`](crate::consensus::ComparativeConsensus).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Independent evaluation runs per call: one leader plus validators
    pub runs: usize,

    /// Validators that must agree with the leader; `None` means all of them
    pub min_agreement: Option<usize>,

    /// Upper bound on a single run, retries included
    #[serde(with = "duration_human")]
    pub run_timeout: Duration,

    /// Retries per run for transient provider errors
    pub max_retries: usize,

    /// First backoff delay between retries
    #[serde(with = "duration_human")]
    pub retry_min_delay: Duration,

    /// Completion settings sent to the provider
    pub completion: CompletionConfig,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            runs: 3,
            min_agreement: None,
            run_timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_min_delay: Duration::from_millis(500),
            completion: CompletionConfig::default(),
        }
    }
}

impl ConsensusConfig {
    /// Number of validator runs (every run except the leader).
    pub fn validators(&self) -> usize {
        self.runs.saturating_sub(1)
    }

    /// Validators required to agree with the leader.
    pub fn required_agreement(&self) -> usize {
        self.min_agreement.unwrap_or_else(|| self.validators())
    }

    /// Reject configurations that can never reach agreement.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.runs == 0 {
            return Err(RuntimeError::InvalidConfig(
                "runs must be at least 1".to_string(),
            ));
        }
        if self.required_agreement() > self.validators() {
            return Err(RuntimeError::InvalidConfig(format!(
                "min_agreement {} exceeds the {} validator runs",
                self.required_agreement(),
                self.validators()
            )));
        }
        Ok(())
    }

    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RuntimeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Serde adapter: `Duration` as a humantime string.
pub(crate) mod duration_human {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
