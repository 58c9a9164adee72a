//! Configuration for the governance engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use logos_oracle::CompletionOptions;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ledger configuration
    pub ledger: LedgerConfig,
    /// Entropy estimator selection
    pub estimator: EstimatorConfig,
    /// Model call defaults for ensemble estimation
    pub oracle: OracleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            estimator: EstimatorConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Path of the JSONL journal
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: "state/ledger.jsonl".to_string(),
        }
    }
}

/// Which entropy strategy the processor is built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum EstimatorConfig {
    /// Fixed heuristic over the amendment shape
    Heuristic,
    /// Hash-derived judges, no model calls
    SimulatedEnsemble {
        /// Number of simulated judges
        #[serde(default = "default_simulated_judges")]
        judges: usize,
    },
    /// Registered model clients acting as judges
    ModelEnsemble {
        /// Registry keys of the judging models
        judges: Vec<String>,
        /// Per-call deadline overriding the oracle default
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::Heuristic
    }
}

fn default_simulated_judges() -> usize {
    crate::estimator::DEFAULT_SIMULATED_JUDGES
}

/// Model call defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Per-call deadline (ms)
    pub timeout_ms: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling mass
    pub top_p: f32,
    /// Maximum tokens per answer
    pub max_tokens: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: 64,
        }
    }
}

impl OracleConfig {
    /// Default per-call deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Completion options carrying these defaults.
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions::default()
            .with_temperature(self.temperature)
            .with_top_p(self.top_p)
            .with_max_tokens(self.max_tokens)
            .with_timeout(self.timeout())
    }
}
