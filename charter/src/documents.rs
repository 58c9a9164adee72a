//! YAML documents that seed a governance run.
//!
//! Three document kinds are recognised:
//!
//! - constitution: `thresholds` and `procedures`
//! - policies: `rules`
//! - amendment sets: `amendments` (kept as drafts; validation happens per proposal)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::types::{Procedure, Rule, RuleStore, Thresholds};
use crate::validation::AmendmentDraft;

/// Error types for document loading.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML did not match the expected shape
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A threshold lies outside [0, 1]
    #[error("Threshold {name} out of range [0, 1]: {value}")]
    ThresholdOutOfRange { name: String, value: f64 },

    /// Two rules share an id
    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),

    /// Two procedures share an id
    #[error("Duplicate procedure id: {0}")]
    DuplicateProcedure(String),
}

/// Thresholds and procedures governing amendments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constitution {
    /// Acceptance gate limits
    pub thresholds: Thresholds,
    /// Known procedures
    #[serde(default)]
    pub procedures: Vec<Procedure>,
}

impl Constitution {
    /// Load from YAML, checking thresholds and procedure ids.
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        let constitution: Self = serde_yaml::from_str(yaml)?;
        constitution.validate()?;
        Ok(constitution)
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Check thresholds are in range and procedure ids are unique.
    pub fn validate(&self) -> Result<(), DocumentError> {
        self.thresholds.validate()?;
        let mut seen = HashSet::new();
        for procedure in &self.procedures {
            if !seen.insert(procedure.id.as_str()) {
                return Err(DocumentError::DuplicateProcedure(procedure.id.clone()));
            }
        }
        Ok(())
    }

    /// Look up a procedure by id.
    pub fn procedure(&self, id: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.id == id)
    }
}

/// The governed rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policies {
    pub rules: Vec<Rule>,
}

impl Policies {
    /// Load from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Move the rules into a store, rejecting duplicate ids.
    pub fn into_store(self) -> Result<RuleStore, DocumentError> {
        RuleStore::new(self.rules)
    }
}

/// A batch of proposed amendments, in submission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmendmentSet {
    #[serde(default)]
    pub amendments: Vec<AmendmentDraft>,
}

impl AmendmentSet {
    /// Load from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }
}
