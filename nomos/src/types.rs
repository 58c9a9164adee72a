//! Core types for the logos-nomos crate.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use logos_charter::{DocumentError, StructuralError};
use logos_oracle::OracleError;

use crate::ledger::LedgerError;
use crate::processor::JuridicalError;

/// Sentinel key reported when an amendment fails structural validation.
pub const PARSE_SENTINEL: &str = "parse/typing";

/// Sentinel reported for juridical failures and parentless gate rejections.
pub const HIERARCHY_SENTINEL: &str = "procedure/hierarchy";

/// Scores and limits seen by the acceptance gate.
///
/// Always reported in full, whether the gate accepted or not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateMetrics {
    /// Coherence (1 − semantic entropy)
    #[serde(rename = "C")]
    pub coherence: f64,
    /// Traceability
    #[serde(rename = "TR")]
    pub traceability: f64,
    /// Blast radius
    #[serde(rename = "BR")]
    pub blast_radius: f64,
    /// Minimum coherence
    #[serde(rename = "θC")]
    pub min_coherence: f64,
    /// Minimum traceability
    #[serde(rename = "θTR")]
    pub min_traceability: f64,
    /// Maximum blast radius
    #[serde(rename = "θBR")]
    pub max_blast_radius: f64,
}

impl GateMetrics {
    /// Whether every criterion passes. No partial credit.
    pub fn passes(&self) -> bool {
        self.coherence >= self.min_coherence
            && self.traceability >= self.min_traceability
            && self.blast_radius <= self.max_blast_radius
    }
}

/// What a proposal reports back.
///
/// Serializes to the gate metric map when scoring happened, otherwise to a
/// one-key sentinel map.
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalMetrics {
    /// Scored and gated
    Scored(GateMetrics),
    /// Rejected before scoring: malformed amendment
    Structural(StructuralError),
    /// Rejected before scoring: procedure check failed
    Juridical(JuridicalError),
    /// Gate rejected an amendment that names no parent rules
    Hierarchy(GateMetrics),
}

impl ProposalMetrics {
    /// Gate metrics, if scoring happened.
    pub fn gate(&self) -> Option<&GateMetrics> {
        match self {
            Self::Scored(metrics) | Self::Hierarchy(metrics) => Some(metrics),
            Self::Structural(_) | Self::Juridical(_) => None,
        }
    }

    /// Whether this is a sentinel rather than raw gate metrics.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Scored(_))
    }
}

impl Serialize for ProposalMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Scored(metrics) => metrics.serialize(serializer),
            Self::Structural(_) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(PARSE_SENTINEL, &0.0)?;
                map.end()
            }
            Self::Juridical(_) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", HIERARCHY_SENTINEL)?;
                map.end()
            }
            Self::Hierarchy(_) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(HIERARCHY_SENTINEL, &0.0)?;
                map.end()
            }
        }
    }
}

/// Result of one proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalOutcome {
    /// Amendment id, when the draft carried one
    pub amendment_id: Option<String>,
    /// Whether the amendment was accepted and committed
    pub accepted: bool,
    /// Gate metrics or rejection sentinel
    pub metrics: ProposalMetrics,
    /// Hash of the ledger record written on acceptance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_hash: Option<String>,
}

impl ProposalOutcome {
    /// A rejection; nothing was committed.
    pub fn rejected(amendment_id: Option<String>, metrics: ProposalMetrics) -> Self {
        Self {
            amendment_id,
            accepted: false,
            metrics,
            ledger_hash: None,
        }
    }

    /// An acceptance committed under `ledger_hash`.
    pub fn accepted(amendment_id: String, metrics: GateMetrics, ledger_hash: String) -> Self {
        Self {
            amendment_id: Some(amendment_id),
            accepted: true,
            metrics: ProposalMetrics::Scored(metrics),
            ledger_hash: Some(ledger_hash),
        }
    }
}

/// Error types for the engine. Rejections are never errors.
#[derive(Debug, thiserror::Error)]
pub enum NomosError {
    /// Ledger I/O or integrity failure
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Model registry misconfigured
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Constitution, policies or amendment documents unreadable
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

pub type Result<T> = std::result::Result<T, NomosError>;
