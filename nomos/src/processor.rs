//! Amendment processor.
//!
//! Order, short-circuiting on the first failure:
//! 1. Structural: the draft validates into an [`Amendment`]
//! 2. Juridical: the procedure exists and permits any requested transmutation
//! 3. Scoring: entropy → coherence, traceability, blast radius
//! 4. Gate
//!
//! On acceptance the record is appended to the ledger first and the rules
//! are mutated only once the append has succeeded.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use logos_charter::{
    Amendment, AmendmentDraft, Constitution, Procedure, RuleStore, StatusAction, Thresholds,
};

use crate::estimator::EntropyEstimator;
use crate::gate::{accept, blast_radius, traceability};
use crate::ledger::{Ledger, LedgerError};
use crate::types::{GateMetrics, ProposalMetrics, ProposalOutcome};

/// Procedure check failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JuridicalError {
    /// The amendment names a procedure the constitution does not define
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    /// The procedure exists but may not change rule status
    #[error("Procedure {procedure} does not allow {}", .action.as_str())]
    TransmutationNotAllowed {
        procedure: String,
        action: StatusAction,
    },
}

/// Payload journaled for every accepted amendment.
#[derive(Serialize)]
struct LedgerEntry<'a> {
    amendment: &'a Amendment,
    metrics: &'a GateMetrics,
}

/// Validates, scores and commits amendments.
pub struct AmendmentProcessor {
    estimator: Arc<dyn EntropyEstimator>,
    thresholds: Thresholds,
    procedures: Vec<Procedure>,
}

impl AmendmentProcessor {
    /// Create a processor with an injected entropy strategy.
    pub fn new(
        estimator: Arc<dyn EntropyEstimator>,
        thresholds: Thresholds,
        procedures: Vec<Procedure>,
    ) -> Self {
        Self {
            estimator,
            thresholds,
            procedures,
        }
    }

    /// Create a processor governed by a constitution.
    pub fn from_constitution(estimator: Arc<dyn EntropyEstimator>, constitution: &Constitution) -> Self {
        Self::new(
            estimator,
            constitution.thresholds,
            constitution.procedures.clone(),
        )
    }

    /// Gate thresholds.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Known procedures.
    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    /// Name of the entropy strategy in use.
    pub fn estimator_name(&self) -> &str {
        self.estimator.name()
    }

    /// Check the procedure route.
    pub fn check_juridical(&self, amendment: &Amendment) -> Result<(), JuridicalError> {
        let procedure = self
            .procedures
            .iter()
            .find(|p| p.id == amendment.procedure_id)
            .ok_or_else(|| JuridicalError::UnknownProcedure(amendment.procedure_id.clone()))?;

        if amendment.status_action.is_transmutation() && !procedure.transmutation_allowed {
            return Err(JuridicalError::TransmutationNotAllowed {
                procedure: procedure.id.clone(),
                action: amendment.status_action,
            });
        }
        Ok(())
    }

    /// Score an amendment and run the gate, without committing anything.
    pub async fn score(&self, amendment: &Amendment, rules: &RuleStore) -> (bool, GateMetrics) {
        let entropy = self.estimator.estimate(amendment, rules).await.clamp(0.0, 1.0);
        let coherence = 1.0 - entropy;
        let tr = traceability(amendment);
        let br = blast_radius(amendment, rules);

        debug!(
            amendment_id = %amendment.id,
            estimator = self.estimator.name(),
            entropy,
            coherence,
            traceability = tr,
            blast_radius = br,
            "Amendment scored"
        );
        accept(coherence, tr, br, &self.thresholds)
    }

    /// Propose a draft amendment.
    ///
    /// Rejections come back as `Ok` with `accepted == false`; only ledger
    /// failures are errors.
    pub async fn propose(
        &self,
        draft: &AmendmentDraft,
        rules: &mut RuleStore,
        ledger: &Ledger,
    ) -> Result<ProposalOutcome, LedgerError> {
        match draft.validate() {
            Ok(amendment) => self.propose_amendment(&amendment, rules, ledger).await,
            Err(e) => {
                info!(amendment_id = ?draft.id, error = %e, "Amendment rejected: structural");
                Ok(ProposalOutcome::rejected(
                    draft.id.clone(),
                    ProposalMetrics::Structural(e),
                ))
            }
        }
    }

    /// Propose an already validated amendment.
    pub async fn propose_amendment(
        &self,
        amendment: &Amendment,
        rules: &mut RuleStore,
        ledger: &Ledger,
    ) -> Result<ProposalOutcome, LedgerError> {
        let id = Some(amendment.id.clone());

        if let Err(e) = self.check_juridical(amendment) {
            info!(amendment_id = %amendment.id, error = %e, "Amendment rejected: juridical");
            return Ok(ProposalOutcome::rejected(id, ProposalMetrics::Juridical(e)));
        }

        let (ok, metrics) = self.score(amendment, rules).await;
        if !ok {
            info!(
                amendment_id = %amendment.id,
                coherence = metrics.coherence,
                traceability = metrics.traceability,
                blast_radius = metrics.blast_radius,
                "Amendment rejected by gate"
            );
            let reported = if amendment.parent_ids.is_empty() {
                ProposalMetrics::Hierarchy(metrics)
            } else {
                ProposalMetrics::Scored(metrics)
            };
            return Ok(ProposalOutcome::rejected(id, reported));
        }

        let hash = ledger.append(&LedgerEntry {
            amendment,
            metrics: &metrics,
        })?;
        let touched = rules.apply_amendment(amendment);

        info!(
            amendment_id = %amendment.id,
            ledger_hash = %hash,
            rules_touched = touched.len(),
            "Amendment accepted"
        );
        Ok(ProposalOutcome::accepted(amendment.id.clone(), metrics, hash))
    }
}
