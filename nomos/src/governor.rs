//! Single-writer owner of the rule store and the ledger.
//!
//! Every proposal runs validate → score → append → mutate under one lock,
//! so the "read chain head, then append" step can never interleave.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use logos_charter::{AmendmentDraft, Constitution, RuleStore};
use logos_oracle::ClientRegistry;

use crate::config::EngineConfig;
use crate::estimator;
use crate::ledger::{Ledger, LedgerRecord};
use crate::processor::AmendmentProcessor;
use crate::types::{ProposalOutcome, Result};

struct Governed {
    rules: RuleStore,
    ledger: Ledger,
}

/// Serializes all proposals against one rule store and ledger.
///
/// Cheap to share behind an [`Arc`]; concurrent `submit` calls queue on the
/// internal lock.
pub struct Governor {
    processor: AmendmentProcessor,
    state: Mutex<Governed>,
}

impl Governor {
    /// Create a governor over an existing store and ledger.
    pub fn new(processor: AmendmentProcessor, rules: RuleStore, ledger: Ledger) -> Self {
        Self {
            processor,
            state: Mutex::new(Governed { rules, ledger }),
        }
    }

    /// Build from configuration: open the ledger and select the estimator.
    pub fn from_config(
        config: &EngineConfig,
        constitution: &Constitution,
        rules: RuleStore,
        registry: &ClientRegistry,
    ) -> Result<Self> {
        let estimator = estimator::from_config(config, registry)?;
        let ledger = Ledger::open(&config.ledger.path)?;
        info!(
            ledger = %config.ledger.path,
            estimator = estimator.name(),
            rules = rules.len(),
            "Governor ready"
        );
        let processor = AmendmentProcessor::from_constitution(estimator, constitution);
        Ok(Self::new(processor, rules, ledger))
    }

    /// The processor in use.
    pub fn processor(&self) -> &AmendmentProcessor {
        &self.processor
    }

    /// Propose one amendment.
    pub async fn submit(&self, draft: &AmendmentDraft) -> Result<ProposalOutcome> {
        let mut guard = self.state.lock().await;
        let Governed { rules, ledger } = &mut *guard;
        Ok(self.processor.propose(draft, rules, ledger).await?)
    }

    /// Propose a batch in order, holding the lock for the whole batch.
    ///
    /// Stops at the first ledger failure.
    pub async fn submit_all(&self, drafts: &[AmendmentDraft]) -> Result<Vec<ProposalOutcome>> {
        let mut guard = self.state.lock().await;
        let Governed { rules, ledger } = &mut *guard;

        let mut outcomes = Vec::with_capacity(drafts.len());
        for draft in drafts {
            outcomes.push(self.processor.propose(draft, rules, ledger).await?);
        }

        let accepted = outcomes.iter().filter(|o| o.accepted).count();
        info!(submitted = drafts.len(), accepted, "Amendment batch processed");
        Ok(outcomes)
    }

    /// Snapshot of the current rules.
    pub async fn rules(&self) -> RuleStore {
        self.state.lock().await.rules.clone()
    }

    /// Hash at the head of the ledger.
    pub async fn last_hash(&self) -> Result<Option<String>> {
        Ok(self.state.lock().await.ledger.last_hash()?)
    }

    /// Every ledger record.
    pub async fn records(&self) -> Result<Vec<LedgerRecord>> {
        Ok(self.state.lock().await.ledger.records()?)
    }

    /// Re-read and verify the ledger chain.
    pub async fn verify_ledger(&self) -> Result<()> {
        Ok(self.state.lock().await.ledger.verify()?)
    }
}

/// Shared handle type.
pub type SharedGovernor = Arc<Governor>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::HeuristicEstimator;
    use logos_charter::{Procedure, Rule, Thresholds};
    use tempfile::TempDir;

    fn governor(dir: &TempDir) -> SharedGovernor {
        let processor = AmendmentProcessor::new(
            Arc::new(HeuristicEstimator),
            Thresholds::new(0.5, 0.8, 0.9).unwrap(),
            vec![Procedure::new("P-std", false)],
        );
        let rules = RuleStore::new(vec![
            Rule::new("R-1", "privacy", "allow"),
            Rule::new("R-2", "retention", "30 days"),
        ])
        .unwrap();
        let ledger = Ledger::open(dir.path().join("ledger.jsonl")).unwrap();
        Arc::new(Governor::new(processor, rules, ledger))
    }

    #[tokio::test]
    async fn test_concurrent_submissions_keep_chain_contiguous() {
        let dir = TempDir::new().unwrap();
        let governor = governor(&dir);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let governor = governor.clone();
                tokio::spawn(async move {
                    let draft = AmendmentDraft::new(format!("A-{}", i), "P-std")
                        .with_parent(if i % 2 == 0 { "R-1" } else { "R-2" })
                        .with_delta("effect", format!("E{}", i % 10))
                        .with_evidence("ticket");
                    governor.submit(&draft).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().accepted);
        }

        let records = governor.records().await.unwrap();
        assert_eq!(records.len(), 16);
        for pair in records.windows(2) {
            assert_eq!(pair[1].prev.as_deref(), Some(pair[0].hash.as_str()));
        }
        governor.verify_ledger().await.unwrap();
        assert_eq!(
            governor.last_hash().await.unwrap().as_deref(),
            Some(records[15].hash.as_str())
        );
    }

    #[tokio::test]
    async fn test_submit_all_preserves_order() {
        let dir = TempDir::new().unwrap();
        let governor = governor(&dir);

        let drafts = vec![
            AmendmentDraft::new("A-1", "P-std")
                .with_parent("R-1")
                .with_delta("effect", "first")
                .with_evidence("e"),
            AmendmentDraft::new("A-2", "P-unknown").with_parent("R-1"),
            AmendmentDraft::new("A-3", "P-std")
                .with_parent("R-1")
                .with_delta("effect", "third")
                .with_evidence("e"),
        ];
        let outcomes = governor.submit_all(&drafts).await.unwrap();

        let accepted: Vec<bool> = outcomes.iter().map(|o| o.accepted).collect();
        assert_eq!(accepted, vec![true, false, true]);
        assert_eq!(governor.rules().await.get("R-1").unwrap().effect, "third");
        assert_eq!(governor.records().await.unwrap().len(), 2);
    }
}
