//! Ensemble estimators: several judges read the amendment, their
//! disagreement is the entropy.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use logos_charter::{canonical_json, Amendment, RuleStore};
use logos_oracle::{
    normalized_entropy, CompletionOptions, ModelPrompt, OracleError, Orchestrator, ERROR_OUTPUT,
};

use super::EntropyEstimator;

/// Judges used by the simulated ensemble when none are configured.
pub const DEFAULT_SIMULATED_JUDGES: usize = 7;

const SEVERITIES: [&str; 5] = ["noop", "minor", "moderate", "major", "intent_change"];

/// Deterministic stand-in for a model ensemble.
///
/// Judge `j` reads `SHA-256("{id}|{canonical JSON of the facts}|{j}")` as a
/// big-endian integer and picks a severity for the first fact by its residue
/// mod 5. The seeds match the Python reference simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedEnsembleEstimator {
    judges: usize,
}

impl SimulatedEnsembleEstimator {
    /// Create with `judges` simulated judges.
    pub fn new(judges: usize) -> Self {
        Self { judges }
    }

    /// Number of judges.
    pub fn judges(&self) -> usize {
        self.judges
    }

    /// Every judge's reading, in judge order.
    pub fn judgments(&self, amendment: &Amendment) -> Vec<String> {
        let facts = amendment.facts();
        let facts_json = canonical_json(&facts).unwrap_or_default();
        let first = facts.first().map(String::as_str).unwrap_or("noop");

        (0..self.judges)
            .map(|judge| {
                let seed = format!("{}|{}|{}", amendment.id, facts_json, judge);
                let digest = Sha256::digest(seed.as_bytes());
                let index = digest
                    .iter()
                    .fold(0usize, |acc, &b| (acc * 256 + b as usize) % SEVERITIES.len());
                format!("{}:{}", first, SEVERITIES[index])
            })
            .collect()
    }
}

impl Default for SimulatedEnsembleEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_JUDGES)
    }
}

#[async_trait]
impl EntropyEstimator for SimulatedEnsembleEstimator {
    fn name(&self) -> &str {
        "simulated_ensemble"
    }

    async fn estimate(&self, amendment: &Amendment, _rules: &RuleStore) -> f64 {
        if self.judges <= 1 {
            return 0.0;
        }
        let judgments = self.judgments(amendment);
        let entropy = normalized_entropy(&judgments);
        debug!(amendment_id = %amendment.id, judges = self.judges, entropy, "Simulated ensemble estimate");
        entropy
    }
}

/// Registered model clients as judges.
///
/// Every judge receives the amendment's facts, one per line. A judge whose
/// call fails or times out contributes the judgment `"error"`.
#[derive(Clone)]
pub struct ModelEnsembleEstimator {
    orchestrator: Orchestrator,
    judges: Vec<String>,
    options: CompletionOptions,
}

impl ModelEnsembleEstimator {
    /// Create an ensemble over registry keys, all of which must be registered.
    pub fn new(orchestrator: Orchestrator, judges: Vec<String>) -> Result<Self, OracleError> {
        if let Some(missing) = judges.iter().find(|k| !orchestrator.registry().contains(k)) {
            return Err(OracleError::NoClient {
                model: missing.clone(),
                available: orchestrator.registry().keys(),
            });
        }
        Ok(Self {
            orchestrator,
            judges,
            options: CompletionOptions::default(),
        })
    }

    /// Set the options sent with every judge call.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Judge keys, in call order.
    pub fn judges(&self) -> &[String] {
        &self.judges
    }

    /// Prompt sent to every judge.
    pub fn prompt(amendment: &Amendment) -> String {
        amendment.facts().join("\n")
    }

    /// Ask every judge and return their raw outputs, in judge order.
    pub async fn judgments(&self, amendment: &Amendment) -> Vec<String> {
        let prompt = Self::prompt(amendment);
        let batch: Vec<ModelPrompt> = self
            .judges
            .iter()
            .map(|judge| ModelPrompt::new(judge.as_str(), prompt.as_str()).with_options(self.options.clone()))
            .collect();

        match self.orchestrator.collect(&batch).await {
            Ok(raws) => raws.into_iter().map(|raw| raw.output).collect(),
            Err(e) => {
                warn!(amendment_id = %amendment.id, error = %e, "Ensemble could not be dispatched");
                vec![ERROR_OUTPUT.to_string(); self.judges.len()]
            }
        }
    }
}

#[async_trait]
impl EntropyEstimator for ModelEnsembleEstimator {
    fn name(&self) -> &str {
        "model_ensemble"
    }

    async fn estimate(&self, amendment: &Amendment, _rules: &RuleStore) -> f64 {
        let judgments = self.judgments(amendment).await;
        let entropy = normalized_entropy(&judgments);
        debug!(
            amendment_id = %amendment.id,
            judges = judgments.len(),
            entropy,
            "Model ensemble estimate"
        );
        entropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos_charter::AmendmentDraft;
    use logos_oracle::{ClientRegistry, MockClient};
    use std::sync::Arc;
    use std::time::Duration;

    fn amendment() -> Amendment {
        AmendmentDraft::new("A-demo", "P-1")
            .with_parent("R-1")
            .with_delta("effect", "Change X")
            .validate()
            .unwrap()
    }

    #[tokio::test]
    async fn test_simulated_is_reproducible_and_bounded() {
        let estimator = SimulatedEnsembleEstimator::default();
        let rules = RuleStore::default();

        let first = estimator.estimate(&amendment(), &rules).await;
        let second = estimator.estimate(&amendment(), &rules).await;
        assert_eq!(first.to_bits(), second.to_bits());
        assert!((0.0..=1.0).contains(&first));

        let judgments = estimator.judgments(&amendment());
        assert_eq!(judgments.len(), DEFAULT_SIMULATED_JUDGES);
        assert!(judgments.iter().all(|j| j.starts_with("effect:Change X:")));
        assert_eq!(judgments, estimator.judgments(&amendment()));
    }

    #[tokio::test]
    async fn test_simulated_judges_for_multi_fact_amendment() {
        let amendment = AmendmentDraft::new("A-multi", "P-1")
            .with_parent("R-1")
            .with_delta("effect", "Deny")
            .with_delta("scope", "eu")
            .validate()
            .unwrap();
        let estimator = SimulatedEnsembleEstimator::default();

        let severities: Vec<String> = estimator
            .judgments(&amendment)
            .into_iter()
            .map(|j| j.trim_start_matches("effect:Deny:").to_string())
            .collect();
        assert_eq!(
            severities,
            vec!["intent_change", "intent_change", "moderate", "minor", "noop", "noop", "minor"]
        );

        let h = estimator.estimate(&amendment, &RuleStore::default()).await;
        assert!((h - 0.6946795539074095).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_simulated_single_judge_is_zero() {
        let estimator = SimulatedEnsembleEstimator::new(1);
        assert_eq!(estimator.estimate(&amendment(), &RuleStore::default()).await, 0.0);
        assert_eq!(estimator.judgments(&amendment()).len(), 1);
    }

    #[tokio::test]
    async fn test_model_ensemble_agreement_and_disagreement() {
        let registry = ClientRegistry::new()
            .with("a", Arc::new(MockClient::new("a").with_response("minor")))
            .with("b", Arc::new(MockClient::new("b").with_response("minor")))
            .with("c", Arc::new(MockClient::new("c").with_response("major")))
            .with("d", Arc::new(MockClient::new("d").with_response("noop")));
        let orchestrator = Orchestrator::new(registry);
        let rules = RuleStore::default();

        let agree =
            ModelEnsembleEstimator::new(orchestrator.clone(), vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(agree.estimate(&amendment(), &rules).await, 0.0);

        let spread = ModelEnsembleEstimator::new(
            orchestrator,
            vec!["a".into(), "c".into(), "d".into()],
        )
        .unwrap();
        let h = spread.estimate(&amendment(), &rules).await;
        assert!((h - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_model_ensemble_prompt_and_failures() {
        let echo = Arc::new(MockClient::new("echo"));
        let registry = ClientRegistry::new()
            .with("echo", echo.clone())
            .with("down", Arc::new(MockClient::new("down").with_available(false)))
            .with(
                "slow",
                Arc::new(MockClient::new("slow").with_delay(Duration::from_millis(500))),
            );
        let estimator = ModelEnsembleEstimator::new(
            Orchestrator::new(registry),
            vec!["echo".into(), "down".into(), "slow".into()],
        )
        .unwrap()
        .with_options(CompletionOptions::default().with_timeout(Duration::from_millis(20)));

        let judgments = estimator.judgments(&amendment()).await;
        assert_eq!(judgments, vec!["effect:Change X", "error", "error"]);
        assert_eq!(echo.call_count(), 1);

        let noop = AmendmentDraft::new("A-2", "P-1").validate().unwrap();
        assert_eq!(ModelEnsembleEstimator::prompt(&noop), "noop");
    }

    #[test]
    fn test_model_ensemble_rejects_unknown_judge() {
        let orchestrator = Orchestrator::new(ClientRegistry::new());
        assert!(ModelEnsembleEstimator::new(orchestrator, vec!["gpt".into()]).is_err());
    }
}
