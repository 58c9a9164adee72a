//! Semantic entropy estimation.
//!
//! An estimator scores how much independent readers would disagree about
//! what an amendment means, in [0, 1]. Strategies are injected into the
//! [`crate::AmendmentProcessor`] at construction:
//! - [`HeuristicEstimator`]: fixed formula over the amendment's shape
//! - [`SimulatedEnsembleEstimator`]: hash-derived judges, no I/O
//! - [`ModelEnsembleEstimator`]: registered model clients as judges

mod ensemble;
mod heuristic;

pub use ensemble::{ModelEnsembleEstimator, SimulatedEnsembleEstimator, DEFAULT_SIMULATED_JUDGES};
pub use heuristic::HeuristicEstimator;

use async_trait::async_trait;
use std::sync::Arc;

use logos_charter::{Amendment, RuleStore};
use logos_oracle::{ClientRegistry, Orchestrator};

use crate::config::{EngineConfig, EstimatorConfig};
use crate::types::Result;

/// Strategy turning an amendment into a semantic entropy score.
#[async_trait]
pub trait EntropyEstimator: Send + Sync {
    /// Name of the strategy.
    fn name(&self) -> &str;

    /// Estimate semantic entropy in [0, 1].
    async fn estimate(&self, amendment: &Amendment, rules: &RuleStore) -> f64;
}

/// Build the estimator selected in `config`.
///
/// Model ensembles resolve their judges against `registry` here, so a
/// missing client fails at startup rather than mid-proposal.
pub fn from_config(
    config: &EngineConfig,
    registry: &ClientRegistry,
) -> Result<Arc<dyn EntropyEstimator>> {
    let estimator: Arc<dyn EntropyEstimator> = match &config.estimator {
        EstimatorConfig::Heuristic => Arc::new(HeuristicEstimator),
        EstimatorConfig::SimulatedEnsemble { judges } => {
            Arc::new(SimulatedEnsembleEstimator::new(*judges))
        }
        EstimatorConfig::ModelEnsemble { judges, timeout_ms } => {
            let mut options = config.oracle.completion_options();
            if let Some(ms) = timeout_ms {
                options.timeout_ms = Some(*ms);
            }
            let orchestrator =
                Orchestrator::new(registry.clone()).with_default_timeout(config.oracle.timeout());
            Arc::new(ModelEnsembleEstimator::new(orchestrator, judges.clone())?.with_options(options))
        }
    };

    tracing::info!(estimator = estimator.name(), "Entropy estimator configured");
    Ok(estimator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NomosError;
    use logos_oracle::{MockClient, OracleError};

    #[test]
    fn test_from_config_selects_strategy() {
        let registry = ClientRegistry::new();

        let estimator = from_config(&EngineConfig::default(), &registry).unwrap();
        assert_eq!(estimator.name(), "heuristic");

        let mut config = EngineConfig::default();
        config.estimator = EstimatorConfig::SimulatedEnsemble { judges: 5 };
        assert_eq!(from_config(&config, &registry).unwrap().name(), "simulated_ensemble");
    }

    #[test]
    fn test_model_ensemble_requires_registered_judges() {
        let registry = ClientRegistry::new().with("mock", Arc::new(MockClient::default()));
        let mut config = EngineConfig::default();

        config.estimator = EstimatorConfig::ModelEnsemble {
            judges: vec!["mock".to_string()],
            timeout_ms: Some(100),
        };
        assert_eq!(from_config(&config, &registry).unwrap().name(), "model_ensemble");

        config.estimator = EstimatorConfig::ModelEnsemble {
            judges: vec!["mock".to_string(), "openai".to_string()],
            timeout_ms: None,
        };
        match from_config(&config, &registry) {
            Err(NomosError::Oracle(OracleError::NoClient { model, .. })) => {
                assert_eq!(model, "openai")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing judge accepted"),
        }
    }
}
