//! Default heuristic estimator.

use async_trait::async_trait;

use logos_charter::{Amendment, RuleStore};

use super::EntropyEstimator;

/// Scores an amendment from its shape alone.
///
/// base (0.30 when an `effect*`/`intent*` field changes, else 0.15)
/// + min(0.25, 0.05 × parents) + min(0.20, 0.01 × fact characters),
/// capped at 0.99.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl HeuristicEstimator {
    /// Synchronous form of the estimate.
    pub fn score(amendment: &Amendment) -> f64 {
        let base = if amendment.touches_any(&["effect", "intent"]) {
            0.30
        } else {
            0.15
        };
        let parent_bonus = f64::min(0.25, 0.05 * amendment.parent_ids.len() as f64);
        let fact_chars: usize = amendment.facts().iter().map(|f| f.chars().count()).sum();
        let length_penalty = f64::min(0.20, 0.01 * fact_chars as f64);

        f64::min(0.99, base + parent_bonus + length_penalty).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl EntropyEstimator for HeuristicEstimator {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn estimate(&self, amendment: &Amendment, _rules: &RuleStore) -> f64 {
        Self::score(amendment)
    }
}
