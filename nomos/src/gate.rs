//! Acceptance gate.
//!
//! Accept iff coherence ≥ θC, traceability ≥ θTR and blast radius ≤ θBR.

use std::collections::HashSet;

use logos_charter::{Amendment, RuleStore, Thresholds};

use crate::types::GateMetrics;

/// How well an amendment is sourced, in [0.5, 1.0].
///
/// Additive: base 0.5, +0.2 with parents, +0.2 with a procedure, +0.1 with evidence.
/// Summed in tenths so a fully sourced amendment scores exactly 1.0.
pub fn traceability(amendment: &Amendment) -> f64 {
    let mut tenths: u32 = 5;
    if !amendment.parent_ids.is_empty() {
        tenths += 2;
    }
    if !amendment.procedure_id.is_empty() {
        tenths += 2;
    }
    if !amendment.evidence.is_empty() {
        tenths += 1;
    }
    f64::min(1.0, f64::from(tenths) / 10.0)
}

/// Fraction of the rule base the amendment's distinct parents touch.
pub fn blast_radius(amendment: &Amendment, rules: &RuleStore) -> f64 {
    let touched: HashSet<&str> = amendment.parent_ids.iter().map(String::as_str).collect();
    let total = rules.len().max(1) as f64;
    f64::min(1.0, touched.len() as f64 / total)
}

/// Apply the three threshold tests.
///
/// The metrics are returned in full regardless of the outcome.
pub fn accept(
    coherence: f64,
    traceability: f64,
    blast_radius: f64,
    thresholds: &Thresholds,
) -> (bool, GateMetrics) {
    let metrics = GateMetrics {
        coherence,
        traceability,
        blast_radius,
        min_coherence: thresholds.coherence,
        min_traceability: thresholds.traceability,
        max_blast_radius: thresholds.blast_radius,
    };
    (metrics.passes(), metrics)
}
