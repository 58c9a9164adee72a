//! Normalized Shannon entropy over a list of judgments.
//!
//! H = −Σ p·ln(p) over the frequency distribution of distinct judgments,
//! divided by ln(N) where N is the number of judgments. N ≤ 1 yields 0,
//! as does a single distinct outcome.

use std::collections::BTreeMap;

/// Normalized disagreement of `judgments`, in [0, 1].
///
/// Frequencies are summed in key order so the result is bit-reproducible.
pub fn normalized_entropy<S: AsRef<str>>(judgments: &[S]) -> f64 {
    let n = judgments.len();
    if n <= 1 {
        return 0.0;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for judgment in judgments {
        *counts.entry(judgment.as_ref()).or_insert(0) += 1;
    }
    if counts.len() == 1 {
        return 0.0;
    }

    let total = n as f64;
    let h: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum();

    (h / total.ln()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_distinct_is_maximal() {
        let h = normalized_entropy(&["a", "b", "c", "d"]);
        assert!((0.99..=1.0).contains(&h), "got {}", h);
    }

    #[test]
    fn test_all_identical_is_zero() {
        assert_eq!(normalized_entropy(&["same", "same", "same"]), 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty: [&str; 0] = [];
        assert_eq!(normalized_entropy(&empty), 0.0);
        assert_eq!(normalized_entropy(&["only"]), 0.0);
    }

    #[test]
    fn test_small_mixed() {
        let h = normalized_entropy(&["a", "a", "b"]);
        assert!((h - 0.5794).abs() < 1e-3, "got {}", h);
    }

    #[test]
    fn test_large_n_two_outcomes() {
        // 50/50 split over 100 judgments: ln(2) / ln(100)
        let judgments: Vec<String> = (0..100)
            .map(|i| if i % 2 == 0 { "x".to_string() } else { "y".to_string() })
            .collect();
        let h = normalized_entropy(&judgments);
        let expected = 2f64.ln() / 100f64.ln();
        assert!((h - expected).abs() < 1e-12);
        assert!(h < 0.2);
    }

    #[test]
    fn test_order_independent() {
        let a = normalized_entropy(&["x", "y", "x", "z", "y"]);
        let b = normalized_entropy(&["z", "y", "y", "x", "x"]);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
