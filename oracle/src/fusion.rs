//! Deterministic interpretation fusion.
//!
//! 1. Normalize each output into (intent, token count, content digest).
//! 2. Majority vote on intent; ties go to the lexicographically smallest label.
//! 3. Confidence = 0.9 × winner share + 0.1 × token-parity agreement, rounded to 3 places.
//! 4. Arguments merged as token min/max plus the sorted member digests.
//!
//! Fusion is a pure function of its input.

use std::collections::BTreeMap;
use tracing::debug;

use logos_charter::short_digest;

use crate::types::{Intent, Interpretation, MergedArguments, RawCompletion};

/// Hex characters kept from each member's content digest.
pub const DIGEST_LEN: usize = 12;

/// Keyword buckets in precedence order; the first bucket with a hit wins.
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Summarize, &["summarize", "summary"]),
    (Intent::Classify, &["classify", "label"]),
    (Intent::Extract, &["extract", "pull out"]),
    (Intent::Plan, &["plan", "roadmap"]),
];

/// One member's normalized view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMember {
    pub intent: Intent,
    pub tokens: usize,
    pub digest: String,
}

/// Normalize a single output text.
pub fn normalize(text: &str) -> NormalizedMember {
    let normalized = text.trim().to_lowercase();

    let intent = INTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown);

    NormalizedMember {
        intent,
        tokens: normalized.split_whitespace().count(),
        digest: short_digest(&normalized, DIGEST_LEN),
    }
}

/// Fuse a batch of raw completions into one interpretation.
pub fn fuse(raws: &[RawCompletion]) -> Interpretation {
    if raws.is_empty() {
        return Interpretation::empty();
    }

    let members: Vec<NormalizedMember> = raws.iter().map(|rc| normalize(&rc.output)).collect();

    // Keyed by label so iteration order is the tie-break order
    let mut tally: BTreeMap<&'static str, (Intent, usize)> = BTreeMap::new();
    for member in &members {
        tally
            .entry(member.intent.as_str())
            .or_insert((member.intent, 0))
            .1 += 1;
    }

    let mut winner = (Intent::Unknown, 0usize);
    for (intent, votes) in tally.values() {
        if *votes > winner.1 {
            winner = (*intent, *votes);
        }
    }
    let (intent, votes) = winner;

    let first_parity = members[0].tokens % 2;
    let parity_agree = if members.iter().all(|m| m.tokens % 2 == first_parity) {
        1.0
    } else {
        0.0
    };

    let total = members.len() as f64;
    let confidence = round3(0.9 * votes as f64 / total + 0.1 * parity_agree);

    let tokens_min = members.iter().map(|m| m.tokens).min().unwrap_or_default();
    let tokens_max = members.iter().map(|m| m.tokens).max().unwrap_or_default();
    let mut hashes: Vec<String> = members.into_iter().map(|m| m.digest).collect();
    hashes.sort();

    debug!(
        intent = %intent,
        votes,
        total = raws.len(),
        confidence,
        "Fused interpretation"
    );

    Interpretation {
        intent,
        arguments: Some(MergedArguments {
            tokens_min,
            tokens_max,
            hashes,
        }),
        confidence,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
