// src/scoring/mod.rs
//! Scoring pipeline: rule resolution → normalization → aggregation → classification.
//!
//! Everything here is pure and synchronous; the engine wires the stages
//! together and the HTTP layer never reaches below it.

pub mod aggregate;
pub mod normalize;
pub mod rules;

// Re-export convenient entry points.
pub use aggregate::{category_breakdown, composite, decide, in_neutral_zone, lean};
pub use normalize::normalize_answer;
pub use rules::{ResolvedResponses, RuleResolver, MAX_RULE_ITERATIONS};

/// Strict numeric parse shared by the normalizer and rule conditions:
/// trims, then requires a finite f64. Empty or exotic strings ("inf", "NaN")
/// count as uninterpretable.
pub(crate) fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Short hash for log lines. Raw answer values never hit the logs,
/// only this id, so diagnostics stay privacy-safe.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
