// src/scoring/aggregate.rs
//! Category aggregation, the two-axis composite, and classification of the
//! decision index.
//!
//! All stages here work on raw (unrounded) floats; rounding to four decimal
//! places happens once, in `EngineOutput::rounded`.

use std::collections::HashMap;

use crate::config::{NaHandling, ScoringConfig, VersionSnapshot};
use crate::decision::{CategoryScore, Decision, LeanStrength};
use crate::scoring::normalize::normalize_answer;
use crate::scoring::rules::ResolvedResponses;

/// Average both axes per active category.
///
/// `questions_by_category` maps every active category id to the indices of
/// its active questions in `snap.questions`, prebuilt at engine construction.
/// Categories with nothing countable come back as zero scores with count 0,
/// they are never dropped from the breakdown.
pub fn category_breakdown(
    snap: &VersionSnapshot,
    questions_by_category: &HashMap<String, Vec<usize>>,
    resolved: &ResolvedResponses,
) -> HashMap<String, CategoryScore> {
    let mut breakdown = HashMap::with_capacity(questions_by_category.len());

    for category in snap.categories.iter().filter(|c| c.active) {
        let mut improve_sum = 0.0;
        let mut move_sum = 0.0;
        let mut count = 0usize;

        let indices = questions_by_category.get(&category.id);
        for &qi in indices.into_iter().flatten() {
            let question = &snap.questions[qi];
            // Questions without a scoring row never score and never count.
            let Some(weights) = snap.question_scoring.get(&question.id) else {
                continue;
            };

            let value = match resolved.responses.get(&question.id) {
                Some(Some(v)) => Some(v.as_str()),
                _ => None,
            };

            if question.is_na(value) {
                // Policy split: excluded NA vanishes entirely, neutral NA
                // keeps its seat in the denominator at score 0.
                if snap.scoring_config.na_handling == NaHandling::TreatAsNeutral {
                    count += 1;
                }
                continue;
            }
            // Null or missing on a question that does not allow NA: simply
            // unanswered.
            let Some(value) = value else {
                continue;
            };

            let mut normalized = normalize_answer(question, value);
            if weights.reverse_scored {
                normalized = -normalized;
            }
            let multiplier = resolved
                .weight_overrides
                .get(&question.id)
                .copied()
                .unwrap_or(weights.multiplier);

            improve_sum += normalized * weights.improve_weight * multiplier;
            move_sum += normalized * weights.move_weight * multiplier;
            count += 1;
        }

        let denominator = count.max(1) as f64;
        breakdown.insert(
            category.id.clone(),
            CategoryScore::new(
                improve_sum / denominator,
                move_sum / denominator,
                count,
                category.default_weight,
            ),
        );
    }

    breakdown
}

/// Weighted composite of both axes over categories that counted at least one
/// question.
///
/// Under `equal_weighting` the normalizer is the number of contributing
/// categories, otherwise the sum of their weights; both floor at 1 so an
/// all-empty questionnaire yields (0, 0) instead of NaN.
pub fn composite(
    breakdown: &HashMap<String, CategoryScore>,
    config: &ScoringConfig,
) -> (f64, f64) {
    let mut improve_sum = 0.0;
    let mut move_sum = 0.0;
    let mut total_weight = 0.0;
    let mut contributing = 0usize;

    for score in breakdown.values() {
        if score.count == 0 {
            continue;
        }
        improve_sum += score.improve * score.weight;
        move_sum += score.move_ * score.weight;
        total_weight += score.weight;
        contributing += 1;
    }

    let normalizer = if config.equal_weighting {
        (contributing as f64).max(1.0)
    } else {
        total_weight.max(1.0)
    };

    (improve_sum / normalizer, move_sum / normalizer)
}

/// Neutral zone test, inclusive on both ends.
pub fn in_neutral_zone(index: f64, config: &ScoringConfig) -> bool {
    index >= config.neutral_zone_min && index <= config.neutral_zone_max
}

/// Sign of the index outside the neutral zone; Unclear inside it.
pub fn decide(index: f64, config: &ScoringConfig) -> Decision {
    if in_neutral_zone(index, config) {
        Decision::Unclear
    } else if index > 0.0 {
        Decision::Improve
    } else {
        Decision::Move
    }
}

/// Lean strength from |index| against the configured thresholds, checked
/// strongest-first. Independent of the neutral zone.
pub fn lean(index: f64, config: &ScoringConfig) -> LeanStrength {
    let magnitude = index.abs();
    if magnitude >= config.strong_lean_threshold {
        LeanStrength::Strong
    } else if magnitude >= config.moderate_lean_threshold {
        LeanStrength::Moderate
    } else if magnitude >= config.slight_lean_threshold {
        LeanStrength::Slight
    } else {
        LeanStrength::Unclear
    }
}
