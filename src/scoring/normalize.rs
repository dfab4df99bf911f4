// src/scoring/normalize.rs
//! Per-question normalization onto [-1, +1].
//!
//! Interpretation faults (junk numbers, unknown options, malformed
//! multi-select payloads) normalize to 0 and log at debug with a hashed
//! value. Scoring must never fail on respondent input.

use tracing::debug;

use crate::config::{AnswerOption, Question, QuestionKind};
use crate::scoring::{anon_hash, parse_finite};

/// Map one raw answer onto the normalized axis.
///
/// NA detection is the caller's job (`Question::is_na`); by the time a value
/// reaches here it is treated as a real answer, sentinel string included.
pub fn normalize_answer(question: &Question, raw: &str) -> f64 {
    match &question.kind {
        // Linear map of [min, max] onto [-1, +1]. Out-of-range submissions
        // extrapolate rather than clamp; bounds are enforced at intake, not
        // here.
        QuestionKind::Scale { min, max } => match parse_finite(raw) {
            Some(v) => 2.0 * (v - min) / (max - min) - 1.0,
            None => fault(question, raw),
        },

        // Free numeric input lands on a fixed /100 ramp, clamped.
        QuestionKind::Numeric => match parse_finite(raw) {
            Some(v) => (v / 100.0).clamp(-1.0, 1.0),
            None => fault(question, raw),
        },

        // Exactly "yes" scores +1; anything else (including casing variants)
        // is a no.
        QuestionKind::YesNo => {
            if raw == "yes" {
                1.0
            } else {
                -1.0
            }
        }

        // A matched option with a declared impact pair scores the clamped
        // mean of the pair; unknown options and impact-less options are 0.
        QuestionKind::Dropdown { options } => options
            .iter()
            .find(|o| o.value == raw)
            .and_then(|o| o.score_impact)
            .map(|imp| ((imp.improve + imp.move_) / 2.0).clamp(-1.0, 1.0))
            .unwrap_or(0.0),

        // Free text never moves the needle.
        QuestionKind::Text => 0.0,

        // Multi-select arrives as a JSON array of option values; selections
        // with declared impacts are averaged, the rest ignored.
        QuestionKind::MultipleChoice { options } => multiple_choice_score(question, options, raw),
    }
}

fn multiple_choice_score(question: &Question, options: &[AnswerOption], raw: &str) -> f64 {
    let selected: Vec<String> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(_) => return fault(question, raw),
    };

    let mut sum = 0.0;
    let mut counted = 0usize;
    for value in &selected {
        let Some(impact) = options
            .iter()
            .find(|o| o.value == *value)
            .and_then(|o| o.score_impact)
        else {
            continue;
        };
        sum += (impact.improve + impact.move_) / 2.0;
        counted += 1;
    }

    if counted == 0 {
        0.0
    } else {
        (sum / counted as f64).clamp(-1.0, 1.0)
    }
}

fn fault(question: &Question, raw: &str) -> f64 {
    debug!(
        target: "scoring",
        question = %question.id,
        kind = question.kind.name(),
        value_hash = %anon_hash(raw),
        "uninterpretable answer normalized to 0"
    );
    0.0
}
