// src/scoring/rules.rs
//! Conditional rule resolver.
//!
//! Rules are trigger/action pairs evaluated against the respondent's own
//! answers: `hide`/`disable` remove target responses before scoring,
//! `zero_weight`/`change_weight` record a multiplier override the aggregator
//! applies later. Resolution runs as a fixed-point loop over a cloned
//! working set, so the caller's response map is never touched.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{ConditionalRule, ResponseSet, RuleAction, RuleOperator};
use crate::scoring::{anon_hash, parse_finite};

/// Hard bound on propagation passes. Exceeding it is not an error, the
/// resolver just stops and reports `converged: false`.
pub const MAX_RULE_ITERATIONS: usize = 10;

/// Result of rule resolution: the pruned response set plus per-question
/// multiplier overrides collected from `zero_weight`/`change_weight` rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResponses {
    pub responses: ResponseSet,
    /// question id -> multiplier that replaces `ScoringWeights.multiplier`.
    pub weight_overrides: HashMap<String, f64>,
    /// Passes actually run (>= 1 whenever any rule group exists).
    pub iterations: usize,
    /// False only when the iteration cap cut propagation short.
    pub converged: bool,
}

/// Active rules grouped by trigger question, in configuration order.
/// Built once per engine; `resolve` is pure over the input.
#[derive(Debug, Clone)]
pub struct RuleResolver {
    groups: Vec<(String, Vec<ConditionalRule>)>,
}

impl RuleResolver {
    pub fn new(rules: &[ConditionalRule]) -> Self {
        let mut groups: Vec<(String, Vec<ConditionalRule>)> = Vec::new();
        for rule in rules.iter().filter(|r| r.active) {
            match groups.iter_mut().find(|(id, _)| *id == rule.if_question_id) {
                Some((_, bucket)) => bucket.push(rule.clone()),
                None => groups.push((rule.if_question_id.clone(), vec![rule.clone()])),
            }
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Run the fixed-point pruning pass over a copy of `responses`.
    ///
    /// A trigger question with no response in the current working set is
    /// skipped, not an error; a null answer counts as "no response". Later
    /// matching rules overwrite earlier weight overrides for the same target.
    pub fn resolve(&self, responses: &ResponseSet) -> ResolvedResponses {
        let mut working = responses.clone();
        let mut overrides: HashMap<String, f64> = HashMap::new();

        if self.groups.is_empty() {
            return ResolvedResponses {
                responses: working,
                weight_overrides: overrides,
                iterations: 0,
                converged: true,
            };
        }

        let mut changed = true;
        let mut iterations = 0usize;

        while changed && iterations < MAX_RULE_ITERATIONS {
            changed = false;
            iterations += 1;

            for (trigger_id, rules) in &self.groups {
                // Live lookup: an earlier group in this pass may have removed
                // the trigger's own response.
                let value = match working.get(trigger_id) {
                    Some(Some(v)) => v.clone(),
                    _ => continue,
                };

                for rule in rules {
                    if !condition_holds(rule.operator, &value, &rule.value) {
                        continue;
                    }
                    match rule.action {
                        RuleAction::Hide | RuleAction::Disable => {
                            for target in &rule.target_question_ids {
                                if working.remove(target).is_some() {
                                    changed = true;
                                    debug!(
                                        target: "scoring",
                                        rule = %rule.id,
                                        question = %target,
                                        trigger = %trigger_id,
                                        value_hash = %anon_hash(&value),
                                        "rule removed response"
                                    );
                                }
                            }
                        }
                        RuleAction::ZeroWeight => {
                            for target in &rule.target_question_ids {
                                overrides.insert(target.clone(), 0.0);
                            }
                        }
                        RuleAction::ChangeWeight => {
                            // A change_weight rule without an override value
                            // has nothing to apply.
                            let Some(w) = rule.weight_override else {
                                continue;
                            };
                            for target in &rule.target_question_ids {
                                overrides.insert(target.clone(), w);
                            }
                        }
                    }
                }
            }
        }

        let converged = !changed;
        if !converged {
            debug!(
                target: "scoring",
                iterations,
                "rule propagation stopped at iteration cap"
            );
        }

        ResolvedResponses {
            responses: working,
            weight_overrides: overrides,
            iterations,
            converged,
        }
    }
}

/// Operator table. String operators compare raw values; ordering operators
/// need both sides to parse as finite numbers, otherwise the condition is
/// false. `in` expects the operand to be a JSON array encoded as a string;
/// malformed JSON is false, never an error.
pub(crate) fn condition_holds(op: RuleOperator, answer: &str, operand: &str) -> bool {
    match op {
        RuleOperator::Eq => answer == operand,
        RuleOperator::Ne => answer != operand,
        RuleOperator::Lt | RuleOperator::Gt | RuleOperator::Le | RuleOperator::Ge => {
            let (Some(a), Some(b)) = (parse_finite(answer), parse_finite(operand)) else {
                return false;
            };
            match op {
                RuleOperator::Lt => a < b,
                RuleOperator::Gt => a > b,
                RuleOperator::Le => a <= b,
                RuleOperator::Ge => a >= b,
                _ => unreachable!(),
            }
        }
        RuleOperator::Contains => answer.contains(operand),
        RuleOperator::In => match serde_json::from_str::<serde_json::Value>(operand) {
            Ok(serde_json::Value::Array(items)) => items
                .iter()
                .any(|v| v.as_str().is_some_and(|s| s == answer)),
            _ => false,
        },
    }
}
