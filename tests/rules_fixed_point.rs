// tests/rules_fixed_point.rs
//
// Conditional-rule propagation seen through the public surface: response
// pruning vs. weight overrides, operator edge cases, and the fixed-point
// guarantees (idempotence, iteration bound).

use std::sync::Arc;

use move_improve_engine::config::{ConditionalRule, ResponseSet, VersionSnapshot};
use move_improve_engine::engine::DecisionEngine;
use move_improve_engine::scoring::{RuleResolver, MAX_RULE_ITERATIONS};

fn answers(pairs: &[(&str, &str)]) -> ResponseSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}

/// One trigger (yesno, unscored) plus one scored dial question, wired
/// through the given rule fragment.
fn ruled_snapshot(rule: serde_json::Value) -> Arc<VersionSnapshot> {
    let snap: VersionSnapshot = serde_json::from_value(serde_json::json!({
        "version": 1,
        "isActive": true,
        "categories": [{"id": "c", "name": "c", "defaultWeight": 1.0}],
        "questions": [
            {"id": "trigger", "categoryId": "c", "type": "yesno", "allowNA": true},
            {"id": "dial", "categoryId": "c", "type": "scale", "scaleMin": 0, "scaleMax": 2}
        ],
        "questionScoring": {"dial": {"improveWeight": 1.0, "moveWeight": 0.0}},
        "conditionalRules": [rule],
        "scoringConfig": {"equalWeighting": true}
    }))
    .expect("ruled snapshot parses");
    snap.validate().expect("ruled snapshot valid");
    Arc::new(snap)
}

#[test]
fn hide_prunes_the_answer_entirely() {
    let engine = DecisionEngine::new(ruled_snapshot(serde_json::json!({
        "ifQuestionId": "trigger", "operator": "==", "value": "yes",
        "action": "hide", "targetQuestionIds": ["dial"]
    })));

    let out = engine.compute(&answers(&[("trigger", "yes"), ("dial", "2")]));
    assert_eq!(out.category_breakdown["c"].count, 0);
    assert_eq!(out.improve_score, 0.0);
    // The pruned answer no longer exists for metadata either.
    assert_eq!(out.metadata.total_answered, 1);
}

#[test]
fn disable_behaves_like_hide() {
    let engine = DecisionEngine::new(ruled_snapshot(serde_json::json!({
        "ifQuestionId": "trigger", "operator": "==", "value": "yes",
        "action": "disable", "targetQuestionIds": ["dial"]
    })));

    let out = engine.compute(&answers(&[("trigger", "yes"), ("dial", "2")]));
    assert_eq!(out.category_breakdown["c"].count, 0);
    assert_eq!(out.metadata.total_answered, 1);
}

#[test]
fn zero_weight_keeps_the_denominator_seat() {
    let engine = DecisionEngine::new(ruled_snapshot(serde_json::json!({
        "ifQuestionId": "trigger", "operator": "==", "value": "yes",
        "action": "zero_weight", "targetQuestionIds": ["dial"]
    })));

    let out = engine.compute(&answers(&[("trigger", "yes"), ("dial", "2")]));
    // Unlike hide, the answer still counts; only its contribution is zeroed.
    let c = &out.category_breakdown["c"];
    assert_eq!(c.count, 1);
    assert_eq!(out.improve_score, 0.0);
    assert_eq!(out.metadata.total_answered, 2);

    // Control: without the trigger the dial scores at full weight.
    let control = engine.compute(&answers(&[("dial", "2")]));
    assert_eq!(control.improve_score, 1.0);
}

#[test]
fn change_weight_scales_the_multiplier() {
    let engine = DecisionEngine::new(ruled_snapshot(serde_json::json!({
        "ifQuestionId": "trigger", "operator": "==", "value": "yes",
        "action": "change_weight", "targetQuestionIds": ["dial"],
        "weightOverride": 2.0
    })));

    let out = engine.compute(&answers(&[("trigger", "yes"), ("dial", "2")]));
    assert_eq!(out.improve_score, 2.0);
    assert_eq!(out.category_breakdown["c"].count, 1);
}

#[test]
fn rules_see_the_raw_na_sentinel() {
    // NA handling belongs to normalization; the resolver compares raw
    // strings, sentinel included.
    let engine = DecisionEngine::new(ruled_snapshot(serde_json::json!({
        "ifQuestionId": "trigger", "operator": "==", "value": "NA",
        "action": "hide", "targetQuestionIds": ["dial"]
    })));

    let out = engine.compute(&answers(&[("trigger", "NA"), ("dial", "2")]));
    assert_eq!(out.category_breakdown["c"].count, 0);
}

#[test]
fn malformed_in_operand_never_fires() {
    let engine = DecisionEngine::new(ruled_snapshot(serde_json::json!({
        "ifQuestionId": "trigger", "operator": "in", "value": "yes, no",
        "action": "hide", "targetQuestionIds": ["dial"]
    })));

    let out = engine.compute(&answers(&[("trigger", "yes"), ("dial", "2")]));
    assert_eq!(out.category_breakdown["c"].count, 1);
    assert_eq!(out.improve_score, 1.0);
}

#[test]
fn numeric_operator_on_junk_never_fires() {
    let engine = DecisionEngine::new(ruled_snapshot(serde_json::json!({
        "ifQuestionId": "trigger", "operator": ">=", "value": "1",
        "action": "hide", "targetQuestionIds": ["dial"]
    })));

    // "yes" does not parse as a number, so the condition is simply false.
    let out = engine.compute(&answers(&[("trigger", "yes"), ("dial", "2")]));
    assert_eq!(out.category_breakdown["c"].count, 1);
}

#[test]
fn resolution_is_idempotent_and_bounded() {
    let rules: Vec<ConditionalRule> = serde_json::from_value(serde_json::json!([
        {"ifQuestionId": "a", "operator": "==", "value": "yes",
         "action": "hide", "targetQuestionIds": ["b"]},
        {"ifQuestionId": "b", "operator": "==", "value": "yes",
         "action": "hide", "targetQuestionIds": ["c"]},
        {"ifQuestionId": "c", "operator": "==", "value": "yes",
         "action": "hide", "targetQuestionIds": ["a"]}
    ]))
    .unwrap();
    let resolver = RuleResolver::new(&rules);

    let input = answers(&[("a", "yes"), ("b", "yes"), ("c", "yes")]);
    let once = resolver.resolve(&input);
    assert!(once.converged);
    assert!(once.iterations <= MAX_RULE_ITERATIONS);

    // Feeding the output back in changes nothing (fixed point reached).
    let twice = resolver.resolve(&once.responses);
    assert_eq!(twice.responses, once.responses);
    assert!(twice.converged);

    // The caller's map is untouched.
    assert_eq!(input.len(), 3);
}
