//! # Decision Engine
//! Pure, testable scoring over one immutable questionnaire snapshot.
//! No I/O; the HTTP layer and the demo binary both call into here.
//!
//! Pipeline per computation: resolve conditional rules, normalize and
//! aggregate per category, composite both axes, classify the index.
//! Lookup structures are built once at construction, never per call.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{Question, ResponseSet, VersionSnapshot};
use crate::decision::{EngineOutput, OutputMetadata};
use crate::scoring::{self, RuleResolver};

pub struct DecisionEngine {
    snapshot: Arc<VersionSnapshot>,
    /// Active category id -> indices of its active questions, in
    /// configuration order.
    questions_by_category: HashMap<String, Vec<usize>>,
    question_index: HashMap<String, usize>,
    resolver: RuleResolver,
}

impl DecisionEngine {
    pub fn new(snapshot: Arc<VersionSnapshot>) -> Self {
        let mut questions_by_category: HashMap<String, Vec<usize>> = snapshot
            .categories
            .iter()
            .filter(|c| c.active)
            .map(|c| (c.id.clone(), Vec::new()))
            .collect();

        let mut question_index = HashMap::with_capacity(snapshot.questions.len());
        for (idx, question) in snapshot.questions.iter().enumerate() {
            question_index.insert(question.id.clone(), idx);
            if !question.active {
                continue;
            }
            if let Some(bucket) = questions_by_category.get_mut(&question.category_id) {
                bucket.push(idx);
            }
        }

        let resolver = RuleResolver::new(&snapshot.conditional_rules);

        Self {
            snapshot,
            questions_by_category,
            question_index,
            resolver,
        }
    }

    pub fn snapshot(&self) -> &VersionSnapshot {
        &self.snapshot
    }

    /// Score one response set against this snapshot.
    ///
    /// Unknown question ids are tolerated: they pass through the resolver,
    /// count toward `totalAnswered`, and score nothing.
    pub fn compute(&self, responses: &ResponseSet) -> EngineOutput {
        // 1) Conditional rules prune responses and collect weight overrides.
        let resolved = self.resolver.resolve(responses);

        // 2) Per-category aggregation over the pruned set.
        let breakdown =
            scoring::category_breakdown(&self.snapshot, &self.questions_by_category, &resolved);

        // 3) Composite both axes and classify the (unrounded) index.
        let config = &self.snapshot.scoring_config;
        let (improve_score, move_score) = scoring::composite(&breakdown, config);
        let index = improve_score - move_score;
        let decision = scoring::decide(index, config);
        let lean = scoring::lean(index, config);
        let in_zone = scoring::in_neutral_zone(index, config);

        debug!(
            target: "scoring",
            version = self.snapshot.version,
            ?decision,
            ?lean,
            iterations = resolved.iterations,
            "decision computed"
        );

        // 4) Metadata counts reflect the post-resolution response set.
        let na_count = resolved
            .responses
            .iter()
            .filter(|(id, value)| {
                self.question(id)
                    .is_some_and(|q| q.is_na(value.as_deref()))
            })
            .count();
        let metadata = OutputMetadata::now(resolved.responses.len(), na_count);

        EngineOutput::rounded(
            improve_score,
            move_score,
            decision,
            lean,
            in_zone,
            breakdown,
            metadata,
        )
    }

    fn question(&self, id: &str) -> Option<&Question> {
        self.question_index
            .get(id)
            .map(|&idx| &self.snapshot.questions[idx])
    }
}

/// One-shot convenience for callers holding a bare snapshot. Builds a
/// throwaway engine; hold a `DecisionEngine` when scoring repeatedly.
pub fn compute_decision(snapshot: &VersionSnapshot, responses: &ResponseSet) -> EngineOutput {
    DecisionEngine::new(Arc::new(snapshot.clone())).compute(responses)
}
