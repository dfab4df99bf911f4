// src/config/mod.rs
//! Versioned questionnaire snapshot: entity types, load-time integrity
//! validation, canonical fingerprint, and the built-in seed.
//!
//! The snapshot is read-only once an engine is built from it; integrity
//! problems are fatal here, never inside the scoring path.

pub mod store;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use anyhow::bail;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Raw answers keyed by question id. `None` carries a JSON null; a missing
/// key means the question was never answered.
pub type ResponseSet = HashMap<String, Option<String>>;

/// Sentinel string respondents submit for "not applicable".
pub const NA_SENTINEL: &str = "NA";

fn default_true() -> bool {
    true
}
fn default_weight() -> f64 {
    1.0
}
fn default_multiplier() -> f64 {
    1.0
}
fn default_version() -> u32 {
    1
}
fn default_neutral_zone_min() -> f64 {
    -0.5
}
fn default_neutral_zone_max() -> f64 {
    0.5
}
fn default_strong_lean() -> f64 {
    1.5
}
fn default_moderate_lean() -> f64 {
    0.75
}
fn default_slight_lean() -> f64 {
    0.3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_weight")]
    pub default_weight: f64,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", rename = "isActive")]
    pub active: bool,
}

/// Per-option score impact pair, used by dropdown and multiple-choice kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreImpact {
    pub improve: f64,
    #[serde(rename = "move")]
    pub move_: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub value: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_impact: Option<ScoreImpact>,
}

/// Question kind as a tagged variant so the normalizer can match
/// exhaustively instead of probing optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestionKind {
    #[serde(rename = "scale")]
    Scale {
        #[serde(rename = "scaleMin")]
        min: f64,
        #[serde(rename = "scaleMax")]
        max: f64,
    },
    #[serde(rename = "dropdown")]
    Dropdown {
        #[serde(default)]
        options: Vec<AnswerOption>,
    },
    #[serde(rename = "numeric")]
    Numeric,
    #[serde(rename = "yesno")]
    YesNo,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "multiple_choice")]
    MultipleChoice {
        #[serde(default)]
        options: Vec<AnswerOption>,
    },
}

impl QuestionKind {
    /// Short name for logs and the /config summary.
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::Scale { .. } => "scale",
            QuestionKind::Dropdown { .. } => "dropdown",
            QuestionKind::Numeric => "numeric",
            QuestionKind::YesNo => "yesno",
            QuestionKind::Text => "text",
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub category_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(default, rename = "allowNA")]
    pub allow_na: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", rename = "isActive")]
    pub active: bool,
}

impl Question {
    /// True when the question allows NA and the value is the sentinel or null.
    /// Callers pass `None` for both null and never-answered.
    pub fn is_na(&self, value: Option<&str>) -> bool {
        if !self.allow_na {
            return false;
        }
        match value {
            None => true,
            Some(v) => v == NA_SENTINEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub improve_weight: f64,
    pub move_weight: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub reverse_scored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "in")]
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Hide,
    Disable,
    ZeroWeight,
    ChangeWeight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    #[serde(default)]
    pub id: String,
    pub if_question_id: String,
    pub operator: RuleOperator,
    /// Raw comparison operand; `in` expects a JSON array encoded as string.
    pub value: String,
    pub action: RuleAction,
    #[serde(default)]
    pub target_question_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_override: Option<f64>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", rename = "isActive")]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NaHandling {
    /// NA answers vanish from numerator and denominator.
    #[default]
    ExcludeFromDenominator,
    /// NA answers score 0 but still count in the denominator.
    TreatAsNeutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    #[serde(default = "default_true")]
    pub equal_weighting: bool,
    #[serde(default = "default_neutral_zone_min")]
    pub neutral_zone_min: f64,
    #[serde(default = "default_neutral_zone_max")]
    pub neutral_zone_max: f64,
    #[serde(default = "default_strong_lean")]
    pub strong_lean_threshold: f64,
    #[serde(default = "default_moderate_lean")]
    pub moderate_lean_threshold: f64,
    #[serde(default = "default_slight_lean")]
    pub slight_lean_threshold: f64,
    #[serde(default)]
    pub na_handling: NaHandling,
}

/// One immutable questionnaire version, as exported by the admin side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_true", rename = "isActive")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub categories: Vec<Category>,
    pub questions: Vec<Question>,
    /// BTreeMap keeps the canonical JSON (and the fingerprint) deterministic.
    #[serde(default)]
    pub question_scoring: BTreeMap<String, ScoringWeights>,
    #[serde(default)]
    pub conditional_rules: Vec<ConditionalRule>,
    pub scoring_config: ScoringConfig,
}

impl VersionSnapshot {
    /// Referential and range checks. Fatal before an engine is built;
    /// the scoring path assumes a snapshot that passed here.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut cat_ids: HashSet<&str> = HashSet::new();
        for c in &self.categories {
            if !cat_ids.insert(c.id.as_str()) {
                bail!("duplicate category id `{}`", c.id);
            }
            if !(c.default_weight > 0.0) {
                bail!(
                    "category `{}` defaultWeight must be positive, got {}",
                    c.id,
                    c.default_weight
                );
            }
        }

        let active_cats: HashSet<&str> = self
            .categories
            .iter()
            .filter(|c| c.active)
            .map(|c| c.id.as_str())
            .collect();

        let mut q_ids: HashSet<&str> = HashSet::new();
        for q in &self.questions {
            if !q_ids.insert(q.id.as_str()) {
                bail!("duplicate question id `{}`", q.id);
            }
            if !cat_ids.contains(q.category_id.as_str()) {
                bail!(
                    "question `{}` references unknown category `{}`",
                    q.id,
                    q.category_id
                );
            }
            if q.active && !active_cats.contains(q.category_id.as_str()) {
                bail!(
                    "question `{}` references inactive category `{}`",
                    q.id,
                    q.category_id
                );
            }
            if let QuestionKind::Scale { min, max } = q.kind {
                if !(max > min) {
                    bail!(
                        "question `{}` has invalid scale bounds: min {} max {}",
                        q.id,
                        min,
                        max
                    );
                }
            }
        }

        for (qid, w) in &self.question_scoring {
            if !q_ids.contains(qid.as_str()) {
                bail!("scoring entry references unknown question `{}`", qid);
            }
            if w.improve_weight < 0.0 || w.move_weight < 0.0 {
                bail!("scoring for `{}` has negative axis weight", qid);
            }
        }

        let sc = &self.scoring_config;
        if sc.neutral_zone_min > sc.neutral_zone_max {
            bail!(
                "neutral zone inverted: min {} > max {}",
                sc.neutral_zone_min,
                sc.neutral_zone_max
            );
        }
        let ordered = sc.strong_lean_threshold >= sc.moderate_lean_threshold
            && sc.moderate_lean_threshold >= sc.slight_lean_threshold
            && sc.slight_lean_threshold >= 0.0;
        if !ordered {
            bail!(
                "lean thresholds must satisfy strong >= moderate >= slight >= 0 (got {}/{}/{})",
                sc.strong_lean_threshold,
                sc.moderate_lean_threshold,
                sc.slight_lean_threshold
            );
        }

        Ok(())
    }

    /// Short hex fingerprint of the canonical JSON form. Logged at load and
    /// exposed via /config so operators can tell versions apart without
    /// diffing files.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

static SEED: Lazy<Arc<VersionSnapshot>> = Lazy::new(|| {
    let raw = include_str!("../../config/questionnaire.json");
    let snap: VersionSnapshot =
        serde_json::from_str(raw).expect("built-in questionnaire seed parses");
    snap.validate()
        .expect("built-in questionnaire seed is internally consistent");
    Arc::new(snap)
});

/// Built-in demo questionnaire, used as fallback when no config file exists.
pub fn seed() -> Arc<VersionSnapshot> {
    SEED.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_snapshot() -> VersionSnapshot {
        serde_json::from_value(serde_json::json!({
            "version": 3,
            "isActive": true,
            "categories": [
                {"id": "c1", "name": "quick_diagnosis", "defaultWeight": 0.5},
                {"id": "c2", "name": "financial", "defaultWeight": 1.0}
            ],
            "questions": [
                {"id": "q1", "categoryId": "c1", "type": "scale", "scaleMin": 1, "scaleMax": 10},
                {"id": "q2", "categoryId": "c2", "type": "yesno", "allowNA": true},
                {"id": "q3", "categoryId": "c2", "type": "dropdown", "options": [
                    {"value": "urgent", "label": "Urgent", "scoreImpact": {"improve": -0.5, "move": 1.0}}
                ]}
            ],
            "questionScoring": {
                "q1": {"improveWeight": 1.0, "moveWeight": 0.0},
                "q2": {"improveWeight": 0.0, "moveWeight": 1.0, "multiplier": 2.0, "reverseScored": true}
            },
            "conditionalRules": [
                {"ifQuestionId": "q2", "operator": "==", "value": "yes", "action": "hide",
                 "targetQuestionIds": ["q3"]}
            ],
            "scoringConfig": {"equalWeighting": true, "neutralZoneMin": -0.5, "neutralZoneMax": 0.5,
                "strongLeanThreshold": 1.5, "moderateLeanThreshold": 0.75, "slightLeanThreshold": 0.3,
                "naHandling": "exclude_from_denominator"}
        }))
        .expect("test snapshot parses")
    }

    #[test]
    fn parses_tagged_question_kinds() {
        let snap = minimal_snapshot();
        assert!(matches!(
            snap.questions[0].kind,
            QuestionKind::Scale { min, max } if min == 1.0 && max == 10.0
        ));
        assert!(matches!(snap.questions[1].kind, QuestionKind::YesNo));
        match &snap.questions[2].kind {
            QuestionKind::Dropdown { options } => {
                assert_eq!(options[0].value, "urgent");
                let imp = options[0].score_impact.expect("impact pair");
                assert_eq!(imp.move_, 1.0);
            }
            other => panic!("expected dropdown, got {:?}", other),
        }
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn validate_rejects_dangling_category() {
        let mut snap = minimal_snapshot();
        snap.questions[0].category_id = "nope".to_string();
        let err = snap.validate().unwrap_err().to_string();
        assert!(err.contains("unknown category"), "got: {err}");
    }

    #[test]
    fn validate_rejects_inactive_category_for_active_question() {
        let mut snap = minimal_snapshot();
        snap.categories[0].active = false;
        let err = snap.validate().unwrap_err().to_string();
        assert!(err.contains("inactive category"), "got: {err}");
    }

    #[test]
    fn validate_rejects_dangling_scoring_entry() {
        let mut snap = minimal_snapshot();
        snap.question_scoring.insert(
            "ghost".to_string(),
            ScoringWeights {
                improve_weight: 1.0,
                move_weight: 1.0,
                multiplier: 1.0,
                reverse_scored: false,
            },
        );
        let err = snap.validate().unwrap_err().to_string();
        assert!(err.contains("unknown question"), "got: {err}");
    }

    #[test]
    fn validate_rejects_inverted_zone_and_thresholds() {
        let mut snap = minimal_snapshot();
        snap.scoring_config.neutral_zone_min = 0.6;
        assert!(snap.validate().is_err());

        let mut snap = minimal_snapshot();
        snap.scoring_config.moderate_lean_threshold = 2.0; // above strong
        assert!(snap.validate().is_err());
    }

    #[test]
    fn validate_rejects_degenerate_scale() {
        let mut snap = minimal_snapshot();
        snap.questions[0].kind = QuestionKind::Scale { min: 5.0, max: 5.0 };
        let err = snap.validate().unwrap_err().to_string();
        assert!(err.contains("scale bounds"), "got: {err}");
    }

    #[test]
    fn na_detection_respects_allow_flag() {
        let snap = minimal_snapshot();
        let q1 = &snap.questions[0]; // allowNA = false
        let q2 = &snap.questions[1]; // allowNA = true
        assert!(!q1.is_na(Some(NA_SENTINEL)));
        assert!(!q1.is_na(None));
        assert!(q2.is_na(Some(NA_SENTINEL)));
        assert!(q2.is_na(None));
        assert!(!q2.is_na(Some("yes")));
    }

    #[test]
    fn fingerprint_is_stable_and_version_sensitive() {
        let a = minimal_snapshot();
        let b = minimal_snapshot();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 12);

        let mut c = minimal_snapshot();
        c.version = 4;
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn seed_is_valid_and_active() {
        let s = seed();
        assert!(s.active);
        assert!(!s.categories.is_empty());
        assert!(!s.questions.is_empty());
        assert!(s.validate().is_ok());
    }
}
