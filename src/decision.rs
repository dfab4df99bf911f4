//! decision.rs — Struktury pro výsledek vyhodnocení dotazníku: rozhodnutí
//! (Improve/Move/Unclear), síla náklonu (lean), rozpad po kategoriích a metadata výpočtu.
//!
//! Cíl: jeden standardizovaný výstup pro API, historii i testy — dvě osy skóre,
//! jejich index a kategorie, aby šlo později snadno přidat doporučení a metriky.
//!
//! Pozn.: JSON tvar drží camelCase klíče původního datového modelu
//! (improveScore, categoryBreakdown, totalAnswered, ...).

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Výsledné rozhodnutí dotazníku.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Improve,
    Move,
    Unclear,
}

/// Síla náklonu podle |decisionIndex| vůči prahům v konfiguraci.
/// Záměrně nezávislá na neutrální zóně — i "Unclear" rozhodnutí může mít
/// nenulový náklon, pokud jsou prahy užší než zóna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeanStrength {
    Strong,
    Moderate,
    Slight,
    Unclear,
}

/// Agregát jedné kategorie: průměrné skóre obou os, počet započtených otázek
/// a váha kategorie pro kompozit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub improve: f64,
    /// "move" je v Rustu klíčové slovo, na drátě zůstává beze změny.
    #[serde(rename = "move")]
    pub move_: f64,
    pub count: usize,
    pub weight: f64,
}

impl CategoryScore {
    pub fn new(improve: f64, move_: f64, count: usize, weight: f64) -> Self {
        Self {
            improve,
            move_,
            count,
            weight,
        }
    }

    /// Prázdná kategorie (bez zodpovězených otázek) — nese jen svou váhu.
    pub fn empty(weight: f64) -> Self {
        Self::new(0.0, 0.0, 0, weight)
    }
}

/// Metadata jednoho výpočtu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetadata {
    /// Počet odpovědí, které prošly rule-resolverem (včetně NA).
    pub total_answered: usize,
    pub na_count: usize,
    /// ISO 8601, zachyceno v okamžiku výpočtu.
    pub timestamp: String,
}

impl OutputMetadata {
    pub fn now(total_answered: usize, na_count: usize) -> Self {
        Self {
            total_answered,
            na_count,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Kompletní výstup engine — derivuje se čerstvě při každém volání,
/// v konfiguraci se nic nemutuje ani necachuje.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOutput {
    pub improve_score: f64,
    pub move_score: f64,
    pub decision_index: f64,
    pub decision: Decision,
    pub lean: LeanStrength,
    pub in_neutral_zone: bool,
    /// Klíčem je id kategorie.
    pub category_breakdown: HashMap<String, CategoryScore>,
    pub metadata: OutputMetadata,
}

impl EngineOutput {
    /// Sestaví výstup ze syrových (nezaokrouhlených) hodnot; zaokrouhlení
    /// na 4 desetinná místa se děje až tady, klasifikace probíhá dříve
    /// nad nezaokrouhleným indexem.
    pub fn rounded(
        improve_score: f64,
        move_score: f64,
        decision: Decision,
        lean: LeanStrength,
        in_neutral_zone: bool,
        category_breakdown: HashMap<String, CategoryScore>,
        metadata: OutputMetadata,
    ) -> Self {
        let decision_index = improve_score - move_score;
        Self {
            improve_score: round4(improve_score),
            move_score: round4(move_score),
            decision_index: round4(decision_index),
            decision,
            lean,
            in_neutral_zone,
            category_breakdown,
            metadata,
        }
    }
}

/// Zaokrouhlení na 4 desetinná místa (tvar výstupu pro klienty).
pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_output_shape_matches_data_model() {
        let mut breakdown = HashMap::new();
        breakdown.insert(
            "location_lifestyle".to_string(),
            CategoryScore::new(0.75, -0.25, 3, 1.0),
        );

        let out = EngineOutput::rounded(
            0.61237,
            -0.14142,
            Decision::Improve,
            LeanStrength::Moderate,
            false,
            breakdown,
            OutputMetadata {
                total_answered: 4,
                na_count: 1,
                timestamp: "2025-08-16T10:00:00Z".to_string(),
            },
        );

        let v = serde_json::to_value(&out).unwrap();

        // Klíčové klíče podle datového modelu
        assert_eq!(v["decision"], serde_json::json!("Improve"));
        assert_eq!(v["lean"], serde_json::json!("Moderate"));
        assert_eq!(v["inNeutralZone"], serde_json::json!(false));

        // Zaokrouhlení na 4 desetinná místa
        let improve = v["improveScore"].as_f64().unwrap();
        assert!((improve - 0.6124).abs() < 1e-9, "got {}", improve);
        let index = v["decisionIndex"].as_f64().unwrap();
        assert!((index - 0.7538).abs() < 1e-9, "got {}", index);

        // Rozpad po kategoriích drží klíč "move" i přes klíčové slovo v Rustu
        let cat = &v["categoryBreakdown"]["location_lifestyle"];
        assert_eq!(cat["move"], serde_json::json!(-0.25));
        assert_eq!(cat["count"], serde_json::json!(3));

        // Metadata
        assert_eq!(v["metadata"]["totalAnswered"], serde_json::json!(4));
        assert_eq!(v["metadata"]["naCount"], serde_json::json!(1));
        assert!(v["metadata"]["timestamp"].is_string());
    }

    #[test]
    fn round4_behaves_at_ties_and_negatives() {
        assert_eq!(round4(0.123449), 0.1234);
        assert_eq!(round4(0.123451), 0.1235);
        assert_eq!(round4(-0.333333333), -0.3333);
        assert_eq!(round4(0.0), 0.0);
    }

    #[test]
    fn metadata_now_produces_rfc3339() {
        let m = OutputMetadata::now(2, 0);
        assert_eq!(m.total_answered, 2);
        assert!(chrono::DateTime::parse_from_rfc3339(&m.timestamp).is_ok());
    }
}
