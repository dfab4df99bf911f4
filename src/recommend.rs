//! recommend.rs — Překlad dvojice (decision, lean) na doporučení pro
//! respondenta: stabilní klíč výsledku, titulek a doprovodný text.
//!
//! Čistý lookup bez konfigurace — texty doporučení jsou produktová kopie
//! verzovaná s kódem, ne s dotazníkem.

use serde::Serialize;

use crate::decision::{Decision, LeanStrength};

/// Guidance block attached to every /decide response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Stable key for analytics (strong_renovate, move_guardrails, ...).
    pub outcome: &'static str,
    pub label: &'static str,
    pub headline: &'static str,
    pub summary: &'static str,
    pub next_steps: &'static str,
}

const STRONG_RENOVATE: Recommendation = Recommendation {
    outcome: "strong_renovate",
    label: "Strong Renovate",
    headline: "Your Best Path: Renovate and Stay Put",
    summary: "Your situation strongly favors renovating. Your location and neighborhood \
              are working well; the issues you face are rooted in how the house functions \
              and how space flows, which thoughtful design and skilled construction can solve.",
    next_steps: "Define your non-negotiables, gather cost estimates, and schedule a \
                 consultation with a reputable design-build firm to explore feasibility.",
};

const RENOVATE_REFINE: Recommendation = Recommendation {
    outcome: "renovate_refine",
    label: "Renovate but Refine Your Plan",
    headline: "Your Best Path: Renovate and Stay Put",
    summary: "Renovation is the right direction, but you need a clearer plan. Focus on \
              prioritizing which renovations matter most and getting detailed quotes.",
    next_steps: "Rank the problems renovation must solve, get two or three detailed quotes, \
                 and pressure-test the budget before committing.",
};

const STRONG_MOVE: Recommendation = Recommendation {
    outcome: "strong_move",
    label: "Strong Move",
    headline: "Your Best Path: Plan a Move",
    summary: "Your situation strongly favors moving. Your biggest challenges are rooted in \
              factors renovation fundamentally cannot solve, such as location, commute or \
              property constraints. A move addresses the real issue.",
    next_steps: "Define your target home and neighborhood, calculate true costs including \
                 transaction expenses, and research inventory in your target area.",
};

const MOVE_GUARDRAILS: Recommendation = Recommendation {
    outcome: "move_guardrails",
    label: "Move but With Clear Guardrails",
    headline: "Your Best Path: Plan a Move",
    summary: "Moving makes sense, but success depends on careful execution. Establish clear \
              criteria for your new home and be disciplined in your search.",
    next_steps: "Write down the criteria a new home must meet, set a walk-away budget, and \
                 connect with a trusted real estate agent.",
};

const TRUE_FORK: Recommendation = Recommendation {
    outcome: "true_fork",
    label: "At a True Fork - Need More Information",
    headline: "You're at a True Fork in the Road",
    summary: "Both options have merit and your responses don't clearly favor either. Your \
              next step is removing uncertainty in one or two critical areas so the better \
              choice becomes clear.",
    next_steps: "Clarify your time horizon, resolve external uncertainties (job, schools, \
                 family), get professional cost estimates, and firm up your financial picture.",
};

const NOT_READY: Recommendation = Recommendation {
    outcome: "not_ready",
    label: "Not Ready to Decide Yet",
    headline: "You're at a True Fork in the Road",
    summary: "You may not have enough clarity or stability to make this decision right now. \
              Consider revisiting this assessment in 6-12 months when circumstances may be \
              clearer.",
    next_steps: "Note which questions you could not answer confidently and revisit once \
                 those unknowns settle.",
};

/// Lean splits each decision into its strong and tempered variant; an
/// Unclear decision with any detectable lean still reads as a fork, only a
/// leanless Unclear is "not ready".
pub fn recommend(decision: Decision, lean: LeanStrength) -> Recommendation {
    match (decision, lean) {
        (Decision::Improve, LeanStrength::Strong) => STRONG_RENOVATE,
        (Decision::Improve, _) => RENOVATE_REFINE,
        (Decision::Move, LeanStrength::Strong) => STRONG_MOVE,
        (Decision::Move, _) => MOVE_GUARDRAILS,
        (Decision::Unclear, LeanStrength::Unclear) => NOT_READY,
        (Decision::Unclear, _) => TRUE_FORK,
    }
}
