//! Demo that runs a few canned response sets through the decision engine
//! and prints the results as JSON (uses the built-in seed questionnaire when
//! no config file is around).

use move_improve_engine::config::{self, ResponseSet};
use move_improve_engine::engine::DecisionEngine;
use move_improve_engine::recommend::recommend;
use move_improve_engine::{FileSnapshotStore, SnapshotStore};

fn answers(pairs: &[(&str, &str)]) -> ResponseSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let store = FileSnapshotStore::from_env()?;
    let snapshot = if store.path().exists() {
        store.load_active().await?
    } else {
        config::seed()
    };
    println!(
        "questionnaire version {} ({})\n",
        snapshot.version,
        snapshot.fingerprint()
    );
    let engine = DecisionEngine::new(snapshot);

    let scenarios: Vec<(&str, ResponseSet)> = vec![
        (
            "settled homeowner, fixable frustrations",
            answers(&[
                ("qd_primary_reason", "floor_plan"),
                ("qd_years_in_home", "12"),
                ("loc_neighborhood_safety", "9"),
                ("loc_commute_satisfaction", "8"),
                ("loc_floor_plan_fixable", "yes"),
                ("loc_hoa_restrictions", "no"),
                ("tsd_renovation_tolerance", "8"),
                ("tsd_timeline_urgency", "flexible"),
                ("tsd_disruptions_acceptable", r#"["dust","noise"]"#),
                ("fin_reno_budget_fits", "yes"),
                ("fin_reno_roi", "8"),
            ]),
        ),
        (
            "location misfit, moving anyway",
            answers(&[
                ("qd_primary_reason", "move_anyway"),
                ("loc_neighborhood_safety", "2"),
                ("loc_commute_satisfaction", "2"),
                ("loc_floor_plan_fixable", "no"),
                ("loc_hoa_restrictions", "yes"),
                ("tsd_renovation_tolerance", "3"),
                ("tsd_timeline_urgency", "asap"),
                ("fin_reno_budget_fits", "no"),
                ("fin_market_healthy", "yes"),
                // Hidden by the move_anyway rule before scoring.
                ("fin_reno_roi", "2"),
            ]),
        ),
        (
            "too early to tell",
            answers(&[
                ("qd_years_in_home", "3"),
                ("loc_neighborhood_safety", "6"),
                ("tsd_renovation_tolerance", "5"),
                ("fin_reno_roi", "NA"),
            ]),
        ),
    ];

    for (label, responses) in scenarios {
        let output = engine.compute(&responses);
        let guidance = recommend(output.decision, output.lean);
        println!("--- {label} ---");
        println!("{}", serde_json::to_string_pretty(&output)?);
        println!("recommendation: {}\n", serde_json::to_string(&guidance)?);
    }

    println!("score-demo done");
    Ok(())
}
