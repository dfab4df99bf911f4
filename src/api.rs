use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::store::{EngineHandle, FileSnapshotStore};
use crate::config::ResponseSet;
use crate::decision::EngineOutput;
use crate::history::{History, HistoryEntry};
use crate::metrics;
use crate::recommend::{recommend, Recommendation};

#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub history: Arc<History>,
}

impl AppState {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            history: Arc::new(History::with_capacity(2000)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/decide", post(decide))
        .route("/config", get(config_summary))
        .route("/debug/history", get(debug_history))
        .route("/admin/reload-config", get(admin_reload_config))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct DecideReq {
    // id otázky -> syrová odpověď; null i chybějící klíč znamenají „bez odpovědi".
    #[serde(default)]
    answers: ResponseSet,
}

#[derive(serde::Serialize)]
struct DecideResp {
    #[serde(flatten)]
    output: EngineOutput,
    recommendation: Recommendation,
}

async fn decide(State(state): State<AppState>, Json(body): Json<DecideReq>) -> Json<DecideResp> {
    let started = Instant::now();

    let engine = state.engine.engine();
    let output = engine.compute(&body.answers);

    metrics::record_decision(output.decision, started.elapsed());
    state.history.push(&output);

    let recommendation = recommend(output.decision, output.lean);
    Json(DecideResp {
        output,
        recommendation,
    })
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigSummary {
    version: u32,
    fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    categories: usize,
    questions: usize,
    scored_questions: usize,
    conditional_rules: usize,
}

/// Shape summary of the active snapshot; enough for operators to tell
/// versions apart without exposing the full questionnaire.
async fn config_summary(State(state): State<AppState>) -> Json<ConfigSummary> {
    let engine = state.engine.engine();
    let snap = engine.snapshot();
    Json(ConfigSummary {
        version: snap.version,
        fingerprint: snap.fingerprint(),
        description: snap.description.clone(),
        categories: snap.categories.iter().filter(|c| c.active).count(),
        questions: snap.questions.iter().filter(|q| q.active).count(),
        scored_questions: snap.question_scoring.len(),
        conditional_rules: snap.conditional_rules.iter().filter(|r| r.active).count(),
    })
}

async fn debug_history(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Vec<HistoryEntry>> {
    let n = q.get("n").and_then(|v| v.parse().ok()).unwrap_or(10);
    Json(state.history.snapshot_last_n(n))
}

async fn admin_reload_config(State(state): State<AppState>) -> String {
    let store = match FileSnapshotStore::from_env() {
        Ok(s) => s,
        Err(e) => return format!("failed: {e:#}"),
    };
    match state.engine.reload_from(&store).await {
        Ok(snapshot) => {
            metrics::set_active_version(snapshot.version);
            metrics::record_reload();
            format!(
                "reloaded: version {} ({})",
                snapshot.version,
                snapshot.fingerprint()
            )
        }
        Err(e) => format!("failed: {e:#}"),
    }
}
