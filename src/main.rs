//! Questionnaire Decision Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.
//!
//! See `README.md` for quickstart and `DESIGN.md` for architecture notes.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use move_improve_engine::api::{self, AppState};
use move_improve_engine::config::store::{start_hot_reload_thread, FileSnapshotStore};
use move_improve_engine::config::{self, VersionSnapshot};
use move_improve_engine::engine::DecisionEngine;
use move_improve_engine::metrics::Metrics;
use move_improve_engine::{EngineHandle, SnapshotStore};

/// Compact tracing init. The default filter stays at info; setting
/// QUESTIONNAIRE_DEV_LOG=1 in a dev environment (debug build OR APP_ENV in
/// {local, development, dev}) widens it to scoring-level debug. RUST_LOG
/// overrides everything.
fn init_tracing() {
    let dev_flag = std::env::var("QUESTIONNAIRE_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("APP_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    let default_filter = if dev_flag && is_dev_env {
        "questionnaire=debug,scoring=debug,info"
    } else {
        "questionnaire=info,scoring=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Active snapshot for boot: the configured file when present, the built-in
/// seed otherwise. A config path pointed at explicitly but broken stays
/// fatal (no silent fallback over operator intent).
async fn boot_snapshot(store: &FileSnapshotStore) -> anyhow::Result<Arc<VersionSnapshot>> {
    if store.path().exists() {
        return store.load_active().await;
    }
    warn!(
        target: "questionnaire",
        path = %store.path().display(),
        "questionnaire config missing, using built-in seed"
    );
    Ok(config::seed())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let store = FileSnapshotStore::from_env()?;
    let snapshot = boot_snapshot(&store).await?;
    info!(
        target: "questionnaire",
        version = snapshot.version,
        fingerprint = %snapshot.fingerprint(),
        "active questionnaire version selected"
    );

    let handle = EngineHandle::new(DecisionEngine::new(snapshot.clone()));
    let metrics = Metrics::init(snapshot.version);

    // If hot reload is enabled, spawn the background watcher.
    start_hot_reload_thread(handle.clone(), store.path().to_path_buf());

    let state = AppState::new(handle);
    let router = api::create_router(state).merge(metrics.router());

    let addr = std::env::var("QUESTIONNAIRE_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(target: "questionnaire", %addr, "decision service listening");
    axum::serve(listener, router).await?;

    Ok(())
}
