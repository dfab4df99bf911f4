// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod decision;
pub mod engine;
pub mod history;
pub mod metrics;
pub mod recommend;
pub mod scoring;

// ---- Re-exports for stable public API ----
// Pohodlný přístup k sestavení routeru: `crate_root::api::create_router` i
// `crate_root::create_router`
pub use crate::api::{create_router, AppState};
pub use crate::config::store::{EngineHandle, FileSnapshotStore, SnapshotStore};
pub use crate::config::{ResponseSet, VersionSnapshot};
pub use crate::decision::{Decision, EngineOutput, LeanStrength};
pub use crate::engine::{compute_decision, DecisionEngine};
pub use crate::recommend::{recommend, Recommendation};
