// src/config/store.rs
//! Snapshot loading and the shared engine handle.
//!
//! The file store reads TOML or JSON, picks the single active version and
//! validates it. `EngineHandle` swaps engines atomically so in-flight
//! computations keep the snapshot they started with; a polling watcher makes
//! local config edits visible without a restart (dev-gated).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::VersionSnapshot;
use crate::engine::DecisionEngine;

pub const ENV_CONFIG_PATH: &str = "QUESTIONNAIRE_CONFIG_PATH";
pub const ENV_HOT_RELOAD: &str = "QUESTIONNAIRE_HOT_RELOAD";
pub const DEFAULT_CONFIG_PATH: &str = "config/questionnaire.json";

/// Source of versioned snapshots. The file store is the only production
/// implementation; the trait keeps the admin/reload path testable.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load and validate the single active questionnaire version.
    async fn load_active(&self) -> Result<Arc<VersionSnapshot>>;

    fn name(&self) -> &'static str;
}

#[derive(Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the config path: $QUESTIONNAIRE_CONFIG_PATH wins (pointing it
    /// at a missing file is an error), otherwise the conventional default.
    /// A missing default is deferred to load time so boot can fall back to
    /// the built-in seed.
    pub fn from_env() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "QUESTIONNAIRE_CONFIG_PATH points to non-existent path"
                ));
            }
            return Ok(Self::new(pb));
        }
        Ok(Self::new(DEFAULT_CONFIG_PATH))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load_active(&self) -> Result<Arc<VersionSnapshot>> {
        Ok(Arc::new(load_snapshot_from(&self.path)?))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Load the active snapshot from an explicit path. Supports TOML or JSON,
/// holding either a single version or a `versions` list.
pub fn load_snapshot_from(path: &Path) -> Result<VersionSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading questionnaire config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let snapshot = pick_active(parse_versions(&content, ext.as_str())?)?;
    snapshot
        .validate()
        .with_context(|| format!("validating questionnaire config {}", path.display()))?;
    info!(
        target: "questionnaire",
        version = snapshot.version,
        fingerprint = %snapshot.fingerprint(),
        path = %path.display(),
        "questionnaire snapshot loaded"
    );
    Ok(snapshot)
}

fn parse_versions(s: &str, hint_ext: &str) -> Result<Vec<VersionSnapshot>> {
    #[derive(serde::Deserialize)]
    struct VersionsDoc {
        versions: Vec<VersionSnapshot>,
    }

    let try_toml = hint_ext == "toml";
    if try_toml {
        if let Ok(doc) = toml::from_str::<VersionsDoc>(s) {
            return Ok(doc.versions);
        }
        if let Ok(single) = toml::from_str::<VersionSnapshot>(s) {
            return Ok(vec![single]);
        }
    }
    if let Ok(many) = serde_json::from_str::<Vec<VersionSnapshot>>(s) {
        return Ok(many);
    }
    if let Ok(doc) = serde_json::from_str::<VersionsDoc>(s) {
        return Ok(doc.versions);
    }
    if let Ok(single) = serde_json::from_str::<VersionSnapshot>(s) {
        return Ok(vec![single]);
    }
    if !try_toml {
        if let Ok(doc) = toml::from_str::<VersionsDoc>(s) {
            return Ok(doc.versions);
        }
        if let Ok(single) = toml::from_str::<VersionSnapshot>(s) {
            return Ok(vec![single]);
        }
    }
    Err(anyhow!("unsupported questionnaire config format"))
}

/// Exactly one active version wins. Zero actives is the canonical
/// "no active questionnaire version found"; more than one is ambiguous.
fn pick_active(versions: Vec<VersionSnapshot>) -> Result<VersionSnapshot> {
    let mut active: Vec<VersionSnapshot> = versions.into_iter().filter(|v| v.active).collect();
    match active.len() {
        0 => Err(anyhow!("no active questionnaire version found")),
        1 => Ok(active.swap_remove(0)),
        n => Err(anyhow!(
            "expected exactly one active questionnaire version, found {n}"
        )),
    }
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// A threadsafe handle that can swap the underlying engine at runtime.
/// In-flight computations keep the `Arc` they cloned; new requests see the
/// new snapshot.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<RwLock<Arc<DecisionEngine>>>,
}

impl EngineHandle {
    pub fn new(engine: DecisionEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(engine))),
        }
    }

    /// Current engine; holds the lock only for the Arc clone.
    pub fn engine(&self) -> Arc<DecisionEngine> {
        self.inner.read().expect("rwlock poisoned").clone()
    }

    pub fn replace(&self, engine: DecisionEngine) {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        *guard = Arc::new(engine);
    }

    /// Load from the store and swap; returns the new snapshot so callers can
    /// log/report the version they activated.
    pub async fn reload_from(&self, store: &dyn SnapshotStore) -> Result<Arc<VersionSnapshot>> {
        let snapshot = store.load_active().await?;
        self.replace(DecisionEngine::new(snapshot.clone()));
        Ok(snapshot)
    }
}

/// Returns true if we should enable hot reload (dev/local only).
/// Enable by setting QUESTIONNAIRE_HOT_RELOAD=1; gated on a debug build or
/// APP_ENV in {local, development, dev}.
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("APP_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Start a simple polling watcher on `path` that reloads into `handle`.
/// Polls mtime every 2s. Uses only std, no external deps. A file that fails
/// to parse or validate is skipped; the running engine stays untouched.
pub fn start_hot_reload_thread(handle: EngineHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => {
                    let changed = match last_mtime {
                        None => {
                            last_mtime = Some(mtime);
                            false
                        }
                        Some(prev) => mtime > prev,
                    };
                    if changed {
                        match load_snapshot_from(&path) {
                            Ok(snapshot) => {
                                let version = snapshot.version;
                                handle.replace(DecisionEngine::new(Arc::new(snapshot)));
                                crate::metrics::set_active_version(version);
                                info!(
                                    target: "questionnaire",
                                    version,
                                    "hot-reloaded questionnaire config"
                                );
                            }
                            Err(e) => {
                                warn!(
                                    target: "questionnaire",
                                    error = %format!("{e:#}"),
                                    "hot reload skipped, keeping current engine"
                                );
                            }
                        }
                        last_mtime = Some(mtime);
                    }
                }
                Err(_) => {
                    // File missing or unreadable; keep trying.
                }
            }
            thread::sleep(poll);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_json(active: bool) -> String {
        serde_json::json!({
            "version": 2,
            "isActive": active,
            "categories": [{"id": "c1", "name": "general", "defaultWeight": 1.0}],
            "questions": [{"id": "q1", "categoryId": "c1", "type": "yesno"}],
            "questionScoring": {"q1": {"improveWeight": 1.0, "moveWeight": 0.0}},
            "scoringConfig": {"equalWeighting": true}
        })
        .to_string()
    }

    #[test]
    fn parses_single_json_snapshot() {
        let versions = parse_versions(&single_json(true), "json").unwrap();
        assert_eq!(versions.len(), 1);
        let snap = pick_active(versions).unwrap();
        assert_eq!(snap.version, 2);
    }

    #[test]
    fn parses_json_version_array_and_picks_active() {
        let doc = format!("[{}, {}]", single_json(false), {
            let mut v: serde_json::Value = serde_json::from_str(&single_json(true)).unwrap();
            v["version"] = serde_json::json!(3);
            v.to_string()
        });
        let snap = pick_active(parse_versions(&doc, "json").unwrap()).unwrap();
        assert_eq!(snap.version, 3);
    }

    #[test]
    fn zero_active_versions_is_the_canonical_error() {
        let err = pick_active(parse_versions(&single_json(false), "json").unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "no active questionnaire version found");
    }

    #[test]
    fn multiple_active_versions_are_rejected() {
        let doc = format!("[{}, {}]", single_json(true), single_json(true));
        let err = pick_active(parse_versions(&doc, "json").unwrap()).unwrap_err();
        assert!(
            err.to_string().contains("exactly one active"),
            "got: {err}"
        );
    }

    #[test]
    fn parses_toml_versions_doc() {
        let doc = r#"
[[versions]]
version = 5
isActive = true

[[versions.categories]]
id = "c1"
name = "general"
defaultWeight = 1.0

[[versions.questions]]
id = "q1"
categoryId = "c1"
type = "yesno"

[versions.questionScoring.q1]
improveWeight = 1.0
moveWeight = 0.0

[versions.scoringConfig]
equalWeighting = true
"#;
        let snap = pick_active(parse_versions(doc, "toml").unwrap()).unwrap();
        assert_eq!(snap.version, 5);
        assert_eq!(snap.questions.len(), 1);
    }

    #[test]
    fn engine_handle_swaps_atomically() {
        let versions = parse_versions(&single_json(true), "json").unwrap();
        let snap = pick_active(versions).unwrap();
        let handle = EngineHandle::new(DecisionEngine::new(Arc::new(snap.clone())));

        let before = handle.engine();
        assert_eq!(before.snapshot().version, 2);

        let mut next = snap;
        next.version = 9;
        handle.replace(DecisionEngine::new(Arc::new(next)));

        // The old Arc is still usable; new readers see the new version.
        assert_eq!(before.snapshot().version, 2);
        assert_eq!(handle.engine().snapshot().version, 9);
    }
}
