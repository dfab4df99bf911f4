//! history.rs — jednoduché in-memory logování posledních vyhodnocení pro
//! /debug/history a ruční diagnostiku. Nic se nepersistuje.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::decision::{Decision, EngineOutput, LeanStrength};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub ts_unix: u64,
    pub decision: Decision,
    pub lean: LeanStrength,
    pub decision_index: f64,
    // stručný „otisk" vstupu pro rychlou diagnostiku:
    pub total_answered: usize,
    pub na_count: usize,
}

#[derive(Debug)]
pub struct History {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, out: &EngineOutput) {
        let entry = HistoryEntry {
            ts_unix: now_unix(),
            decision: out.decision,
            lean: out.lean,
            decision_index: out.decision_index,
            total_answered: out.metadata.total_answered,
            na_count: out.metadata.na_count,
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let len = v.len();
        let start = len.saturating_sub(n);
        v[start..].to_vec()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
