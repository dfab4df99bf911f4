use std::time::Duration;

use axum::{routing::get, Router};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::decision::Decision;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "decision_requests_total",
            "Total decision computations served."
        );
        describe_counter!(
            "decision_outcomes_total",
            "Decision computations by resulting decision."
        );
        describe_counter!(
            "questionnaire_reloads_total",
            "Successful questionnaire config reloads."
        );
        describe_histogram!(
            "decision_duration_ms",
            "Decision computation time in milliseconds."
        );
        describe_gauge!(
            "questionnaire_active_version",
            "Version number of the active questionnaire snapshot."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize Prometheus recorder and expose a static gauge with the
    /// active snapshot version.
    pub fn init(active_version: u32) -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();
        gauge!("questionnaire_active_version").set(active_version as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Per-computation recording; a no-op unless a recorder is installed.
pub fn record_decision(decision: Decision, elapsed: Duration) {
    ensure_metrics_described();
    counter!("decision_requests_total").increment(1);
    counter!("decision_outcomes_total", "decision" => decision_label(decision)).increment(1);
    histogram!("decision_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
}

pub fn record_reload() {
    counter!("questionnaire_reloads_total").increment(1);
}

/// Keeps the version gauge honest across reloads and hot swaps.
pub fn set_active_version(version: u32) {
    gauge!("questionnaire_active_version").set(version as f64);
}

fn decision_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Improve => "Improve",
        Decision::Move => "Move",
        Decision::Unclear => "Unclear",
    }
}
