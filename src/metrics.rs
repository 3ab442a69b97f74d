//! Prometheus wiring for the pipeline counters.
//!
//! The summarizer always emits through the `metrics` facade; without an
//! installed recorder those calls are no-ops. `Metrics::init` installs the
//! Prometheus recorder once per process and `render` returns the exposition text.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const POSTS_KEPT_TOTAL: &str = "pipeline_posts_kept_total";
pub const POSTS_DROPPED_TOTAL: &str = "pipeline_posts_dropped_total";
pub const RUNS_TOTAL: &str = "pipeline_runs_total";
pub const LAST_RISK_INDICATOR: &str = "pipeline_last_risk_indicator";
pub const RUN_MS: &str = "pipeline_run_ms";

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Later calls hand back the same handle.
    pub fn init() -> Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| -> Result<PrometheusHandle> {
                // Default buckets; histograms render as summaries.
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")?;
                describe_pipeline_metrics();
                Ok(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// HELP text for the pipeline series; must run after the recorder is installed.
fn describe_pipeline_metrics() {
    describe_counter!(POSTS_KEPT_TOTAL, "Posts that survived cleaning.");
    describe_counter!(
        POSTS_DROPPED_TOTAL,
        "Records dropped by the cleaner or undecodable at the boundary."
    );
    describe_counter!(RUNS_TOTAL, "Completed weekly analysis runs.");
    describe_gauge!(
        LAST_RISK_INDICATOR,
        "Heuristic misinformation-risk indicator of the last run."
    );
    describe_histogram!(RUN_MS, "Wall time of one analysis run in milliseconds.");
}
