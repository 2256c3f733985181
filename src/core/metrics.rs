use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::db::types::ShuffleMode;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_exam_upload(channel: &'static str) {
    metrics::counter!("exam_uploads_total", "channel" => channel).increment(1);
}

pub(crate) fn record_runtime_variant(p1_mode: ShuffleMode) {
    metrics::counter!("runtime_variants_total", "p1_mode" => p1_mode.as_str()).increment(1);
}

pub(crate) fn record_submission_graded(graded: bool) {
    let outcome = if graded { "graded" } else { "ungraded" };
    metrics::counter!("submissions_graded_total", "outcome" => outcome).increment(1);
}
