use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&settings.telemetry().log_level));

    let builder = fmt().with_env_filter(filter).with_target(false);

    if settings.telemetry().json {
        builder
            .json()
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    } else {
        builder
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    }

    Ok(())
}

/// Applies the configured level to this crate and the HTTP trace layer; everything else stays at `warn`.
fn default_filter(level: &str) -> EnvFilter {
    let level = level.trim();
    let directives = format!("warn,kiemtra={level},tower_http={level}");
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn,kiemtra=info"))
}
