use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use triage_ai::config::AppConfig;
use triage_ai::error::AppError;
use triage_ai::telemetry;
use triage_ai::triage::{CallTriageService, CommandTranscriber, SymphoniaFrontEnd};

pub(crate) type TriageService = CallTriageService<SymphoniaFrontEnd, CommandTranscriber>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads configuration and installs logging. Every command starts here.
pub(crate) fn bootstrap() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

/// Builds the audio pipeline. The speech model is loaded on first use, not
/// here.
pub(crate) fn triage_service(config: &AppConfig) -> Result<Arc<TriageService>, AppError> {
    config.ensure_dirs()?;
    Ok(Arc::new(CallTriageService::from_config(config)))
}
