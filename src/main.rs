use anomaly_detector::app_context::AppContext;
use anomaly_detector::config::{Config, ConfigError, config_path_from_env, load_config};
use anomaly_detector::jobs::start_ingest_job;
use tracing_subscriber::EnvFilter;

fn init_json_logging() {
    if let Err(error) = tracing_log::LogTracer::init() {
        eprintln!(
            "logging bridge initialization failed (continuing with existing logger): {}",
            error
        );
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("global logger initialization failed: {}", error);
    }
}

fn resolve_config() -> Result<Config, ConfigError> {
    let path = config_path_from_env();
    if !path.exists() {
        log::warn!(
            "config_missing path={} action=using_builtin_defaults",
            path.display()
        );
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }
    load_config(&path)
}

#[tokio::main]
async fn main() {
    init_json_logging();

    let config = match resolve_config() {
        Ok(config) => config,
        Err(error) => {
            log::error!("Configuration error: {}", error);
            return;
        }
    };

    log::info!(
        "Anomaly detector is starting... thresholds={} trends={} patterns={} cooldown_secs={}",
        config.thresholds.len(),
        config.trends.len(),
        config.patterns.len(),
        config.detector.cooldown_secs
    );

    let app_context = AppContext::new(config);
    if let Err(error) = start_ingest_job(app_context).await {
        log::error!("ingest job aborted: {}", error);
    }
}
