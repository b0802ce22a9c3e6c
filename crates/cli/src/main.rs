use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use pullist_core::{
    load_config, metrics, validate_config, Branch, BranchRunner, Credentials, FsReportEmitter,
    IlsApi, IlswsClient, ReportEmitter, RequestGate, SanitizedConfig, XsltprocTransformer,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let json = std::env::var("PULLIST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn run() -> Result<()> {
    init_logging();

    // Config path: PULLIST_CONFIG, then the first argument, then ./config.toml
    let config_path = std::env::var("PULLIST_CONFIG")
        .map(PathBuf::from)
        .ok()
        .or_else(|| std::env::args().nth(1).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!(version = VERSION, "Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration: {:?}", SanitizedConfig::from(&config));

    let client = IlswsClient::new(&config.ils).context("Failed to create ILSWS client")?;
    let api: Arc<dyn IlsApi> = Arc::new(client);
    info!("ILS endpoint: {}", config.ils.base_url());

    let gate = Arc::new(RequestGate::new(&config.gate));

    let transformer = Arc::new(XsltprocTransformer::new(config.report.xsltproc_path.clone()));
    let emitter: Arc<dyn ReportEmitter> =
        Arc::new(FsReportEmitter::new(config.report.clone(), transformer));

    let runner = BranchRunner::new(
        api,
        Arc::clone(&gate),
        emitter,
        Credentials::new(config.ils.username.clone(), config.ils.password.clone()),
        config.pipeline.clone(),
    );

    let branches: Vec<Branch> = config.branches.iter().map(Branch::from).collect();
    let result = runner.run(&branches).await;

    if let Some(path) = &config.report.metrics_textfile {
        match metrics::write_textfile(path) {
            Ok(()) => info!("Metrics written to {:?}", path),
            Err(e) => warn!("Failed to write metrics to {:?}: {}", path, e),
        }
    }

    let summary = result.context("Run aborted")?;

    info!(
        max_concurrent = summary.max_concurrent,
        errors = summary.total_errors(),
        items = summary.total_rows(),
        requests = summary.requests,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "{}, {}, {}, {}",
        summary.max_concurrent,
        summary.total_errors(),
        summary.total_rows(),
        summary.requests
    );

    if !summary.is_success() {
        for failure in &summary.failures {
            error!(branch = %failure.branch.key, "Skipped: {}", failure.error);
        }
        bail!("{} of {} branches failed", summary.failures.len(), branches.len());
    }

    Ok(())
}
