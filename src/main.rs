use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use parking_lot::RwLock;

use leadflow_engine::{OutreachOrchestrator, SessionEventAggregator};
use leadflow_gateway::{HttpAgentGateway, SseEventSource};
use leadflow_settings::{load_config, load_settings_from_path, settings_path};
use leadflow_store::LeadStore;
use leadflow_telemetry::{init_telemetry, LogFormat, TelemetryConfig};

#[derive(Debug, Parser)]
#[command(name = "leadflow", about = "Agent-driven sales outreach pipeline", version)]
struct Cli {
    /// Seed the store with the demo leads and tracking report.
    #[arg(long)]
    sample_data: bool,

    /// Listen port (overrides config and LEADFLOW_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (default: ~/.leadflow/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, default_value = "json")]
    log_format: LogFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _telemetry = init_telemetry(TelemetryConfig {
        format: cli.log_format,
        ..TelemetryConfig::default()
    });
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting leadflow");

    let mut config = load_config().context("failed to load service config")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let settings_file = cli.settings.unwrap_or_else(settings_path);
    let settings = load_settings_from_path(&settings_file)
        .with_context(|| format!("failed to load settings from {}", settings_file.display()))?;
    tracing::info!(path = %settings_file.display(), tone = ?settings.tone, "settings loaded");

    let gateway = HttpAgentGateway::new(&config.gateway).context("failed to build agent gateway")?;
    let events = SseEventSource::new(&config.gateway).context("failed to build event source")?;
    tracing::info!(
        gateway = gateway.base_url(),
        drafting = %config.agents.drafting,
        sending = %config.agents.sending,
        tracking = %config.agents.tracking,
        "agent gateway configured"
    );

    let store = if cli.sample_data {
        LeadStore::with_sample_data()
    } else {
        LeadStore::new()
    };
    tracing::info!(leads = store.len(), sample = cli.sample_data, "lead store ready");

    let activity = Arc::new(SessionEventAggregator::new(Arc::new(events)));
    let orchestrator = Arc::new(OutreachOrchestrator::new(
        Arc::new(gateway),
        store,
        activity,
        config.agents.clone(),
    ));

    let state = leadflow_server::AppState {
        orchestrator,
        settings: Arc::new(RwLock::new(settings)),
        settings_path: Arc::new(settings_file),
    };
    let handle = leadflow_server::start(&config.server, state)
        .await
        .with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?;

    tracing::info!(addr = %handle.addr, "leadflow ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
