use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restreamer_core::{
    load_config, validate_config, Collaborators, FfmpegTranscoder, HttpSpecProvider,
    HttpTransfer, Orchestrator, YoutubeSearchProvider, YtDlpExtractor,
};
use restreamer_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("RESTREAMER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("restreamer {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (hash {})", &config_hash[..16]);
    info!("Control plane: {}", config.control_plane.url);
    info!("Cache root: {:?}", config.storage.root_path);
    if config.streaming.disabled {
        warn!("Streaming disabled, running in cache-only mode");
    } else {
        info!("Sink root: {}", config.streaming.sink_root_url);
    }

    let collaborators = Collaborators {
        provider: Arc::new(
            HttpSpecProvider::new(&config.control_plane)
                .context("Failed to create control plane client")?,
        ),
        transcoder: Arc::new(FfmpegTranscoder::new(config.transcoder.clone())),
        extractor: Arc::new(YtDlpExtractor::new(config.extractor.clone())),
        transfer: Arc::new(HttpTransfer::new().context("Failed to create HTTP transfer")?),
        search: Arc::new(
            YoutubeSearchProvider::new(&config.search)
                .context("Failed to create search provider")?,
        ),
    };

    let orchestrator = Orchestrator::new(&config, collaborators);
    orchestrator
        .validate()
        .await
        .context("Transcoder is not usable")?;

    let registered = orchestrator
        .bootstrap()
        .await
        .context("Failed to bootstrap channels")?;
    info!("Orchestrator started with {} channels", registered);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, orchestrator.clone()));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    info!("Stopping orchestrator...");
    orchestrator.stop();
    if !orchestrator.wait_stopped_with_grace().await {
        warn!("Some tasks did not exit within the grace period and were aborted");
    }
    info!("Server shut down");

    served
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
