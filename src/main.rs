//! Partgate -- multipart upload orchestration service.
//!
//! Resolves store connection parameters once at startup, builds the
//! immutable store client binding and the coordinator over it, then
//! serves the upload API. SIGTERM/SIGINT handlers only stop accepting
//! connections and wait for in-flight requests before exiting.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use partgate::coordinator::UploadCoordinator;
use partgate::store::s3::S3MultipartStore;

/// Command-line arguments for the Partgate server.
#[derive(Parser, Debug)]
#[command(
    name = "partgate",
    version,
    about = "Multipart upload orchestration service for S3-compatible object stores"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "partgate.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = partgate::config::load_config(&cli.config)?;

    // Initialize tracing / logging per config, overridable via RUST_LOG.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(env_filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    // Initialize Prometheus metrics recorder and register metric descriptions.
    if config.observability.metrics {
        partgate::metrics::init_metrics();
        partgate::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    // Resolve store parameters and build the client binding exactly once.
    // Missing credentials or bucket fail here, not at first request.
    let params = partgate::store::client::resolve(&config.storage)?;
    let client = partgate::store::client::build_client(&params).await;
    let store = Arc::new(S3MultipartStore::new(client, params.bucket.clone()));

    let coordinator = UploadCoordinator::new(
        store,
        config.upload.key_prefix.clone(),
        Duration::from_secs(config.upload.presign_expiry_secs),
    );
    info!(
        "Upload coordinator ready: bucket={} key_prefix={} presign_expiry={}s",
        params.bucket, config.upload.key_prefix, config.upload.presign_expiry_secs
    );

    // Build AppState.
    let state = Arc::new(partgate::AppState {
        config: config.clone(),
        coordinator,
    });

    let app = partgate::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Partgate listening on {}", bind_addr);

    // Graceful shutdown: on SIGTERM/SIGINT, stop accepting new connections
    // and wait for in-flight requests to complete. In-flight uploads at the
    // store are unaffected; clients resume against the same upload_id.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Partgate shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
