use anyhow::Context;
use healnav::{
    api::{build_router, AppState},
    config::Config,
    ml::ModelArtifacts,
    processing::TriageProcessor,
    state::TriageQueue,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("healnav={},tower_http=info", config.observability.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting HealNav v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Encoding policy: {}", config.model.encoding_policy);

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = healnav::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Model artifacts are required; there is no degraded mode
    let artifacts = ModelArtifacts::load(&config.model).with_context(|| {
        format!(
            "failed to load model artifacts from {}",
            config.model.artifact_dir.display()
        )
    })?;
    tracing::info!("✅ Model artifacts loaded");

    let queue = Arc::new(TriageQueue::new());
    let processor = Arc::new(TriageProcessor::new(
        Arc::new(artifacts),
        config.model.encoding_policy,
        queue,
    ));

    let app = build_router(AppState::new(processor));

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {}", http_addr))?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Predict: http://{}/predict", http_addr);
    tracing::info!("   Triage queue: http://{}/v1/queue", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
