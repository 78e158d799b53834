// src/main.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use service_health_exporter::{
    config::{self, DEFAULT_CONFIG_PATH},
    health::{create_prober, Scheduler},
    metrics::MetricsRegistry,
    server::{MetricsHandler, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("service_health_exporter=info".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    info!(
        "Polling {} services every {:?} with {} (probe timeout {:?}, {} exposition)",
        config.services.len(),
        config.interval(),
        config.controller,
        config.probe_timeout(),
        config.metrics
    );

    let metrics = Arc::new(MetricsRegistry::new()?);

    // Bind before the first cycle: an unreachable endpoint is a startup failure.
    let server = ServerBuilder::new(config.server.url.clone(), config.server.port)
        .with_handler(MetricsHandler::new(metrics.clone()))
        .bind()
        .await
        .with_context(|| format!("Failed to start metrics server on {}", config.server.address()))?;

    let prober = create_prober(config.controller, config.probe_timeout());
    let scheduler = Arc::new(Scheduler::new(
        config.services.clone(),
        config.interval(),
        prober,
        metrics,
    ));

    let poller = tokio::spawn(scheduler.clone().start());
    let mut server_task = tokio::spawn(server.serve());

    tokio::select! {
        result = &mut server_task => {
            scheduler.shutdown();
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.context("Metrics server stopped")),
                Err(e) => Err(e).context("Metrics server task failed"),
            };
        }
        _ = shutdown_signal() => {}
    }

    scheduler.shutdown();
    if let Err(e) = poller.await {
        error!("Health poller task failed: {}", e);
    }
    server_task.abort();

    info!("Shutdown complete");
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
