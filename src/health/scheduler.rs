// src/health/scheduler.rs
use crate::health::{Coordinator, Prober};
use crate::metrics::{MetricsRegistry, Timer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info};

/// Drives the poll loop: probe every service, publish the batch, sleep.
pub struct Scheduler {
    services: Vec<String>,
    interval: Duration,
    coordinator: Coordinator,
    metrics: Arc<MetricsRegistry>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub total: usize,
    pub healthy: usize,
    pub elapsed: Duration,
}

impl CycleSummary {
    pub fn unhealthy(&self) -> usize {
        self.total - self.healthy
    }
}

impl Scheduler {
    pub fn new(
        services: Vec<String>,
        interval: Duration,
        prober: Arc<dyn Prober>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            services,
            interval,
            coordinator: Coordinator::new(prober),
            metrics,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Poll until [`Scheduler::shutdown`] is called. The first cycle runs
    /// immediately; a cycle in progress is always finished.
    pub async fn start(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!(
            "Starting health poller for {} services with interval: {:?}",
            self.services.len(),
            self.interval
        );

        loop {
            self.run_cycle().await;

            debug!("Waiting {:?} to refresh service status", self.interval);
            tokio::select! {
                _ = sleep(self.interval) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Health poller shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// One polling cycle: fan out, wait for every probe, publish.
    pub async fn run_cycle(&self) -> CycleSummary {
        let timer = Timer::new();

        let batch = self.coordinator.collect(&self.services).await;
        for status in batch.iter() {
            info!("{} {}", status.name, status.value());
        }

        let healthy = batch.healthy_count();
        let collected_at = batch.collected_at();
        let total = self.metrics.apply_batch(batch);

        let summary = CycleSummary {
            total,
            healthy,
            elapsed: timer.elapsed(),
        };

        info!(
            "Health check complete: {} healthy, {} unhealthy in {:?} (collected at {})",
            summary.healthy,
            summary.unhealthy(),
            summary.elapsed,
            collected_at.to_rfc3339()
        );

        summary
    }
}
