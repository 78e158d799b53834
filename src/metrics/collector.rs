// src/metrics/collector.rs
use crate::health::Batch;
use anyhow::Result;
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use std::time::Instant;

pub const SERVICE_HEALTH_METRIC: &str = "service_health_status";
pub const SERVICE_NAME_LABEL: &str = "service_name";

/// Process-wide store of one health gauge per service name.
///
/// Each gauge is updated atomically on its own; a scrape that races a batch
/// update may see some names from the previous cycle and some from the
/// current one.
pub struct MetricsRegistry {
    registry: Registry,
    service_health_status: IntGaugeVec,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let service_health_status = IntGaugeVec::new(
            Opts::new(
                SERVICE_HEALTH_METRIC,
                "Health status of systemd services (1 = healthy, 0 = unhealthy)",
            ),
            &[SERVICE_NAME_LABEL],
        )?;
        registry.register(Box::new(service_health_status.clone()))?;

        Ok(Self {
            registry,
            service_health_status,
        })
    }

    pub fn set_health(&self, service: &str, healthy: bool) {
        let value = if healthy { 1 } else { 0 };
        self.service_health_status
            .with_label_values(&[service])
            .set(value);
    }

    /// Publish a whole batch; returns the number of gauges written.
    pub fn apply_batch(&self, batch: Batch) -> usize {
        let mut written = 0;
        for status in batch {
            self.set_health(&status.name, status.healthy);
            written += 1;
        }
        written
    }

    /// Current contents in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
