// src/metrics/mod.rs
mod collector;

pub use collector::{MetricsRegistry, Timer, SERVICE_HEALTH_METRIC, SERVICE_NAME_LABEL};
