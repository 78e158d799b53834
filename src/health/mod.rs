// src/health/mod.rs
mod coordinator;
mod prober;
mod scheduler;
mod status;

pub use coordinator::Coordinator;
pub use prober::{create_prober, CommandProber, ProbeError, Prober, UnsupportedProber};
pub use scheduler::{CycleSummary, Scheduler};
pub use status::{Batch, ServiceStatus};
