// src/health/prober.rs
use crate::config::ControllerKind;
use crate::health::ServiceStatus;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Readiness check for a single service.
///
/// Probes never fail outward: anything that is not a confirmed healthy
/// answer is reported as unhealthy, and the reason only goes to the log.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, service: &str) -> ServiceStatus;

    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("Command exited with {status}, output {output:?}")]
    Inactive { status: ExitStatus, output: String },

    #[error("Unexpected output {0:?}")]
    UnexpectedOutput(String),

    #[error("Controller {0} has no readiness command")]
    UnsupportedController(ControllerKind),
}

impl ProbeError {
    /// True when the check itself could not be carried out, as opposed to the
    /// service answering that it is down.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ProbeError::Spawn { .. } | ProbeError::Timeout(_) | ProbeError::UnsupportedController(_)
        )
    }
}

/// Runs `<program> <args..> <service>` and compares stdout with a token.
///
/// One trailing newline is stripped before the comparison, so `active` and
/// `active\n` both match; any other difference does not.
#[derive(Debug, Clone)]
pub struct CommandProber {
    program: String,
    args: Vec<String>,
    expected: String,
    timeout: Duration,
}

impl CommandProber {
    pub fn new<I, S>(
        program: impl Into<String>,
        args: I,
        expected: impl Into<String>,
        timeout: Duration,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            expected: expected.into(),
            timeout,
        }
    }

    /// `systemctl is-active <service>`, healthy on `active`.
    pub fn systemctl(timeout: Duration) -> Self {
        Self::new("systemctl", ["is-active"], "active", timeout)
    }

    async fn check(&self, service: &str) -> Result<(), ProbeError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(service)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let token = stdout.strip_suffix('\n').unwrap_or(&stdout);

        if !output.status.success() {
            return Err(ProbeError::Inactive {
                status: output.status,
                output: token.to_string(),
            });
        }

        if token != self.expected {
            return Err(ProbeError::UnexpectedOutput(token.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl Prober for CommandProber {
    async fn probe(&self, service: &str) -> ServiceStatus {
        match self.check(service).await {
            Ok(()) => {
                debug!("Service {} is {}", service, self.expected);
                ServiceStatus::healthy(service)
            }
            Err(e) => {
                report_failure(service, &e);
                ServiceStatus::unhealthy(service)
            }
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Stand-in for a controller kind that is accepted by configuration but has
/// no readiness command. Every service is published as unhealthy.
#[derive(Debug, Clone)]
pub struct UnsupportedProber {
    kind: ControllerKind,
}

impl UnsupportedProber {
    pub fn new(kind: ControllerKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Prober for UnsupportedProber {
    async fn probe(&self, service: &str) -> ServiceStatus {
        report_failure(service, &ProbeError::UnsupportedController(self.kind));
        ServiceStatus::unhealthy(service)
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }
}

fn report_failure(service: &str, e: &ProbeError) {
    if e.is_infrastructure() {
        error!("Health check for {} could not run: {}", service, e);
    } else {
        warn!("Service {} is not active: {}", service, e);
    }
}

pub fn create_prober(kind: ControllerKind, probe_timeout: Duration) -> Arc<dyn Prober> {
    match kind {
        ControllerKind::Systemctl => Arc::new(CommandProber::systemctl(probe_timeout)),
        other => {
            warn!(
                "Controller {} has no readiness command, every service will report unhealthy",
                other
            );
            Arc::new(UnsupportedProber::new(other))
        }
    }
}
