// src/config/models.rs
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::warn;

use super::ConfigError;

pub const DEFAULT_URL: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 2112;
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_METRICS: &str = "prometheus";

/// Process supervisor queried for service readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerKind {
    #[default]
    Systemctl,
    AnotherController,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 2] = [ControllerKind::Systemctl, ControllerKind::AnotherController];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerKind::Systemctl => "systemctl",
            ControllerKind::AnotherController => "anotherController",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the configuration file before defaults are applied.
///
/// Every optional field treats an explicit zero or empty value the same as an
/// absent one.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub services: Vec<String>,
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub server: RawServerConfig,
    #[serde(default)]
    pub controller: Option<String>,
    #[serde(default)]
    pub metrics: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawServerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub services: Vec<String>,
    pub interval_secs: u64,
    pub server: ServerConfig,
    pub controller: ControllerKind,
    pub metrics: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub url: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.url, self.port)
    }
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RawConfig {
    /// Validate service names and fill every unset field with its default.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        for (position, name) in self.services.iter().enumerate() {
            if name.is_empty() {
                return Err(ConfigError::EmptyServiceName(position));
            }
            if name.starts_with('-') {
                return Err(ConfigError::OptionLikeServiceName(name.clone()));
            }
        }

        let controller = match self.controller.as_deref() {
            None | Some("") => ControllerKind::default(),
            Some(value) => ControllerKind::parse(value).unwrap_or_else(|| {
                warn!(
                    "Invalid controller specified: {}. Using default: {}",
                    value,
                    ControllerKind::default()
                );
                ControllerKind::default()
            }),
        };

        Ok(Config {
            services: self.services,
            interval_secs: non_zero_or(self.interval, DEFAULT_INTERVAL_SECS),
            server: ServerConfig {
                url: non_empty_or(self.server.url, DEFAULT_URL),
                port: self.server.port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT),
            },
            controller,
            metrics: non_empty_or(self.metrics, DEFAULT_METRICS),
            timeout_secs: non_zero_or(self.timeout, DEFAULT_TIMEOUT_SECS),
        })
    }
}

fn non_zero_or(value: Option<u64>, default: u64) -> u64 {
    value.filter(|v| *v != 0).unwrap_or(default)
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
