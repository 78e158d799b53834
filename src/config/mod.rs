// src/config/mod.rs
mod models;

pub use models::*;

use std::path::{Path, PathBuf};

/// Path used when no configuration file is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Service name at position {0} is empty")]
    EmptyServiceName(usize),

    #[error("Service name {0:?} must not start with '-'")]
    OptionLikeServiceName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// YAML for `.yaml`/`.yml`, JSON for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Load configuration from a file (JSON or YAML), apply defaults and validate.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    parse_config(&contents, ConfigFormat::from_path(path))
}

pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let raw: RawConfig = match format {
        ConfigFormat::Json => serde_json::from_str(contents)?,
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
    };

    raw.into_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "service-health-exporter-{}-{}",
            std::process::id(),
            name
        ))
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("config.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Json);
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let path = temp_config_path("load.json");
        tokio::fs::write(&path, r#"{"services": ["nginx"], "interval": 3}"#)
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(config.services, vec!["nginx".to_string()]);
        assert_eq!(config.interval_secs, 3);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[tokio::test]
    async fn test_load_yaml_config_from_file() {
        let path = temp_config_path("load.yaml");
        tokio::fs::write(&path, "services:\n  - sshd\nserver:\n  port: 9100\n")
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(config.services, vec!["sshd".to_string()]);
        assert_eq!(config.server.port, 9100);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let path = temp_config_path("does-not-exist.json");
        let err = load_config(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_config("{\"services\": [", ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
