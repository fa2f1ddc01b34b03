//! Configuration management for the server binary.
//!
//! Settings come from a TOML file, then command-line overrides, and are
//! finally converted into the library's [`ServerConfig`].

use crate::cli::CliArgs;
use anyhow::{Context, Result};
use game_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind_address: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Empty-room sweep period; 0 turns the sweep off
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

fn default_max_connections() -> usize {
    1000
}

fn default_sweep_interval() -> u64 {
    30_000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: default_max_connections(),
            sweep_interval_ms: default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads `path`, writing a default configuration there first if it is missing.
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(bind) = &args.bind {
            self.server.bind_address = bind.clone();
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
        if let Some(max) = args.max_connections {
            self.server.max_connections = max;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", self.server.bind_address));
        }
        if self.server.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {VALID_LEVELS:?}",
                self.logging.level
            ));
        }
        Ok(())
    }

    pub fn to_server_config(&self) -> Result<ServerConfig> {
        let bind_address: SocketAddr = self
            .server
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind_address))?;

        let config = ServerConfig::new(bind_address)
            .with_max_connections(self.server.max_connections)
            .with_sweep_interval_ms(self.server.sweep_interval_ms);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let server_config = config.to_server_config().unwrap();
        assert_eq!(server_config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(server_config.max_connections, 1000);
        assert_eq!(server_config.sweep_interval_ms, 30_000);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".to_string();
        assert!(config.validate().unwrap_err().contains("bind address"));

        config.server.bind_address = "127.0.0.1:8080".to_string();
        config.server.max_connections = 0;
        assert!(config.validate().is_err());

        config.server.max_connections = 10;
        config.logging.level = "loud".to_string();
        assert!(config.validate().unwrap_err().contains("loud"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = AppConfig::default();
        let args = CliArgs::try_parse_from([
            "uttt",
            "--bind",
            "0.0.0.0:9100",
            "--log-level",
            "debug",
            "--json-logs",
            "--max-connections",
            "8",
        ])
        .unwrap();

        config.apply_cli_overrides(&args);
        assert_eq!(config.server.bind_address, "0.0.0.0:9100");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.server.max_connections, 8);
        assert_eq!(config.server.sweep_interval_ms, 30_000);
    }

    #[tokio::test]
    async fn test_missing_file_gets_default_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.server.max_connections, config.server.max_connections);
        assert_eq!(reloaded.logging.level, "info");
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        tokio::fs::write(
            file.path(),
            "[server]\nbind_address = \"0.0.0.0:7000\"\nsweep_interval_ms = 0\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:7000");
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.server.sweep_interval_ms, 0);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        tokio::fs::write(file.path(), "server = [not toml").await.unwrap();
        assert!(AppConfig::load_from_file(file.path()).await.is_err());
    }
}
