//! Server configuration for flowctl-server and flowctl-worker
//!
//! Loads and parses flowctl.toml configuration, with every field overridable
//! via environment variable. Field groups mirror the components they drive:
//! database location, HTTP bind address, monitor poll tuning, worker pool
//! bounds, and auto-scale thresholds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "flowctl.db".to_string()
}

/// Input/output monitor tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_input_poll_ms")]
    pub input_poll_interval_ms: u64,
    #[serde(default = "default_input_batch_size")]
    pub input_batch_size: i64,
    #[serde(default = "default_output_poll_min_ms")]
    pub output_poll_min_ms: u64,
    #[serde(default = "default_output_poll_max_ms")]
    pub output_poll_max_ms: u64,
    #[serde(default = "default_output_batch_size")]
    pub output_batch_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            input_poll_interval_ms: default_input_poll_ms(),
            input_batch_size: default_input_batch_size(),
            output_poll_min_ms: default_output_poll_min_ms(),
            output_poll_max_ms: default_output_poll_max_ms(),
            output_batch_size: default_output_batch_size(),
        }
    }
}

fn default_input_poll_ms() -> u64 {
    100
}
fn default_input_batch_size() -> i64 {
    50
}
fn default_output_poll_min_ms() -> u64 {
    100
}
fn default_output_poll_max_ms() -> u64 {
    2000
}
fn default_output_batch_size() -> usize {
    25
}

/// Worker pool bounds and auto-scale thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,
    /// 0 means derive from available parallelism at startup (CPU count - 1).
    #[serde(default)]
    pub max_workers: usize,
    #[serde(default = "default_thread_cap")]
    pub thread_cap: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_scale_up_avg_threads")]
    pub scale_up_avg_threads: f64,
    #[serde(default = "default_scale_down_avg_threads")]
    pub scale_down_avg_threads: f64,
    #[serde(default = "default_scale_down_cpu_percent")]
    pub scale_down_cpu_percent: f64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            min_workers: default_min_workers(),
            max_workers: 0,
            thread_cap: default_thread_cap(),
            queue_capacity: default_queue_capacity(),
            scale_up_avg_threads: default_scale_up_avg_threads(),
            scale_down_avg_threads: default_scale_down_avg_threads(),
            scale_down_cpu_percent: default_scale_down_cpu_percent(),
        }
    }
}

fn default_min_workers() -> usize {
    2
}
fn default_thread_cap() -> usize {
    10
}
fn default_queue_capacity() -> usize {
    1000
}
fn default_scale_up_avg_threads() -> f64 {
    1.5
}
fn default_scale_down_avg_threads() -> f64 {
    1.0
}
fn default_scale_down_cpu_percent() -> f64 {
    30.0
}

impl WorkerPoolConfig {
    /// Resolve `max_workers`, defaulting to `CPU_count - 1` (floor 1) when unset.
    pub fn resolved_max_workers(&self) -> usize {
        if self.max_workers > 0 {
            return self.max_workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(1)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub worker_pool: WorkerPoolConfig,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ServerConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(ServerConfigError::ReadError)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ServerConfigError> {
        toml::from_str(content).map_err(ServerConfigError::ParseError)
    }

    /// Load configuration, applying environment overrides on top of the file
    /// (or defaults, if no file is found). Search order: `CONFIG_PATH` env
    /// var, then `./flowctl.toml`, then built-in defaults.
    pub fn load() -> Result<Self, ServerConfigError> {
        let mut config = if let Ok(config_path) = std::env::var("CONFIG_PATH") {
            Self::from_file(config_path)?
        } else if PathBuf::from("flowctl.toml").exists() {
            Self::from_file("flowctl.toml")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if is_test_mode() {
            self.database.path = std::env::var("TEST_DB_NAME").unwrap_or_else(|_| ":memory:".to_string());
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }
        if let Ok(host) = std::env::var("HOST") {
            self.host = host;
        }
    }

    /// Get database URL from configuration
    pub fn database_url(&self) -> String {
        if self.database.path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}", self.database.path)
        }
    }
}

/// `TEST_MODE` environment variable: switches to an isolated database.
pub fn is_test_mode() -> bool {
    std::env::var("TEST_MODE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parsing() {
        let toml_content = r#"
[database]
path = "flowctl.db"

[monitor]
input_poll_interval_ms = 200

[worker_pool]
min_workers = 3
"#;
        let config = ServerConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.database.path, "flowctl.db");
        assert_eq!(config.monitor.input_poll_interval_ms, 200);
        assert_eq!(config.worker_pool.min_workers, 3);
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.monitor.input_batch_size, 50);
        assert_eq!(config.worker_pool.min_workers, 2);
    }

    #[test]
    fn test_resolved_max_workers_defaults_from_cpu_count() {
        let config = WorkerPoolConfig::default();
        assert!(config.resolved_max_workers() >= 1);
    }
}
