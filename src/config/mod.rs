//! Configuration module for flowctl
//!
//! Typed server configuration loaded from TOML with environment overrides:
//! database location, HTTP bind address, monitor poll tuning, worker pool
//! bounds, and auto-scale thresholds.

pub mod server;

pub use server::{
    is_test_mode, DatabaseConfig, MonitorConfig, ServerConfig, ServerConfigError, WorkerPoolConfig,
};
