//! Directory configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_core::config::ReputationConfig;
use lumen_core::constants::DEFAULT_MAX_WEIGHT;

#[derive(Clone, Debug)]
pub struct Config {
    /// RocksDB directory holding the imported snapshot and scores.
    pub db_path: PathBuf,
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    pub reputation: ReputationConfig,
    /// Upper bound on one request's store work.
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = match std::env::var("LUMEN_DB_PATH") {
            Ok(p) => PathBuf::from(p),
            Err(_) => lumen_store::default_db_path().context("could not determine data directory")?,
        };

        let bind_addr = std::env::var("LUMEN_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8090".to_string());

        let max_weight: f64 = match std::env::var("LUMEN_MAX_WEIGHT") {
            Ok(v) => v.parse().context("LUMEN_MAX_WEIGHT must be a number")?,
            Err(_) => DEFAULT_MAX_WEIGHT,
        };
        let reputation = ReputationConfig::with_max_weight(max_weight)?;

        let timeout_secs: u64 = std::env::var("LUMEN_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("LUMEN_REQUEST_TIMEOUT_SECS must be a positive integer")?;

        Ok(Config {
            db_path,
            bind_addr,
            reputation,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}
