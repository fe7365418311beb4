//! Process configuration from the environment.
//!
//! | Variable              | Default | Meaning                                   |
//! |-----------------------|---------|-------------------------------------------|
//! | `SLOT_LOG_LEVEL`      | `info`  | fallback filter when `RUST_LOG` is unset  |
//! | `SLOT_INPUT`          | unset   | store JSON used when `--input` is absent  |
//! | `SLOT_SEED`           | unset   | RNG seed for the stochastic solvers       |
//! | `SLOT_STALE_RUN_SECS` | `1800`  | silence after which a run is reclaimed    |
//!
//! A `.env` file in the working directory is read first.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STALE_RUN_SECS: u64 = 1800;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input: Option<PathBuf>,
    pub seed: Option<u64>,
    pub stale_run_after: Duration,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("SLOT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let input = env::var("SLOT_INPUT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let seed = match env::var("SLOT_SEED") {
            Ok(value) => Some(
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed(value.clone()))?,
            ),
            Err(_) => None,
        };
        let stale_secs = match env::var("SLOT_STALE_RUN_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidStaleRunSecs(value.clone()))?,
            Err(_) => DEFAULT_STALE_RUN_SECS,
        };

        Ok(Self {
            input,
            seed,
            stale_run_after: Duration::from_secs(stale_secs),
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SLOT_SEED must be an unsigned 64-bit integer, got '{0}'")]
    InvalidSeed(String),
    #[error("SLOT_STALE_RUN_SECS must be a positive number of seconds, got '{0}'")]
    InvalidStaleRunSecs(String),
}
