//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over `logging.level`. With `logging.json` every event is
//! one JSON object per line.

use tickstash_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::error::IngestError;

/// Install the global subscriber.
pub fn init(config: &LoggingConfig) -> Result<(), IngestError> {
    let filter = build_filter(&config.level);
    let installed = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };
    installed.map_err(|e| IngestError::Logging {
        message: e.to_string(),
    })
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
