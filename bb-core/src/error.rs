//! Error types.
//!
//! Infeasible plays are not errors (see `play::PlayKind::NoDefensePlan`);
//! these cover configuration loading and worker threads.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("trajectory worker thread panicked")]
    WorkerPanicked,
}
