//! Runner Error Types

use thiserror::Error;

/// Errors that stop the runner
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging was already initialized
    #[error("Logging setup failed: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
}
