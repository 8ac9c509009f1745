//! Error types for the AI core

use thiserror::Error;

/// Result type for AI construction and configuration
pub type Result<T> = std::result::Result<T, AiError>;

/// Errors raised while building an agent.
///
/// Ticking never fails; only configuration and construction do.
#[derive(Debug, Error)]
pub enum AiError {
    /// A tunable is out of its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be parsed
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
