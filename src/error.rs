//! Error types for Solace gateway

use thiserror::Error;

/// Result type alias for Solace operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Solace gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persona not found
    #[error("persona not found: {0}")]
    PersonaNotFound(String),

    /// Language model call failed
    #[error("llm error: {0}")]
    Llm(String),

    /// Crisis alert could not be built or delivered
    #[error("alert error: {0}")]
    Alert(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
