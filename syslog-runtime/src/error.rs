//! Error types for process lifecycle management.

use thiserror::Error;

/// Result type alias using [`RuntimeError`].
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while starting or running the collector process.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration validation error.
    #[error("configuration validation failed: {0}")]
    ConfigValidation(String),

    /// A listener failed to bind its socket.
    #[error("failed to bind {listener} listener on {addr}: {source}")]
    Bind {
        listener: &'static str,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A supervised worker task panicked or was cancelled unexpectedly.
    #[error("worker error: {0}")]
    Worker(String),
}

impl RuntimeError {
    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    /// Create a worker error.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}
