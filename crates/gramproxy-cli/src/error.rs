//! CLI-specific error types and exit code mapping.

use gramproxy_core::ConfigError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The listener could not be bound.
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The server failed to start or stopped with an error.
    #[error("Server error: {0}")]
    Server(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions (see sysexits.h):
    /// - 1: General error
    /// - 74: I/O error (bind failure)
    /// - 78: Configuration error
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::Bind { .. } => 74, // EX_IOERR
            Self::Server(_) => 1,
        }
    }
}
