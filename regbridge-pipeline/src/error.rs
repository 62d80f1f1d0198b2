//! Error types for the pipeline.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while setting up or tearing down a bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// A pipeline task panicked or was cancelled.
    #[error("Worker error: {0}")]
    Worker(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    /// Create a worker error.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}

impl From<regbridge_common::Error> for BridgeError {
    fn from(err: regbridge_common::Error) -> Self {
        match err {
            regbridge_common::Error::Config(msg) => Self::Config(msg),
            regbridge_common::Error::Parse(msg) => Self::ConfigParse(msg),
            regbridge_common::Error::Io(e) => Self::Io(e),
        }
    }
}

/// Failure of a single call into a transport collaborator.
///
/// These never abort the pipeline; the affected register or batch is skipped.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The call did not complete in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The device answered with an exception response.
    #[error("Device exception: {0}")]
    Exception(String),

    /// Protocol-level failure (framing, CRC, unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Fewer bytes left the socket than were handed in.
    #[error("Short send: {sent} of {expected} bytes")]
    ShortSend { sent: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Timeout(Duration::from_millis(500));
        assert_eq!(err.to_string(), "Timed out after 500ms");

        let err = TransportError::ShortSend {
            sent: 3,
            expected: 10,
        };
        assert_eq!(err.to_string(), "Short send: 3 of 10 bytes");
    }

    #[test]
    fn test_common_error_conversion() {
        let err: BridgeError = regbridge_common::Error::Config("bad".to_string()).into();
        assert!(matches!(err, BridgeError::Config(_)));

        let err: BridgeError = regbridge_common::Error::Parse("bad".to_string()).into();
        assert!(matches!(err, BridgeError::ConfigParse(_)));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BridgeError = regbridge_common::Error::Io(io).into();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
