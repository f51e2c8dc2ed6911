//! Common error types for aifabrix.

use thiserror::Error;

/// Common error type for aifabrix operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {kind} name: {value}")]
    InvalidName { kind: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing file: {0}")]
    MissingFile(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not authenticated: {0}")]
    Authentication(String),

    #[error("Docker is not installed or not on PATH")]
    DockerNotFound,

    #[error("Docker is not running")]
    DockerNotRunning,

    #[error("Port {port} is already in use. Try --port {}", port + 1)]
    PortInUse { port: u16 },

    #[error("Image not found: {image}")]
    ImageMissing { image: String },

    #[error("Command execution failed: {cmd} - {reason}")]
    CommandExecution { cmd: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_in_use_message_suggests_next_port() {
        let err = Error::PortInUse { port: 3000 };
        assert_eq!(
            err.to_string(),
            "Port 3000 is already in use. Try --port 3001"
        );
    }
}
