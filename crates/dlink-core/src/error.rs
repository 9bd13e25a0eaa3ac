//! Error types for dlink

use thiserror::Error;

/// Core error type shared by the loader, the connectors and the compiler
#[derive(Error, Debug)]
pub enum LinkError {
    /// Missing keys, bad archive directories, unsupported driver families
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No connector implementation registered under the requested name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Driver initialization or a live connectivity probe failed
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// A symbol could not be resolved from the isolated archives or their parent
    #[error("Isolation error: {0}")]
    Isolation(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl LinkError {
    /// Whether a caller may reasonably retry the failed operation as a whole.
    ///
    /// The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}

/// Result type alias for dlink operations
pub type Result<T> = std::result::Result<T, LinkError>;
