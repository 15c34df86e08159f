//! Error types for Wiregrant

use thiserror::Error;

/// Result type alias using Wiregrant Error
pub type Result<T> = std::result::Result<T, Error>;

/// Wiregrant error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Name '{0}' is not registered")]
    NameNotFound(String),

    #[error("Name resolution unavailable: {0}")]
    ResolutionUnavailable(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Incomplete server parameters: {0}")]
    IncompleteServerParams(String),

    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Content store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Pinning for retention failed: {0}")]
    RetentionRisk(String),

    #[error("Tunnel address pool exhausted")]
    AddressPoolExhausted,

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Integrity verification failed: {0}")]
    IntegrityError(String),
}

impl Error {
    /// True for failures of an external collaborator (oracle, store, RNG)
    /// rather than of the request itself.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::ResolutionUnavailable(_)
                | Error::StoreUnavailable(_)
                | Error::EntropyUnavailable(_)
                | Error::Io(_)
        )
    }
}
