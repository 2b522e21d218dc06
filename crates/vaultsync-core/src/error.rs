//! Error types for vaultsync-core

use thiserror::Error;

use crate::manifest::ManifestError;
use crate::quota::QuotaError;

/// Result type alias using vaultsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vaultsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Client-reported manifest failed validation
    #[error("Invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    /// Planned sync would exceed the account quota
    #[error("Quota exceeded: {0}")]
    Quota(#[from] QuotaError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
