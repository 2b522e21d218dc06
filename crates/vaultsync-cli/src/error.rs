use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] vaultsync_core::Error),
    #[error(transparent)]
    Quota(#[from] vaultsync_core::quota::QuotaError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to read manifest {}: {source}", .path.display())]
    ReadManifest { path: PathBuf, source: io::Error },
    #[error("Invalid vector clock {input:?}: {source}")]
    InvalidClock {
        input: String,
        source: serde_json::Error,
    },
    #[error("Invalid time {0:?}, expected YYYY-MM-DD HH:MM")]
    InvalidTime(String),
    #[error("Device name cannot be empty")]
    EmptyDeviceName,
    #[error("File path cannot be empty")]
    EmptyPath,
}
