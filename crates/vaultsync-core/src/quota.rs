//! Storage quota estimation for a planned sync.
//!
//! Runs over the diff result before any transfer URL is issued so an
//! over-quota batch is rejected with no side effects.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{LocalFile, RemoteFile, SyncAction, SyncActionKind};

/// Storage impact of a batch of sync actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStats {
    /// Size of every object the batch writes, for the per-file ceiling
    pub upload_sizes: Vec<u64>,
    /// New bytes the batch adds to the account's usage
    pub total_new_size: u64,
}

/// Account limits enforced before transfers are prepared. `None` disables a
/// check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimits {
    pub max_file_size: Option<u64>,
    pub storage_limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaError {
    #[error("file of {size} bytes exceeds the {limit} byte per-file limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("storing {requested} new bytes on top of {current} would exceed the {limit} byte storage limit")]
    StorageExceeded {
        current: u64,
        requested: u64,
        limit: u64,
    },
}

/// Estimate the storage consumed by `actions`.
///
/// Uploads count only growth over the server copy; a shrinking file never
/// lowers the total. A conflict writes two objects but only the local size is
/// counted as new, since the server's bytes are already in current usage and
/// are renamed rather than duplicated.
pub fn compute_upload_quota_stats(
    local: &[LocalFile],
    remote: &[RemoteFile],
    actions: &[SyncAction],
) -> QuotaStats {
    if actions.is_empty() {
        return QuotaStats::default();
    }

    let local_sizes: HashMap<&str, u64> = local
        .iter()
        .map(|file| (file.file_id(), file.size()))
        .collect();
    let remote_sizes: HashMap<&str, u64> = remote
        .iter()
        .map(|file| (file.id.as_str(), file.size))
        .collect();

    let mut stats = QuotaStats::default();
    for action in actions {
        let local_size = local_sizes
            .get(action.file_id.as_str())
            .copied()
            .unwrap_or_else(|| action.size.unwrap_or(0));
        let remote_size = remote_sizes.get(action.file_id.as_str()).copied();

        match action.action {
            SyncActionKind::Upload => {
                stats.upload_sizes.push(local_size);
                let growth = local_size.saturating_sub(remote_size.unwrap_or(0));
                stats.total_new_size = stats.total_new_size.saturating_add(growth);
            }
            SyncActionKind::Conflict => {
                stats.upload_sizes.push(local_size);
                stats.upload_sizes.push(remote_size.unwrap_or(0));
                stats.total_new_size = stats.total_new_size.saturating_add(local_size);
            }
            SyncActionKind::Delete | SyncActionKind::Download => {}
        }
    }

    tracing::debug!(
        objects = stats.upload_sizes.len(),
        total_new_size = stats.total_new_size,
        "Estimated upload quota"
    );
    stats
}

impl QuotaStats {
    /// Largest object the batch writes
    pub fn largest_upload(&self) -> Option<u64> {
        self.upload_sizes.iter().copied().max()
    }

    /// Run every quota check, per-file ceiling first.
    pub fn enforce(&self, limits: &QuotaLimits, current_usage: u64) -> Result<(), QuotaError> {
        check_file_size_allowed(limits, &self.upload_sizes)?;
        check_storage_allowed(limits, current_usage, self.total_new_size)
    }
}

/// Reject the batch if any single object exceeds the per-file limit.
pub fn check_file_size_allowed(limits: &QuotaLimits, upload_sizes: &[u64]) -> Result<(), QuotaError> {
    let Some(limit) = limits.max_file_size else {
        return Ok(());
    };
    match upload_sizes.iter().find(|&&size| size > limit) {
        Some(&size) => Err(QuotaError::FileTooLarge { size, limit }),
        None => Ok(()),
    }
}

/// Reject the batch if it would push the account past its storage limit.
pub fn check_storage_allowed(
    limits: &QuotaLimits,
    current_usage: u64,
    total_new_size: u64,
) -> Result<(), QuotaError> {
    let Some(limit) = limits.storage_limit else {
        return Ok(());
    };
    if current_usage.saturating_add(total_new_size) > limit {
        return Err(QuotaError::StorageExceeded {
            current: current_usage,
            requested: total_new_size,
            limit,
        });
    }
    Ok(())
}
