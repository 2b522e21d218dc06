use std::sync::Arc;

use serde::Serialize;
use vaultsync_core::commit::CommitEntry;
use vaultsync_core::manifest::{
    validate_commit_entries, validate_identifier, validate_local_manifest,
};
use vaultsync_core::transfer::plan_transfers;
use vaultsync_core::{
    compute_sync_actions, compute_upload_quota_stats, ActionSummary, LocalFile, QuotaLimits,
    QuotaStats, SyncAction,
};

use crate::error::AppError;
use crate::storage::{R2PresignService, SignedTransfer};
use crate::store::{CommitOutcome, ManifestStore};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub actions: Vec<SyncAction>,
    pub summary: ActionSummary,
    pub transfers: Vec<SignedTransfer>,
    pub quota: QuotaReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaReport {
    #[serde(flatten)]
    pub stats: QuotaStats,
    pub storage_used: u64,
}

/// Diff and commit flow of one vault, independent of the HTTP layer.
#[derive(Clone)]
pub struct SyncService {
    store: ManifestStore,
    presigner: Option<Arc<R2PresignService>>,
    quota: QuotaLimits,
    default_device_name: String,
}

impl SyncService {
    pub fn new(
        store: ManifestStore,
        presigner: Option<Arc<R2PresignService>>,
        quota: QuotaLimits,
        default_device_name: String,
    ) -> Self {
        Self {
            store,
            presigner,
            quota,
            default_device_name,
        }
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Decide the actions for a device's manifest and sign the transfers they
    /// need. Quota is enforced before any URL is issued.
    pub async fn diff(
        &self,
        vault_id: &str,
        device_id: &str,
        files: &[LocalFile],
    ) -> Result<DiffResponse, AppError> {
        validate_identifier("vault id", vault_id)?;
        validate_identifier("device id", device_id)?;
        validate_local_manifest(files)?;

        let device_name = self
            .store
            .device_name(vault_id, device_id)
            .await
            .unwrap_or_else(|| self.default_device_name.clone());
        let snapshot = self.store.snapshot(vault_id).await;

        let actions = compute_sync_actions(files, &snapshot.files, &device_name);
        let stats = compute_upload_quota_stats(files, &snapshot.files, &actions);
        if let Err(error) = stats.enforce(&self.quota, snapshot.storage_used) {
            tracing::warn!(vault = vault_id, device = device_id, %error, "Sync rejected by quota");
            return Err(error.into());
        }

        let planned = plan_transfers(vault_id, &actions);
        let transfers = if planned.is_empty() {
            Vec::new()
        } else {
            let presigner = self.presigner.as_ref().ok_or_else(|| {
                AppError::service_unavailable("object storage is not configured")
            })?;
            presigner.presign_transfers(planned).await?
        };

        tracing::info!(
            vault = vault_id,
            device = device_id,
            actions = actions.len(),
            transfers = transfers.len(),
            new_bytes = stats.total_new_size,
            "Computed sync diff"
        );

        Ok(DiffResponse {
            summary: ActionSummary::from_actions(&actions),
            actions,
            transfers,
            quota: QuotaReport {
                stats,
                storage_used: snapshot.storage_used,
            },
        })
    }

    /// Record the outcome of a device's transfers, all or nothing.
    pub async fn commit(
        &self,
        vault_id: &str,
        device_id: &str,
        entries: &[CommitEntry],
    ) -> Result<CommitOutcome, AppError> {
        validate_identifier("vault id", vault_id)?;
        validate_identifier("device id", device_id)?;

        validate_commit_entries(entries)?;

        match self.store.commit(vault_id, device_id, entries).await {
            Ok(outcome) => {
                tracing::info!(
                    vault = vault_id,
                    device = device_id,
                    applied = outcome.applied,
                    storage_used = outcome.storage_used,
                    "Committed sync"
                );
                Ok(outcome)
            }
            Err(conflicts) => {
                tracing::warn!(
                    vault = vault_id,
                    device = device_id,
                    conflicts = conflicts.len(),
                    "Commit rejected by stale hashes"
                );
                Err(AppError::CommitConflict(conflicts))
            }
        }
    }
}
