use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use vaultsync_core::commit::{find_commit_conflicts, CommitConflict, CommitEntry};
use vaultsync_core::util::unix_timestamp_millis;
use vaultsync_core::RemoteFile;

/// In-memory manifests, storage usage, and device registry per vault.
#[derive(Clone, Default)]
pub struct ManifestStore {
    vaults: Arc<Mutex<HashMap<String, VaultState>>>,
}

#[derive(Debug, Default)]
struct VaultState {
    files: BTreeMap<String, RemoteFile>,
    storage_used: u64,
    devices: HashMap<String, DeviceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub name: String,
    pub last_sync_at: Option<i64>,
}

/// Remote manifest (tombstones included) and current usage of one vault
#[derive(Debug, Clone, Default)]
pub struct VaultSnapshot {
    pub files: Vec<RemoteFile>,
    pub storage_used: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub applied: usize,
    pub storage_used: u64,
}

impl ManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device or rename it, keeping its last-sync time.
    pub async fn register_device(&self, vault_id: &str, device_id: &str, name: String) -> DeviceRecord {
        let mut vaults = self.vaults.lock().await;
        let vault = vaults.entry(vault_id.to_string()).or_default();
        let record = vault
            .devices
            .entry(device_id.to_string())
            .and_modify(|record| record.name.clone_from(&name))
            .or_insert_with(|| DeviceRecord {
                name,
                last_sync_at: None,
            });
        record.clone()
    }

    pub async fn device_name(&self, vault_id: &str, device_id: &str) -> Option<String> {
        let vaults = self.vaults.lock().await;
        vaults
            .get(vault_id)
            .and_then(|vault| vault.devices.get(device_id))
            .map(|record| record.name.clone())
    }

    pub async fn snapshot(&self, vault_id: &str) -> VaultSnapshot {
        let vaults = self.vaults.lock().await;
        vaults
            .get(vault_id)
            .map(|vault| VaultSnapshot {
                files: vault.files.values().cloned().collect(),
                storage_used: vault.storage_used,
            })
            .unwrap_or_default()
    }

    /// Apply a finished sync. Either every entry lands or, when any expected
    /// hash is stale, nothing does and the stale entries are returned.
    pub async fn commit(
        &self,
        vault_id: &str,
        device_id: &str,
        entries: &[CommitEntry],
    ) -> Result<CommitOutcome, Vec<CommitConflict>> {
        let mut vaults = self.vaults.lock().await;
        let vault = vaults.entry(vault_id.to_string()).or_default();

        let current: Vec<RemoteFile> = entries
            .iter()
            .filter_map(|entry| vault.files.get(&entry.file_id).cloned())
            .collect();
        let conflicts = find_commit_conflicts(entries, &current);
        if !conflicts.is_empty() {
            return Err(conflicts);
        }

        for entry in entries {
            let before = vault.files.get(&entry.file_id).map_or(0, live_size);
            let record = entry.to_remote_file();
            let after = live_size(&record);
            vault.storage_used = vault.storage_used.saturating_sub(before).saturating_add(after);
            vault.files.insert(record.id.clone(), record);
        }

        if let Some(device) = vault.devices.get_mut(device_id) {
            device.last_sync_at = Some(unix_timestamp_millis());
        }

        Ok(CommitOutcome {
            applied: entries.len(),
            storage_used: vault.storage_used,
        })
    }
}

fn live_size(file: &RemoteFile) -> u64 {
    if file.is_deleted {
        0
    } else {
        file.size
    }
}
