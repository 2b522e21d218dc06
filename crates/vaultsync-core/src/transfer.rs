//! Object-storage transfers required by a diff result.
//!
//! Turns sync actions into the list of objects a storage client must sign
//! URLs for. Nothing here talks to storage.

use serde::{Deserialize, Serialize};

use crate::models::{SyncAction, SyncActionKind};

/// HTTP verb of a presigned transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferMethod {
    Get,
    Put,
}

/// Why a transfer is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferPurpose {
    Upload,
    Download,
    /// Fetch the server's divergent version before it is overwritten
    ConflictOriginal,
    /// Write local content over the server's version
    ConflictOverwrite,
    /// Write the preserved server version under the conflict copy ID
    ConflictCopy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTransfer {
    pub file_id: String,
    pub purpose: TransferPurpose,
    pub method: TransferMethod,
    pub object_key: String,
}

/// Storage key of a file's current content
pub fn object_key(vault_id: &str, file_id: &str) -> String {
    format!("vaults/{vault_id}/files/{file_id}")
}

/// List the transfers needed to carry out `actions` in vault `vault_id`.
///
/// Deletes need no transfer; a conflict needs three.
pub fn plan_transfers(vault_id: &str, actions: &[SyncAction]) -> Vec<PlannedTransfer> {
    let mut transfers = Vec::new();

    for action in actions {
        let key = object_key(vault_id, &action.file_id);
        let planned = |purpose, method, object_key| PlannedTransfer {
            file_id: action.file_id.clone(),
            purpose,
            method,
            object_key,
        };

        match action.action {
            SyncActionKind::Upload => {
                transfers.push(planned(TransferPurpose::Upload, TransferMethod::Put, key));
            }
            SyncActionKind::Download => {
                transfers.push(planned(TransferPurpose::Download, TransferMethod::Get, key));
            }
            SyncActionKind::Conflict => {
                let copy_key = action.conflict_copy_id.map_or_else(
                    || format!("{key}.conflict"),
                    |copy_id| object_key(vault_id, &copy_id.to_string()),
                );
                transfers.push(planned(
                    TransferPurpose::ConflictOriginal,
                    TransferMethod::Get,
                    key.clone(),
                ));
                transfers.push(planned(
                    TransferPurpose::ConflictOverwrite,
                    TransferMethod::Put,
                    key,
                ));
                transfers.push(planned(
                    TransferPurpose::ConflictCopy,
                    TransferMethod::Put,
                    copy_key,
                ));
            }
            SyncActionKind::Delete => {}
        }
    }

    transfers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConflictCopyId;

    #[test]
    fn deletes_need_no_transfer() {
        let actions = [SyncAction::new("f1", "a.md", SyncActionKind::Delete)];
        assert!(plan_transfers("v1", &actions).is_empty());
    }

    #[test]
    fn upload_and_download_use_file_key() {
        let actions = [
            SyncAction::new("f1", "a.md", SyncActionKind::Upload),
            SyncAction::new("f2", "b.md", SyncActionKind::Download),
        ];
        let transfers = plan_transfers("v1", &actions);
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].method, TransferMethod::Put);
        assert_eq!(transfers[0].object_key, "vaults/v1/files/f1");
        assert_eq!(transfers[1].method, TransferMethod::Get);
        assert_eq!(transfers[1].object_key, "vaults/v1/files/f2");
    }

    #[test]
    fn conflict_needs_three_transfers() {
        let copy_id = ConflictCopyId::new();
        let action = SyncAction::new("f1", "a.md", SyncActionKind::Conflict)
            .with_conflict_copy("a (Phone - 2025-01-01 00:00).md".to_string(), copy_id);
        let transfers = plan_transfers("v1", &[action]);

        let purposes: Vec<TransferPurpose> = transfers.iter().map(|t| t.purpose).collect();
        assert_eq!(
            purposes,
            vec![
                TransferPurpose::ConflictOriginal,
                TransferPurpose::ConflictOverwrite,
                TransferPurpose::ConflictCopy
            ]
        );
        assert_eq!(transfers[0].object_key, transfers[1].object_key);
        assert_eq!(
            transfers[2].object_key,
            format!("vaults/v1/files/{copy_id}")
        );
    }

    #[test]
    fn methods_serialize_uppercase() {
        assert_eq!(
            serde_json::to_string(&TransferMethod::Put).unwrap(),
            "\"PUT\""
        );
    }
}
