//! Optimistic-concurrency check for committing a finished sync.
//!
//! Transfers run out of band, so another device may have committed between
//! this device's diff and its commit. Entries carry the hash they expect the
//! server to still hold; any mismatch rejects the whole commit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;
use crate::models::RemoteFile;

/// A file outcome reported by a device after its transfers completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEntry {
    pub file_id: String,
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_hash: String,
    #[serde(default)]
    pub vector_clock: VectorClock,
    #[serde(default)]
    pub is_deleted: bool,
    /// Hash the server held when the diff was computed; `None` skips the check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
}

impl CommitEntry {
    /// Server record this entry becomes once applied
    pub fn to_remote_file(&self) -> RemoteFile {
        RemoteFile {
            id: self.file_id.clone(),
            path: self.path.clone(),
            title: self.title.clone(),
            size: self.size,
            content_hash: self.content_hash.clone(),
            vector_clock: self.vector_clock.clone(),
            is_deleted: self.is_deleted,
        }
    }
}

/// A commit entry whose expected hash no longer matches the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitConflict {
    pub file_id: String,
    pub path: String,
    pub expected_hash: String,
    /// `None` when the server has no record of the file
    pub current_hash: Option<String>,
}

/// Every entry whose `expected_hash` differs from the current server hash.
pub fn find_commit_conflicts(entries: &[CommitEntry], current: &[RemoteFile]) -> Vec<CommitConflict> {
    let current_by_id: HashMap<&str, &RemoteFile> =
        current.iter().map(|file| (file.id.as_str(), file)).collect();

    entries
        .iter()
        .filter_map(|entry| {
            let expected_hash = entry.expected_hash.as_ref()?;
            let current_hash = current_by_id
                .get(entry.file_id.as_str())
                .map(|file| file.content_hash.clone());
            if current_hash.as_ref() == Some(expected_hash) {
                return None;
            }
            Some(CommitConflict {
                file_id: entry.file_id.clone(),
                path: entry.path.clone(),
                expected_hash: expected_hash.clone(),
                current_hash,
            })
        })
        .collect()
}
