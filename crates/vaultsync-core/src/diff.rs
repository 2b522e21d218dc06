//! Sync diff engine.
//!
//! Resolves a device's local manifest against the server manifest and decides
//! one action per file. Matching is by file ID; paths may differ between the
//! two sides when a file was renamed.
//!
//! When both sides changed the content concurrently, the local version wins
//! and the server's version is preserved as a renamed conflict copy.

use std::collections::{HashMap, HashSet};

use chrono::{Local, NaiveDateTime};

use crate::clock::{compare, ClockRelation};
use crate::conflict_name::generate_conflict_name_at;
use crate::models::{ConflictCopyId, LocalFile, PresentFile, RemoteFile, SyncAction, SyncActionKind};

/// Decide the sync action for every file known to either side.
///
/// Actions follow local-manifest order, followed by server-only files in
/// server-manifest order. Files both sides agree on produce no action.
pub fn compute_sync_actions(
    local: &[LocalFile],
    remote: &[RemoteFile],
    device_name: &str,
) -> Vec<SyncAction> {
    compute_sync_actions_at(local, remote, device_name, Local::now().naive_local())
}

/// [`compute_sync_actions`] with an explicit conflict resolution time.
pub fn compute_sync_actions_at(
    local: &[LocalFile],
    remote: &[RemoteFile],
    device_name: &str,
    resolved_at: NaiveDateTime,
) -> Vec<SyncAction> {
    let remote_by_id: HashMap<&str, &RemoteFile> =
        remote.iter().map(|file| (file.id.as_str(), file)).collect();
    let local_ids: HashSet<&str> = local.iter().map(LocalFile::file_id).collect();

    let mut actions = Vec::new();

    for file in local {
        let counterpart = remote_by_id.get(file.file_id()).copied();
        if let Some(action) = resolve_file(file, counterpart, device_name, resolved_at) {
            tracing::debug!(
                file_id = %action.file_id,
                action = %action.action,
                has_remote = counterpart.is_some(),
                "Resolved sync action"
            );
            actions.push(action);
        }
    }

    // Created on a peer device and never seen here
    for file in remote {
        if file.is_deleted || local_ids.contains(file.id.as_str()) {
            continue;
        }
        tracing::debug!(file_id = %file.id, "Remote-only file, scheduling download");
        actions.push(download(&file.id, file));
    }

    let summary = ActionSummary::from_actions(&actions);
    tracing::info!(
        local_files = local.len(),
        remote_files = remote.len(),
        uploads = summary.uploads,
        downloads = summary.downloads,
        deletes = summary.deletes,
        conflicts = summary.conflicts,
        "Computed sync actions"
    );

    actions
}

/// Number of actions of each kind in a diff result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ActionSummary {
    pub uploads: usize,
    pub downloads: usize,
    pub deletes: usize,
    pub conflicts: usize,
}

impl ActionSummary {
    pub fn from_actions(actions: &[SyncAction]) -> Self {
        actions.iter().fold(Self::default(), |mut summary, action| {
            match action.action {
                SyncActionKind::Upload => summary.uploads += 1,
                SyncActionKind::Download => summary.downloads += 1,
                SyncActionKind::Delete => summary.deletes += 1,
                SyncActionKind::Conflict => summary.conflicts += 1,
            }
            summary
        })
    }

    pub const fn total(&self) -> usize {
        self.uploads + self.downloads + self.deletes + self.conflicts
    }
}

fn resolve_file(
    local: &LocalFile,
    remote: Option<&RemoteFile>,
    device_name: &str,
    resolved_at: NaiveDateTime,
) -> Option<SyncAction> {
    let Some(remote) = remote else {
        return match local {
            LocalFile::Deleted(_) => None,
            LocalFile::Present(file) => Some(upload(file, None)),
        };
    };

    let relation = compare(local.vector_clock(), &remote.vector_clock);

    match (local, remote.is_deleted) {
        (LocalFile::Deleted(_), true) => None,
        (LocalFile::Deleted(file), false) => match relation {
            ClockRelation::After => Some(delete(&file.file_id, &file.path, remote)),
            // Remote wins and the file is resurrected locally
            ClockRelation::Before | ClockRelation::Equal | ClockRelation::Concurrent => {
                Some(download(&file.file_id, remote))
            }
        },
        (LocalFile::Present(file), true) => match relation {
            // A concurrent local edit beats the remote delete
            ClockRelation::After | ClockRelation::Concurrent => Some(upload(file, Some(remote))),
            ClockRelation::Before | ClockRelation::Equal => {
                Some(delete(&file.file_id, &file.path, remote))
            }
        },
        (LocalFile::Present(file), false) => {
            resolve_live(file, remote, relation, device_name, resolved_at)
        }
    }
}

fn resolve_live(
    local: &PresentFile,
    remote: &RemoteFile,
    relation: ClockRelation,
    device_name: &str,
    resolved_at: NaiveDateTime,
) -> Option<SyncAction> {
    if local.content_hash == remote.content_hash {
        if local.path != remote.path {
            return Some(match relation {
                ClockRelation::After => upload(local, Some(remote)),
                ClockRelation::Before | ClockRelation::Equal | ClockRelation::Concurrent => {
                    download(&local.file_id, remote)
                }
            });
        }

        // Same bytes in the same place: only the clocks need to converge
        return match relation {
            ClockRelation::Equal => None,
            ClockRelation::After => Some(upload(local, Some(remote))),
            ClockRelation::Before | ClockRelation::Concurrent => {
                Some(download(&local.file_id, remote))
            }
        };
    }

    match relation {
        ClockRelation::After => Some(upload(local, Some(remote))),
        ClockRelation::Before => Some(download(&local.file_id, remote)),
        ClockRelation::Equal | ClockRelation::Concurrent => {
            Some(conflict(local, remote, device_name, resolved_at))
        }
    }
}

fn upload(local: &PresentFile, remote: Option<&RemoteFile>) -> SyncAction {
    SyncAction::new(&local.file_id, &local.path, SyncActionKind::Upload)
        .with_content(local.size, &local.content_hash)
        .with_remote_clock(remote.map(|file| &file.vector_clock))
}

fn download(file_id: &str, remote: &RemoteFile) -> SyncAction {
    SyncAction::new(file_id, &remote.path, SyncActionKind::Download)
        .with_content(remote.size, &remote.content_hash)
        .with_remote_clock(Some(&remote.vector_clock))
}

fn delete(file_id: &str, path: &str, remote: &RemoteFile) -> SyncAction {
    SyncAction::new(file_id, path, SyncActionKind::Delete)
        .with_remote_clock(Some(&remote.vector_clock))
}

fn conflict(
    local: &PresentFile,
    remote: &RemoteFile,
    device_name: &str,
    resolved_at: NaiveDateTime,
) -> SyncAction {
    let rename = generate_conflict_name_at(&remote.path, device_name, resolved_at);
    let copy_id = ConflictCopyId::new();
    tracing::info!(
        file_id = %local.file_id,
        conflict_copy_id = %copy_id,
        "Concurrent edit detected, forking server copy"
    );
    SyncAction::new(&local.file_id, &local.path, SyncActionKind::Conflict)
        .with_content(local.size, &local.content_hash)
        .with_remote_clock(Some(&remote.vector_clock))
        .with_conflict_copy(rename, copy_id)
}
