//! Data models for vaultsync

mod action;
mod file;

pub use action::{ConflictCopyId, SyncAction, SyncActionKind};
pub use file::{DeletedFile, LocalFile, LocalFileRecord, PresentFile, RemoteFile};
