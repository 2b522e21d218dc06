//! Manifest file models

use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;

/// A file present on the reporting device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentFile {
    /// Stable identifier shared across devices and server
    pub file_id: String,
    /// Vault-relative path
    pub path: String,
    pub title: String,
    /// Content size in bytes
    pub size: u64,
    pub content_hash: String,
    pub vector_clock: VectorClock,
}

/// A file deleted on the reporting device but not yet confirmed removed from
/// the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFile {
    pub file_id: String,
    pub path: String,
    /// Clock as of the deletion
    pub vector_clock: VectorClock,
}

/// One entry of a device's local manifest.
///
/// On the wire a local tombstone is reported with an empty `contentHash` (or
/// `isDeleted: true`); decoding turns that into [`LocalFile::Deleted`] so a
/// genuinely empty file can never be mistaken for a deletion downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LocalFileRecord", into = "LocalFileRecord")]
pub enum LocalFile {
    Present(PresentFile),
    Deleted(DeletedFile),
}

impl LocalFile {
    pub fn file_id(&self) -> &str {
        match self {
            Self::Present(file) => &file.file_id,
            Self::Deleted(file) => &file.file_id,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Present(file) => &file.path,
            Self::Deleted(file) => &file.path,
        }
    }

    pub const fn vector_clock(&self) -> &VectorClock {
        match self {
            Self::Present(file) => &file.vector_clock,
            Self::Deleted(file) => &file.vector_clock,
        }
    }

    /// Content hash, `None` for a local tombstone
    pub fn content_hash(&self) -> Option<&str> {
        match self {
            Self::Present(file) => Some(&file.content_hash),
            Self::Deleted(_) => None,
        }
    }

    /// Size in bytes, 0 for a local tombstone
    pub const fn size(&self) -> u64 {
        match self {
            Self::Present(file) => file.size,
            Self::Deleted(_) => 0,
        }
    }

    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }
}

impl From<PresentFile> for LocalFile {
    fn from(file: PresentFile) -> Self {
        Self::Present(file)
    }
}

impl From<DeletedFile> for LocalFile {
    fn from(file: DeletedFile) -> Self {
        Self::Deleted(file)
    }
}

/// Wire representation of a [`LocalFile`] as reported by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFileRecord {
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
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_deleted: bool,
}

impl From<LocalFileRecord> for LocalFile {
    fn from(record: LocalFileRecord) -> Self {
        if record.is_deleted || record.content_hash.is_empty() {
            Self::Deleted(DeletedFile {
                file_id: record.file_id,
                path: record.path,
                vector_clock: record.vector_clock,
            })
        } else {
            Self::Present(PresentFile {
                file_id: record.file_id,
                path: record.path,
                title: record.title,
                size: record.size,
                content_hash: record.content_hash,
                vector_clock: record.vector_clock,
            })
        }
    }
}

impl From<LocalFile> for LocalFileRecord {
    fn from(file: LocalFile) -> Self {
        match file {
            LocalFile::Present(file) => Self {
                file_id: file.file_id,
                path: file.path,
                title: file.title,
                size: file.size,
                content_hash: file.content_hash,
                vector_clock: file.vector_clock,
                is_deleted: false,
            },
            LocalFile::Deleted(file) => Self {
                file_id: file.file_id,
                path: file.path,
                title: String::new(),
                size: 0,
                content_hash: String::new(),
                vector_clock: file.vector_clock,
                is_deleted: true,
            },
        }
    }
}

/// A file record in the server's authoritative manifest, including
/// soft-deleted rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub title: String,
    pub size: u64,
    pub content_hash: String,
    #[serde(default)]
    pub vector_clock: VectorClock,
    /// Tombstone flag
    #[serde(default)]
    pub is_deleted: bool,
}
