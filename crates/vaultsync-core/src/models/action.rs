//! Sync action model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::VectorClock;

/// Identifier of a forked conflict copy, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictCopyId(Uuid);

impl ConflictCopyId {
    /// Create a new unique conflict copy ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConflictCopyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConflictCopyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConflictCopyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// What the requesting device must do with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncActionKind {
    Upload,
    Download,
    Delete,
    /// Overwrite the server copy with local content and fork the server's
    /// version into a renamed copy
    Conflict,
}

impl SyncActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Delete => "delete",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One decided action for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAction {
    pub file_id: String,
    pub path: String,
    pub action: SyncActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Server clock the device adopts once the action is applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_vector_clock: Option<VectorClock>,
    /// Display/storage name of the forked copy of the server's version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_rename: Option<String>,
    /// Uniqueness key of the forked copy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_copy_id: Option<ConflictCopyId>,
}

impl SyncAction {
    /// Bare action with no optional payload
    pub fn new(file_id: impl Into<String>, path: impl Into<String>, action: SyncActionKind) -> Self {
        Self {
            file_id: file_id.into(),
            path: path.into(),
            action,
            size: None,
            content_hash: None,
            remote_vector_clock: None,
            conflict_rename: None,
            conflict_copy_id: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, size: u64, content_hash: impl Into<String>) -> Self {
        self.size = Some(size);
        self.content_hash = Some(content_hash.into());
        self
    }

    #[must_use]
    pub fn with_remote_clock(mut self, clock: Option<&VectorClock>) -> Self {
        self.remote_vector_clock = clock.cloned();
        self
    }

    #[must_use]
    pub fn with_conflict_copy(mut self, rename: String, copy_id: ConflictCopyId) -> Self {
        self.conflict_rename = Some(rename);
        self.conflict_copy_id = Some(copy_id);
        self
    }
}
