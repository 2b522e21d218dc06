//! Validation of client-reported manifests.
//!
//! Local manifests and commit entries arrive from devices and are untrusted;
//! they are checked here before reaching the diff engine or the server
//! manifest.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::clock::VectorClock;
use crate::commit::CommitEntry;
use crate::models::{LocalFile, RemoteFile};

const MAX_TOKEN_LEN: usize = 128;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._:+/=-]+$").expect("Invalid regex"));

// Identifiers end up inside object-storage keys, so no separators
static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("Invalid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("file id must not be empty")]
    EmptyFileId,
    #[error("invalid {kind}: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("duplicate file id: {0}")]
    DuplicateFileId(String),
    #[error("invalid path for file {file_id}: {reason}")]
    InvalidPath { file_id: String, reason: &'static str },
    #[error("invalid content hash for file {0}")]
    InvalidContentHash(String),
    #[error("invalid device id in vector clock of file {0}")]
    InvalidDeviceId(String),
}

/// Validate a device's local manifest.
pub fn validate_local_manifest(files: &[LocalFile]) -> Result<(), ManifestError> {
    let mut seen = HashSet::with_capacity(files.len());
    for file in files {
        validate_record(
            &mut seen,
            file.file_id(),
            file.path(),
            file.content_hash(),
            file.vector_clock(),
        )?;
    }
    Ok(())
}

/// Validate the entries of a commit before they become server records.
///
/// Live entries must carry a content hash; tombstones may leave it empty.
pub fn validate_commit_entries(entries: &[CommitEntry]) -> Result<(), ManifestError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        let hash = Some(entry.content_hash.as_str()).filter(|hash| !hash.is_empty());
        if hash.is_none() && !entry.is_deleted {
            return Err(ManifestError::InvalidContentHash(entry.file_id.clone()));
        }
        validate_record(&mut seen, &entry.file_id, &entry.path, hash, &entry.vector_clock)?;
    }
    Ok(())
}

fn validate_record<'a>(
    seen: &mut HashSet<&'a str>,
    file_id: &'a str,
    path: &str,
    content_hash: Option<&str>,
    vector_clock: &VectorClock,
) -> Result<(), ManifestError> {
    if file_id.trim().is_empty() {
        return Err(ManifestError::EmptyFileId);
    }
    validate_identifier("file id", file_id)?;
    if !seen.insert(file_id) {
        return Err(ManifestError::DuplicateFileId(file_id.to_string()));
    }

    validate_path(file_id, path)?;

    if let Some(hash) = content_hash {
        if !is_valid_token(hash) {
            return Err(ManifestError::InvalidContentHash(file_id.to_string()));
        }
    }
    if !clock_devices_valid(vector_clock) {
        return Err(ManifestError::InvalidDeviceId(file_id.to_string()));
    }
    Ok(())
}

/// Check a vault, device, or file identifier before it is used in a storage key.
pub fn validate_identifier(kind: &'static str, value: &str) -> Result<(), ManifestError> {
    if IDENTIFIER_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ManifestError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

/// Parse a local manifest JSON array and validate it.
pub fn parse_local_manifest(json: &str) -> crate::Result<Vec<LocalFile>> {
    let files: Vec<LocalFile> = serde_json::from_str(json)?;
    validate_local_manifest(&files)?;
    Ok(files)
}

/// Parse a server manifest JSON array. Server records are trusted as stored.
pub fn parse_remote_manifest(json: &str) -> crate::Result<Vec<RemoteFile>> {
    Ok(serde_json::from_str(json)?)
}

fn validate_path(file_id: &str, path: &str) -> Result<(), ManifestError> {
    let invalid = |reason| ManifestError::InvalidPath {
        file_id: file_id.to_string(),
        reason,
    };

    if path.trim().is_empty() {
        return Err(invalid("path must not be empty"));
    }
    if path.starts_with('/') {
        return Err(invalid("path must be vault-relative"));
    }
    if path.contains('\\') {
        return Err(invalid("path must use forward slashes"));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(invalid("path must not contain traversal segments"));
    }
    Ok(())
}

fn clock_devices_valid(clock: &VectorClock) -> bool {
    clock.devices().all(is_valid_token)
}

fn is_valid_token(value: &str) -> bool {
    value.len() <= MAX_TOKEN_LEN && TOKEN_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeletedFile, PresentFile};

    fn file(id: &str, path: &str, hash: &str) -> LocalFile {
        LocalFile::Present(PresentFile {
            file_id: id.to_string(),
            path: path.to_string(),
            title: String::new(),
            size: 1,
            content_hash: hash.to_string(),
            vector_clock: [("laptop-1", 1)].into_iter().collect(),
        })
    }

    #[test]
    fn accepts_well_formed_manifest() {
        let tombstone = LocalFile::Deleted(DeletedFile {
            file_id: "f3".to_string(),
            path: "old.md".to_string(),
            vector_clock: VectorClock::new(),
        });
        let files = vec![
            file("f1", "notes/a.md", "sha256:abc123"),
            file("f2", "b c.md", "9f86d081884c7d65"),
            tombstone,
        ];
        assert_eq!(validate_local_manifest(&files), Ok(()));
    }

    #[test]
    fn parse_local_manifest_validates() {
        let json = r#"[
            {"fileId":"f1","path":"a.md","size":1,"contentHash":"h1","vectorClock":{}},
            {"fileId":"f1","path":"b.md","size":1,"contentHash":"h2","vectorClock":{}}
        ]"#;
        assert!(matches!(
            parse_local_manifest(json),
            Err(crate::Error::Manifest(ManifestError::DuplicateFileId(_)))
        ));
        assert!(matches!(
            parse_local_manifest("{"),
            Err(crate::Error::Serialization(_))
        ));
    }

    #[test]
    fn parse_remote_manifest_keeps_tombstones() {
        let files = parse_remote_manifest(
            r#"[{"id":"f1","path":"a.md","size":2,"contentHash":"h","isDeleted":true}]"#,
        )
        .unwrap();
        assert!(files[0].is_deleted);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let files = vec![file("f1", "a.md", "h"), file("f1", "b.md", "h")];
        assert_eq!(
            validate_local_manifest(&files),
            Err(ManifestError::DuplicateFileId("f1".to_string()))
        );
    }

    #[test]
    fn rejects_empty_id() {
        assert_eq!(
            validate_local_manifest(&[file(" ", "a.md", "h")]),
            Err(ManifestError::EmptyFileId)
        );
    }

    #[test]
    fn rejects_unsafe_paths() {
        for path in ["", "/etc/passwd", "a/../../b.md", "dir\\a.md"] {
            assert!(matches!(
                validate_local_manifest(&[file("f1", path, "h")]),
                Err(ManifestError::InvalidPath { .. })
            ));
        }
    }

    #[test]
    fn identifiers_cannot_escape_storage_keys() {
        assert!(validate_identifier("vault id", "vault-1").is_ok());
        assert!(validate_identifier("file id", "0193e5b2-7c1f-7a4e-9d2b-5c3f1e2a9b7d").is_ok());
        for bad in ["", "..", "a/b", ".hidden", "with space"] {
            assert!(validate_identifier("file id", bad).is_err(), "{bad} accepted");
        }
        assert!(matches!(
            validate_local_manifest(&[file("../f1", "a.md", "h")]),
            Err(ManifestError::InvalidIdentifier { kind: "file id", .. })
        ));
    }

    #[test]
    fn dotted_names_are_not_traversal() {
        assert!(validate_local_manifest(&[file("f1", "a/..b/c...md", "h")]).is_ok());
    }

    #[test]
    fn rejects_malformed_hash() {
        assert_eq!(
            validate_local_manifest(&[file("f1", "a.md", "bad hash")]),
            Err(ManifestError::InvalidContentHash("f1".to_string()))
        );
        let long = "a".repeat(MAX_TOKEN_LEN + 1);
        assert!(validate_local_manifest(&[file("f1", "a.md", &long)]).is_err());
    }

    fn entry(id: &str, path: &str, hash: &str) -> CommitEntry {
        CommitEntry {
            file_id: id.to_string(),
            path: path.to_string(),
            title: String::new(),
            size: 1,
            content_hash: hash.to_string(),
            vector_clock: [("laptop-1", 1)].into_iter().collect(),
            is_deleted: false,
            expected_hash: None,
        }
    }

    #[test]
    fn commit_entries_follow_manifest_path_rules() {
        let mut tombstone = entry("f2", "old.md", "");
        tombstone.is_deleted = true;
        assert_eq!(
            validate_commit_entries(&[entry("f1", "notes/a.md", "h1"), tombstone]),
            Ok(())
        );

        for path in ["../../etc/evil.md", "/abs.md", "a\\b.md", " "] {
            assert!(matches!(
                validate_commit_entries(&[entry("f1", path, "h1")]),
                Err(ManifestError::InvalidPath { .. })
            ));
        }
    }

    #[test]
    fn live_commit_entry_needs_hash() {
        assert_eq!(
            validate_commit_entries(&[entry("f1", "a.md", "")]),
            Err(ManifestError::InvalidContentHash("f1".to_string()))
        );
        assert_eq!(
            validate_commit_entries(&[entry("f1", "a.md", "bad hash")]),
            Err(ManifestError::InvalidContentHash("f1".to_string()))
        );
        assert_eq!(
            validate_commit_entries(&[entry("f1", "a.md", "h"), entry("f1", "b.md", "h")]),
            Err(ManifestError::DuplicateFileId("f1".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_device_id() {
        let LocalFile::Present(mut present) = file("f1", "a.md", "h") else {
            unreachable!();
        };
        present.vector_clock.increment("bad device");
        assert_eq!(
            validate_local_manifest(&[LocalFile::Present(present)]),
            Err(ManifestError::InvalidDeviceId("f1".to_string()))
        );
    }
}
