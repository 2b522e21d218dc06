use std::path::Path;

use chrono::{Local, NaiveDateTime};
use vaultsync_core::manifest::{parse_local_manifest, parse_remote_manifest};
use vaultsync_core::{ActionSummary, LocalFile, RemoteFile, SyncAction, SyncActionKind, VectorClock};

use crate::error::CliError;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Read and validate a device manifest.
pub fn read_local_manifest(path: &Path) -> Result<Vec<LocalFile>, CliError> {
    let json = read_manifest_file(path)?;
    let files = parse_local_manifest(&json)?;
    tracing::debug!(files = files.len(), "Validated local manifest");
    Ok(files)
}

pub fn read_remote_manifest(path: &Path) -> Result<Vec<RemoteFile>, CliError> {
    let json = read_manifest_file(path)?;
    Ok(parse_remote_manifest(&json)?)
}

fn read_manifest_file(path: &Path) -> Result<String, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::ReadManifest {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = json.len(), "Loaded manifest");
    Ok(json)
}

pub fn parse_clock(input: &str) -> Result<VectorClock, CliError> {
    serde_json::from_str(input).map_err(|source| CliError::InvalidClock {
        input: input.to_string(),
        source,
    })
}

/// Parse a `--at` value, falling back to the current local time.
pub fn resolve_time(at: Option<&str>) -> Result<NaiveDateTime, CliError> {
    match at {
        Some(raw) => NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT)
            .map_err(|_| CliError::InvalidTime(raw.to_string())),
        None => Ok(Local::now().naive_local()),
    }
}

pub fn normalize_device_name(name: &str) -> Result<String, CliError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyDeviceName);
    }
    Ok(trimmed.to_string())
}

pub fn format_action_lines(actions: &[SyncAction]) -> Vec<String> {
    actions
        .iter()
        .map(|action| match (&action.action, &action.conflict_rename) {
            (SyncActionKind::Conflict, Some(rename)) => {
                format!("{:<8} {} -> {rename}", action.action.label(), action.path)
            }
            _ => format!("{:<8} {}", action.action.label(), action.path),
        })
        .collect()
}

pub fn format_summary(summary: &ActionSummary) -> String {
    if summary.total() == 0 {
        return "Already in sync".to_string();
    }
    format!(
        "{} upload(s), {} download(s), {} delete(s), {} conflict(s)",
        summary.uploads, summary.downloads, summary.deletes, summary.conflicts
    )
}
