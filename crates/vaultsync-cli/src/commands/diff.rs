use std::path::Path;

use serde::Serialize;
use vaultsync_core::diff::compute_sync_actions_at;
use vaultsync_core::{ActionSummary, SyncAction};

use crate::commands::common::{
    format_action_lines, format_summary, normalize_device_name, read_local_manifest,
    read_remote_manifest, resolve_time,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct DiffOutput {
    pub actions: Vec<SyncAction>,
    pub summary: ActionSummary,
}

pub fn run_diff(
    local_path: &Path,
    remote_path: &Path,
    device_name: &str,
    at: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let output = diff_manifests(local_path, remote_path, device_name, at)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_action_lines(&output.actions) {
            println!("{line}");
        }
        println!("{}", format_summary(&output.summary));
    }

    Ok(())
}

pub fn diff_manifests(
    local_path: &Path,
    remote_path: &Path,
    device_name: &str,
    at: Option<&str>,
) -> Result<DiffOutput, CliError> {
    let device_name = normalize_device_name(device_name)?;
    let resolved_at = resolve_time(at)?;
    let local = read_local_manifest(local_path)?;
    let remote = read_remote_manifest(remote_path)?;

    let actions = compute_sync_actions_at(&local, &remote, &device_name, resolved_at);
    let summary = ActionSummary::from_actions(&actions);
    Ok(DiffOutput { actions, summary })
}
