use std::path::Path;

use serde::Serialize;
use vaultsync_core::{compute_sync_actions, compute_upload_quota_stats, QuotaLimits, QuotaStats};

use crate::cli::DEFAULT_DEVICE_NAME;
use crate::commands::common::{read_local_manifest, read_remote_manifest};
use crate::error::CliError;

pub struct QuotaArgs<'a> {
    pub local: &'a Path,
    pub remote: &'a Path,
    pub current_usage: u64,
    pub max_file_size: Option<u64>,
    pub storage_limit: Option<u64>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaOutput {
    #[serde(flatten)]
    pub stats: QuotaStats,
    pub largest_upload: Option<u64>,
    pub current_usage: u64,
    /// Why the batch would be rejected, if it would
    pub rejection: Option<String>,
}

/// Prints the estimate, then fails when a limit would be exceeded.
pub fn run_quota(args: &QuotaArgs<'_>) -> Result<(), CliError> {
    let limits = QuotaLimits {
        max_file_size: args.max_file_size,
        storage_limit: args.storage_limit,
    };
    let stats = estimate_quota(args.local, args.remote)?;
    let outcome = stats.enforce(&limits, args.current_usage);

    let output = QuotaOutput {
        largest_upload: stats.largest_upload(),
        current_usage: args.current_usage,
        rejection: outcome.as_ref().err().map(ToString::to_string),
        stats,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_quota_lines(&output) {
            println!("{line}");
        }
    }

    outcome?;
    Ok(())
}

pub fn estimate_quota(local_path: &Path, remote_path: &Path) -> Result<QuotaStats, CliError> {
    let local = read_local_manifest(local_path)?;
    let remote = read_remote_manifest(remote_path)?;
    let actions = compute_sync_actions(&local, &remote, DEFAULT_DEVICE_NAME);
    Ok(compute_upload_quota_stats(&local, &remote, &actions))
}

pub fn format_quota_lines(output: &QuotaOutput) -> Vec<String> {
    let mut lines = vec![
        format!("objects written: {}", output.stats.upload_sizes.len()),
        format!(
            "largest object:  {} bytes",
            output.largest_upload.unwrap_or(0)
        ),
        format!("new bytes:       {}", output.stats.total_new_size),
        format!("current usage:   {}", output.current_usage),
    ];
    lines.push(match &output.rejection {
        Some(reason) => format!("status:          rejected ({reason})"),
        None => "status:          ok".to_string(),
    });
    lines
}
