use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use pretty_assertions::assert_eq;
use vaultsync_core::{ActionSummary, ClockRelation, QuotaStats, SyncActionKind};

use crate::cli::CompletionShell;
use crate::commands::common::{format_action_lines, format_summary, read_local_manifest, resolve_time};
use crate::commands::compare::compare_clocks;
use crate::commands::completions::completion_script;
use crate::commands::conflict_name::conflict_name;
use crate::commands::diff::diff_manifests;
use crate::commands::quota::{estimate_quota, format_quota_lines, QuotaOutput};
use crate::error::CliError;

const LOCAL_MANIFEST: &str = r#"[
    {"fileId":"f1","path":"notes/a.md","size":10,"contentHash":"h1","vectorClock":{"laptop":2}},
    {"fileId":"f2","path":"b.md","size":5,"contentHash":"h2","vectorClock":{"laptop":1}}
]"#;

const REMOTE_MANIFEST: &str = r#"[
    {"id":"f1","path":"notes/a.md","size":10,"contentHash":"h1-phone","vectorClock":{"phone":1}},
    {"id":"f3","path":"c.md","size":3,"contentHash":"h3","vectorClock":{"phone":1}},
    {"id":"f4","path":"gone.md","size":0,"contentHash":"","vectorClock":{"phone":2},"isDeleted":true}
]"#;

struct TempManifest(PathBuf);

impl TempManifest {
    fn new(contents: &str) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let suffix = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "vaultsync-cli-test-{}-{nanos}-{suffix}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for TempManifest {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn diff_reports_conflict_upload_and_remote_only_download() {
    let local = TempManifest::new(LOCAL_MANIFEST);
    let remote = TempManifest::new(REMOTE_MANIFEST);

    let output = diff_manifests(&local.0, &remote.0, " Laptop ", Some("2026-01-02 03:04")).unwrap();

    let kinds: Vec<_> = output
        .actions
        .iter()
        .map(|action| (action.file_id.as_str(), action.action))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("f1", SyncActionKind::Conflict),
            ("f2", SyncActionKind::Upload),
            ("f3", SyncActionKind::Download),
        ]
    );
    assert_eq!(
        output.actions[0].conflict_rename.as_deref(),
        Some("notes/a (Laptop - 2026-01-02 03:04).md")
    );
    assert_eq!(
        output.summary,
        ActionSummary {
            uploads: 1,
            downloads: 1,
            deletes: 0,
            conflicts: 1,
        }
    );
}

#[test]
fn action_lines_show_conflict_rename() {
    let local = TempManifest::new(LOCAL_MANIFEST);
    let remote = TempManifest::new(REMOTE_MANIFEST);
    let output = diff_manifests(&local.0, &remote.0, "Laptop", Some("2026-01-02 03:04")).unwrap();

    let lines = format_action_lines(&output.actions);
    assert_eq!(
        lines[0],
        "conflict notes/a.md -> notes/a (Laptop - 2026-01-02 03:04).md"
    );
    assert_eq!(lines[1], "upload   b.md");
    assert_eq!(
        format_summary(&output.summary),
        "1 upload(s), 1 download(s), 0 delete(s), 1 conflict(s)"
    );
    assert_eq!(format_summary(&ActionSummary::default()), "Already in sync");
}

#[test]
fn quota_counts_both_conflict_objects() {
    let local = TempManifest::new(LOCAL_MANIFEST);
    let remote = TempManifest::new(REMOTE_MANIFEST);

    let stats = estimate_quota(&local.0, &remote.0).unwrap();
    assert_eq!(
        stats,
        QuotaStats {
            upload_sizes: vec![10, 10, 5],
            total_new_size: 15,
        }
    );
}

#[test]
fn quota_lines_include_rejection_reason() {
    let output = QuotaOutput {
        stats: QuotaStats {
            upload_sizes: vec![7],
            total_new_size: 7,
        },
        largest_upload: Some(7),
        current_usage: 0,
        rejection: Some("too big".to_string()),
    };
    let lines = format_quota_lines(&output);
    assert_eq!(lines.last().unwrap(), "status:          rejected (too big)");
}

#[test]
fn invalid_local_manifest_is_rejected() {
    let duplicate = TempManifest::new(
        r#"[{"fileId":"f1","path":"a.md","contentHash":"h"},{"fileId":"f1","path":"b.md","contentHash":"h"}]"#,
    );
    assert!(matches!(
        read_local_manifest(&duplicate.0),
        Err(CliError::Core(vaultsync_core::Error::Manifest(_)))
    ));

    let malformed = TempManifest::new("{not json");
    assert!(matches!(
        read_local_manifest(&malformed.0),
        Err(CliError::Core(vaultsync_core::Error::Serialization(_)))
    ));
}

#[test]
fn missing_manifest_names_the_path() {
    let path = std::env::temp_dir().join("vaultsync-cli-test-does-not-exist.json");
    let error = read_local_manifest(&path).unwrap_err();
    assert!(matches!(error, CliError::ReadManifest { .. }));
    assert!(error.to_string().contains("does-not-exist"));
}

#[test]
fn conflict_name_uses_explicit_time() {
    assert_eq!(
        conflict_name("report.final.pdf", "Work PC", Some("2025-12-31 23:59")).unwrap(),
        "report.final (Work PC - 2025-12-31 23:59).pdf"
    );
    assert!(matches!(
        conflict_name("a.md", "  ", None),
        Err(CliError::EmptyDeviceName)
    ));
    assert!(matches!(
        conflict_name(" ", "Laptop", None),
        Err(CliError::EmptyPath)
    ));
}

#[test]
fn resolve_time_rejects_other_formats() {
    assert!(resolve_time(Some("2025-12-31T23:59:00")).is_err());
    assert!(resolve_time(None).is_ok());
}

#[test]
fn compare_clocks_reports_relation() {
    assert_eq!(
        compare_clocks(r#"{"a":2}"#, r#"{"a":1}"#).unwrap(),
        ClockRelation::After
    );
    assert_eq!(
        compare_clocks(r#"{"a":1}"#, r#"{"b":1}"#).unwrap(),
        ClockRelation::Concurrent
    );
    assert_eq!(compare_clocks("{}", r#"{"a":0}"#).unwrap(), ClockRelation::Equal);
    assert!(matches!(
        compare_clocks("[1]", "{}"),
        Err(CliError::InvalidClock { .. })
    ));
}

#[test]
fn completion_scripts_name_the_binary() {
    let script = String::from_utf8(completion_script(CompletionShell::Bash)).unwrap();
    assert!(script.contains("vaultsync"));
    assert!(script.contains("conflict-name"));
}
