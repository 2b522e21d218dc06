//! Display names for forked conflict copies.

use chrono::{Local, NaiveDateTime};

/// Device names longer than this are truncated with a `...` suffix
pub const MAX_DEVICE_NAME_CHARS: usize = 30;

/// Name for the conflict copy of `path`, stamped with the current local time.
///
/// The name is for display and storage paths only. Two conflicts on the same
/// path within the same minute produce the same name; callers key copies by
/// [`ConflictCopyId`](crate::models::ConflictCopyId).
pub fn generate_conflict_name(path: &str, device_name: &str) -> String {
    generate_conflict_name_at(path, device_name, Local::now().naive_local())
}

/// Name for the conflict copy of `path` as resolved at `resolved_at`.
///
/// ```
/// use chrono::NaiveDate;
/// use vaultsync_core::conflict_name::generate_conflict_name_at;
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 9)
///     .unwrap()
///     .and_hms_opt(14, 5, 0)
///     .unwrap();
/// assert_eq!(
///     generate_conflict_name_at("notes/todo.md", "Laptop", at),
///     "notes/todo (Laptop - 2024-03-09 14:05).md"
/// );
/// ```
pub fn generate_conflict_name_at(
    path: &str,
    device_name: &str,
    resolved_at: NaiveDateTime,
) -> String {
    let (dir, file_name) = path
        .rfind('/')
        .map_or(("", path), |index| path.split_at(index + 1));
    let (base, ext) = match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    };

    format!(
        "{dir}{base} ({} - {}){ext}",
        truncate_device_name(device_name),
        resolved_at.format("%Y-%m-%d %H:%M")
    )
}

fn truncate_device_name(device_name: &str) -> String {
    if device_name.chars().count() > MAX_DEVICE_NAME_CHARS {
        let truncated: String = device_name.chars().take(MAX_DEVICE_NAME_CHARS).collect();
        format!("{truncated}...")
    } else {
        device_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 31)
            .unwrap()
            .and_hms_opt(9, 7, 42)
            .unwrap()
    }

    #[test]
    fn keeps_directory_and_extension() {
        assert_eq!(
            generate_conflict_name_at("journal/2025/jan.md", "Phone", at()),
            "journal/2025/jan (Phone - 2025-01-31 09:07).md"
        );
    }

    #[test]
    fn splits_on_last_dot_only() {
        assert_eq!(
            generate_conflict_name_at("archive.tar.gz", "Phone", at()),
            "archive.tar (Phone - 2025-01-31 09:07).gz"
        );
    }

    #[test]
    fn file_without_extension() {
        assert_eq!(
            generate_conflict_name_at("docs/README", "Phone", at()),
            "docs/README (Phone - 2025-01-31 09:07)"
        );
    }

    #[test]
    fn leading_dot_is_not_an_extension() {
        assert_eq!(
            generate_conflict_name_at(".obsidian", "Phone", at()),
            ".obsidian (Phone - 2025-01-31 09:07)"
        );
    }

    #[test]
    fn dot_in_directory_is_ignored() {
        assert_eq!(
            generate_conflict_name_at("v1.2/notes", "Phone", at()),
            "v1.2/notes (Phone - 2025-01-31 09:07)"
        );
    }

    #[test]
    fn long_device_name_is_truncated() {
        let device = "a".repeat(31);
        let name = generate_conflict_name_at("a.md", &device, at());
        assert_eq!(
            name,
            format!("a ({}... - 2025-01-31 09:07).md", "a".repeat(30))
        );
    }

    #[test]
    fn device_name_at_limit_is_kept() {
        let device = "é".repeat(30);
        let name = generate_conflict_name_at("a.md", &device, at());
        assert!(name.contains(&device));
        assert!(!name.contains("..."));
    }

    #[test]
    fn same_inputs_give_same_name() {
        assert_eq!(
            generate_conflict_name_at("a.md", "Phone", at()),
            generate_conflict_name_at("a.md", "Phone", at())
        );
    }

    #[test]
    fn current_time_name_has_minute_stamp() {
        let pattern =
            regex::Regex::new(r"^notes/plan \(Tablet - \d{4}-\d{2}-\d{2} \d{2}:\d{2}\)\.md$")
                .unwrap();
        let name = generate_conflict_name("notes/plan.md", "Tablet");
        assert!(pattern.is_match(&name), "unexpected name: {name}");
    }
}
