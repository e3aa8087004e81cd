//! Capture artifact naming

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Timestamp layout used in artifact filenames
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Build the artifact filename stem `{serial}_{status}_{timestamp}`.
///
/// Absent optional components are omitted together with their separator; the
/// timestamp is always present.
pub fn artifact_stem(
    serial: Option<&str>,
    status: Option<&str>,
    timestamp: DateTime<Local>,
) -> String {
    let ts = timestamp.format(TIMESTAMP_FORMAT).to_string();
    let mut parts: Vec<&str> = Vec::new();
    if let Some(serial) = serial {
        parts.push(serial);
    }
    if let Some(status) = status {
        parts.push(status);
    }
    parts.push(&ts);
    parts.join("_")
}

/// Resolve a destination path for `stem` inside `dest_dir` that does not
/// collide with an existing file: `_1`, `_2`, ... is appended until the name
/// is unique.
pub fn unique_path(dest_dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = dest_dir.join(format!("{}.{}", stem, extension));
    if !candidate.exists() {
        return candidate;
    }
    let mut counter = 1;
    loop {
        let candidate = dest_dir.join(format!("{}_{}.{}", stem, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 15, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_full_stem() {
        assert_eq!(
            artifact_stem(Some("SN123456"), Some("ModelA"), ts()),
            "SN123456_ModelA_20240315_093005"
        );
    }

    #[test]
    fn test_absent_components_are_omitted() {
        assert_eq!(artifact_stem(None, Some("ok"), ts()), "ok_20240315_093005");
        assert_eq!(artifact_stem(Some("SN1"), None, ts()), "SN1_20240315_093005");
        assert_eq!(artifact_stem(None, None, ts()), "20240315_093005");
    }

    #[test]
    fn test_unique_path_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_path(dir.path(), "a_b", "jpg");
        assert_eq!(first, dir.path().join("a_b.jpg"));
        std::fs::write(&first, b"x").unwrap();

        let second = unique_path(dir.path(), "a_b", "jpg");
        assert_eq!(second, dir.path().join("a_b_1.jpg"));
        std::fs::write(&second, b"x").unwrap();

        let third = unique_path(dir.path(), "a_b", "jpg");
        assert_eq!(third, dir.path().join("a_b_2.jpg"));
    }
}
