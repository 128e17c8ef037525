//! Provenance metadata carried by snapshot file paths.
//!
//! Snapshot layouts place each plugin file under
//! `<...>/<source>/<snapshot-dir>/<plugin>_<timestamp>.json`, where the
//! snapshot directory name carries the numeric snapshot id after its first
//! `-` (for example `snapshot-42`). All three directory-derived fields plus
//! the plugin name are extracted here, before any file content is read.

use std::path::Path;

use crate::error::{IngestError, Result};

/// Provenance extracted from one snapshot file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMeta {
    /// Machine or capture origin, the third-from-last path segment.
    pub source: String,
    /// Numeric snapshot ordinal within the source.
    pub snapshot_id: i64,
    /// Raw capture-time token from the file name.
    pub timestamp: String,
    /// Plugin name, the file-name prefix before the first `_`.
    pub plugin: String,
}

/// Extract provenance metadata from a snapshot file path.
pub fn parse_path_meta(path: &Path) -> Result<PathMeta> {
    let segments: Vec<&str> = path
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if segments.len() < 3 {
        return Err(IngestError::PathStructure {
            path: path.to_path_buf(),
            reason: format!(
                "expected at least source/snapshot/file segments, found {}",
                segments.len()
            ),
        });
    }

    let file_name = segments[segments.len() - 1];
    let snapshot_dir = segments[segments.len() - 2];
    let source = segments[segments.len() - 3];

    let token = snapshot_dir.split('-').nth(1).unwrap_or("");
    let snapshot_id = token
        .parse::<i64>()
        .map_err(|_| IngestError::SnapshotId {
            path: path.to_path_buf(),
            token: token.to_string(),
        })?;

    let timestamp = timestamp_from_name(file_name).ok_or_else(|| IngestError::PathStructure {
        path: path.to_path_buf(),
        reason: format!("file name '{file_name}' carries no capture-time token"),
    })?;

    Ok(PathMeta {
        source: source.to_string(),
        snapshot_id,
        timestamp,
        plugin: plugin_from_name(file_name),
    })
}

/// Plugin name of a snapshot file: the stem up to the first `_`, or the
/// whole stem when the name has no underscore.
pub fn plugin_from_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".json").unwrap_or(file_name);
    match stem.split_once('_') {
        Some((plugin, _)) => plugin.to_string(),
        None => stem.to_string(),
    }
}

/// Capture-time token of a snapshot file name.
///
/// The token is the maximal trailing run of `[0-9-_.]` characters that
/// follows an underscore preceded by a lowercase letter. Plugin names may
/// themselves contain underscores (`plugin_list_2023.json`), so the scan
/// walks candidate underscores left to right and accepts the first whose
/// suffix is entirely token characters.
fn timestamp_from_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(".json")?;
    let bytes = stem.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        if b != b'_' || idx == 0 || !bytes[idx - 1].is_ascii_lowercase() {
            continue;
        }
        let suffix = &stem[idx + 1..];
        if !suffix.is_empty()
            && suffix
                .bytes()
                .all(|c| c.is_ascii_digit() || matches!(c, b'-' | b'_' | b'.'))
        {
            return Some(suffix.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_all_fields() {
        let path = PathBuf::from("/data/hostA/snap-42/proc_2023-01-02.json");
        let meta = parse_path_meta(&path).unwrap();
        assert_eq!(meta.source, "hostA");
        assert_eq!(meta.snapshot_id, 42);
        assert_eq!(meta.timestamp, "2023-01-02");
        assert_eq!(meta.plugin, "proc");
    }

    #[test]
    fn multi_segment_timestamp() {
        let path = PathBuf::from("captures/box7/run-3/envars_2022-01-30_10-26-01.json");
        let meta = parse_path_meta(&path).unwrap();
        assert_eq!(meta.timestamp, "2022-01-30_10-26-01");
        assert_eq!(meta.plugin, "envars");
    }

    #[test]
    fn underscored_plugin_name() {
        let path = PathBuf::from("d/host/s-1/plugin_list_2023.json");
        let meta = parse_path_meta(&path).unwrap();
        assert_eq!(meta.plugin, "plugin");
        assert_eq!(meta.timestamp, "2023");
    }

    #[test]
    fn missing_timestamp_rejected() {
        let path = PathBuf::from("d/host/s-1/handles.json");
        let err = parse_path_meta(&path).unwrap_err();
        assert!(matches!(err, IngestError::PathStructure { .. }));
    }

    #[test]
    fn too_few_segments_rejected() {
        let path = PathBuf::from("proc_2023.json");
        let err = parse_path_meta(&path).unwrap_err();
        assert!(matches!(err, IngestError::PathStructure { .. }));
    }

    #[test]
    fn non_numeric_snapshot_id_rejected() {
        let path = PathBuf::from("d/host/snapshot-zz/proc_2023.json");
        let err = parse_path_meta(&path).unwrap_err();
        match err {
            IngestError::SnapshotId { token, .. } => assert_eq!(token, "zz"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn snapshot_dir_without_dash_rejected() {
        let path = PathBuf::from("d/host/latest/proc_2023.json");
        assert!(matches!(
            parse_path_meta(&path).unwrap_err(),
            IngestError::SnapshotId { .. }
        ));
    }
}
