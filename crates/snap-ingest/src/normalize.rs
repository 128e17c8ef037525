//! Normalization of raw record sets into provenance-stamped frames.
//!
//! Each snapshot file becomes one frame: feature columns from the record
//! set (minus the excluded ones), optionally restricted and reordered to a
//! configured include list, plus four broadcast provenance columns derived
//! from the file path.

use std::path::Path;

use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series};

use snap_model::SourceOptions;

use crate::error::Result;
use crate::path_meta::{PathMeta, parse_path_meta, plugin_from_name};
use crate::record_set::{RawRecordSet, frame_from_rows};
use crate::{IngestError, decode::load_record_set};

/// Name of the provenance column frames are partitioned under.
pub const SOURCE_COLUMN: &str = "source";

/// Build the feature frame for one record set.
///
/// Excluded columns are first dropped from the header list and the frame is
/// built against the restricted headers. Record sets whose rows still carry
/// values for the excluded columns fail that build with an arity mismatch;
/// those are rebuilt against the full header list and the excluded columns
/// dropped afterwards.
pub fn record_frame(set: &RawRecordSet, cols_exclude: &[String], path: &Path) -> Result<DataFrame> {
    let feature_names: Vec<String> = set
        .titles
        .iter()
        .filter(|t| !cols_exclude.contains(t))
        .cloned()
        .collect();

    match frame_from_rows(&feature_names, &set.data, path) {
        Ok(df) => Ok(df),
        Err(IngestError::RowArity { .. }) => {
            tracing::info!(
                path = %path.display(),
                "rows carry excluded columns, rebuilding with full header list"
            );
            let mut df = frame_from_rows(&set.titles, &set.data, path)?;
            let present: Vec<&str> = cols_exclude
                .iter()
                .filter(|c| df.column(c).is_ok())
                .map(String::as_str)
                .collect();
            df = df.drop_many(present);
            Ok(df)
        }
        Err(err) => Err(err),
    }
}

/// Restrict and reorder `df` to the configured include list.
///
/// Included columns the record set never produced are materialized as
/// all-null string columns, so every plugin yields the same shape.
pub fn fill_included_columns(mut df: DataFrame, cols_include: &[String]) -> Result<DataFrame> {
    if cols_include.is_empty() {
        return Ok(df);
    }
    for name in cols_include {
        if df.column(name).is_err() {
            df.with_column(Series::full_null(
                name.as_str().into(),
                df.height(),
                &DataType::String,
            ))?;
        }
    }
    Ok(df.select(cols_include.iter().map(String::as_str))?)
}

/// Stamp the four provenance columns onto a feature frame.
pub fn attach_meta_columns(df: &mut DataFrame, meta: &PathMeta) -> Result<()> {
    let rows = df.height();
    df.with_column(Series::new("snapshot_id".into(), vec![meta.snapshot_id; rows]).into_column())?;
    df.with_column(Series::new("timestamp".into(), vec![meta.timestamp.clone(); rows]).into_column())?;
    df.with_column(Series::new(SOURCE_COLUMN.into(), vec![meta.source.clone(); rows]).into_column())?;
    df.with_column(Series::new("plugin".into(), vec![meta.plugin.clone(); rows]).into_column())?;
    Ok(())
}

/// Normalize one snapshot file into a provenance-stamped frame.
///
/// Returns `Ok(None)` when the file's plugin is not in the configured
/// plugin set; such files are skipped without being read or validated.
pub fn normalize_file(path: &Path, options: &SourceOptions) -> Result<Option<DataFrame>> {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let plugin = plugin_from_name(file_name);
    if !options.accepts_plugin(&plugin) {
        tracing::debug!(
            path = %path.display(),
            plugin,
            "skipping file for unselected plugin"
        );
        return Ok(None);
    }

    let meta = parse_path_meta(path)?;

    let set = load_record_set(path, &options.encoding)?;
    let df = record_frame(&set, &options.cols_exclude, path)?;
    let mut df = fill_included_columns(df, &options.cols_include)?;
    attach_meta_columns(&mut df, &meta)?;
    Ok(Some(df))
}

/// Normalize a batch of snapshot files.
///
/// Files that fail to decode or parse are logged and dropped; the rest of
/// the batch is unaffected. Structural path errors abort the batch, since
/// they indicate a misconfigured snapshot layout rather than one bad file.
pub fn normalize_batch(paths: &[std::path::PathBuf], options: &SourceOptions) -> Result<Vec<DataFrame>> {
    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        match normalize_file(path, options) {
            Ok(Some(df)) => frames.push(df),
            Ok(None) => {}
            Err(err) if err.is_recoverable_per_file() => {
                tracing::error!(
                    path = %path.display(),
                    error = %err,
                    "dropping unreadable snapshot file"
                );
            }
            Err(err) => return Err(err),
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(titles: &[&str], data: Vec<Vec<serde_json::Value>>) -> RawRecordSet {
        RawRecordSet {
            titles: titles.iter().map(ToString::to_string).collect(),
            data,
        }
    }

    fn path() -> &'static Path {
        Path::new("d/host/s-1/proc_2023.json")
    }

    #[test]
    fn excluded_columns_dropped_via_fallback() {
        let set = set(
            &["PID", "SHA256"],
            vec![vec![json!(1), json!("aa")], vec![json!(2), json!("bb")]],
        );
        let df = record_frame(&set, &["SHA256".to_string()], path()).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["PID"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn restricted_build_used_when_rows_match() {
        // Rows already lack the excluded column, so the first build succeeds.
        let set = set(&["PID"], vec![vec![json!(1)]]);
        let df = record_frame(&set, &["SHA256".to_string()], path()).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["PID"]);
    }

    #[test]
    fn include_list_orders_and_fills() {
        let set = set(&["B", "A"], vec![vec![json!(1), json!(2)]]);
        let df = record_frame(&set, &[], path()).unwrap();
        let include = vec!["A".to_string(), "Missing".to_string(), "B".to_string()];
        let df = fill_included_columns(df, &include).unwrap();

        assert_eq!(df.get_column_names_str(), vec!["A", "Missing", "B"]);
        assert_eq!(df.column("Missing").unwrap().null_count(), 1);
    }

    #[test]
    fn meta_columns_broadcast() {
        let set = set(&["PID"], vec![vec![json!(1)], vec![json!(2)]]);
        let mut df = record_frame(&set, &[], path()).unwrap();
        let meta = parse_path_meta(path()).unwrap();
        attach_meta_columns(&mut df, &meta).unwrap();

        assert_eq!(df.shape(), (2, 5));
        let sources = df.column("source").unwrap().str().unwrap();
        assert!(sources.into_iter().all(|v| v == Some("host")));
        let ids = df.column("snapshot_id").unwrap().i64().unwrap();
        assert!(ids.into_iter().all(|v| v == Some(1)));
    }
}
