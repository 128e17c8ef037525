//! Configuration options for snapshot ingestion.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Column the exclusion list defaults to when none is configured.
pub const DEFAULT_EXCLUDED_COLUMN: &str = "SHA256";

/// Primary text encoding used when none is configured.
pub const DEFAULT_ENCODING: &str = "latin1";

/// Options controlling how plugin snapshot files are normalized.
///
/// `cols_include` is ordered and defines the final column order of every
/// normalized frame; `cols_exclude` is a set that defaults to a single
/// sentinel column ([`DEFAULT_EXCLUDED_COLUMN`]); `plugins_include` names the
/// plugin identifiers that are accepted: files from any other plugin are
/// skipped as expected noise, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Ordered columns to extract; absent columns are null-filled.
    pub cols_include: Vec<String>,

    /// Columns dropped when present.
    pub cols_exclude: Vec<String>,

    /// Accepted plugin identifiers (portion of the file name before the
    /// first underscore).
    pub plugins_include: Vec<String>,

    /// Primary text encoding label (e.g. `latin1`). Decode failures retry
    /// once with UTF-8 unless this label itself starts with `utf`.
    pub encoding: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            cols_include: Vec::new(),
            cols_exclude: vec![DEFAULT_EXCLUDED_COLUMN.to_string()],
            plugins_include: Vec::new(),
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl SourceOptions {
    pub fn new(
        cols_include: Vec<String>,
        plugins_include: Vec<String>,
    ) -> Self {
        Self {
            cols_include,
            plugins_include,
            ..Self::default()
        }
    }

    pub fn with_cols_exclude(mut self, cols_exclude: Vec<String>) -> Self {
        self.cols_exclude = cols_exclude;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Whether the plugin identifier is in the accepted set.
    pub fn accepts_plugin(&self, plugin: &str) -> bool {
        self.plugins_include.iter().any(|p| p == plugin)
    }
}

/// Configuration for the file discovery source.
///
/// Batch sizes are governed by whatever accumulated in the queue within the
/// timeout window, not a fixed count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Glob pattern matching the files to read, e.g.
    /// `./input/<source>/snapshot-*/*.json`.
    pub input_glob: String,

    /// Keep watching the directory for new files after the initial scan.
    pub watch_directory: bool,

    /// Maximum number of files to read; `-1` is unbounded.
    pub max_files: i64,

    /// Emit files in sorted order.
    pub sort_glob: bool,

    /// Match files in subdirectories of the glob.
    pub recursive: bool,

    /// Bound on the internal path queue (backpressure).
    pub queue_max_size: usize,

    /// How long to wait while assembling one batch from the queue.
    pub batch_timeout: Duration,
}

impl WatcherConfig {
    pub fn new(input_glob: impl Into<String>) -> Self {
        Self {
            input_glob: input_glob.into(),
            watch_directory: false,
            max_files: -1,
            sort_glob: false,
            recursive: true,
            queue_max_size: 128,
            batch_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_watch_directory(mut self, watch: bool) -> Self {
        self.watch_directory = watch;
        self
    }

    pub fn with_max_files(mut self, max_files: i64) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_sort_glob(mut self, sort: bool) -> Self {
        self.sort_glob = sort;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_queue_max_size(mut self, size: usize) -> Self {
        self.queue_max_size = size;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_exclusion_sentinel() {
        let options = SourceOptions::default();
        assert_eq!(options.cols_exclude, vec!["SHA256"]);
        assert_eq!(options.encoding, "latin1");
    }

    #[test]
    fn plugin_acceptance() {
        let options = SourceOptions::new(
            vec!["PID".to_string()],
            vec!["proc".to_string(), "threadlist".to_string()],
        );
        assert!(options.accepts_plugin("proc"));
        assert!(!options.accepts_plugin("handles"));
    }

    #[test]
    fn watcher_defaults() {
        let config = WatcherConfig::new("./input/**/*.json");
        assert_eq!(config.max_files, -1);
        assert!(!config.watch_directory);
        assert!(config.recursive);
        assert_eq!(config.queue_max_size, 128);
    }
}
