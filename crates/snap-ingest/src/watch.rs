//! File discovery: glob scanning with session-scoped dedup and batching.

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use snap_model::WatcherConfig;

use crate::error::{IngestError, Result};

/// How often the watcher re-scans while waiting for new files.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A blocking producer of path batches.
pub trait PathBatchSource: Send {
    /// The next batch of paths, or `None` when the source is exhausted.
    fn next_batch(&mut self) -> Result<Option<Vec<PathBuf>>>;
}

/// Glob-driven file discovery with a bounded in-memory queue.
///
/// Every path is emitted at most once per session. In one-shot mode the
/// watcher drains whatever the glob matches and then reports exhaustion; in
/// watch mode it keeps polling, blocking until at least one new file shows
/// up and then accumulating further arrivals until the batch timeout or the
/// queue bound, whichever comes first.
pub struct DirectoryWatcher {
    config: WatcherConfig,
    seen: BTreeSet<PathBuf>,
    pending: VecDeque<PathBuf>,
    emitted: i64,
    done: bool,
}

impl DirectoryWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            seen: BTreeSet::new(),
            pending: VecDeque::new(),
            emitted: 0,
            done: false,
        }
    }

    /// The glob actually matched against. With recursion disabled every
    /// `**` in the configured pattern is demoted to a single-level `*`.
    fn effective_pattern(&self) -> String {
        if self.config.recursive {
            self.config.input_glob.clone()
        } else {
            self.config.input_glob.replace("**", "*")
        }
    }

    /// Scan the glob and queue paths not seen this session.
    fn scan(&mut self) -> Result<usize> {
        let pattern = self.effective_pattern();
        let entries = glob::glob(&pattern).map_err(|e| IngestError::GlobPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut fresh = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| IngestError::GlobEntry {
                message: e.to_string(),
            })?;
            if path.is_file() && !self.seen.contains(&path) {
                fresh.push(path);
            }
        }
        if self.config.sort_glob {
            fresh.sort();
        }

        let count = fresh.len();
        for path in fresh {
            self.seen.insert(path.clone());
            self.pending.push_back(path);
        }
        if count > 0 {
            tracing::debug!(count, pattern, "discovered new snapshot files");
        }
        Ok(count)
    }

    /// Paths still allowed under the `max_files` cap.
    fn budget(&self) -> usize {
        if self.config.max_files < 0 {
            usize::MAX
        } else {
            usize::try_from((self.config.max_files - self.emitted).max(0)).unwrap_or(0)
        }
    }

    fn drain_batch(&mut self) -> Vec<PathBuf> {
        let take = self
            .pending
            .len()
            .min(self.config.queue_max_size)
            .min(self.budget());
        let batch: Vec<PathBuf> = self.pending.drain(..take).collect();
        self.emitted += batch.len() as i64;
        batch
    }
}

impl PathBatchSource for DirectoryWatcher {
    fn next_batch(&mut self) -> Result<Option<Vec<PathBuf>>> {
        if self.done {
            return Ok(None);
        }
        if self.budget() == 0 {
            self.done = true;
            return Ok(None);
        }

        if self.pending.is_empty() {
            self.scan()?;
        }

        if self.config.watch_directory {
            while self.pending.is_empty() {
                std::thread::sleep(POLL_INTERVAL);
                self.scan()?;
            }
            // Something arrived; keep collecting until the window closes.
            let deadline = Instant::now() + self.config.batch_timeout;
            while Instant::now() < deadline && self.pending.len() < self.config.queue_max_size {
                std::thread::sleep(POLL_INTERVAL);
                self.scan()?;
            }
        } else if self.pending.is_empty() {
            self.done = true;
            return Ok(None);
        }

        let batch = self.drain_batch();
        tracing::debug!(count = batch.len(), "assembled path batch");
        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seed(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"{}").unwrap();
        }
        dir
    }

    fn config(dir: &TempDir) -> WatcherConfig {
        WatcherConfig::new(format!("{}/**/*.json", dir.path().display())).with_sort_glob(true)
    }

    #[test]
    fn one_shot_drains_then_exhausts() {
        let dir = seed(&["h/s-1/proc_1.json", "h/s-1/envars_1.json"]);
        let mut watcher = DirectoryWatcher::new(config(&dir));

        let batch = watcher.next_batch().unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert!(watcher.next_batch().unwrap().is_none());
        // Exhaustion is sticky.
        assert!(watcher.next_batch().unwrap().is_none());
    }

    #[test]
    fn paths_never_repeat_within_a_session() {
        let dir = seed(&["h/s-1/proc_1.json"]);
        let mut watcher = DirectoryWatcher::new(config(&dir));

        let first = watcher.next_batch().unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert!(watcher.next_batch().unwrap().is_none());
    }

    #[test]
    fn queue_bound_chunks_batches() {
        let dir = seed(&[
            "h/s-1/a_1.json",
            "h/s-1/b_1.json",
            "h/s-1/c_1.json",
            "h/s-1/d_1.json",
            "h/s-1/e_1.json",
        ]);
        let mut watcher = DirectoryWatcher::new(config(&dir).with_queue_max_size(2));

        let sizes: Vec<usize> = std::iter::from_fn(|| watcher.next_batch().unwrap())
            .map(|b| b.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn max_files_caps_emission() {
        let dir = seed(&["h/s-1/a_1.json", "h/s-1/b_1.json", "h/s-1/c_1.json"]);
        let mut watcher = DirectoryWatcher::new(config(&dir).with_max_files(2));

        let batch = watcher.next_batch().unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert!(watcher.next_batch().unwrap().is_none());
    }

    #[test]
    fn sorted_emission_order() {
        let dir = seed(&["h/s-1/b_1.json", "h/s-1/a_1.json"]);
        let mut watcher = DirectoryWatcher::new(config(&dir));

        let batch = watcher.next_batch().unwrap().unwrap();
        let names: Vec<_> = batch
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_1.json", "b_1.json"]);
    }

    #[test]
    fn bad_pattern_rejected() {
        let mut watcher = DirectoryWatcher::new(WatcherConfig::new("[invalid"));
        assert!(matches!(
            watcher.next_batch().unwrap_err(),
            IngestError::GlobPattern { .. }
        ));
    }
}
