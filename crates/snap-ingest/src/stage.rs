//! The snapshot source stage: discovery, normalization, and partitioning
//! wired into the graph contract.

use snap_graph::{
    Message, OutputShape, PipelineMode, SourceStage, StageInfo, StageRegistry, meta_message,
};
use snap_model::{SourceOptions, WatcherConfig};

use crate::normalize::{SOURCE_COLUMN, normalize_batch};
use crate::partition::{PartitionBackend, partition_by_source};
use crate::watch::{DirectoryWatcher, PathBatchSource};

/// Registered name of the snapshot source stage.
pub const SNAPSHOT_SOURCE_NAME: &str = "from-snapshot";

/// Source stage that turns discovered snapshot files into per-source
/// metadata-wrapped frames.
///
/// Each emitted batch covers one path batch from the underlying discovery
/// source: its files are normalized, concatenated, and split by source, one
/// message per distinct source. Path batches whose every file was skipped or
/// dropped produce no messages; the stage moves on to the next batch instead
/// of emitting an empty one.
pub struct SnapshotSourceStage {
    paths: Box<dyn PathBatchSource>,
    options: SourceOptions,
    backend: PartitionBackend,
}

impl SnapshotSourceStage {
    pub fn new(config: WatcherConfig, options: SourceOptions, backend: PartitionBackend) -> Self {
        Self::with_source(Box::new(DirectoryWatcher::new(config)), options, backend)
    }

    /// Build over an arbitrary path source.
    pub fn with_source(
        paths: Box<dyn PathBatchSource>,
        options: SourceOptions,
        backend: PartitionBackend,
    ) -> Self {
        Self {
            paths,
            options,
            backend,
        }
    }
}

impl SourceStage for SnapshotSourceStage {
    fn info(&self) -> StageInfo {
        let info = StageInfo::new(SNAPSHOT_SOURCE_NAME, PipelineMode::Tabular);
        match self.backend {
            PartitionBackend::Native => info.accelerated(),
            PartitionBackend::Portable => info,
        }
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Meta
    }

    fn next_batch(&mut self) -> anyhow::Result<Option<Vec<Message>>> {
        loop {
            let Some(paths) = self.paths.next_batch()? else {
                return Ok(None);
            };

            let frames = normalize_batch(&paths, &self.options)?;
            let by_source = partition_by_source(frames, SOURCE_COLUMN, self.backend)?;
            if by_source.is_empty() {
                continue;
            }

            let messages = by_source
                .into_iter()
                .map(|(source, frame)| {
                    tracing::info!(source, rows = frame.height(), "emitting snapshot frame");
                    meta_message(source, frame)
                })
                .collect();
            return Ok(Some(messages));
        }
    }
}

/// Register the snapshot source under both backends.
///
/// The portable constructor always filters per source key; the accelerated
/// one delegates the split to the frame engine and is picked whenever the
/// build prefers native backends.
pub fn register_snapshot_source(
    registry: &mut StageRegistry,
    config: WatcherConfig,
    options: SourceOptions,
) -> snap_graph::error::Result<()> {
    let (portable_config, portable_options) = (config.clone(), options.clone());
    registry.register_source(SNAPSHOT_SOURCE_NAME, PipelineMode::Tabular, move || {
        Box::new(SnapshotSourceStage::new(
            portable_config.clone(),
            portable_options.clone(),
            PartitionBackend::Portable,
        ))
    });
    registry.register_source_native(SNAPSHOT_SOURCE_NAME, move || {
        Box::new(SnapshotSourceStage::new(
            config.clone(),
            options.clone(),
            PartitionBackend::Native,
        ))
    })
}
