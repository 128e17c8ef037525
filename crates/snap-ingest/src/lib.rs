//! Snapshot ingestion: discovery, decoding, normalization, partitioning.
//!
//! The pipeline from file system to graph message runs:
//!
//! 1. **watch**: glob discovery with session dedup and bounded batching
//! 2. **decode**: encoding-aware loading with a single UTF-8 fallback
//! 3. **record_set**: parsing the titles/data layout into typed frames
//! 4. **path_meta** / **normalize**: provenance stamping and column shaping
//! 5. **partition**: splitting each batch by its source column
//! 6. **stage**: the above wired up as a graph source stage

pub mod decode;
pub mod error;
pub mod normalize;
pub mod partition;
pub mod path_meta;
pub mod record_set;
pub mod stage;
pub mod watch;

pub use error::IngestError;
pub use normalize::{SOURCE_COLUMN, normalize_batch, normalize_file};
pub use partition::{PartitionBackend, partition_by_source};
pub use path_meta::{PathMeta, parse_path_meta};
pub use record_set::RawRecordSet;
pub use stage::{SNAPSHOT_SOURCE_NAME, SnapshotSourceStage, register_snapshot_source};
pub use watch::{DirectoryWatcher, PathBatchSource};
