//! Messages exchanged between graph stages.
//!
//! Every value flowing along an edge is a [`Message`]. The variant determines
//! the [`OutputShape`] a stage must declare to emit it, and the shape in turn
//! selects the strategy the schema reconciler uses to complete missing
//! columns.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use polars::prelude::DataFrame;

/// Abstract category of a stage's emitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// A batch of discovered file paths.
    PathBatch,
    /// A raw frame with no wrapper.
    Frame,
    /// A frame wrapped with source metadata ([`SnapshotMeta`]).
    Meta,
    /// A row range over a metadata-wrapped frame ([`SnapshotBatch`]).
    Batch,
}

impl OutputShape {
    /// Stable name used in wiring errors and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::PathBatch => "path-batch",
            Self::Frame => "frame",
            Self::Meta => "meta",
            Self::Batch => "batch",
        }
    }
}

/// A frame paired with the source it was partitioned under.
///
/// The frame is guarded so that the reconciler can take exclusive mutable
/// access scoped exactly to a column-fill operation; the guard is released on
/// every exit path. Concurrent readers during that window are serialized by
/// the lock.
#[derive(Debug)]
pub struct SnapshotMeta {
    source: String,
    frame: Mutex<DataFrame>,
}

impl SnapshotMeta {
    pub fn new(source: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            source: source.into(),
            frame: Mutex::new(frame),
        }
    }

    /// The source key this frame was partitioned under.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of rows in the wrapped frame.
    pub fn row_count(&self) -> usize {
        self.with_frame(polars::prelude::DataFrame::height)
    }

    /// Run `f` with shared access to the frame.
    pub fn with_frame<R>(&self, f: impl FnOnce(&DataFrame) -> R) -> R {
        // A poisoned lock only means a panic elsewhere; the frame itself is
        // still structurally valid, so recover the guard.
        let guard = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with exclusive mutable access to the frame. The lock is held
    /// for exactly the duration of `f` and released even if `f` errors.
    pub fn with_frame_mut<R>(&self, f: impl FnOnce(&mut DataFrame) -> R) -> R {
        let mut guard = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Consume the wrapper and return the frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A contiguous row range over a [`SnapshotMeta`] frame.
///
/// Stages that fan one snapshot out into per-row-range work units emit these;
/// the reconciler completes them through the embedded meta handle.
#[derive(Debug, Clone)]
pub struct SnapshotBatch {
    meta: Arc<SnapshotMeta>,
    offset: usize,
    count: usize,
}

impl SnapshotBatch {
    pub fn new(meta: Arc<SnapshotMeta>, offset: usize, count: usize) -> Self {
        Self {
            meta,
            offset,
            count,
        }
    }

    /// The metadata wrapper this batch ranges over.
    pub fn meta(&self) -> &Arc<SnapshotMeta> {
        &self.meta
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Copy of the rows this batch covers.
    pub fn rows(&self) -> DataFrame {
        self.meta
            .with_frame(|df| df.slice(self.offset as i64, self.count))
    }
}

/// One unit of data flowing along a graph edge.
#[derive(Debug, Clone)]
pub enum Message {
    /// Discovered file paths, in discovery order.
    Paths(Vec<PathBuf>),
    /// A raw frame.
    Frame(DataFrame),
    /// A metadata-wrapped frame.
    Meta(Arc<SnapshotMeta>),
    /// A row range over a metadata-wrapped frame.
    Batch(SnapshotBatch),
}

impl Message {
    /// The shape of this message.
    pub fn shape(&self) -> OutputShape {
        match self {
            Self::Paths(_) => OutputShape::PathBatch,
            Self::Frame(_) => OutputShape::Frame,
            Self::Meta(_) => OutputShape::Meta,
            Self::Batch(_) => OutputShape::Batch,
        }
    }
}
