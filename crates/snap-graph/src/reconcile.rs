//! Schema reconciliation: column completion for declared required columns.
//!
//! Stages downstream of a frame-constructing node may declare, at graph build
//! time, the columns they will read. Reconciliation guarantees every declared
//! column exists before any of them runs: columns absent from an arriving
//! frame are appended filled with a type-appropriate default, columns already
//! present are left untouched, and applying the same spec twice is a no-op.
//!
//! Fill values are part of the output contract: numeric kinds are filled with
//! zero (not null), strings with the empty string, booleans with `false`.

use std::sync::Arc;

use anyhow::Result;
use polars::prelude::{DataFrame, DataType, NamedFrom, Series};

use snap_model::{ColumnKind, RequiredColumns};

use crate::error::{GraphError, Result as GraphResult};
use crate::message::{Message, OutputShape, SnapshotMeta};
use crate::stage::{PipelineMode, Stage, StageInfo};

/// The frame dtype a [`ColumnKind`] materializes as.
pub fn fill_dtype(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Int64 => DataType::Int64,
        ColumnKind::Float32 => DataType::Float32,
        ColumnKind::String => DataType::String,
        ColumnKind::Bool => DataType::Boolean,
    }
}

/// Build a fill column of `len` default values for `kind`.
fn fill_series(name: &str, kind: ColumnKind, len: usize) -> Series {
    match kind {
        ColumnKind::Int64 => Series::new(name.into(), vec![0i64; len]),
        ColumnKind::Float32 => Series::new(name.into(), vec![0.0f32; len]),
        ColumnKind::String => Series::new(name.into(), vec![""; len]),
        ColumnKind::Bool => Series::new(name.into(), vec![false; len]),
    }
}

/// Append every declared column missing from `df`, filled with defaults.
///
/// Existing columns are never altered, so the operation is idempotent.
pub fn fill_missing_columns(df: &mut DataFrame, required: &RequiredColumns) -> GraphResult<()> {
    let height = df.height();
    for (name, kind) in required.iter() {
        let exists = df.get_column_names().iter().any(|c| c.as_str() == name);
        if exists {
            continue;
        }
        tracing::debug!(
            column = name,
            kind = kind.display_name(),
            "materializing missing column"
        );
        df.with_column(fill_series(name, kind, height))?;
    }
    Ok(())
}

/// The column-completion operation, independent of graph wiring.
///
/// Dispatch follows the shape of the arriving message: raw frames are filled
/// directly; metadata-wrapped frames are filled under scoped exclusive access
/// to the wrapper's frame; row-collection batches delegate to the wrapped
/// metadata. Any other message shape is a wiring error.
#[derive(Debug, Clone)]
pub struct ColumnCompletion {
    required: RequiredColumns,
}

impl ColumnCompletion {
    pub fn new(required: RequiredColumns) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &RequiredColumns {
        &self.required
    }

    /// Complete a raw frame in place.
    pub fn complete_frame(&self, df: &mut DataFrame) -> GraphResult<()> {
        fill_missing_columns(df, &self.required)
    }

    /// Complete the frame held by a metadata wrapper. Exclusive access is
    /// scoped to the fill and released on every exit path.
    pub fn complete_meta(&self, meta: &SnapshotMeta) -> GraphResult<()> {
        meta.with_frame_mut(|df| fill_missing_columns(df, &self.required))
    }

    /// Complete one message, dispatching on its shape.
    pub fn complete(&self, message: Message) -> GraphResult<Message> {
        match message {
            Message::Frame(mut df) => {
                self.complete_frame(&mut df)?;
                Ok(Message::Frame(df))
            }
            Message::Meta(meta) => {
                self.complete_meta(&meta)?;
                Ok(Message::Meta(meta))
            }
            Message::Batch(batch) => {
                self.complete_meta(batch.meta())?;
                Ok(Message::Batch(batch))
            }
            other => Err(GraphError::UnsupportedOutputShape {
                shape: other.shape().display_name(),
            }),
        }
    }
}

/// A [`Stage`] wrapping a [`ColumnCompletion`], spliced into the graph
/// immediately after a frame-constructing node.
#[derive(Debug)]
pub struct CompletionStage {
    shape: [OutputShape; 1],
    completion: ColumnCompletion,
}

impl CompletionStage {
    fn new(shape: OutputShape, required: RequiredColumns) -> Self {
        Self {
            shape: [shape],
            completion: ColumnCompletion::new(required),
        }
    }

    pub fn completion(&self) -> &ColumnCompletion {
        &self.completion
    }
}

impl Stage for CompletionStage {
    fn info(&self) -> StageInfo {
        StageInfo::new("column-completion", PipelineMode::Any)
    }

    fn accepted_inputs(&self) -> &[OutputShape] {
        &self.shape
    }

    fn output_shape(&self) -> OutputShape {
        self.shape[0]
    }

    fn apply(&mut self, input: Message) -> Result<Vec<Message>> {
        Ok(vec![self.completion.complete(input)?])
    }
}

/// Derive the completion step for a stage's declared output shape.
///
/// Returns `None` for an empty spec (no hop is inserted); fails fast with the
/// offending shape name when the shape cannot carry a completion step. Such a
/// shape is a stage-wiring bug, never silently skipped.
pub fn completion_stage(
    shape: OutputShape,
    required: &RequiredColumns,
) -> GraphResult<Option<CompletionStage>> {
    if required.is_empty() {
        return Ok(None);
    }
    match shape {
        OutputShape::Frame | OutputShape::Meta | OutputShape::Batch => {
            Ok(Some(CompletionStage::new(shape, required.clone())))
        }
        other => Err(GraphError::UnsupportedOutputShape {
            shape: other.display_name(),
        }),
    }
}

/// Convenience used by meta-emitting sources: wrap a partitioned frame.
pub fn meta_message(source: impl Into<String>, frame: DataFrame) -> Message {
    Message::Meta(Arc::new(SnapshotMeta::new(source, frame)))
}
