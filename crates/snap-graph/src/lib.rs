//! Stage composition, schema reconciliation, and graph execution.
//!
//! This crate provides the contracts a processing graph is wired from:
//!
//! - **message**: the message shapes flowing between stages
//! - **stage**: the [`Stage`]/[`SourceStage`] composition contract
//! - **reconcile**: column completion for declared required columns
//! - **graph**: build-time wiring checks and the synchronous runner
//! - **registry**: stage registration with native/portable backend selection

pub mod error;
pub mod graph;
pub mod message;
pub mod reconcile;
pub mod registry;
pub mod stage;

pub use error::GraphError;
pub use graph::{Graph, GraphBuilder};
pub use message::{Message, OutputShape, SnapshotBatch, SnapshotMeta};
pub use reconcile::{
    ColumnCompletion, CompletionStage, completion_stage, fill_missing_columns, meta_message,
};
pub use registry::{Backend, StageRegistry};
pub use stage::{PipelineMode, SourceStage, Stage, StageInfo};
