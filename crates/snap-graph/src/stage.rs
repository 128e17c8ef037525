//! The stage composition contract.
//!
//! Every node in a processing graph is either a [`SourceStage`] (produces
//! batches of messages) or a [`Stage`] (transforms one message into zero or
//! more). Both advertise a [`StageInfo`] and a declared [`OutputShape`]; the
//! graph builder uses the declarations to reject incompatible wiring before
//! execution starts and to splice a column-completion node after stages that
//! construct new frames.
//!
//! A stage's transform is never invoked concurrently with itself on the same
//! instance, and it must not keep cross-message caches: scheduler reruns may
//! replay messages.

use anyhow::Result;

use snap_model::RequiredColumns;

use crate::error::Result as GraphResult;
use crate::message::{Message, OutputShape};
use crate::reconcile::{CompletionStage, completion_stage};

/// Pipeline mode a stage applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Tabular feature pipelines (frames of typed columns).
    Tabular,
    /// Applicable in any mode.
    Any,
}

impl PipelineMode {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Tabular => "tabular",
            Self::Any => "any",
        }
    }

    /// Whether a stage registered for `self` may run in `requested` mode.
    pub fn applies_to(self, requested: PipelineMode) -> bool {
        self == PipelineMode::Any || self == requested
    }
}

/// Advertised identity of a stage.
#[derive(Debug, Clone)]
pub struct StageInfo {
    /// Unique stage name within a graph.
    pub name: String,
    /// Pipeline mode the stage applies to.
    pub mode: PipelineMode,
    /// Whether an accelerated (native) implementation is available. The
    /// builder selects it when present; both implementations must be
    /// behaviorally equivalent for the same input.
    pub accelerated: bool,
}

impl StageInfo {
    pub fn new(name: impl Into<String>, mode: PipelineMode) -> Self {
        Self {
            name: name.into(),
            mode,
            accelerated: false,
        }
    }

    pub fn accelerated(mut self) -> Self {
        self.accelerated = true;
        self
    }
}

/// A transform node: one input message, zero or more output messages.
pub trait Stage {
    /// Advertised identity.
    fn info(&self) -> StageInfo;

    /// Input shapes this stage accepts; checked at graph build time.
    fn accepted_inputs(&self) -> &[OutputShape];

    /// Declared shape of emitted messages.
    fn output_shape(&self) -> OutputShape;

    /// Transform one input unit. Must be side-effect-free with respect to
    /// shared state.
    fn apply(&mut self, input: Message) -> Result<Vec<Message>>;

    /// Whether this stage constructs new frames (rather than passing through
    /// frames built upstream). Only such stages get a completion node.
    fn emits_new_frames(&self) -> bool {
        false
    }

    /// Post-construction hook, invoked exactly once per stage per graph
    /// build, after the stage's own node is wired. The default derives a
    /// column-completion step for frame-constructing stages; an unsupported
    /// declared shape fails the build here.
    fn completion_step(&self, required: &RequiredColumns) -> GraphResult<Option<CompletionStage>> {
        if self.emits_new_frames() {
            completion_stage(self.output_shape(), required)
        } else {
            Ok(None)
        }
    }
}

/// A source node: produces message batches until exhausted.
pub trait SourceStage {
    /// Advertised identity.
    fn info(&self) -> StageInfo;

    /// Declared shape of emitted messages.
    fn output_shape(&self) -> OutputShape;

    /// Produce the next batch, or `None` once the source is exhausted. Batch
    /// boundaries are governed by the source's own accumulation policy.
    fn next_batch(&mut self) -> Result<Option<Vec<Message>>>;

    /// Sources construct new frames by definition; override to opt out.
    fn emits_new_frames(&self) -> bool {
        true
    }

    /// Post-construction hook; see [`Stage::completion_step`].
    fn completion_step(&self, required: &RequiredColumns) -> GraphResult<Option<CompletionStage>> {
        if self.emits_new_frames() {
            completion_stage(self.output_shape(), required)
        } else {
            Ok(None)
        }
    }
}
