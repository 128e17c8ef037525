//! Error types for graph construction and schema reconciliation.

use thiserror::Error;

/// Errors raised while building a graph or completing frame schemas.
///
/// Construction errors (`UnsupportedOutputShape`, `IncompatibleEdge`,
/// `DuplicateStageName`, ...) indicate a programming error in stage wiring and
/// are raised at build time, before any message flows.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A stage declared an output shape the reconciler cannot complete.
    #[error("output shape '{shape}' does not support column completion")]
    UnsupportedOutputShape { shape: &'static str },

    /// A stage was wired after an upstream node whose output it does not accept.
    #[error("stage '{stage}' does not accept '{shape}' output of '{upstream}'")]
    IncompatibleEdge {
        stage: String,
        upstream: String,
        shape: &'static str,
    },

    /// The graph was built without a source stage.
    #[error("graph has no source stage")]
    MissingSource,

    /// Two stages in one graph advertised the same unique name.
    #[error("duplicate stage name '{name}'")]
    DuplicateStageName { name: String },

    /// A stage name was requested from the registry but never registered.
    #[error("unknown stage '{name}'")]
    UnknownStage { name: String },

    /// A registered stage does not apply to the requested pipeline mode.
    #[error("stage '{name}' is not applicable in '{mode}' mode")]
    ModeMismatch { name: String, mode: &'static str },

    /// A frame operation failed while filling columns.
    #[error("frame operation failed: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
