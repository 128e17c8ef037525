//! Error types for snapshot ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading and normalizing snapshot files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Failed to read file bytes.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Decoding Errors ===
    /// The configured encoding label is not a known encoding.
    #[error("unknown encoding label '{label}'")]
    UnknownEncoding { label: String },

    /// File bytes are not valid under the given encoding.
    #[error("failed to decode {path} with {encoding} encoding")]
    Decode { path: PathBuf, encoding: String },

    /// Top-level JSON is malformed or missing `titles`/`data`.
    #[error("failed to parse record set {path}: {message}")]
    RecordSetParse { path: PathBuf, message: String },

    /// A data row does not match the arity of the header list.
    #[error("row {row} of {path} has {found} values, expected {expected}")]
    RowArity {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    // === Path Structure Errors ===
    /// The path has too few segments to carry source/snapshot metadata.
    #[error("invalid snapshot path {path}: {reason}")]
    PathStructure { path: PathBuf, reason: String },

    /// The snapshot directory segment does not carry a numeric id.
    #[error("invalid snapshot id '{token}' in {path}")]
    SnapshotId { path: PathBuf, token: String },

    // === Discovery Errors ===
    /// The configured glob pattern is invalid.
    #[error("invalid glob pattern '{pattern}': {message}")]
    GlobPattern { pattern: String, message: String },

    /// A glob entry could not be read.
    #[error("failed to read glob entry: {message}")]
    GlobEntry { message: String },

    // === Frame Errors ===
    /// Failed frame operation.
    #[error("frame operation failed: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
}

impl IngestError {
    /// Whether the batch loop may skip the offending file and continue.
    ///
    /// Decode and parse failures are expected noise in a continuously watched
    /// directory; structural path errors indicate a misconfigured layout and
    /// are raised to the caller.
    pub fn is_recoverable_per_file(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::RecordSetParse { .. } | Self::RowArity { .. }
        )
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        let decode = IngestError::Decode {
            path: PathBuf::from("a.json"),
            encoding: "latin1".to_string(),
        };
        assert!(decode.is_recoverable_per_file());

        let structural = IngestError::PathStructure {
            path: PathBuf::from("a.json"),
            reason: "too few segments".to_string(),
        };
        assert!(!structural.is_recoverable_per_file());
    }
}
