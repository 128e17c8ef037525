//! Core data model for snapshot telemetry ingestion.
//!
//! This crate holds the dependency-light types shared across the workspace:
//!
//! - **column**: primitive column type tags ([`ColumnKind`])
//! - **required**: ordered required-column declarations ([`RequiredColumns`])
//! - **options**: ingestion and discovery configuration

pub mod column;
pub mod options;
pub mod required;

pub use column::ColumnKind;
pub use options::{DEFAULT_ENCODING, DEFAULT_EXCLUDED_COLUMN, SourceOptions, WatcherConfig};
pub use required::RequiredColumns;
