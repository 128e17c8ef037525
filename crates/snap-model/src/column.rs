//! Primitive column type tags used by required-column declarations.

use serde::{Deserialize, Serialize};

/// Primitive scalar type of a declared column.
///
/// Stages declare the columns they (or their downstream consumers) will read
/// as a name plus one of these tags. The tag decides the fill value used when
/// a column has to be materialized on a frame that lacks it: numeric kinds are
/// filled with zero (never null), [`ColumnKind::String`] with the empty
/// string, and [`ColumnKind::Bool`] with `false`. A filled column reads as
/// "not yet computed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// 64-bit signed integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// UTF-8 string.
    String,
    /// Boolean flag.
    Bool,
}

impl ColumnKind {
    /// Whether the kind is numeric (and therefore zero-filled).
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int64 | Self::Float32)
    }

    /// Human-readable name for logs and error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::String => "string",
            Self::Bool => "bool",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_kinds() {
        assert!(ColumnKind::Int64.is_numeric());
        assert!(ColumnKind::Float32.is_numeric());
        assert!(!ColumnKind::String.is_numeric());
        assert!(!ColumnKind::Bool.is_numeric());
    }
}
