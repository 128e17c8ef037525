//! Decoded snapshot record sets and their frame representation.
//!
//! A snapshot plugin file is a JSON object with two length-synchronized
//! top-level arrays: `titles` (column names) and `data` (rows positionally
//! aligned with `titles`). Rows whose arity disagrees with the header list in
//! use are a parse failure, never silently truncated.

use std::path::Path;

use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{IngestError, Result};

/// The decoded content of one snapshot plugin file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecordSet {
    /// Column names.
    pub titles: Vec<String>,
    /// Rows, each positionally aligned with `titles`.
    pub data: Vec<Vec<Value>>,
}

impl RawRecordSet {
    /// Parse a record set from decoded JSON text.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| IngestError::RecordSetParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Build a frame from `rows` under the header list `names`.
///
/// Every row must have exactly `names.len()` values; the first mismatch is
/// reported with its row index. Column dtypes are sniffed from the values:
/// all-integer columns become `Int64`, numeric columns `Float64`, boolean
/// columns `Boolean`, everything else `String`.
pub fn frame_from_rows(names: &[String], rows: &[Vec<Value>], path: &Path) -> Result<DataFrame> {
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != names.len() {
            return Err(IngestError::RowArity {
                path: path.to_path_buf(),
                row: idx,
                expected: names.len(),
                found: row.len(),
            });
        }
    }

    let columns = names
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<&Value> = rows.iter().map(|row| &row[col]).collect();
            column_series(name, &values).into_column()
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Sniff a column dtype from its JSON values and build the series.
fn column_series(name: &str, values: &[&Value]) -> Series {
    if values.is_empty() {
        return Series::new_empty(name.into(), &DataType::String);
    }

    let non_null = values.iter().filter(|v| !v.is_null()).count();
    if non_null == 0 {
        return Series::full_null(name.into(), values.len(), &DataType::String);
    }

    if values.iter().all(|v| v.is_null() || v.as_i64().is_some()) {
        let ints: Vec<Option<i64>> = values.iter().map(|v| v.as_i64()).collect();
        return Series::new(name.into(), ints);
    }

    if values.iter().all(|v| v.is_null() || v.is_number()) {
        let floats: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
        return Series::new(name.into(), floats);
    }

    if values.iter().all(|v| v.is_null() || v.is_boolean()) {
        let bools: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
        return Series::new(name.into(), bools);
    }

    let strings: Vec<Option<String>> = values
        .iter()
        .map(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name.into(), strings)
}
