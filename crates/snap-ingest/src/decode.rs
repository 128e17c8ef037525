//! Encoding-aware record-set loading with a single UTF-8 fallback.

use std::path::Path;

use encoding_rs::Encoding;

use crate::error::{IngestError, Result};
use crate::record_set::RawRecordSet;

/// Label of the universal fallback encoding.
const FALLBACK_ENCODING: &str = "utf-8";

/// Read and parse a record set, retrying once with UTF-8.
///
/// A decode-or-parse failure under the primary encoding is retried with
/// UTF-8. When the primary label itself starts with `utf` the original error
/// is returned untouched instead of re-decoding. A failure after the
/// fallback is fatal for this file.
pub fn load_record_set(path: &Path, encoding: &str) -> Result<RawRecordSet> {
    match decode_and_parse(path, encoding) {
        Ok(set) => Ok(set),
        Err(err) if err.is_recoverable_per_file() => {
            tracing::error!(
                path = %path.display(),
                encoding,
                error = %err,
                "unable to load record set with configured encoding"
            );
            if encoding.to_ascii_lowercase().starts_with("utf") {
                return Err(err);
            }
            tracing::info!(
                path = %path.display(),
                "retrying with {FALLBACK_ENCODING} encoding"
            );
            decode_and_parse(path, FALLBACK_ENCODING)
        }
        Err(err) => Err(err),
    }
}

/// Decode file bytes with one encoding and parse the result.
fn decode_and_parse(path: &Path, encoding: &str) -> Result<RawRecordSet> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let enc = Encoding::for_label(encoding.as_bytes()).ok_or_else(|| {
        IngestError::UnknownEncoding {
            label: encoding.to_string(),
        }
    })?;

    // Label-faithful decode: no BOM sniffing may silently switch encodings.
    let (text, had_errors) = enc.decode_without_bom_handling(&bytes);
    if had_errors {
        return Err(IngestError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.to_string(),
        });
    }

    RawRecordSet::parse(&text, path)
}
