//! Splitting a batch of normalized frames by their source column.

use std::collections::BTreeMap;

use polars::prelude::{ChunkCompareEq, ChunkUnique, DataFrame};

use crate::error::Result;

/// Which partition implementation to use.
///
/// Both backends produce identical per-source frames for the same input;
/// the native one delegates the split to the frame engine while the
/// portable one filters per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionBackend {
    #[default]
    Native,
    Portable,
}

/// Concatenate normalized frames and split them by the `key` column.
///
/// Returns one frame per distinct key value, keyed by value. An empty input
/// batch yields an empty map. With a single distinct value the combined
/// frame is returned whole, skipping the split entirely.
pub fn partition_by_source(
    frames: Vec<DataFrame>,
    key: &str,
    backend: PartitionBackend,
) -> Result<BTreeMap<String, DataFrame>> {
    let Some(combined) = concat_frames(frames)? else {
        return Ok(BTreeMap::new());
    };

    let values = combined.column(key)?.str()?;
    let unique: Vec<String> = values
        .unique()?
        .into_iter()
        .flatten()
        .map(ToString::to_string)
        .collect();

    if let [only] = unique.as_slice() {
        return Ok(BTreeMap::from([(only.clone(), combined)]));
    }

    match backend {
        PartitionBackend::Portable => {
            let mut by_source = BTreeMap::new();
            for value in unique {
                let mask = combined.column(key)?.str()?.equal(value.as_str());
                by_source.insert(value, combined.filter(&mask)?);
            }
            Ok(by_source)
        }
        PartitionBackend::Native => {
            let parts = combined.partition_by_stable([key], true)?;
            let mut by_source = BTreeMap::new();
            for part in parts {
                let value = part
                    .column(key)?
                    .str()?
                    .get(0)
                    .unwrap_or_default()
                    .to_string();
                by_source.insert(value, part);
            }
            Ok(by_source)
        }
    }
}

/// Vertically stack a batch of frames, or `None` when the batch is empty.
///
/// Frames from different plugins disagree on fill-column dtypes: an
/// include-listed column a plugin never produced arrives as an all-null
/// string column, while a peer frame carries real typed values for it. Those
/// fill columns are cast to the peer dtype before stacking.
fn concat_frames(frames: Vec<DataFrame>) -> Result<Option<DataFrame>> {
    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return Ok(None);
    };
    for mut frame in iter {
        align_fill_columns(&mut combined, &mut frame)?;
        combined.vstack_mut(&frame)?;
    }
    Ok(Some(combined))
}

/// Cast all-null fill columns to the dtype their peer frame carries.
///
/// Genuine dtype conflicts (both sides non-null) are left for the stack to
/// report.
fn align_fill_columns(left: &mut DataFrame, right: &mut DataFrame) -> Result<()> {
    let names: Vec<String> = left
        .get_column_names_str()
        .iter()
        .map(ToString::to_string)
        .collect();
    for name in names {
        let Ok(peer) = right.column(&name) else {
            continue;
        };
        let peer_dtype = peer.dtype().clone();
        let own = left.column(&name)?;
        if own.dtype() == &peer_dtype {
            continue;
        }
        if own.null_count() == own.len() {
            let cast = own.cast(&peer_dtype)?;
            left.with_column(cast)?;
        } else if peer.null_count() == peer.len() {
            let own_dtype = own.dtype().clone();
            let cast = right.column(&name)?.cast(&own_dtype)?;
            right.with_column(cast)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    fn frame(sources: &[&str], pids: &[i64]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("source".into(), sources.to_vec()).into_column(),
            Series::new("PID".into(), pids.to_vec()).into_column(),
        ])
        .unwrap()
    }

    fn run(backend: PartitionBackend) -> BTreeMap<String, DataFrame> {
        let frames = vec![
            frame(&["hostA", "hostB"], &[1, 2]),
            frame(&["hostA"], &[3]),
        ];
        partition_by_source(frames, "source", backend).unwrap()
    }

    #[test]
    fn splits_rows_by_key() {
        for backend in [PartitionBackend::Portable, PartitionBackend::Native] {
            let parts = run(backend);
            assert_eq!(parts.len(), 2);
            assert_eq!(parts["hostA"].height(), 2);
            assert_eq!(parts["hostB"].height(), 1);

            let pids = parts["hostA"].column("PID").unwrap().i64().unwrap();
            let mut seen: Vec<i64> = pids.into_iter().flatten().collect();
            seen.sort_unstable();
            assert_eq!(seen, vec![1, 3]);
        }
    }

    #[test]
    fn backends_agree() {
        let portable = run(PartitionBackend::Portable);
        let native = run(PartitionBackend::Native);
        assert_eq!(
            portable.keys().collect::<Vec<_>>(),
            native.keys().collect::<Vec<_>>()
        );
        for (key, part) in &portable {
            assert_eq!(part.height(), native[key].height());
        }
    }

    #[test]
    fn single_source_returned_whole() {
        let frames = vec![frame(&["hostA", "hostA"], &[1, 2])];
        let parts =
            partition_by_source(frames, "source", PartitionBackend::Portable).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts["hostA"].height(), 2);
    }

    #[test]
    fn null_fill_columns_adopt_peer_dtype() {
        use polars::prelude::DataType;

        // One plugin never produced PID, so it was materialized as an
        // all-null string column; the other carries real Int64 values.
        let filled = DataFrame::new(vec![
            Series::new("source".into(), vec!["hostA"]).into_column(),
            Series::full_null("PID".into(), 1, &DataType::String).into_column(),
        ])
        .unwrap();
        let typed = frame(&["hostA", "hostB"], &[1, 2]);

        for frames in [
            vec![filled.clone(), typed.clone()],
            vec![typed.clone(), filled.clone()],
        ] {
            let parts =
                partition_by_source(frames, "source", PartitionBackend::Portable).unwrap();
            assert_eq!(parts["hostA"].height(), 2);
            assert_eq!(
                parts["hostA"].column("PID").unwrap().dtype(),
                &DataType::Int64
            );
            assert_eq!(parts["hostA"].column("PID").unwrap().null_count(), 1);
        }
    }

    #[test]
    fn empty_batch_yields_empty_map() {
        let parts =
            partition_by_source(Vec::new(), "source", PartitionBackend::Native).unwrap();
        assert!(parts.is_empty());
    }
}
