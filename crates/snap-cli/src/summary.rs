//! End-of-session reporting.

use std::collections::BTreeMap;

use snap_graph::Message;

/// Row counts observed at the end of an ingestion session.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows emitted per source key.
    pub rows_by_source: BTreeMap<String, usize>,
    /// Terminal messages produced.
    pub messages: usize,
}

impl RunSummary {
    pub fn from_outputs(outputs: &[Message]) -> Self {
        let mut summary = Self {
            messages: outputs.len(),
            ..Self::default()
        };
        for message in outputs {
            match message {
                Message::Meta(meta) => {
                    *summary
                        .rows_by_source
                        .entry(meta.source().to_string())
                        .or_default() += meta.row_count();
                }
                Message::Batch(batch) => {
                    *summary
                        .rows_by_source
                        .entry(batch.meta().source().to_string())
                        .or_default() += batch.count();
                }
                Message::Frame(frame) => {
                    *summary
                        .rows_by_source
                        .entry("<unpartitioned>".to_string())
                        .or_default() += frame.height();
                }
                Message::Paths(_) => {}
            }
        }
        summary
    }

    pub fn total_rows(&self) -> usize {
        self.rows_by_source.values().sum()
    }
}

/// Print the session summary to stdout.
pub fn print_summary(summary: &RunSummary) {
    println!("Ingestion complete");
    for (source, rows) in &summary.rows_by_source {
        println!("  {source}: {rows} rows");
    }
    println!(
        "  total: {} rows across {} messages",
        summary.total_rows(),
        summary.messages
    );
}
