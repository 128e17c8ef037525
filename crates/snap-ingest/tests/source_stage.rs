//! End-to-end tests: snapshot files on disk through the graph to completed
//! per-source frames.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::DataType;
use serde_json::json;
use tempfile::TempDir;

use snap_graph::{Graph, GraphBuilder, Message, SnapshotMeta};
use snap_ingest::normalize_batch;
use snap_ingest::partition::PartitionBackend;
use snap_ingest::stage::SnapshotSourceStage;
use snap_model::{ColumnKind, RequiredColumns, SourceOptions, WatcherConfig};

fn write_json(root: &Path, rel: &str, value: serde_json::Value) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec(&value).unwrap()).unwrap();
}

fn proc_set(pids: &[i64]) -> serde_json::Value {
    let data: Vec<_> = pids
        .iter()
        .map(|pid| json!([pid, format!("proc-{pid}"), "deadbeef"]))
        .collect();
    json!({"titles": ["PID", "Name", "SHA256"], "data": data})
}

fn build_graph(root: &Path) -> Graph {
    let config = WatcherConfig::new(format!("{}/**/*.json", root.display())).with_sort_glob(true);
    let options = SourceOptions::new(Vec::new(), vec!["proc".to_string()]);
    let required = RequiredColumns::new().with("score", ColumnKind::Float32);
    let stage = SnapshotSourceStage::new(config, options, PartitionBackend::Portable);

    GraphBuilder::new(required)
        .source(Box::new(stage))
        .unwrap()
        .build()
        .unwrap()
}

fn by_source(outputs: Vec<Message>) -> BTreeMap<String, Arc<SnapshotMeta>> {
    outputs
        .into_iter()
        .map(|message| match message {
            Message::Meta(meta) => (meta.source().to_string(), meta),
            other => panic!("unexpected message shape: {:?}", other.shape()),
        })
        .collect()
}

#[test]
fn snapshot_files_become_completed_per_source_frames() {
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "hostA/snap-1/proc_2023-01-02.json", proc_set(&[1, 2]));
    write_json(dir.path(), "hostB/snap-2/proc_2023-01-03.json", proc_set(&[7]));

    let outputs = build_graph(dir.path()).run().unwrap();
    let metas = by_source(outputs);
    assert_eq!(
        metas.keys().collect::<Vec<_>>(),
        vec!["hostA", "hostB"]
    );

    let host_a = &metas["hostA"];
    assert_eq!(host_a.row_count(), 2);
    host_a.with_frame(|df| {
        let names = df.get_column_names_str();
        assert!(names.contains(&"PID"));
        assert!(!names.contains(&"SHA256"));

        // Provenance columns from the path.
        let ids = df.column("snapshot_id").unwrap().i64().unwrap();
        assert!(ids.into_iter().all(|v| v == Some(1)));
        let stamps = df.column("timestamp").unwrap().str().unwrap();
        assert!(stamps.into_iter().all(|v| v == Some("2023-01-02")));

        // Declared column completed with its zero value.
        let score = df.column("score").unwrap();
        assert_eq!(score.dtype(), &DataType::Float32);
        let zeros = score.f32().unwrap();
        assert!(zeros.into_iter().all(|v| v == Some(0.0)));
    });

    let host_b = &metas["hostB"];
    assert_eq!(host_b.row_count(), 1);
    host_b.with_frame(|df| {
        let ids = df.column("snapshot_id").unwrap().i64().unwrap();
        assert_eq!(ids.get(0), Some(2));
    });
}

#[test]
fn one_bad_file_never_poisons_its_batch() {
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "hostA/snap-1/proc_2023-01-02.json", proc_set(&[1]));
    std::fs::write(dir.path().join("hostA/snap-1/proc_2023-01-03.json"), b"{not json").unwrap();
    write_json(dir.path(), "hostA/snap-1/proc_2023-01-04.json", proc_set(&[2, 3]));

    let paths = vec![
        dir.path().join("hostA/snap-1/proc_2023-01-02.json"),
        dir.path().join("hostA/snap-1/proc_2023-01-03.json"),
        dir.path().join("hostA/snap-1/proc_2023-01-04.json"),
    ];
    let options = SourceOptions::new(Vec::new(), vec!["proc".to_string()]);

    let frames = normalize_batch(&paths, &options).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].height(), 1);
    assert_eq!(frames[1].height(), 2);
}

#[test]
fn both_partition_backends_yield_identical_sources() {
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "hostA/snap-1/proc_2023-01-02.json", proc_set(&[1]));
    write_json(dir.path(), "hostB/snap-1/proc_2023-01-02.json", proc_set(&[2]));

    let options = SourceOptions::new(Vec::new(), vec!["proc".to_string()]);
    let mut heights = Vec::new();
    for backend in [PartitionBackend::Portable, PartitionBackend::Native] {
        let config =
            WatcherConfig::new(format!("{}/**/*.json", dir.path().display())).with_sort_glob(true);
        let mut stage = SnapshotSourceStage::new(config, options.clone(), backend);
        let batch = snap_graph::SourceStage::next_batch(&mut stage).unwrap().unwrap();
        let metas = by_source(batch);
        heights.push(
            metas
                .iter()
                .map(|(source, meta)| (source.clone(), meta.row_count()))
                .collect::<Vec<_>>(),
        );
    }
    assert_eq!(heights[0], heights[1]);
}

#[test]
fn mixed_plugin_batch_partitions_by_source() {
    // An include list makes fill columns arrive all-null string while peer
    // plugins carry typed values for the same name; partitioning must still
    // keep every row.
    let dir = TempDir::new().unwrap();
    write_json(
        dir.path(),
        "hostA/snap-1/proc_2023-01-02.json",
        json!({"titles": ["PID", "Name"], "data": [[1, "init"], [2, "sshd"]]}),
    );
    write_json(
        dir.path(),
        "hostA/snap-1/envars_2023-01-02.json",
        json!({"titles": ["Variable"], "data": [["PATH"]]}),
    );
    write_json(
        dir.path(),
        "hostB/snap-2/envars_2023-01-03.json",
        json!({"titles": ["Variable"], "data": [["HOME"]]}),
    );

    let options = SourceOptions::new(
        vec!["PID".to_string(), "Variable".to_string()],
        vec!["proc".to_string(), "envars".to_string()],
    );
    let required = RequiredColumns::new().with("score", ColumnKind::Float32);

    for backend in [PartitionBackend::Portable, PartitionBackend::Native] {
        let config =
            WatcherConfig::new(format!("{}/**/*.json", dir.path().display())).with_sort_glob(true);
        let stage = SnapshotSourceStage::new(config, options.clone(), backend);
        let outputs = GraphBuilder::new(required.clone())
            .source(Box::new(stage))
            .unwrap()
            .build()
            .unwrap()
            .run()
            .unwrap();

        let metas = by_source(outputs);
        assert_eq!(metas.keys().collect::<Vec<_>>(), vec!["hostA", "hostB"]);
        assert_eq!(metas["hostA"].row_count(), 3);
        assert_eq!(metas["hostB"].row_count(), 1);
        metas["hostA"].with_frame(|df| {
            let pids = df.column("PID").unwrap();
            assert_eq!(pids.dtype(), &DataType::Int64);
            assert_eq!(pids.null_count(), 1);
        });
    }
}

#[test]
fn include_list_gives_every_plugin_the_same_shape() {
    let dir = TempDir::new().unwrap();
    write_json(
        dir.path(),
        "hostA/snap-1/proc_2023-01-02.json",
        json!({"titles": ["PID", "Name"], "data": [[1, "init"]]}),
    );
    write_json(
        dir.path(),
        "hostA/snap-1/envars_2023-01-02.json",
        json!({"titles": ["Variable"], "data": [["PATH"]]}),
    );

    let paths = vec![
        dir.path().join("hostA/snap-1/envars_2023-01-02.json"),
        dir.path().join("hostA/snap-1/proc_2023-01-02.json"),
    ];
    let options = SourceOptions::new(
        vec!["PID".to_string(), "Variable".to_string()],
        vec!["proc".to_string(), "envars".to_string()],
    );

    let frames = normalize_batch(&paths, &options).unwrap();
    assert_eq!(frames.len(), 2);
    for frame in &frames {
        assert_eq!(
            frame.get_column_names_str()[..2],
            ["PID", "Variable"]
        );
    }
    // The envars frame never produced PID; it must be null-filled.
    assert_eq!(frames[0].column("PID").unwrap().null_count(), 1);
    assert_eq!(frames[1].column("Variable").unwrap().null_count(), 1);
}
