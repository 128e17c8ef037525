//! Command implementations for the ingestion runner.

use std::fs;
use std::time::Duration;

use anyhow::Context;

use snap_graph::{Backend, GraphBuilder, PipelineMode, StageRegistry};
use snap_ingest::{SNAPSHOT_SOURCE_NAME, register_snapshot_source};
use snap_model::{RequiredColumns, SourceOptions, WatcherConfig};

use crate::cli::RunArgs;
use crate::summary::RunSummary;

/// Run one ingestion session end to end and summarize what was emitted.
pub fn run_ingest(args: &RunArgs) -> anyhow::Result<RunSummary> {
    let config = WatcherConfig::new(&args.input_glob)
        .with_watch_directory(args.watch)
        .with_max_files(args.max_files)
        .with_sort_glob(args.sort_glob)
        .with_recursive(!args.no_recursive)
        .with_queue_max_size(args.queue_size)
        .with_batch_timeout(Duration::from_secs(args.batch_timeout_secs));

    let options = SourceOptions::new(args.columns.clone(), args.plugins.clone())
        .with_cols_exclude(args.excludes.clone())
        .with_encoding(&args.encoding);

    let required = load_required_columns(args)?;
    let backend = if args.portable {
        Backend::Portable
    } else {
        Backend::PreferNative
    };

    let mut registry = StageRegistry::new();
    register_snapshot_source(&mut registry, config, options)?;
    let source = registry.build_source(SNAPSHOT_SOURCE_NAME, PipelineMode::Tabular, backend)?;

    let mut graph = GraphBuilder::new(required).source(source)?.build()?;
    tracing::info!(nodes = ?graph.node_names(), "starting ingestion session");
    let outputs = graph.run()?;
    Ok(RunSummary::from_outputs(&outputs))
}

/// List the registered stages, flagging those with an accelerated backend.
pub fn run_stages() -> anyhow::Result<()> {
    let mut registry = StageRegistry::new();
    register_snapshot_source(
        &mut registry,
        WatcherConfig::new("*.json"),
        SourceOptions::default(),
    )?;

    println!("Source stages:");
    for name in registry.source_names() {
        let stage = registry.build_source(name, PipelineMode::Tabular, Backend::PreferNative)?;
        let info = stage.info();
        let backend = if info.accelerated { "native" } else { "portable" };
        println!("  {name} [{}] ({backend})", info.mode.display_name());
    }
    let transforms = registry.transform_names();
    if !transforms.is_empty() {
        println!("Transform stages:");
        for name in transforms {
            println!("  {name}");
        }
    }
    Ok(())
}

fn load_required_columns(args: &RunArgs) -> anyhow::Result<RequiredColumns> {
    let Some(path) = &args.required_columns else {
        return Ok(RequiredColumns::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading required columns from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing required columns in {}", path.display()))
}
