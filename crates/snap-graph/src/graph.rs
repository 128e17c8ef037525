//! Linear graph construction and synchronous execution.
//!
//! The builder wires a single source followed by a chain of transform stages.
//! Wiring is type-checked at build time against each stage's declared
//! accepted input shapes, and a column-completion node is spliced immediately
//! after every frame-constructing node when required columns were declared.
//!
//! Execution is cooperative and single-threaded: the runner pulls batches
//! from the source and pushes each message through the chain one stage at a
//! time, so no transform is ever invoked concurrently with itself.

use std::collections::BTreeSet;

use anyhow::Result;

use snap_model::RequiredColumns;

use crate::error::{GraphError, Result as GraphResult};
use crate::message::{Message, OutputShape};
use crate::stage::{SourceStage, Stage};

struct Node {
    name: String,
    stage: Box<dyn Stage>,
}

/// Builds a [`Graph`] from a source and a chain of stages.
pub struct GraphBuilder {
    required: RequiredColumns,
    source: Option<Box<dyn SourceStage>>,
    nodes: Vec<Node>,
    names: BTreeSet<String>,
    tail_shape: Option<OutputShape>,
    tail_name: String,
}

impl GraphBuilder {
    /// Start a build with the union of columns any stage in the graph will
    /// need. The set is fixed here; it is never mutated once messages flow.
    pub fn new(required: RequiredColumns) -> Self {
        Self {
            required,
            source: None,
            nodes: Vec::new(),
            names: BTreeSet::new(),
            tail_shape: None,
            tail_name: String::new(),
        }
    }

    fn claim_name(&mut self, name: &str) -> GraphResult<()> {
        if !self.names.insert(name.to_string()) {
            return Err(GraphError::DuplicateStageName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Install the source stage and, when it constructs new frames and
    /// columns were declared, its completion node.
    pub fn source(mut self, stage: Box<dyn SourceStage>) -> GraphResult<Self> {
        let info = stage.info();
        self.claim_name(&info.name)?;
        let completion = stage.completion_step(&self.required)?;
        self.tail_shape = Some(stage.output_shape());
        self.tail_name = info.name.clone();
        self.source = Some(stage);
        if let Some(step) = completion {
            self.splice_completion(&info.name, step);
        }
        Ok(self)
    }

    /// Append a transform stage, rejecting incompatible wiring.
    pub fn add_stage(mut self, stage: Box<dyn Stage>) -> GraphResult<Self> {
        let upstream_shape = self.tail_shape.ok_or(GraphError::MissingSource)?;
        let info = stage.info();
        if !stage.accepted_inputs().contains(&upstream_shape) {
            return Err(GraphError::IncompatibleEdge {
                stage: info.name,
                upstream: self.tail_name.clone(),
                shape: upstream_shape.display_name(),
            });
        }
        self.claim_name(&info.name)?;
        let completion = stage.completion_step(&self.required)?;
        self.tail_shape = Some(stage.output_shape());
        self.tail_name = info.name.clone();
        self.nodes.push(Node {
            name: info.name.clone(),
            stage,
        });
        if let Some(step) = completion {
            self.splice_completion(&info.name, step);
        }
        Ok(self)
    }

    fn splice_completion(&mut self, parent: &str, step: impl Stage + 'static) {
        let name = format!("{parent}-completion");
        tracing::debug!(node = %name, "splicing column-completion node");
        // Completion preserves the parent's output shape, so the tail shape
        // is unchanged.
        self.tail_name = name.clone();
        self.nodes.push(Node {
            name,
            stage: Box::new(step),
        });
    }

    /// Finish the build.
    pub fn build(self) -> GraphResult<Graph> {
        let source = self.source.ok_or(GraphError::MissingSource)?;
        Ok(Graph {
            source,
            nodes: self.nodes,
        })
    }
}

/// A built processing graph: one source and an ordered chain of stages.
pub struct Graph {
    source: Box<dyn SourceStage>,
    nodes: Vec<Node>,
}

impl Graph {
    /// Node names in execution order, completion nodes included.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Push one batch of messages through the stage chain, returning the
    /// terminal outputs.
    pub fn process_batch(&mut self, batch: Vec<Message>) -> Result<Vec<Message>> {
        let mut current = batch;
        for node in &mut self.nodes {
            let mut next = Vec::with_capacity(current.len());
            for message in current {
                next.extend(node.stage.apply(message)?);
            }
            current = next;
        }
        Ok(current)
    }

    /// Drive the source to exhaustion, collecting terminal outputs.
    ///
    /// With a watching source this only returns when the source's own
    /// termination policy (max files, watch flag) ends the session.
    pub fn run(&mut self) -> Result<Vec<Message>> {
        let mut outputs = Vec::new();
        while let Some(batch) = self.source.next_batch()? {
            tracing::debug!(messages = batch.len(), "dispatching source batch");
            outputs.extend(self.process_batch(batch)?);
        }
        Ok(outputs)
    }
}
