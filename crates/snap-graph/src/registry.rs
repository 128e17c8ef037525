//! Stage registration and backend selection.
//!
//! Stages register under a unique name with a pipeline-mode applicability tag
//! and an optional accelerated (native) constructor. The backend choice is
//! resolved once at graph-build time: the accelerated implementation is used
//! when available and permitted, otherwise the portable one. Both must be
//! behaviorally equivalent for the same input, and share a conformance suite.

use std::collections::BTreeMap;

use crate::error::{GraphError, Result as GraphResult};
use crate::stage::{PipelineMode, SourceStage, Stage};

/// Which implementation family to resolve at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Use the accelerated implementation when one is registered.
    #[default]
    PreferNative,
    /// Always use the portable implementation.
    Portable,
}

type SourceFactory = Box<dyn Fn() -> Box<dyn SourceStage> + Send + Sync>;
type TransformFactory = Box<dyn Fn() -> Box<dyn Stage> + Send + Sync>;

struct SourceEntry {
    mode: PipelineMode,
    portable: SourceFactory,
    native: Option<SourceFactory>,
}

struct TransformEntry {
    mode: PipelineMode,
    portable: TransformFactory,
    native: Option<TransformFactory>,
}

/// Registry of constructible stages, keyed by advertised name.
#[derive(Default)]
pub struct StageRegistry {
    sources: BTreeMap<String, SourceEntry>,
    transforms: BTreeMap<String, TransformEntry>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source stage's portable constructor.
    pub fn register_source<F>(&mut self, name: impl Into<String>, mode: PipelineMode, portable: F)
    where
        F: Fn() -> Box<dyn SourceStage> + Send + Sync + 'static,
    {
        self.sources.insert(
            name.into(),
            SourceEntry {
                mode,
                portable: Box::new(portable),
                native: None,
            },
        );
    }

    /// Attach an accelerated constructor to a registered source.
    pub fn register_source_native<F>(&mut self, name: &str, native: F) -> GraphResult<()>
    where
        F: Fn() -> Box<dyn SourceStage> + Send + Sync + 'static,
    {
        let entry = self
            .sources
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownStage {
                name: name.to_string(),
            })?;
        entry.native = Some(Box::new(native));
        Ok(())
    }

    /// Register a transform stage's portable constructor.
    pub fn register_transform<F>(
        &mut self,
        name: impl Into<String>,
        mode: PipelineMode,
        portable: F,
    ) where
        F: Fn() -> Box<dyn Stage> + Send + Sync + 'static,
    {
        self.transforms.insert(
            name.into(),
            TransformEntry {
                mode,
                portable: Box::new(portable),
                native: None,
            },
        );
    }

    /// Attach an accelerated constructor to a registered transform.
    pub fn register_transform_native<F>(&mut self, name: &str, native: F) -> GraphResult<()>
    where
        F: Fn() -> Box<dyn Stage> + Send + Sync + 'static,
    {
        let entry = self
            .transforms
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownStage {
                name: name.to_string(),
            })?;
        entry.native = Some(Box::new(native));
        Ok(())
    }

    /// Construct a registered source for the requested mode and backend.
    pub fn build_source(
        &self,
        name: &str,
        mode: PipelineMode,
        backend: Backend,
    ) -> GraphResult<Box<dyn SourceStage>> {
        let entry = self
            .sources
            .get(name)
            .ok_or_else(|| GraphError::UnknownStage {
                name: name.to_string(),
            })?;
        check_mode(name, entry.mode, mode)?;
        match (backend, &entry.native) {
            (Backend::PreferNative, Some(native)) => Ok(native()),
            _ => Ok((entry.portable)()),
        }
    }

    /// Construct a registered transform for the requested mode and backend.
    pub fn build_transform(
        &self,
        name: &str,
        mode: PipelineMode,
        backend: Backend,
    ) -> GraphResult<Box<dyn Stage>> {
        let entry = self
            .transforms
            .get(name)
            .ok_or_else(|| GraphError::UnknownStage {
                name: name.to_string(),
            })?;
        check_mode(name, entry.mode, mode)?;
        match (backend, &entry.native) {
            (Backend::PreferNative, Some(native)) => Ok(native()),
            _ => Ok((entry.portable)()),
        }
    }

    /// Registered source names.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Registered transform names.
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.keys().map(String::as_str).collect()
    }
}

fn check_mode(name: &str, registered: PipelineMode, requested: PipelineMode) -> GraphResult<()> {
    if registered.applies_to(requested) {
        Ok(())
    } else {
        Err(GraphError::ModeMismatch {
            name: name.to_string(),
            mode: requested.display_name(),
        })
    }
}
