//! Workflow configuration

use reqflow_clients::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Target graph database for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Graph name announced to the schema/execution workers
    pub graph_name: String,
    /// Storage target for execution outcomes; skipped when `None`
    pub store_target: Option<String>,
}

impl DatabaseConfig {
    /// Config for a named graph
    #[must_use]
    pub fn new(graph_name: impl Into<String>) -> Self {
        Self {
            graph_name: graph_name.into(),
            store_target: None,
        }
    }

    /// With an outcome storage target
    #[inline]
    #[must_use]
    pub fn with_store_target(mut self, target: impl Into<String>) -> Self {
        self.store_target = Some(target.into());
        self
    }
}

/// Workflow options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOptions {
    /// Per-step attempt budget. Retries are immediate, without backoff.
    pub max_retries: u32,
    /// Whether fan-out phases run concurrently; `false` forces sequential
    /// dispatch for debugging
    pub enable_parallelism: bool,
    /// Concurrency cap for fan-out phases; 0 = unbounded
    pub max_concurrent_tasks: usize,
    /// Fraction of failed tasks above which a best-effort phase fails
    /// the workflow anyway
    pub best_effort_failure_threshold: f64,
    /// Directory for per-phase checkpoints
    pub checkpoint_dir: PathBuf,
    /// Options forwarded to the text-generation service
    pub generation: GenerationOptions,
}

impl WorkflowOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry budget
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// With parallel fan-out enabled/disabled
    #[inline]
    #[must_use]
    pub fn with_parallelism(mut self, enabled: bool) -> Self {
        self.enable_parallelism = enabled;
        self
    }

    /// With a fan-out concurrency cap
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_tasks(mut self, max: usize) -> Self {
        self.max_concurrent_tasks = max;
        self
    }

    /// With a best-effort failure threshold (clamped to 0..=1)
    #[inline]
    #[must_use]
    pub fn with_best_effort_threshold(mut self, fraction: f64) -> Self {
        self.best_effort_failure_threshold = fraction.clamp(0.0, 1.0);
        self
    }

    /// With a checkpoint directory
    #[inline]
    #[must_use]
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = dir.into();
        self
    }

    /// With generation options
    #[inline]
    #[must_use]
    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            enable_parallelism: true,
            max_concurrent_tasks: 0,
            best_effort_failure_threshold: 0.5,
            checkpoint_dir: PathBuf::from("./checkpoints"),
            generation: GenerationOptions::default(),
        }
    }
}
