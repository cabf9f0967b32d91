//! reqflow Core - workflow orchestration
//!
//! Turns business-requirement documents plus a graph-database schema into
//! analysis artifacts through a fixed six-phase pipeline:
//!
//! 1. Schema analysis
//! 2. Requirements extraction
//! 3. Use-case generation
//! 4. Template generation
//! 5. Template execution (fan-out per template, best-effort)
//! 6. Report generation (fan-out per outcome, best-effort)
//!
//! The supervisor is the sole writer of workflow state; workers process
//! read-only snapshots and reply with messages. Every phase boundary
//! persists an atomic checkpoint, so an interrupted or paused workflow
//! resumes by skipping completed phases.
//!
//! External services (text generation, schema extraction, analysis
//! execution) are reached only through the trait contracts in
//! `reqflow-clients`, injected via [`ClientSet`].

#![warn(unreachable_pub)]

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod supervisor;
pub mod trace;
pub mod worker;
pub mod workflow;

// Re-exports for convenience
pub use checkpoint::{CheckpointStore, CHECKPOINT_FORMAT_VERSION};
pub use config::{DatabaseConfig, WorkflowOptions};
pub use engine::{ConcurrencyEngine, TaskSpec};
pub use error::{CheckpointError, WorkerError, WorkflowError};
pub use supervisor::{CancellationHandle, Supervisor};
pub use trace::{TraceCollector, TraceSummary, WorkerStats};
pub use worker::{build_workers, ClientSet, Worker};
pub use workflow::{AnalysisWorkflow, WorkflowProgress};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a workflow end to end
    pub use crate::{
        AnalysisWorkflow, CancellationHandle, ClientSet, DatabaseConfig, WorkflowError,
        WorkflowOptions, WorkflowProgress,
    };
    pub use reqflow_model::prelude::*;
}
