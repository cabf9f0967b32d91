//! reqflow Model - workflow data model
//!
//! Defines the serializable core of the pipeline:
//! - Versioned workflow state with a single mutation entry point
//! - Immutable inter-worker messages
//! - The static phase plan and worker roles
//! - Artifact payloads produced along the pipeline
//! - Trace events for timing/cost observability
//!
//! Everything in this crate is pure data: no I/O, no async, no clients.
//! All mutation flows through [`WorkflowState::apply`] so the supervisor
//! stays the one writer and every change bumps the state version.

#![warn(unreachable_pub)]

pub mod artifacts;
pub mod message;
pub mod plan;
pub mod state;
pub mod status;
pub mod trace;

// Re-exports for convenience
pub use artifacts::{
    AnalysisReport, AnalysisTemplate, EdgeType, ExecutionOutcome, GraphSchema, NodeType,
    PropertySpec, Requirement, RequirementsSummary, UseCase, WorkflowArtifacts,
};
pub use message::{Message, MessageId, MessageKind};
pub use plan::{fan_out_step_name, Phase, PhaseKind, PhasePlan, WorkerRole};
pub use state::{
    ArtifactUpdate, StateError, StateMutation, StepResult, StepStatus, WorkerFault, WorkflowState,
};
pub use status::{allowed_transitions, validate_transition, WorkflowStatus};
pub use trace::TraceEvent;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the reqflow data model
    pub use crate::{
        Message, MessageKind, Phase, PhaseKind, PhasePlan, StateMutation, StepResult, StepStatus,
        WorkerRole, WorkflowArtifacts, WorkflowState, WorkflowStatus,
    };
}
