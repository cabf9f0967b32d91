//! Static phase plan
//!
//! The plan is built once from the fixed dependency graph of the pipeline:
//! schema analysis and requirements extraction feed use-case generation,
//! which feeds template generation; template execution fans out per
//! generated template and report generation fans out per execution outcome.
//! Fan-out task counts are only knowable once upstream phases settle, so
//! fan-out phases are expanded at dispatch time.

use serde::{Deserialize, Serialize};

/// Closed set of worker capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerRole {
    /// Extracts and summarizes the graph database schema
    SchemaAnalysis,
    /// Turns input documents into structured requirements
    RequirementsExtraction,
    /// Derives use cases from requirements + schema
    UseCaseGeneration,
    /// Produces executable analysis templates per use case
    TemplateGeneration,
    /// Runs one template on the analytics engine
    TemplateExecution,
    /// Writes one narrative report per execution outcome
    ReportGeneration,
}

impl WorkerRole {
    /// Capability tag used in messages and error records
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaAnalysis => "schema-analysis",
            Self::RequirementsExtraction => "requirements-extraction",
            Self::UseCaseGeneration => "use-case-generation",
            Self::TemplateGeneration => "template-generation",
            Self::TemplateExecution => "template-execution",
            Self::ReportGeneration => "report-generation",
        }
    }
}

impl std::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a phase's steps are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Exactly one step, or task count unknown until upstream output exists
    Sequential,
    /// Homogeneous task list known from upstream artifacts; fan-out/fan-in
    FanOut,
}

/// One stage of the workflow plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    /// Phase name; also the step-name prefix for fan-out tasks
    pub name: &'static str,
    /// Sequential or fan-out
    pub kind: PhaseKind,
    /// Worker role that processes this phase's tasks
    pub role: WorkerRole,
    /// Required phases fail the workflow on retry exhaustion;
    /// best-effort phases record per-task failures instead
    pub required: bool,
}

/// Ordered phase descriptors for the full pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    phases: Vec<Phase>,
}

impl PhasePlan {
    /// The standard six-phase analysis plan
    #[must_use]
    pub fn standard() -> Self {
        Self {
            phases: vec![
                Phase {
                    name: "schema_analysis",
                    kind: PhaseKind::Sequential,
                    role: WorkerRole::SchemaAnalysis,
                    required: true,
                },
                Phase {
                    name: "requirements_extraction",
                    kind: PhaseKind::Sequential,
                    role: WorkerRole::RequirementsExtraction,
                    required: true,
                },
                Phase {
                    name: "use_case_generation",
                    kind: PhaseKind::Sequential,
                    role: WorkerRole::UseCaseGeneration,
                    required: true,
                },
                Phase {
                    name: "template_generation",
                    kind: PhaseKind::Sequential,
                    role: WorkerRole::TemplateGeneration,
                    required: true,
                },
                Phase {
                    name: "template_execution",
                    kind: PhaseKind::FanOut,
                    role: WorkerRole::TemplateExecution,
                    required: false,
                },
                Phase {
                    name: "report_generation",
                    kind: PhaseKind::FanOut,
                    role: WorkerRole::ReportGeneration,
                    required: false,
                },
            ],
        }
    }

    /// Ordered phase list
    #[inline]
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Number of phases in the plan
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Whether the plan is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Look up a phase by name
    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Phase that owns a step name (fan-out steps are `<phase>:<index>`)
    #[must_use]
    pub fn phase_of_step<'a>(&'a self, step_name: &str) -> Option<&'a Phase> {
        let phase_name = step_name.split(':').next().unwrap_or(step_name);
        self.phase(phase_name)
    }
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self::standard()
    }
}

/// Step name for the `index`-th task (1-based) of a fan-out phase
#[must_use]
pub fn fan_out_step_name(phase: &str, index: usize) -> String {
    format!("{phase}:{index}")
}
