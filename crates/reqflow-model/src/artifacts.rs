//! Artifact payloads produced along the pipeline
//!
//! Each phase deposits typed artifacts here; downstream phases read them to
//! expand their own task lists (templates drive execution fan-out, outcomes
//! drive report fan-out).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One property of a node or edge type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub data_type: String,
}

/// Node type in the graph schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

/// Edge type in the graph schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeType {
    pub name: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

/// Schema extracted from the graph database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    pub node_types: Vec<NodeType>,
    pub edge_types: Vec<EdgeType>,
    /// Natural-language summary written by the schema-analysis worker
    #[serde(default)]
    pub summary: String,
}

/// One structured business requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Requirements extracted from the input documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsSummary {
    pub title: String,
    pub summary: String,
    pub requirements: Vec<Requirement>,
}

/// Analysis use case derived from requirements + schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCase {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Requirement ids this use case covers
    #[serde(default)]
    pub requirement_refs: Vec<String>,
}

/// Executable analysis template generated for a use case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTemplate {
    pub id: String,
    pub use_case_id: String,
    pub name: String,
    /// Executable template text for the analytics engine
    pub body: String,
}

/// Result of running one template on the analytics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub template_id: String,
    pub job_id: String,
    /// Engine-specific result rows, kept opaque
    pub records: Value,
    pub duration_ms: u64,
}

/// Narrative report written for one execution outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub template_id: String,
    pub title: String,
    pub narrative: String,
}

/// All artifacts a workflow has produced so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowArtifacts {
    pub schema: Option<GraphSchema>,
    pub requirements: Option<RequirementsSummary>,
    pub use_cases: Vec<UseCase>,
    pub templates: Vec<AnalysisTemplate>,
    pub outcomes: Vec<ExecutionOutcome>,
    pub reports: Vec<AnalysisReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn artifacts_round_trip() {
        let artifacts = WorkflowArtifacts {
            schema: Some(GraphSchema {
                node_types: vec![NodeType {
                    name: "Customer".into(),
                    properties: vec![PropertySpec {
                        name: "id".into(),
                        data_type: "string".into(),
                    }],
                }],
                edge_types: vec![],
                summary: "customers only".into(),
            }),
            outcomes: vec![ExecutionOutcome {
                template_id: "tpl-1".into(),
                job_id: "job-9".into(),
                records: json!([{"count": 12}]),
                duration_ms: 420,
            }],
            ..Default::default()
        };

        let encoded = serde_json::to_string(&artifacts).unwrap();
        let decoded: WorkflowArtifacts = serde_json::from_str(&encoded).unwrap();
        assert_eq!(artifacts, decoded);
    }
}
