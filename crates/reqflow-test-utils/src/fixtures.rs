//! Canned pipeline artifacts used by the mock clients

use reqflow_clients::DocumentSource;
use reqflow_model::{
    AnalysisTemplate, EdgeType, GraphSchema, NodeType, PropertySpec, Requirement,
    RequirementsSummary, UseCase,
};

/// Small retail graph: customers place orders containing products
#[must_use]
pub fn sample_schema() -> GraphSchema {
    GraphSchema {
        node_types: vec![
            NodeType {
                name: "Customer".into(),
                properties: vec![
                    PropertySpec {
                        name: "id".into(),
                        data_type: "string".into(),
                    },
                    PropertySpec {
                        name: "region".into(),
                        data_type: "string".into(),
                    },
                ],
            },
            NodeType {
                name: "Order".into(),
                properties: vec![PropertySpec {
                    name: "total".into(),
                    data_type: "float".into(),
                }],
            },
            NodeType {
                name: "Product".into(),
                properties: vec![PropertySpec {
                    name: "sku".into(),
                    data_type: "string".into(),
                }],
            },
        ],
        edge_types: vec![
            EdgeType {
                name: "PLACED".into(),
                from: "Customer".into(),
                to: "Order".into(),
                properties: vec![],
            },
            EdgeType {
                name: "CONTAINS".into(),
                from: "Order".into(),
                to: "Product".into(),
                properties: vec![PropertySpec {
                    name: "quantity".into(),
                    data_type: "int".into(),
                }],
            },
        ],
        summary: String::new(),
    }
}

/// Two inline markdown requirement documents
#[must_use]
pub fn sample_documents() -> Vec<DocumentSource> {
    vec![
        DocumentSource::inline(
            "churn-brief.md",
            "text/markdown",
            "# Churn analysis\nIdentify customers at risk of churning by region.",
        ),
        DocumentSource::inline(
            "basket-brief.md",
            "text/markdown",
            "# Basket analysis\nFind products frequently ordered together.",
        ),
    ]
}

#[must_use]
pub fn sample_requirements() -> RequirementsSummary {
    RequirementsSummary {
        title: "Retail analytics requirements".into(),
        summary: "Churn risk and basket affinity over the retail graph.".into(),
        requirements: vec![
            Requirement {
                id: "REQ-1".into(),
                description: "Surface customers at risk of churning, grouped by region.".into(),
                priority: Some("high".into()),
            },
            Requirement {
                id: "REQ-2".into(),
                description: "Identify product pairs frequently ordered together.".into(),
                priority: Some("medium".into()),
            },
        ],
    }
}

#[must_use]
pub fn sample_use_cases() -> Vec<UseCase> {
    vec![
        UseCase {
            id: "UC-1".into(),
            title: "Regional churn risk".into(),
            description: "Rank regions by share of customers with no recent orders.".into(),
            requirement_refs: vec!["REQ-1".into()],
        },
        UseCase {
            id: "UC-2".into(),
            title: "Basket affinity".into(),
            description: "Count co-occurrence of product pairs within orders.".into(),
            requirement_refs: vec!["REQ-2".into()],
        },
    ]
}

#[must_use]
pub fn sample_templates() -> Vec<AnalysisTemplate> {
    vec![
        AnalysisTemplate {
            id: "TPL-1".into(),
            use_case_id: "UC-1".into(),
            name: "churn by region".into(),
            body: "MATCH (c:Customer) WHERE NOT (c)-[:PLACED]->(:Order) \
                   RETURN c.region, count(c)"
                .into(),
        },
        AnalysisTemplate {
            id: "TPL-2".into(),
            use_case_id: "UC-2".into(),
            name: "product co-occurrence".into(),
            body: "MATCH (o:Order)-[:CONTAINS]->(p:Product) \
                   RETURN p.sku, count(o)"
                .into(),
        },
        AnalysisTemplate {
            id: "TPL-3".into(),
            use_case_id: "UC-2".into(),
            name: "order volume".into(),
            body: "MATCH (o:Order) RETURN count(o)".into(),
        },
    ]
}
