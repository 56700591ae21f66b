//! Graph edges between knowledge nodes (spec §3.1)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relationship types connecting two `KnowledgeNode`s (or a node and a
/// `Person`, for `PersonMentioned`).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    SimilarTo,
    RelatesTo,
    PersonMentioned,
    CausedBy,
    PartOf,
    Supersedes,
    Similar,
    Temporal,
    Causal,
    Semantic,
    UserDefined,
    SameSource,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::SimilarTo => "similar_to",
            EdgeType::RelatesTo => "relates_to",
            EdgeType::PersonMentioned => "person_mentioned",
            EdgeType::CausedBy => "caused_by",
            EdgeType::PartOf => "part_of",
            EdgeType::Supersedes => "supersedes",
            EdgeType::Similar => "similar",
            EdgeType::Temporal => "temporal",
            EdgeType::Causal => "causal",
            EdgeType::Semantic => "semantic",
            EdgeType::UserDefined => "user_defined",
            EdgeType::SameSource => "same_source",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        Some(match s {
            "similar_to" => EdgeType::SimilarTo,
            "relates_to" => EdgeType::RelatesTo,
            "person_mentioned" => EdgeType::PersonMentioned,
            "caused_by" => EdgeType::CausedBy,
            "part_of" => EdgeType::PartOf,
            "supersedes" => EdgeType::Supersedes,
            "similar" => EdgeType::Similar,
            "temporal" => EdgeType::Temporal,
            "causal" => EdgeType::Causal,
            "semantic" => EdgeType::Semantic,
            "user_defined" => EdgeType::UserDefined,
            "same_source" => EdgeType::SameSource,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge between two entities, unique on `(from_id, to_id, edge_type)`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub edge_type: EdgeType,
    pub weight: f32,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl GraphEdge {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, edge_type: EdgeType, weight: f32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from_id: from_id.into(),
            to_id: to_id.into(),
            edge_type,
            weight: weight.clamp(0.0, 1.0),
            metadata: None,
            created_at: Utc::now(),
        }
    }
}
