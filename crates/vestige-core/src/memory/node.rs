//! Knowledge Node - the fundamental unit of memory (spec §3.1)
//!
//! Combines FSRS-6 scheduling state, the Bjork dual-strength model, and
//! the provenance/trust fields external agents attach at ingestion time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// SOURCE TYPE / PLATFORM
// ============================================================================

/// What kind of thing a node represents (spec §3.1).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Fact,
    Concept,
    Event,
    Person,
    Place,
    Note,
    Pattern,
    Decision,
    Conversation,
    Email,
    Book,
    Article,
    Highlight,
    Meeting,
    Manual,
    Webpage,
    Intention,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Fact => "fact",
            SourceType::Concept => "concept",
            SourceType::Event => "event",
            SourceType::Person => "person",
            SourceType::Place => "place",
            SourceType::Note => "note",
            SourceType::Pattern => "pattern",
            SourceType::Decision => "decision",
            SourceType::Conversation => "conversation",
            SourceType::Email => "email",
            SourceType::Book => "book",
            SourceType::Article => "article",
            SourceType::Highlight => "highlight",
            SourceType::Meeting => "meeting",
            SourceType::Manual => "manual",
            SourceType::Webpage => "webpage",
            SourceType::Intention => "intention",
        }
    }

    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fact" => SourceType::Fact,
            "concept" => SourceType::Concept,
            "event" => SourceType::Event,
            "person" => SourceType::Person,
            "place" => SourceType::Place,
            "note" => SourceType::Note,
            "pattern" => SourceType::Pattern,
            "decision" => SourceType::Decision,
            "conversation" => SourceType::Conversation,
            "email" => SourceType::Email,
            "book" => SourceType::Book,
            "article" => SourceType::Article,
            "highlight" => SourceType::Highlight,
            "meeting" => SourceType::Meeting,
            "manual" => SourceType::Manual,
            "webpage" => SourceType::Webpage,
            "intention" => SourceType::Intention,
            _ => SourceType::Note,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a node's content originated (manual entry, an ingestion tool, etc).
/// For intentions this field doubles as the lifecycle status per §4.11.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourcePlatform {
    #[default]
    Api,
    NaturalLanguage,
    Inferred,
    /// Intention lifecycle states, stored here per the §4.11 tool-level encoding.
    Active,
    Snoozed,
    Fulfilled,
    Cancelled,
    Expired,
    Custom(String),
}

// ============================================================================
// FSRS SCHEDULING STATE
// ============================================================================

/// FSRS-6 card state (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingState {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

// ============================================================================
// KNOWLEDGE NODE
// ============================================================================

/// A knowledge node: the canonical unit of memory (spec §3.1).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeNode {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: i64,
    pub review_count: i64,

    pub source_type: SourceType,
    pub source_platform: SourcePlatform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_chain: Vec<String>,

    // ---- FSRS scheduling ----
    pub stability: f64,
    pub difficulty: f64,
    pub state: SchedulingState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review: Option<DateTime<Utc>>,
    pub reps: i64,
    pub lapses: i64,

    // ---- Dual-strength ----
    pub storage_strength: f64,
    pub retrieval_strength: f64,
    /// Legacy field: derived view of `retrieval_strength` (spec §9 open
    /// question c). Kept in sync by `sync_retention_strength`.
    pub retention_strength: f64,
    pub stability_factor: f64,

    // ---- Affect / trust ----
    pub sentiment_intensity: f64,
    pub confidence: f64,
    pub is_contradicted: bool,
    #[serde(default)]
    pub contradiction_ids: Vec<String>,

    // ---- Tags / entities ----
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub people: BTreeSet<String>,
    #[serde(default)]
    pub concepts: BTreeSet<String>,
    #[serde(default)]
    pub events: BTreeSet<String>,

    // ---- Git context (optional) ----
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub git_uncommitted_paths: Vec<String>,
}

impl Default for KnowledgeNode {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            content: String::new(),
            summary: None,
            created_at: now,
            updated_at: now,
            last_accessed_at: now,
            access_count: 0,
            review_count: 0,
            source_type: SourceType::default(),
            source_platform: SourcePlatform::default(),
            source_id: None,
            source_url: None,
            source_chain: vec![],
            stability: crate::fsrs::initial_stability(3),
            difficulty: crate::fsrs::initial_difficulty(3),
            state: SchedulingState::New,
            last_review: None,
            next_review: None,
            reps: 0,
            lapses: 0,
            storage_strength: 1.0,
            retrieval_strength: 1.0,
            retention_strength: 1.0,
            stability_factor: 1.0,
            sentiment_intensity: 0.0,
            confidence: 1.0,
            is_contradicted: false,
            contradiction_ids: vec![],
            tags: BTreeSet::new(),
            people: BTreeSet::new(),
            concepts: BTreeSet::new(),
            events: BTreeSet::new(),
            git_branch: None,
            git_commit: None,
            git_uncommitted_paths: vec![],
        }
    }
}

impl KnowledgeNode {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// §3.1 invariant: `retrieval_strength <= storage_strength`.
    pub fn check_dual_strength_invariant(&self) -> bool {
        self.retrieval_strength <= self.storage_strength + f64::EPSILON
    }

    /// §3.1 invariant: `next_review >= last_review` when both are set.
    pub fn check_review_ordering_invariant(&self) -> bool {
        match (self.last_review, self.next_review) {
            (Some(last), Some(next)) => next >= last,
            _ => true,
        }
    }

    /// §9 open question (c): `retention_strength` is a derived view of
    /// `retrieval_strength`, kept equal so legacy readers never diverge.
    pub fn sync_retention_strength(&mut self) {
        self.retention_strength = self.retrieval_strength;
    }

    pub fn is_due(&self) -> bool {
        self.next_review.map(|t| t <= Utc::now()).unwrap_or(true)
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for creating a new memory via `ingest` (§6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IngestInput {
    pub content: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub sentiment_intensity: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub force_create: bool,
}

impl Default for IngestInput {
    fn default() -> Self {
        Self {
            content: String::new(),
            source_type: SourceType::default(),
            source_url: None,
            sentiment_intensity: 0.0,
            tags: vec![],
            force_create: false,
        }
    }
}

/// Search mode for `recall`/`search` (§4.4).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    Keyword,
    Semantic,
    #[default]
    Hybrid,
    Context,
}

/// Input for `recall`/`search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecallInput {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub min_score: f32,
    #[serde(default)]
    pub search_mode: SearchMode,
    #[serde(default)]
    pub source_type: Option<SourceType>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub min_retention: Option<f64>,
    #[serde(default)]
    pub max_retention: Option<f64>,
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
}

fn default_limit() -> i64 {
    10
}

impl Default for RecallInput {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: default_limit(),
            offset: 0,
            min_score: 0.0,
            search_mode: SearchMode::Hybrid,
            source_type: None,
            tags: vec![],
            min_retention: None,
            max_retention: None,
            date_from: None,
            date_to: None,
        }
    }
}

// ============================================================================
// PATCH
// ============================================================================

/// Partial update applied by `Store::update_node_fields` (§4.1). Every field
/// is optional; `id` and `created_at` are never part of a patch.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub content: Option<String>,
    pub summary: Option<Option<String>>,
    pub source_id: Option<Option<String>>,
    pub source_url: Option<Option<String>>,
    pub source_chain: Option<Vec<String>>,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub state: Option<SchedulingState>,
    pub last_review: Option<Option<DateTime<Utc>>>,
    pub next_review: Option<Option<DateTime<Utc>>>,
    pub reps: Option<i64>,
    pub lapses: Option<i64>,
    pub storage_strength: Option<f64>,
    pub retrieval_strength: Option<f64>,
    pub retention_strength: Option<f64>,
    pub stability_factor: Option<f64>,
    pub sentiment_intensity: Option<f64>,
    pub confidence: Option<f64>,
    pub is_contradicted: Option<bool>,
    pub contradiction_ids: Option<Vec<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub people: Option<BTreeSet<String>>,
    pub concepts: Option<BTreeSet<String>>,
    pub events: Option<BTreeSet<String>>,
    pub access_count: Option<i64>,
    pub review_count: Option<i64>,
}

impl NodePatch {
    pub fn apply(&self, node: &mut KnowledgeNode) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = self.$field.clone() {
                    node.$field = v;
                }
            };
        }
        set!(content);
        set!(summary);
        set!(source_id);
        set!(source_url);
        set!(source_chain);
        set!(stability);
        set!(difficulty);
        set!(state);
        set!(last_review);
        set!(next_review);
        set!(reps);
        set!(lapses);
        set!(storage_strength);
        set!(retrieval_strength);
        set!(retention_strength);
        set!(stability_factor);
        set!(sentiment_intensity);
        set!(confidence);
        set!(is_contradicted);
        set!(contradiction_ids);
        set!(tags);
        set!(people);
        set!(concepts);
        set!(events);
        set!(access_count);
        set!(review_count);
        // retention_strength mirrors retrieval_strength only when the caller
        // didn't set retention_strength explicitly (decay/promote/demote own
        // it directly; FSRS review coupling updates retrieval_strength and
        // relies on the mirror - see §9 open question c).
        if self.retrieval_strength.is_some() && self.retention_strength.is_none() {
            node.sync_retention_strength();
        }
        node.updated_at = Utc::now();
    }
}

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    Keyword,
    Semantic,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub node: KnowledgeNode,
    pub keyword_score: Option<f32>,
    pub semantic_score: Option<f32>,
    pub combined_score: f32,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    pub node: KnowledgeNode,
    pub similarity: f32,
}

/// Pagination envelope returned by `search_nodes` (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResults {
    pub results: Vec<SearchResult>,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
    pub total_after_filters: i64,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_nodes: i64,
    pub nodes_due_for_review: i64,
    pub average_retention: f64,
    pub average_storage_strength: f64,
    pub average_retrieval_strength: f64,
    pub oldest_memory: Option<DateTime<Utc>>,
    pub newest_memory: Option<DateTime<Utc>>,
    pub nodes_with_embeddings: i64,
}

/// Result of a `consolidate` sweep (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationResult {
    pub processed: i64,
    pub promoted: i64,
    pub pruned: i64,
    pub decay_applied: i64,
    pub embeddings_missing: i64,
    pub duration_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_roundtrip() {
        for st in [
            SourceType::Fact,
            SourceType::Concept,
            SourceType::Event,
            SourceType::Intention,
            SourceType::Webpage,
        ] {
            assert_eq!(SourceType::parse_name(st.as_str()), st);
        }
    }

    #[test]
    fn test_default_node_satisfies_invariants() {
        let node = KnowledgeNode::default();
        assert!(node.check_dual_strength_invariant());
        assert!(node.check_review_ordering_invariant());
        assert!(node.is_due());
        assert_eq!(node.state, SchedulingState::New);
        assert_eq!(node.reps, 0);
        assert!(node.last_review.is_none());
    }

    #[test]
    fn test_ingest_input_deny_unknown_fields() {
        let json = r#"{"content": "test", "sourceType": "fact", "tags": []}"#;
        let result: Result<IngestInput, _> = serde_json::from_str(json);
        assert!(result.is_ok());

        let bad = r#"{"content": "test", "sourceType": "fact", "evil": "x"}"#;
        let result: Result<IngestInput, _> = serde_json::from_str(bad);
        assert!(result.is_err());
    }

    #[test]
    fn test_sync_retention_strength() {
        let mut node = KnowledgeNode::default();
        node.retrieval_strength = 0.42;
        node.sync_retention_strength();
        assert_eq!(node.retention_strength, 0.42);
    }
}
