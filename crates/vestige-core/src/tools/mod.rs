//! Tool surface facade (spec §6.1, §4.12)
//!
//! Thin, stateless wrappers the outer tool layer (CLI/RPC, out of scope here)
//! calls directly. Each function maps one §6.1 tool name onto the storage,
//! search, FSRS, and neuroscience modules, converting failures into the
//! crate-wide `VestigeError` envelope (§7).

use chrono::Utc;

use crate::config::VestigeConfig;
use crate::consolidation::{self, ConsolidationOptions};
use crate::embeddings::EmbeddingProvider;
use crate::error::{ErrorKind, Result, VestigeError};
use crate::fsrs::{FSRSScheduler, FSRSState, Rating, ReviewResult};
use crate::ingest::{self, SmartIngestResult};
use crate::memory::{
    ConsolidationResult, IngestInput, KnowledgeNode, MemoryStats, NodePatch, PagedResults, RecallInput,
};
use crate::neuroscience::context_memory::WorkingContext;
use crate::neuroscience::memory_states::MemoryState;
use crate::search;
use crate::storage::Storage;

const PROMOTE_DELTA: f64 = 0.2;
const PROMOTE_STABILITY_MULTIPLIER: f64 = 1.5;
const PROMOTE_STABILITY_CAP: f64 = 365.0;
const DEMOTE_DELTA: f64 = 0.3;
const DEMOTE_FLOOR: f64 = 0.1;
const DEMOTE_STABILITY_MULTIPLIER: f64 = 0.5;
const DEMOTE_STABILITY_FLOOR: f64 = 1.0;
const FEEDBACK_PREVIEW_LEN: usize = 100;
const TAG_STABILITY_THRESHOLD: f64 = 1.3;
const TAG_STRENGTH_DIVISOR: f64 = 1.5;

pub fn ingest(storage: &Storage, input: IngestInput) -> Result<KnowledgeNode> {
    Ok(storage.insert_node(input)?)
}

pub fn smart_ingest(storage: &Storage, embedder: Option<&dyn EmbeddingProvider>, input: IngestInput) -> Result<SmartIngestResult> {
    Ok(ingest::smart_ingest(storage, embedder, input)?)
}

pub fn recall(storage: &Storage, embedder: Option<&dyn EmbeddingProvider>, input: RecallInput, config: &VestigeConfig) -> Result<PagedResults> {
    Ok(search::recall(storage, embedder, input, config)?)
}

/// Alias kept for the §6.1 `search` tool name (identical semantics to `recall`).
pub fn search(storage: &Storage, embedder: Option<&dyn EmbeddingProvider>, input: RecallInput, config: &VestigeConfig) -> Result<PagedResults> {
    recall(storage, embedder, input, config)
}

/// Runs an FSRS review and applies the §4.2 dual-strength coupling:
/// on success `storage_strength += 0.1*(1-storage_strength)`, `retrieval_strength = 1.0`;
/// on lapse `retrieval_strength = max(0.1, retrieval_strength*0.5)`, storage unchanged.
pub fn review(storage: &Storage, id: &str, rating: Rating) -> Result<KnowledgeNode> {
    let node = storage.get_node(id)?.ok_or_else(|| VestigeError::not_found(format!("node {id}")))?;
    let now = Utc::now();
    let scheduler = FSRSScheduler::default();
    let card = FSRSState { stability: node.stability, difficulty: node.difficulty, state: node.state, last_review: node.last_review };
    let result: ReviewResult = scheduler.review(&card, rating, now);

    let (storage_strength, retrieval_strength) = if result.is_lapse {
        (node.storage_strength, (node.retrieval_strength * 0.5).max(0.1))
    } else {
        (node.storage_strength + 0.1 * (1.0 - node.storage_strength), 1.0)
    };

    let updated = storage.update_node_fields(
        id,
        NodePatch {
            stability: Some(result.stability),
            difficulty: Some(result.difficulty),
            state: Some(result.state),
            last_review: Some(Some(result.last_review)),
            next_review: Some(Some(result.next_review)),
            reps: Some(node.reps + 1),
            lapses: Some(if result.is_lapse { node.lapses + 1 } else { node.lapses }),
            storage_strength: Some(storage_strength),
            retrieval_strength: Some(retrieval_strength),
            review_count: Some(node.review_count + 1),
            ..Default::default()
        },
    )?;
    Ok(updated)
}

pub fn stats(storage: &Storage) -> Result<MemoryStats> {
    Ok(storage.get_stats()?)
}

pub fn consolidate(storage: &Storage, config: &VestigeConfig) -> Result<ConsolidationResult> {
    let opts = ConsolidationOptions::from_config(config);
    Ok(consolidation::consolidate(storage, &opts)?)
}

pub fn get_knowledge(storage: &Storage, id: &str) -> Result<KnowledgeNode> {
    storage.get_node(id)?.ok_or_else(|| VestigeError::not_found(format!("node {id}")))
}

pub fn delete_knowledge(storage: &Storage, id: &str) -> Result<bool> {
    Ok(storage.delete_node(id)?)
}

/// Derives the accessibility state for a node from its current retention
/// (spec §4.6); a thin read-only view, no persisted state-machine row yet.
pub fn get_memory_state(storage: &Storage, id: &str) -> Result<MemoryState> {
    let node = get_knowledge(storage, id)?;
    Ok(MemoryState::from_retention(node.retention_strength))
}

pub fn list_by_state(storage: &Storage, state: MemoryState, limit: i64) -> Result<Vec<KnowledgeNode>> {
    let all = storage.get_all_nodes(i64::MAX, 0)?;
    Ok(all
        .into_iter()
        .filter(|n| MemoryState::from_retention(n.retention_strength) == state)
        .take(limit.max(0) as usize)
        .collect())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StateStats {
    pub active: i64,
    pub dormant: i64,
    pub silent: i64,
    pub unavailable: i64,
}

pub fn state_stats(storage: &Storage) -> Result<StateStats> {
    let all = storage.get_all_nodes(i64::MAX, 0)?;
    let mut stats = StateStats { active: 0, dormant: 0, silent: 0, unavailable: 0 };
    for node in &all {
        match MemoryState::from_retention(node.retention_strength) {
            MemoryState::Active => stats.active += 1,
            MemoryState::Dormant => stats.dormant += 1,
            MemoryState::Silent => stats.silent += 1,
            MemoryState::Unavailable => stats.unavailable += 1,
        }
    }
    Ok(stats)
}

/// `promote_memory`: `retention += 0.2` (clamp 1), `stability_factor *= 1.5`
/// (clamp 365). Spec §4.12.
pub fn promote_memory(storage: &Storage, id: &str) -> Result<KnowledgeNode> {
    let node = get_knowledge(storage, id)?;
    let retention = (node.retention_strength + PROMOTE_DELTA).min(1.0);
    let stability_factor = (node.stability_factor * PROMOTE_STABILITY_MULTIPLIER).min(PROMOTE_STABILITY_CAP);
    Ok(storage.update_node_fields(
        id,
        NodePatch { retention_strength: Some(retention), stability_factor: Some(stability_factor), ..Default::default() },
    )?)
}

/// `demote_memory`: `retention -= 0.3` (floor 0.1), `stability_factor *= 0.5`
/// (floor 1.0). Never deletes the node. Spec §4.12.
pub fn demote_memory(storage: &Storage, id: &str) -> Result<KnowledgeNode> {
    let node = get_knowledge(storage, id)?;
    let retention = (node.retention_strength - DEMOTE_DELTA).max(DEMOTE_FLOOR);
    let stability_factor = (node.stability_factor * DEMOTE_STABILITY_MULTIPLIER).max(DEMOTE_STABILITY_FLOOR);
    Ok(storage.update_node_fields(
        id,
        NodePatch { retention_strength: Some(retention), stability_factor: Some(stability_factor), ..Default::default() },
    )?)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FeedbackRequest {
    pub node_id: String,
    pub preview: String,
    pub options: [&'static str; 3],
}

/// `request_feedback`: a content preview truncated to 100 chars with an
/// ellipsis when truncated, plus the standard A=promote/B=demote/C=custom
/// options (spec §4.12) for the caller to present to the user.
pub fn request_feedback(storage: &Storage, id: &str) -> Result<FeedbackRequest> {
    let node = get_knowledge(storage, id)?;
    let truncated = node.content.chars().count() > FEEDBACK_PREVIEW_LEN;
    let mut preview: String = node.content.chars().take(FEEDBACK_PREVIEW_LEN).collect();
    if truncated {
        preview.push('…');
    }
    Ok(FeedbackRequest { node_id: node.id, preview, options: ["Promote", "Demote", "Custom"] })
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackChoice {
    Promote,
    Demote,
    /// Free-form feedback (option C): recorded on the node as its summary
    /// and flagged for immediate re-review rather than promoted or demoted.
    Custom(String),
}

/// Applies the user's A/B/C choice: promotes, demotes, or records custom
/// feedback and schedules an immediate re-review, respectively.
pub fn apply_feedback(storage: &Storage, id: &str, choice: FeedbackChoice) -> Result<KnowledgeNode> {
    match choice {
        FeedbackChoice::Promote => promote_memory(storage, id),
        FeedbackChoice::Demote => demote_memory(storage, id),
        FeedbackChoice::Custom(note) => Ok(storage.update_node_fields(
            id,
            NodePatch { summary: Some(Some(note)), next_review: Some(Some(Utc::now())), ..Default::default() },
        )?),
    }
}

/// `trigger_importance`: boosts retention/stability per the §4.7 event-type
/// table without requiring a full synaptic-tagging sweep.
pub fn trigger_importance(storage: &Storage, id: &str, event_type: &str) -> Result<KnowledgeNode> {
    let boost = crate::neuroscience::synaptic_tagging::trigger_boost_for(event_type)
        .ok_or_else(|| VestigeError::new(ErrorKind::Invalid, format!("unknown importance event type: {event_type}")))?;
    let node = get_knowledge(storage, id)?;
    let retention = (node.retention_strength + boost.retention_delta).clamp(0.0, 1.0);
    let stability_factor = (node.stability_factor * boost.stability_multiplier).min(PROMOTE_STABILITY_CAP);
    Ok(storage.update_node_fields(
        id,
        NodePatch { retention_strength: Some(retention), stability_factor: Some(stability_factor), ..Default::default() },
    )?)
}

/// `find_tagged`: nodes flagged important by synaptic tagging, i.e.
/// `stability_factor > 1.3 && retention >= min_strength`, sorted by
/// stability desc then retention desc (spec §4.12).
pub fn find_tagged(storage: &Storage, min_strength: f64, limit: i64) -> Result<Vec<(KnowledgeNode, f64)>> {
    let all = storage.get_all_nodes(i64::MAX, 0)?;
    let mut tagged: Vec<(KnowledgeNode, f64)> = all
        .into_iter()
        .filter(|n| n.stability_factor > TAG_STABILITY_THRESHOLD && n.retention_strength >= min_strength)
        .map(|n| {
            let tag_strength = ((n.stability_factor - 1.0) / TAG_STRENGTH_DIVISOR).min(1.0);
            (n, tag_strength)
        })
        .collect();
    tagged.sort_by(|a, b| {
        b.0.stability_factor
            .partial_cmp(&a.0.stability_factor)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.retention_strength.partial_cmp(&a.0.retention_strength).unwrap_or(std::cmp::Ordering::Equal))
    });
    tagged.truncate(limit.max(0) as usize);
    Ok(tagged)
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TagStats {
    pub tagged_count: i64,
    pub total_count: i64,
    pub distribution: std::collections::BTreeMap<String, i64>,
}

/// `tag_stats`: count and tag-value distribution over tagged memories.
pub fn tag_stats(storage: &Storage) -> Result<TagStats> {
    let all = storage.get_all_nodes(i64::MAX, 0)?;
    let mut stats = TagStats { total_count: all.len() as i64, ..Default::default() };
    for node in &all {
        if node.stability_factor > TAG_STABILITY_THRESHOLD {
            stats.tagged_count += 1;
            for tag in &node.tags {
                *stats.distribution.entry(tag.clone()).or_insert(0) += 1;
            }
        }
    }
    Ok(stats)
}

/// `context`: captures the current working context for later encoding-
/// specificity comparisons (spec §4.9). A pure construction helper; the
/// caller supplies what it already knows about the environment.
pub fn context(project_name: Option<String>, frameworks: Vec<String>) -> WorkingContext {
    WorkingContext { project_name, frameworks, captured_at: Utc::now(), ..Default::default() }
}

/// `codebase`: thin accessor mirroring the caller's current project
/// identity, used by `ContextBased::InCodebase` prospective-memory triggers.
/// File-watching and git introspection are out of scope (spec §1 Non-goals).
pub fn codebase(project_name: Option<String>) -> crate::neuroscience::prospective_memory::TriggerContext {
    crate::neuroscience::prospective_memory::TriggerContext { project_name, now: Some(Utc::now()), ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::IngestInput;

    fn node_with(storage: &Storage, stability_factor: f64, retention: f64) -> KnowledgeNode {
        let node = storage.insert_node(IngestInput { content: "x".into(), ..Default::default() }).unwrap();
        storage
            .update_node_fields(&node.id, NodePatch { stability_factor: Some(stability_factor), retention_strength: Some(retention), ..Default::default() })
            .unwrap()
    }

    #[test]
    fn promote_then_demote_round_trips_within_bounds() {
        let storage = Storage::in_memory().unwrap();
        let node = storage.insert_node(IngestInput { content: "x".into(), ..Default::default() }).unwrap();
        let promoted = promote_memory(&storage, &node.id).unwrap();
        assert!((promoted.retention_strength - 1.0).abs() < 1e-9);
        let demoted = demote_memory(&storage, &promoted.id).unwrap();
        assert!((demoted.retention_strength - 0.7).abs() < 1e-9);
    }

    #[test]
    fn find_tagged_filters_by_stability_threshold() {
        let storage = Storage::in_memory().unwrap();
        node_with(&storage, 1.0, 0.9);
        let tagged_node = node_with(&storage, 2.0, 0.9);
        let results = find_tagged(&storage, 0.0, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, tagged_node.id);
        assert!((results[0].1 - (1.0 / 1.5)).abs() < 1e-9);
    }

    #[test]
    fn request_feedback_truncates_preview_with_ellipsis() {
        let storage = Storage::in_memory().unwrap();
        let long_content = "a".repeat(500);
        let node = storage.insert_node(IngestInput { content: long_content, ..Default::default() }).unwrap();
        let feedback = request_feedback(&storage, &node.id).unwrap();
        assert_eq!(feedback.preview.chars().count(), 101);
        assert!(feedback.preview.ends_with('…'));
        assert_eq!(feedback.options, ["Promote", "Demote", "Custom"]);
    }

    #[test]
    fn request_feedback_short_content_has_no_ellipsis() {
        let storage = Storage::in_memory().unwrap();
        let node = storage.insert_node(IngestInput { content: "short".into(), ..Default::default() }).unwrap();
        let feedback = request_feedback(&storage, &node.id).unwrap();
        assert_eq!(feedback.preview, "short");
        assert!(!feedback.preview.ends_with('…'));
    }

    #[test]
    fn trigger_importance_rejects_unknown_event_type() {
        let storage = Storage::in_memory().unwrap();
        let node = storage.insert_node(IngestInput { content: "x".into(), ..Default::default() }).unwrap();
        assert!(trigger_importance(&storage, &node.id, "not_a_real_event").is_err());
    }
}
