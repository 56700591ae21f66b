//! Hippocampal Index (spec §4.5)
//!
//! Teyler & Rudy's (2007) hippocampal indexing theory: the hippocampus
//! doesn't store full memories, it stores compact pointers ("indices") that
//! can be combined and traversed to reconstruct and associate memories
//! stored elsewhere (here, the Store). This module is the in-memory index:
//! barcoding for dedup, 768->128 compression for compact comparison, a
//! weighted combined-relevance score, typed association links, and
//! spreading activation over those links.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::memory::KnowledgeNode;

/// Compressed index dimension (spec §4.5, §6.3).
pub const INDEX_EMBEDDING_DIM: usize = 128;

#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum HippocampalIndexError {
    #[error("memory not found in index: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, HippocampalIndexError>;

// ============================================================================
// BARCODE
// ============================================================================

/// `(content_hash, temporal_hash)` identifier used for fast dedup and
/// indexing (spec §4.5, §8 property 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBarcode {
    pub content_hash: String,
    pub temporal_hash: String,
}

pub struct BarcodeGenerator;

impl BarcodeGenerator {
    /// `content_hash = first 16 hex bytes of SHA-256(content)`;
    /// `temporal_hash = first 16 hex bytes of SHA-256(content[:100] | timestamp_ms)`.
    /// Identical content shares `content_hash` regardless of when it was
    /// encoded, but `temporal_hash` differs across encodings of the same
    /// content at different times.
    pub fn generate(content: &str, timestamp: DateTime<Utc>) -> MemoryBarcode {
        let content_hash = hex16(Sha256::digest(content.as_bytes()));

        let prefix: String = content.chars().take(100).collect();
        let mut temporal_input = prefix.into_bytes();
        temporal_input.extend_from_slice(timestamp.timestamp_millis().to_le_bytes().as_slice());
        let temporal_hash = hex16(Sha256::digest(&temporal_input));

        MemoryBarcode { content_hash, temporal_hash }
    }
}

fn hex16(digest: impl AsRef<[u8]>) -> String {
    digest.as_ref().iter().take(16).map(|b| format!("{b:02x}")).collect()
}

// ============================================================================
// COMPRESSION
// ============================================================================

/// Compresses a full-dimensional embedding to `INDEX_EMBEDDING_DIM` by
/// contiguous-group mean, then L2-normalizes. Inputs narrower than the
/// target are zero-padded first (a zero-vector result is allowed - the
/// normalization is then a no-op).
pub fn compress_embedding(full: &[f32]) -> Vec<f32> {
    let target = INDEX_EMBEDDING_DIM;
    if full.len() <= target {
        let mut padded = full.to_vec();
        padded.resize(target, 0.0);
        return normalize(padded);
    }

    let group_size = full.len() as f64 / target as f64;
    let mut out = Vec::with_capacity(target);
    for i in 0..target {
        let start = (i as f64 * group_size).floor() as usize;
        let end = (((i + 1) as f64 * group_size).floor() as usize).max(start + 1).min(full.len());
        let slice = &full[start..end];
        let mean = slice.iter().sum::<f32>() / slice.len() as f32;
        out.push(mean);
    }
    normalize(out)
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let dot: f32 = a[..n].iter().zip(&b[..n]).map(|(x, y)| x * y).sum();
    let na = (a[..n].iter().map(|x| x * x).sum::<f32>()).sqrt();
    let nb = (b[..n].iter().map(|x| x * x).sum::<f32>()).sqrt();
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        0.0
    } else {
        (dot / (na * nb)) as f64
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Inputs to the importance sub-score (spec §4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportanceInputs {
    pub emotional_intensity: f64,
    pub access_count: i64,
    pub hours_since_access: f64,
    pub has_associations: bool,
    pub starred: bool,
    pub retention_strength: f64,
    pub is_consolidated: bool,
}

/// `0.15*emotional + 0.20*freq + 0.10*recent + 0.15*has_assoc + 0.20*starred
/// + 0.15*high_retention + 0.05*consolidated`, clamped to `[0,1]`.
pub fn importance_score(inputs: &ImportanceInputs) -> f64 {
    let emotional = inputs.emotional_intensity.clamp(0.0, 1.0);
    let freq = (inputs.access_count as f64 / 10.0).clamp(0.0, 1.0);
    let recent = (1.0 / (1.0 + inputs.hours_since_access / 24.0)).clamp(0.0, 1.0);
    let has_assoc = if inputs.has_associations { 1.0 } else { 0.0 };
    let starred = if inputs.starred { 1.0 } else { 0.0 };
    let high_retention = if inputs.retention_strength >= 0.7 { 1.0 } else { 0.0 };
    let consolidated = if inputs.is_consolidated { 1.0 } else { 0.0 };

    let score = 0.15 * emotional
        + 0.20 * freq
        + 0.10 * recent
        + 0.15 * has_assoc
        + 0.20 * starred
        + 0.15 * high_retention
        + 0.05 * consolidated;
    score.clamp(0.0, 1.0)
}

/// `combined = 0.5*semantic + 0.2*text + 0.15*temporal + 0.15*importance`.
/// Temporal uses the 336-hour half-life reciprocal form.
pub fn combined_score(semantic: f64, text: f64, hours_since_access: f64, importance: f64) -> f64 {
    let temporal = 1.0 / (1.0 + hours_since_access / 336.0);
    0.5 * semantic + 0.2 * text + 0.15 * temporal + 0.15 * importance
}

// ============================================================================
// TYPED LINKS
// ============================================================================

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationLinkType {
    Semantic,
    Temporal,
    Causal,
    PersonMentioned,
    SameSource,
    UserDefined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexLink {
    pub from: String,
    pub to: String,
    pub link_type: AssociationLinkType,
    pub strength: f32,
}

// ============================================================================
// QUERY / FILTERS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct IndexQuery {
    pub query_embedding: Option<Vec<f32>>,
    pub query_text: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub required_flags: Vec<String>,
    pub min_similarity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMatch {
    pub node_id: String,
    pub score: f64,
}

const DEFAULT_MIN_SIMILARITY: f64 = 0.3;

// ============================================================================
// INDEX
// ============================================================================

struct IndexedMemory {
    barcode: MemoryBarcode,
    compressed: Vec<f32>,
    created_at: DateTime<Utc>,
    flags: HashSet<String>,
}

/// The in-memory hippocampal index: owner-exclusive per spec §5 (a single
/// writer lock guards mutation; snapshotted at search time by the caller).
#[derive(Default)]
pub struct HippocampalIndex {
    memories: HashMap<String, IndexedMemory>,
    links: HashMap<(String, String, AssociationLinkType), IndexLink>,
    adjacency: HashMap<String, Vec<(String, AssociationLinkType)>>,
}

impl HippocampalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_memory(&mut self, id: impl Into<String>, content: &str, embedding: Option<&[f32]>, created_at: DateTime<Utc>, flags: &[String]) {
        let id = id.into();
        let barcode = BarcodeGenerator::generate(content, created_at);
        let compressed = embedding.map(compress_embedding).unwrap_or_default();
        self.memories.insert(
            id,
            IndexedMemory {
                barcode,
                compressed,
                created_at,
                flags: flags.iter().cloned().collect(),
            },
        );
    }

    pub fn barcode(&self, id: &str) -> Option<&MemoryBarcode> {
        self.memories.get(id).map(|m| &m.barcode)
    }

    pub fn remove(&mut self, id: &str) {
        self.memories.remove(id);
        self.links.retain(|(f, t, _), _| f != id && t != id);
        self.adjacency.remove(id);
        for targets in self.adjacency.values_mut() {
            targets.retain(|(t, _)| t != id);
        }
    }

    /// Adds or updates a link keyed by `(from, to, type)`; updates overwrite
    /// strength and clamp to `[0,1]`.
    pub fn link(&mut self, from: impl Into<String>, to: impl Into<String>, link_type: AssociationLinkType, strength: f32) {
        let from = from.into();
        let to = to.into();
        let strength = strength.clamp(0.0, 1.0);
        let key = (from.clone(), to.clone(), link_type);
        if self.links.insert(key, IndexLink { from: from.clone(), to: to.clone(), link_type, strength }).is_none() {
            self.adjacency.entry(from).or_default().push((to, link_type));
        }
    }

    /// `has_associations` flag mirrors `links.len() > 0` for this node (as
    /// source).
    pub fn has_associations(&self, id: &str) -> bool {
        self.adjacency.get(id).is_some_and(|v| !v.is_empty())
    }

    pub fn links_from(&self, id: &str) -> Vec<&IndexLink> {
        self.adjacency
            .get(id)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|(to, lt)| self.links.get(&(id.to_string(), to.clone(), *lt)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Filters and scores candidates against `query` (spec §4.5 filters).
    /// `text_score_fn` computes the text-relevance sub-score for a node
    /// against `query.query_text` (left to the caller, which has access to
    /// full content via the Store - see §9 open question b).
    pub fn search(
        &self,
        query: &IndexQuery,
        now: DateTime<Utc>,
        importance_of: impl Fn(&str) -> ImportanceInputs,
        text_score_of: impl Fn(&str) -> f64,
    ) -> Vec<IndexMatch> {
        let min_similarity = query.min_similarity.unwrap_or(DEFAULT_MIN_SIMILARITY);
        let compressed_query = query.query_embedding.as_deref().map(compress_embedding);

        let mut matches = Vec::new();
        for (id, mem) in &self.memories {
            if let Some(after) = query.created_after {
                if mem.created_at < after {
                    continue;
                }
            }
            if let Some(before) = query.created_before {
                if mem.created_at > before {
                    continue;
                }
            }
            if !query.required_flags.iter().all(|f| mem.flags.contains(f)) {
                continue;
            }

            let semantic = match &compressed_query {
                Some(q) if !mem.compressed.is_empty() => cosine(q, &mem.compressed),
                _ => 0.0,
            };

            let has_embedding_query = compressed_query.is_some();
            let has_text_query = query.query_text.is_some();
            if has_embedding_query && semantic < min_similarity {
                continue;
            }

            let text = if has_text_query { text_score_of(id) } else { 0.0 };
            if has_text_query && !has_embedding_query && text < min_similarity {
                continue;
            }

            let hours = (now - mem.created_at).num_seconds() as f64 / 3600.0;
            let importance = importance_score(&importance_of(id));
            let score = combined_score(semantic, text, hours.max(0.0), importance);
            matches.push(IndexMatch { node_id: id.clone(), score });
        }

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches
    }

    /// Breadth-first spreading activation (spec §4.5, §8 property 7).
    /// Starting activation `1.0`; each hop multiplies by `edge.strength*0.7`;
    /// stops when activation drops below `0.1` or `max_hops` is reached. A
    /// visited set breaks cycles; the best activation per node is kept.
    pub fn spread_activation(&self, start: &str, max_hops: usize) -> Vec<ActivatedNode> {
        const DECAY: f32 = 0.7;
        const FLOOR: f32 = 0.1;

        let mut best: HashMap<String, ActivatedNode> = HashMap::new();
        let mut queue: VecDeque<(String, f32, usize, Vec<String>, Option<AssociationLinkType>)> = VecDeque::new();
        queue.push_back((start.to_string(), 1.0, 0, vec![start.to_string()], None));

        while let Some((node, activation, depth, path, dominant_type)) = queue.pop_front() {
            if depth > 0 {
                let better = best.get(&node).is_none_or(|existing| activation > existing.activation);
                if better {
                    best.insert(
                        node.clone(),
                        ActivatedNode {
                            node_id: node.clone(),
                            activation,
                            distance: depth,
                            path: path.clone(),
                            dominant_link_type: dominant_type,
                        },
                    );
                } else {
                    continue;
                }
            }

            if depth >= max_hops {
                continue;
            }

            for link in self.links_from(&node) {
                if path.contains(&link.to) {
                    continue;
                }
                let next_activation = activation * link.strength * DECAY;
                if next_activation < FLOOR {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(link.to.clone());
                let next_dominant = dominant_type.or(Some(link.link_type));
                queue.push_back((link.to.clone(), next_activation, depth + 1, next_path, next_dominant));
            }
        }

        let mut out: Vec<ActivatedNode> = best.into_values().collect();
        out.sort_by(|a, b| b.activation.partial_cmp(&a.activation).unwrap_or(std::cmp::Ordering::Equal));
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivatedNode {
    pub node_id: String,
    pub activation: f32,
    pub distance: usize,
    pub path: Vec<String>,
    pub dominant_link_type: Option<AssociationLinkType>,
}

/// Helper extracting `ImportanceInputs` from a `KnowledgeNode` for callers
/// that don't need to customize the mapping.
pub fn importance_inputs_for(node: &KnowledgeNode, now: DateTime<Utc>, has_associations: bool) -> ImportanceInputs {
    ImportanceInputs {
        emotional_intensity: node.sentiment_intensity,
        access_count: node.access_count,
        hours_since_access: (now - node.last_accessed_at).num_seconds() as f64 / 3600.0,
        has_associations,
        starred: node.stability_factor > 1.3,
        retention_strength: node.retention_strength,
        is_consolidated: node.review_count > 0,
    }
}
