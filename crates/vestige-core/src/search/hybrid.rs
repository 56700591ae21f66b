//! Fusion and scoring math for the search pipeline (spec §4.4)

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::memory::KnowledgeNode;

/// Reciprocal Rank Fusion: `score(d) = w_k/(k+rank_K(d)) + w_v/(k+rank_V(d))`,
/// an absent list contributing 0 for that id. Ties are left stable; the
/// caller breaks them by retention/recency per §4.4.
pub fn reciprocal_rank_fusion(
    keyword_ranked: &[String],
    vector_ranked: &[String],
    k_rrf: f64,
    keyword_weight: f64,
    vector_weight: f64,
) -> HashMap<String, f64> {
    let mut scores: HashMap<String, f64> = HashMap::new();
    for (rank, id) in keyword_ranked.iter().enumerate() {
        *scores.entry(id.clone()).or_default() += keyword_weight / (k_rrf + rank as f64);
    }
    for (rank, id) in vector_ranked.iter().enumerate() {
        *scores.entry(id.clone()).or_default() += vector_weight / (k_rrf + rank as f64);
    }
    scores
}

/// Linear combination of normalized scores - an alternate fusion strategy
/// kept alongside RRF for callers that want score-scale-aware blending.
pub fn linear_combination(
    keyword_results: &[(String, f32)],
    vector_results: &[(String, f32)],
    keyword_weight: f32,
    vector_weight: f32,
) -> HashMap<String, f32> {
    let mut scores: HashMap<String, f32> = HashMap::new();
    for (id, score) in keyword_results {
        *scores.entry(id.clone()).or_default() += score * keyword_weight;
    }
    for (id, score) in vector_results {
        *scores.entry(id.clone()).or_default() += score * vector_weight;
    }
    scores
}

/// Sorts fused `(id, score)` pairs by score desc, breaking ties by larger
/// `retention_strength` then newer `last_accessed_at` (§4.4).
pub fn sort_fused(mut scored: Vec<(KnowledgeNode, f64)>) -> Vec<(KnowledgeNode, f64)> {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.0.retention_strength
                    .partial_cmp(&a.0.retention_strength)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| b.0.last_accessed_at.cmp(&a.0.last_accessed_at))
    });
    scored
}

/// Context-mode weighted sum (§4.4): temporal (14-day half-life), topical
/// (tag overlap), project (substring match), mood (sentiment alignment).
/// Weights are fixed and normalized to sum to 1.
pub struct ContextQuery<'a> {
    pub topics: &'a [String],
    pub project: Option<&'a str>,
    pub mood: Option<&'a str>,
    pub temporal_half_life_days: f64,
}

pub fn context_score(node: &KnowledgeNode, now: DateTime<Utc>, ctx: &ContextQuery) -> f64 {
    let weights = [0.25_f64, 0.35, 0.20, 0.20]; // temporal, topical, project, mood
    let sum: f64 = weights.iter().sum();

    let hours = (now - node.last_accessed_at).num_seconds() as f64 / 3600.0;
    let half_life_hours = ctx.temporal_half_life_days * 24.0;
    let temporal = if half_life_hours > 0.0 {
        0.5_f64.powf(hours.max(0.0) / half_life_hours)
    } else {
        0.0
    };

    let topical = if ctx.topics.is_empty() {
        0.0
    } else {
        let tags: Vec<String> = node.tags.iter().map(|t| t.to_lowercase()).collect();
        let hits = ctx
            .topics
            .iter()
            .filter(|topic| {
                let topic = topic.to_lowercase();
                tags.iter().any(|t| t.contains(&topic) || topic.contains(t.as_str()))
            })
            .count();
        hits as f64 / ctx.topics.len() as f64
    };

    let project = match ctx.project {
        Some(p) if !p.is_empty() => {
            let p_lower = p.to_lowercase();
            if node.content.to_lowercase().contains(&p_lower) {
                1.0
            } else if node.tags.iter().any(|t| t.to_lowercase().contains(&p_lower)) {
                0.8
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    let mood = match ctx.mood {
        Some("positive") | Some("negative") => node.sentiment_intensity,
        Some("neutral") => 1.0 - node.sentiment_intensity,
        _ => 0.0,
    };

    (weights[0] * temporal + weights[1] * topical + weights[2] * project + weights[3] * mood) / sum
}
