//! Search pipeline (spec §4.4)
//!
//! Keyword + vector candidate generation, Reciprocal Rank Fusion, filters,
//! context-mode scoring, and pagination. `C4` in the component map.

mod hybrid;
mod keyword;
mod vector;

pub use hybrid::{context_score, linear_combination, reciprocal_rank_fusion, sort_fused, ContextQuery};
pub use keyword::keyword_candidates;
pub use vector::vector_candidates;

use chrono::Utc;

use crate::config::VestigeConfig;
use crate::embeddings::EmbeddingProvider;
use crate::memory::{KnowledgeNode, MatchType, PagedResults, RecallInput, SearchMode, SearchResult};
use crate::storage::{Result, Storage};

const SOURCE_LIMIT_MULTIPLIER: usize = 3;

/// Runs `recall`/`search` end-to-end (§4.4, §6.1). `embedder` may be `None`;
/// semantic/hybrid modes then degrade to keyword-only, per the §7 convention
/// that an absent source list is equivalent to zero weight (§8 property 8).
pub fn recall(
    storage: &Storage,
    embedder: Option<&dyn EmbeddingProvider>,
    input: RecallInput,
    config: &VestigeConfig,
) -> Result<PagedResults> {
    let k = (input.limit.max(1) as usize) * SOURCE_LIMIT_MULTIPLIER;

    let keyword_hits = if matches!(input.search_mode, SearchMode::Semantic) {
        Vec::new()
    } else {
        keyword::keyword_candidates(storage, &input.query, k)
    };

    let vector_hits = if matches!(input.search_mode, SearchMode::Keyword) {
        Vec::new()
    } else if let Some(embedder) = embedder {
        match embedder.embed(&input.query) {
            Ok(embedding) => vector::vector_candidates(storage, &embedding.vector, k)?,
            Err(_) => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let mut nodes_by_id: std::collections::HashMap<String, KnowledgeNode> =
        std::collections::HashMap::new();
    for (node, _) in keyword_hits.iter().chain(vector_hits.iter()) {
        nodes_by_id.entry(node.id.clone()).or_insert_with(|| node.clone());
    }

    let keyword_ranked: Vec<String> = keyword_hits.iter().map(|(n, _)| n.id.clone()).collect();
    let vector_ranked: Vec<String> = vector_hits.iter().map(|(n, _)| n.id.clone()).collect();
    let keyword_scores: std::collections::HashMap<String, f32> =
        keyword_hits.iter().map(|(n, s)| (n.id.clone(), *s)).collect();
    let vector_scores: std::collections::HashMap<String, f32> =
        vector_hits.iter().map(|(n, s)| (n.id.clone(), *s)).collect();

    let fused: Vec<(KnowledgeNode, f64)> = match input.search_mode {
        SearchMode::Context => {
            let ctx = ContextQuery {
                topics: &input.tags,
                project: None,
                mood: None,
                temporal_half_life_days: config.temporal_half_life_days,
            };
            let now = Utc::now();
            nodes_by_id
                .values()
                .cloned()
                .map(|node| {
                    let score = context_score(&node, now, &ctx);
                    (node, score)
                })
                .collect()
        }
        _ => {
            let rrf = reciprocal_rank_fusion(
                &keyword_ranked,
                &vector_ranked,
                config.rrf_k,
                config.keyword_weight,
                config.vector_weight,
            );
            nodes_by_id
                .values()
                .cloned()
                .map(|node| {
                    let score = *rrf.get(&node.id).unwrap_or(&0.0);
                    (node, score)
                })
                .collect()
        }
    };

    let sorted = sort_fused(fused);

    let filtered: Vec<SearchResult> = sorted
        .into_iter()
        .filter(|(node, score)| passes_filters(node, *score as f32, &input))
        .map(|(node, score)| {
            let keyword_score = keyword_scores.get(&node.id).copied();
            let semantic_score = vector_scores.get(&node.id).copied();
            let match_type = match (keyword_score.is_some(), semantic_score.is_some()) {
                (true, true) => MatchType::Both,
                (true, false) => MatchType::Keyword,
                _ => MatchType::Semantic,
            };
            SearchResult {
                node,
                keyword_score,
                semantic_score,
                combined_score: score as f32,
                match_type,
            }
        })
        .collect();

    let total_after_filters = filtered.len() as i64;
    let offset = input.offset.max(0) as usize;
    let limit = input.limit.max(0) as usize;
    let page: Vec<SearchResult> = filtered.into_iter().skip(offset).take(limit).collect();
    let has_more = (offset + page.len()) < total_after_filters as usize;

    // Best-effort recall side-effect (§4.4): must not fail the query.
    for result in &page {
        let _ = storage.update_node_access(&result.node.id);
    }

    Ok(PagedResults {
        results: page,
        limit: input.limit,
        offset: input.offset,
        has_more,
        total_after_filters,
    })
}

fn passes_filters(node: &KnowledgeNode, score: f32, input: &RecallInput) -> bool {
    if score < input.min_score {
        return false;
    }
    if let Some(st) = input.source_type {
        if node.source_type != st {
            return false;
        }
    }
    if !input.tags.is_empty() {
        let tags_lower: Vec<String> = node.tags.iter().map(|t| t.to_lowercase()).collect();
        let matches = input
            .tags
            .iter()
            .any(|t| tags_lower.contains(&t.to_lowercase()));
        if !matches {
            return false;
        }
    }
    if let Some(min) = input.min_retention {
        if node.retention_strength < min {
            return false;
        }
    }
    if let Some(max) = input.max_retention {
        if node.retention_strength > max {
            return false;
        }
    }
    if let Some(from) = input.date_from {
        if node.created_at < from {
            return false;
        }
    }
    if let Some(to) = input.date_to {
        if node.created_at > to {
            return false;
        }
    }
    true
}
