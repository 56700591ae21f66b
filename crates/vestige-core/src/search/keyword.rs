//! Keyword candidate generation (spec §4.4)
//!
//! Thin wrapper over the Store's FTS5/LIKE contract (§4.1) that returns
//! fully-hydrated nodes so the fusion stage never has to re-query.

use crate::memory::KnowledgeNode;
use crate::storage::Storage;

/// Up to `limit * multiplier` keyword candidates, ranked by normalized
/// relevance descending. Falls back to `LIKE` when FTS yields nothing and
/// the query is non-trivial (FTS5 unavailable or the index is empty).
pub fn keyword_candidates(
    storage: &Storage,
    query: &str,
    k: usize,
) -> Vec<(KnowledgeNode, f32)> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    match storage.fts_candidates(query, k as i64) {
        Ok(rows) if !rows.is_empty() => rows,
        _ => storage.like_candidates(query, k as i64).unwrap_or_default(),
    }
}
