//! Vector candidate generation (spec §4.4)
//!
//! Brute-force cosine scan over stored embeddings. The concrete ANN index
//! (HNSW, IVF, ...) is an adapter concern (spec §1); at the scale a local
//! memory store runs at, a linear scan is the honest default and keeps the
//! crate free of a vector-search dependency.

use crate::embeddings::cosine_similarity;
use crate::memory::KnowledgeNode;
use crate::storage::Storage;

/// Up to `limit * multiplier` nodes ranked by cosine similarity to
/// `query_embedding`, mapped from `[-1,1]` into `[0,1]` per §4.4.
pub fn vector_candidates(
    storage: &Storage,
    query_embedding: &[f32],
    k: usize,
) -> crate::storage::Result<Vec<(KnowledgeNode, f32)>> {
    let all = storage.all_embeddings()?;
    let mut scored: Vec<(String, f32)> = all
        .into_iter()
        .map(|(id, vector)| {
            let sim = cosine_similarity(query_embedding, &vector);
            (id, (sim + 1.0) / 2.0)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    let mut out = Vec::with_capacity(scored.len());
    for (id, score) in scored {
        if let Some(node) = storage.get_node(&id)? {
            out.push((node, score));
        }
    }
    Ok(out)
}
