//! Embedding provider trait and a deterministic local default
//!
//! The concrete embedding provider is an adapter (spec §1) - callers supply
//! their own `EmbeddingProvider` (wrapping whatever model they run).
//! `LocalHashEmbedder` is a dependency-free deterministic fallback used when
//! no provider is configured, by tests, and by the offline/`has_embedding:
//! false` paths in Smart Ingest (§4.8).

use serde::{Deserialize, Serialize};

/// Dense embedding dimension (spec §6.3).
pub const EMBEDDING_DIMENSIONS: usize = 768;

/// Maximum text length considered for embedding (truncated if longer).
pub const MAX_TEXT_LENGTH: usize = 8192;

/// Batch size for efficient embedding generation.
pub const BATCH_SIZE: usize = 32;

#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    #[error("embedding generation failed: {0}")]
    Failed(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A semantic embedding vector (spec §3.1, §6.3). Must be unit-norm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model: String,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        let mut e = Self {
            vector,
            model: model.into(),
        };
        e.normalize();
        e
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.vector, &other.vector)
    }

    pub fn normalize(&mut self) {
        let norm = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut self.vector {
                *x /= norm;
            }
        }
    }

    /// §8 invariant 2: `|len(v) - 1| <= 1e-3`.
    pub fn is_unit_norm(&self) -> bool {
        let norm = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        (norm - 1.0).abs() <= 1e-3 || self.vector.iter().all(|x| *x == 0.0)
    }

    /// Little-endian IEEE-754 float32, packed tightly (spec §6.3).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.vector.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8], model: impl Into<String>) -> Option<Self> {
        if bytes.len() % 4 != 0 {
            return None;
        }
        let vector: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Some(Self {
            vector,
            model: model.into(),
        })
    }
}

/// Cosine similarity, mapped into `[-1, 1]`. Zero vectors yield `0.0` by the
/// crate-wide convention that math paths never fail (spec §7).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot = dot_product(a, b);
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Matryoshka-style truncation to the first `dims` components, re-normalized.
pub fn matryoshka_truncate(vector: &[f32], dims: usize) -> Vec<f32> {
    let mut truncated: Vec<f32> = vector.iter().take(dims).copied().collect();
    let norm = truncated.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut truncated {
            *x /= norm;
        }
    }
    truncated
}

/// Adapter boundary for embedding generation (spec §1: "embedding provider"
/// is out of scope as a concrete implementation, but the contract it must
/// satisfy is in scope).
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
    fn dimensions(&self) -> usize;
    fn model_name(&self) -> &str;
}

/// Deterministic local embedder: hashes overlapping word shingles into a
/// fixed-width vector. No network, no model download - used as the default
/// provider in tests and whenever `has_embedding: false` would otherwise
/// force Smart Ingest (§4.8) onto the keyword-only path.
pub struct LocalHashEmbedder {
    dims: usize,
}

impl Default for LocalHashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSIONS)
    }
}

impl LocalHashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl EmbeddingProvider for LocalHashEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("text cannot be empty".into()));
        }
        let truncated = if text.len() > MAX_TEXT_LENGTH {
            &text[..MAX_TEXT_LENGTH]
        } else {
            text
        };
        let mut vector = vec![0.0f32; self.dims];
        for token in truncated.split_whitespace().map(|w| w.to_lowercase()) {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            std::hash::Hash::hash(&token, &mut hasher);
            let h = std::hash::Hasher::finish(&hasher);
            let idx = (h as usize) % self.dims;
            let sign = if (h >> 63) & 1 == 1 { -1.0 } else { 1.0 };
            vector[idx] += sign;
        }
        Ok(Embedding::new(vector, self.model_name()))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "local-hash-v1"
    }
}
