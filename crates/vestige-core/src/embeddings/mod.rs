//! Semantic embeddings module (spec §6.3)
//!
//! Defines the embedding wire contract and the `EmbeddingProvider` adapter
//! boundary. Concrete providers (ONNX models, hosted APIs) are supplied by
//! the caller; `LocalHashEmbedder` is the dependency-free default.

mod local;

pub use local::{
    cosine_similarity, dot_product, euclidean_distance, matryoshka_truncate, Embedding,
    EmbeddingError, EmbeddingProvider, LocalHashEmbedder, BATCH_SIZE, EMBEDDING_DIMENSIONS,
    MAX_TEXT_LENGTH,
};
