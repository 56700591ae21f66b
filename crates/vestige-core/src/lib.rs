//! # Vestige Core
//!
//! Cognitive memory engine: FSRS-6 spaced repetition, a Bjork dual-strength
//! model, hybrid keyword/semantic search, and a set of neuroscience-inspired
//! mechanisms (hippocampal indexing, synaptic tagging, memory state machine,
//! context-dependent retrieval, predictive retrieval, and prospective memory)
//! layered on top of a single SQLite store.
//!
//! ## Core model
//!
//! - **FSRS-6**: 21-parameter spaced repetition scheduler (§4.2).
//! - **Dual-Strength Model**: Bjork & Bjork (1992) storage/retrieval strength
//!   coupling, with a legacy `retention_strength` mirror (§3.1, §4.2).
//! - **Hybrid Search**: Reciprocal Rank Fusion of keyword (FTS5) and vector
//!   candidates, plus an encoding-specificity context mode (§4.4, §4.9).
//!
//! ## Neuroscience-inspired mechanisms
//!
//! - **Synaptic Tagging and Capture (STC)**: memories can become important
//!   *retroactively* based on subsequent events (Frey & Morris, 1997).
//! - **Hippocampal Indexing**: content/temporal barcoding with typed
//!   association links and spreading activation (Teyler & Rudy, 2007).
//! - **Memory State Machine**: an accessibility continuum (Active, Dormant,
//!   Silent, Unavailable) with retrieval-induced forgetting (Bjork, 1970s).
//! - **Predictive Retrieval**: interest tracking and co-access prediction
//!   (Friston, 2010).
//! - **Prospective Memory**: future intentions tracked separately from
//!   retrospective recall (Einstein & McDaniel, 1990).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use vestige_core::{Storage, IngestInput, Rating};
//!
//! let storage = Storage::in_memory()?;
//!
//! let input = IngestInput {
//!     content: "The mitochondria is the powerhouse of the cell".to_string(),
//!     ..Default::default()
//! };
//! let node = storage.insert_node(input)?;
//!
//! let updated = vestige_core::tools::review(&storage, &node.id, Rating::Good)?;
//! ```
//!
//! ## Feature flags
//!
//! - `embeddings` (default): enables the `EmbeddingProvider` trait and the
//!   bundled deterministic `LocalHashEmbedder`.
//! - `vector-search` (default): enables the brute-force vector candidate
//!   search path over stored embeddings.
//! - `full`: all features.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod consolidation;
pub mod error;
pub mod fsrs;
pub mod ingest;
pub mod memory;
pub mod neuroscience;
pub mod storage;
pub mod tools;

#[cfg(feature = "embeddings")]
#[cfg_attr(docsrs, doc(cfg(feature = "embeddings")))]
pub mod embeddings;

#[cfg(feature = "vector-search")]
#[cfg_attr(docsrs, doc(cfg(feature = "vector-search")))]
pub mod search;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::VestigeConfig;
pub use error::{ErrorKind, VestigeError};

pub use memory::{
    ConsolidationResult, EdgeType, GraphEdge, IngestInput, KnowledgeNode, MatchType, MemoryStats,
    NodePatch, PagedResults, Person, RecallInput, SchedulingState, SearchMode, SearchResult,
    SimilarityResult, SourcePlatform, SourceType,
};

pub use fsrs::{
    initial_difficulty, initial_stability, next_interval, retrievability, retrievability_with_decay,
    FSRSParameters, FSRSScheduler, FSRSState, LearningState, PreviewResults, Rating, ReviewResult,
};

pub use storage::{sanitize_fts5_query, DatabaseSize, Result, Storage, StorageError};

pub use consolidation::ConsolidationOptions;

pub use ingest::{IngestDecision, SmartIngestResult};

pub use neuroscience::{
    ActiveFile, AssociationLinkType, BarcodeGenerator, CaptureResult, CaptureWindow, CapturedMemory,
    CompetitionCandidate, CompetitionEvent, CompetitionManager, CompetitionResult, ContextPattern,
    DecayFunction, GitContext, HippocampalIndex, HippocampalIndexError, ImportanceCluster,
    ImportanceEvent, ImportanceEventType, IndexLink, IndexMatch, IndexQuery, Intention,
    IntentionStatus, IntentionTrigger, MemoryBarcode, MemoryContext, MemoryLifecycle, MemoryState,
    PredictedMemory, PredictionReason, Priority, PredictiveRetriever, ProspectiveMemory,
    ProspectiveMemoryError, RecurrencePattern, StateTransition, StateTransitionReason, SynapticTag,
    SynapticTaggingSystem, TriggerBoost, TriggerContext, TriggerPattern, WorkingContext,
    parse_intention,
};

#[cfg(feature = "embeddings")]
pub use embeddings::{cosine_similarity, Embedding, EmbeddingError, EmbeddingProvider, LocalHashEmbedder};

#[cfg(feature = "vector-search")]
pub use search::{
    linear_combination, reciprocal_rank_fusion, ContextQuery,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm version (6 = 21 parameters).
pub const FSRS_VERSION: u8 = 6;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        ConsolidationResult, FSRSScheduler, FSRSState, IngestInput, KnowledgeNode, MemoryStats,
        Rating, RecallInput, Result, SearchMode, SourceType, Storage, StorageError, VestigeConfig,
        VestigeError,
    };

    #[cfg(feature = "embeddings")]
    pub use crate::{Embedding, EmbeddingProvider};

    #[cfg(feature = "vector-search")]
    pub use crate::reciprocal_rank_fusion;

    pub use crate::{
        HippocampalIndex, Intention, IntentionTrigger, MemoryLifecycle, MemoryState,
        PredictiveRetriever, Priority, ProspectiveMemory, SynapticTaggingSystem, WorkingContext,
    };

    pub use crate::tools;
}
