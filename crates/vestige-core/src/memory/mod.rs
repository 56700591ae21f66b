//! Memory module - core entities and data structures (spec §3.1)

mod node;
mod person;
mod graph;

pub use node::{
    ConsolidationResult, IngestInput, KnowledgeNode, MatchType, MemoryStats, NodePatch,
    PagedResults, RecallInput, SchedulingState, SearchMode, SearchResult, SimilarityResult,
    SourcePlatform, SourceType,
};
pub use person::Person;
pub use graph::{GraphEdge, EdgeType};
