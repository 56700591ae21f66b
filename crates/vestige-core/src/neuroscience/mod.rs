//! # Neuroscience-Inspired Memory Mechanisms
//!
//! Unlike traditional AI memory systems that treat importance as static, these
//! mechanisms capture the dynamic nature of biological memory.
//!
//! ## Key Insight: Retroactive Importance
//!
//! In biological systems, memories can become important AFTER encoding based on
//! subsequent events. This is fundamentally different from how AI systems typically
//! work, where importance is determined at encoding time.
//!
//! ## Implemented Mechanisms
//!
//! - **Memory States**: Memories exist on a continuum of accessibility (Active, Dormant,
//!   Silent, Unavailable) rather than simply "remembered" or "forgotten". Implements
//!   retrieval-induced forgetting where retrieving one memory can suppress similar ones.
//!
//! - **Synaptic Tagging and Capture (STC)**: Memories can be consolidated retroactively
//!   when related important events occur within a temporal window (up to 9 hours in
//!   biological systems, configurable here).
//!
//! - **Context-Dependent Memory**: Encoding Specificity Principle (Tulving & Thomson, 1973).
//!   Memory retrieval is most effective when the retrieval context matches the encoding context.
//!
//! - **Hippocampal Indexing**: Content/temporal barcoding plus typed association links with
//!   spreading activation (Teyler & Rudy, 2007; Collins & Loftus, 1975).
//!
//! - **Predictive Retrieval**: Interest tracking and co-access prediction (Friston, 2010).
//!
//! - **Prospective Memory**: Future intentions separate from retrospective recall
//!   (Einstein & McDaniel, 1990).
//!
//! ## References
//!
//! - Frey, U., & Morris, R. G. (1997). Synaptic tagging and long-term potentiation. Nature.
//! - Redondo, R. L., & Morris, R. G. (2011). Making memories last: the synaptic tagging
//!   and capture hypothesis. Nature Reviews Neuroscience.
//! - Tulving, E., & Thomson, D. M. (1973). Encoding specificity and retrieval processes
//!   in episodic memory. Psychological Review.
//! - Collins, A. M., & Loftus, E. F. (1975). A spreading-activation theory of semantic
//!   processing. Psychological Review.
//! - Teyler, T. J., & Rudy, J. W. (2007). The hippocampal indexing theory and episodic
//!   memory: updating the index. Hippocampus.
//! - Friston, K. (2010). The free-energy principle: a unified brain theory? Nature
//!   Reviews Neuroscience.
//! - Einstein, G. O., & McDaniel, M. A. (1990). Normal aging and prospective memory.
//!   Journal of Experimental Psychology.

pub mod context_memory;
pub mod hippocampal_index;
pub mod memory_states;
pub mod predictive_retrieval;
pub mod prospective_memory;
pub mod synaptic_tagging;

pub use synaptic_tagging::{
    CaptureResult, CaptureWindow, CapturedMemory, DecayFunction, ImportanceCluster, ImportanceEvent,
    ImportanceEventType, SynapticTag, SynapticTaggingSystem, TriggerBoost,
};

pub use context_memory::{
    ActiveFile, GitContext, MemoryContext, WorkingContext, apply_context_boost, boost_and_resort,
    context_similarity,
};

pub use memory_states::{
    CompetitionCandidate, CompetitionEvent, CompetitionManager, CompetitionResult, MemoryLifecycle,
    MemoryState, StateTransition, StateTransitionReason,
};

pub use hippocampal_index::{
    AssociationLinkType, BarcodeGenerator, HippocampalIndex, HippocampalIndexError, IndexLink,
    IndexMatch, IndexQuery, MemoryBarcode,
};

pub use predictive_retrieval::{PredictedMemory, PredictionReason, PredictiveRetriever};

pub use prospective_memory::{
    ContextPattern, Intention, IntentionStatus, IntentionTrigger, Priority, ProspectiveMemory,
    ProspectiveMemoryError, RecurrencePattern, TriggerContext, TriggerPattern, parse_intention,
};
