//! Configuration surface (spec §6.5)
//!
//! Every field here is independently overridable; `VestigeConfig::default()`
//! reproduces the constants named throughout `spec.md` so callers only need
//! to override what they actually want to change.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolves a platform-appropriate database path for a given file name,
/// following the same `directories`-based convention the teacher's
/// `Storage::new(path: Option<PathBuf>)` uses.
pub fn default_db_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "vestige", "core") {
        return proj_dirs.data_dir().join("vestige.db");
    }
    PathBuf::from("vestige.db")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestigeConfig {
    /// Path to the local SQLite database, or a `remote://` URL for the
    /// adapter variant (§6.4). Local storage only is implemented here.
    pub db_path: PathBuf,
    /// Bearer token for the remote adapter variant, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Identifier of the embedding model in use, stored alongside vectors.
    pub embedding_model: String,
    /// Dense embedding dimension (§6.3).
    pub embedding_dim: usize,
    /// Compressed hippocampal index dimension (§3.1, §4.5).
    pub compressed_dim: usize,
    /// RRF fusion constant `k` (§4.4).
    pub rrf_k: f64,
    /// Keyword-list weight in RRF fusion.
    pub keyword_weight: f64,
    /// Vector-list weight in RRF fusion.
    pub vector_weight: f64,
    /// Half-life, in days, for the context-mode temporal term (§4.4).
    pub temporal_half_life_days: f64,
    /// Grace period, in hours, before decay is applied to a node (§4.3).
    pub decay_grace_hours: i64,
    /// Retention floor below which nodes are pruned (§4.3).
    pub prune_threshold: f64,
    /// Retention ceiling above which nodes are promoted (§4.3).
    pub promote_threshold: f64,
    /// Backward half of the synaptic-tagging capture window, in hours (§4.7).
    pub stc_backward_h: f64,
    /// Forward half of the synaptic-tagging capture window, in hours (§4.7).
    pub stc_forward_h: f64,
    /// Default synaptic-tag lifetime, in hours (§4.7).
    pub tag_lifetime_h: f64,
    /// Minimum PRP event strength that can trigger capture (§4.7).
    pub prp_threshold: f64,
    /// Suppression duration, in hours, after losing memory-state competition (§4.6).
    pub suppression_h: i64,
    /// Predictive-retrieval session idle timeout, in milliseconds (§4.10).
    pub session_timeout_ms: i64,
    /// Enables verbose tracing output.
    pub debug: bool,
}

impl Default for VestigeConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            auth_token: None,
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: 768,
            compressed_dim: 128,
            rrf_k: 60.0,
            keyword_weight: 0.5,
            vector_weight: 0.5,
            temporal_half_life_days: 14.0,
            decay_grace_hours: 24,
            prune_threshold: 0.05,
            promote_threshold: 0.8,
            stc_backward_h: 9.0,
            stc_forward_h: 2.0,
            tag_lifetime_h: 12.0,
            prp_threshold: 0.7,
            suppression_h: 24,
            session_timeout_ms: 1_800_000,
            debug: false,
        }
    }
}
