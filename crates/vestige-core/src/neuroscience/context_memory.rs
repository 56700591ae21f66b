//! Context Memory (spec §4.9)
//!
//! Tulving & Thomson's (1973) Encoding Specificity Principle: recall is
//! strongest when the retrieval context matches the encoding context. This
//! module captures a `WorkingContext` snapshot alongside each memory and
//! computes a similarity boost applied to search results at retrieval time.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitContext {
    pub branch: Option<String>,
    pub head: Option<String>,
    #[serde(default)]
    pub dirty_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFile {
    pub path: String,
    pub language: Option<String>,
    pub directory: String,
    pub module: Option<String>,
    #[serde(default)]
    pub related_files: Vec<String>,
    pub is_test: bool,
}

/// Snapshot of the environment a memory was encoded in (spec §4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingContext {
    pub project_type: Option<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    pub project_name: Option<String>,
    pub project_root: Option<String>,
    pub git: Option<GitContext>,
    pub active_file: Option<ActiveFile>,
    #[serde(default)]
    pub recent_files: Vec<String>,
    #[serde(default)]
    pub config_files: Vec<String>,
    pub captured_at: DateTime<Utc>,
}

/// Stored alongside a memory id, per spec §4.9.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContext {
    pub memory_id: String,
    pub context: WorkingContext,
    pub encoding_keywords: Vec<String>,
    pub topics: Vec<String>,
}

fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let b: HashSet<&str> = b.iter().map(|s| s.as_str()).collect();
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

fn file_proximity(a: &ActiveFile, b: &ActiveFile) -> f64 {
    if a.directory == b.directory {
        1.0
    } else if a.module.is_some() && a.module == b.module {
        0.7
    } else if a.related_files.iter().any(|f| f == &b.path) || b.related_files.iter().any(|f| f == &a.path) {
        0.5
    } else if a.language.is_some() && a.language == b.language {
        0.2
    } else {
        0.0
    }
}

/// Weighted sum over project/framework/git/file/temporal similarity (spec
/// §4.9). Weights: project_match 0.25, framework Jaccard 0.20, git branch
/// 0.15, file proximity 0.25, temporal proximity 0.15 (`0.5^(hours/24)`).
pub fn context_similarity(encoded: &WorkingContext, current: &WorkingContext, now: DateTime<Utc>) -> f64 {
    let project_match = match (&encoded.project_name, &current.project_name) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    };

    let framework = jaccard(&encoded.frameworks, &current.frameworks);

    let git_branch = match (&encoded.git, &current.git) {
        (Some(a), Some(b)) => match (&a.branch, &b.branch) {
            (Some(x), Some(y)) if x == y => 1.0,
            _ => 0.0,
        },
        _ => 0.0,
    };

    let file_prox = match (&encoded.active_file, &current.active_file) {
        (Some(a), Some(b)) => file_proximity(a, b),
        _ => 0.0,
    };

    let hours = (now - encoded.captured_at).num_seconds() as f64 / 3600.0;
    let temporal = 0.5_f64.powf(hours.max(0.0) / 24.0);

    0.25 * project_match + 0.20 * framework + 0.15 * git_branch + 0.25 * file_prox + 0.15 * temporal
}

/// Applies the retrieval boost: `score' = score * (1 + 0.3*similarity)`.
pub fn apply_context_boost(score: f64, similarity: f64) -> f64 {
    score * (1.0 + 0.3 * similarity)
}

/// Re-sorts `(id, score)` pairs descending after boosting.
pub fn boost_and_resort(mut scored: Vec<(String, f64)>, similarity_of: impl Fn(&str) -> f64) -> Vec<(String, f64)> {
    for (id, score) in scored.iter_mut() {
        *score = apply_context_boost(*score, similarity_of(id));
    }
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}
