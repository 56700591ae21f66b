//! Decay & Consolidation (spec §4.3)
//!
//! Periodic sweep: time-decay of retention strength with a sentiment-aware
//! grace period, prune/promote thresholds, and an embeddings-missing count.

use std::time::Instant;

use chrono::Utc;

use crate::config::VestigeConfig;
use crate::memory::{ConsolidationResult, NodePatch};
use crate::storage::{Result, Storage};

/// `consolidate` options (spec §4.3); defaults mirror `VestigeConfig`.
#[derive(Debug, Clone)]
pub struct ConsolidationOptions {
    pub apply_decay: bool,
    pub prune_threshold: f64,
    pub promote_threshold: f64,
    pub max_process: i64,
}

impl ConsolidationOptions {
    pub fn from_config(config: &VestigeConfig) -> Self {
        Self {
            apply_decay: true,
            prune_threshold: config.prune_threshold,
            promote_threshold: config.promote_threshold,
            max_process: 1000,
        }
    }
}

const GRACE_HOURS: f64 = 24.0;

/// One multiplicative decay step for a node that has gone stale past the
/// grace period (§4.3 step 2).
pub fn decay_multiplier(stability_factor: f64, hours_since_access: f64, sentiment_intensity: f64) -> f64 {
    let days = hours_since_access / 24.0;
    let stability_factor_prime = 1.0 + (stability_factor - 1.0) * 0.1;
    let effective_daily_rate = 0.95_f64.powf(1.0 / stability_factor_prime);
    let raw_factor = effective_daily_rate.powf(days);
    let sentiment_protection = 1.0 - 0.3 * sentiment_intensity;
    raw_factor * sentiment_protection + (1.0 - sentiment_protection)
}

/// Runs the consolidation sweep over the store, mutating nodes in place.
pub fn consolidate(storage: &Storage, opts: &ConsolidationOptions) -> Result<ConsolidationResult> {
    let start = Instant::now();
    let now = Utc::now();
    let nodes = storage.nodes_by_last_accessed_asc(opts.max_process)?;

    let mut processed = 0i64;
    let mut promoted = 0i64;
    let mut pruned = 0i64;
    let mut decay_applied = 0i64;

    for node in &nodes {
        processed += 1;
        let hours_since_access = (now - node.last_accessed_at).num_seconds() as f64 / 3600.0;

        let mut retention = node.retention_strength;
        let mut stability_factor = node.stability_factor;

        if opts.apply_decay && hours_since_access > GRACE_HOURS {
            let multiplier =
                decay_multiplier(stability_factor, hours_since_access, node.sentiment_intensity);
            retention = (retention * multiplier).max(0.0);
            decay_applied += 1;
        }

        if retention < opts.prune_threshold && node.access_count < 3 {
            retention = 0.0;
            pruned += 1;
        } else if retention >= opts.promote_threshold && node.access_count >= 5 {
            stability_factor = (stability_factor * 1.1).min(365.0);
            promoted += 1;
        }

        if retention != node.retention_strength || stability_factor != node.stability_factor {
            storage.update_node_fields(
                &node.id,
                NodePatch {
                    retention_strength: Some(retention),
                    stability_factor: Some(stability_factor),
                    ..Default::default()
                },
            )?;
        }
    }

    let embeddings_missing = storage.count_nodes_without_embedding()?;

    Ok(ConsolidationResult {
        processed,
        promoted,
        pruned,
        decay_applied,
        embeddings_missing,
        duration_ms: start.elapsed().as_millis() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::IngestInput;

    #[test]
    fn decay_multiplier_is_monotone_in_time() {
        let m1 = decay_multiplier(1.0, 48.0, 0.0);
        let m2 = decay_multiplier(1.0, 96.0, 0.0);
        assert!(m2 < m1);
    }

    #[test]
    fn sentiment_protects_against_decay() {
        let unprotected = decay_multiplier(1.0, 72.0, 0.0);
        let protected = decay_multiplier(1.0, 72.0, 1.0);
        assert!(protected > unprotected);
    }

    #[test]
    fn low_access_count_low_retention_gets_pruned() {
        let storage = Storage::in_memory().unwrap();
        let node = storage
            .insert_node(IngestInput { content: "fact".into(), ..Default::default() })
            .unwrap();
        storage
            .update_node_fields(
                &node.id,
                NodePatch { retention_strength: Some(0.01), ..Default::default() },
            )
            .unwrap();
        let opts = ConsolidationOptions::from_config(&VestigeConfig::default());
        let result = consolidate(&storage, &opts).unwrap();
        assert_eq!(result.pruned, 1);
        let fetched = storage.get_node(&node.id).unwrap().unwrap();
        assert_eq!(fetched.retention_strength, 0.0);
        assert_eq!(fetched.content, "fact", "prune never deletes content");
    }

    #[test]
    fn consolidate_reports_embeddings_missing() {
        let storage = Storage::in_memory().unwrap();
        storage
            .insert_node(IngestInput { content: "a".into(), ..Default::default() })
            .unwrap();
        let opts = ConsolidationOptions::from_config(&VestigeConfig::default());
        let result = consolidate(&storage, &opts).unwrap();
        assert_eq!(result.processed, 1);
        assert_eq!(result.embeddings_missing, 1);
    }
}
