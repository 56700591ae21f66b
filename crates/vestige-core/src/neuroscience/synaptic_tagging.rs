//! Synaptic Tagging & Capture (spec §4.7)
//!
//! Frey & Morris (1997); Redondo & Morris (2011). A memory laid down weakly
//! can still be durably consolidated if a sufficiently important event (a
//! PRP event) occurs within an asymmetric time window around it. This
//! models retroactive importance: significance discovered *after* encoding
//! still strengthens the right memory.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const PRP_THRESHOLD: f64 = 0.7;
const TAG_ACTIVE_FLOOR: f64 = 0.3;
const CAPTURE_SCORE_THRESHOLD: f64 = 0.3;
const MAX_CLUSTERS: usize = 50;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayFunction {
    Exponential,
    Power,
    Linear,
    Logarithmic,
}

impl DecayFunction {
    /// `t` and `lifetime` in hours, both `>= 0`. `strength(t)` at `t=0` is 1.0.
    pub fn strength_at(&self, t: f64, lifetime: f64) -> f64 {
        if lifetime <= 0.0 {
            return 0.0;
        }
        let s = match self {
            DecayFunction::Exponential => {
                let lambda = -0.01_f64.ln();
                (-lambda * t / lifetime).exp()
            }
            DecayFunction::Power => (1.0 + 10.0 * t / lifetime).powf(-2.0),
            DecayFunction::Linear => 1.0 - t / lifetime,
            DecayFunction::Logarithmic => 1.0 / (1.0 + (1.0 + t * std::f64::consts::E / lifetime).ln()),
        };
        s.clamp(0.0, 1.0)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceEventType {
    UserFlag,
    NoveltySpike,
    EmotionalContent,
    RepeatedAccess,
    CrossReference,
    TemporalProximity,
}

impl ImportanceEventType {
    /// `(base_strength, capture_radius_multiplier)` per spec §4.7 table.
    pub fn base_strength_and_radius(&self) -> (f64, f64) {
        match self {
            ImportanceEventType::UserFlag => (1.00, 1.5),
            ImportanceEventType::NoveltySpike => (0.90, 1.2),
            ImportanceEventType::EmotionalContent => (0.80, 1.3),
            ImportanceEventType::RepeatedAccess => (0.75, 1.0),
            ImportanceEventType::CrossReference => (0.60, 0.8),
            ImportanceEventType::TemporalProximity => (0.50, 0.6),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceEvent {
    pub id: String,
    pub event_type: ImportanceEventType,
    pub strength: f64,
    pub timestamp: DateTime<Utc>,
    pub source_memory: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ImportanceEvent {
    pub fn new(event_type: ImportanceEventType, strength: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            strength: strength.clamp(0.0, 1.0),
            timestamp,
            source_memory: None,
            metadata: None,
        }
    }

    /// An event fires only if `strength >= PRP_THRESHOLD`.
    pub fn fires(&self) -> bool {
        self.strength >= PRP_THRESHOLD
    }
}

/// A synaptic tag laid at encoding time. Only one active (non-captured) tag
/// per memory is allowed - laying a new tag replaces any existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapticTag {
    pub memory_id: String,
    pub laid_at: DateTime<Utc>,
    pub initial_strength: f64,
    pub lifetime_h: f64,
    pub decay_function: DecayFunction,
    pub captured: bool,
}

impl SynapticTag {
    pub fn new(memory_id: impl Into<String>, laid_at: DateTime<Utc>, lifetime_h: f64, decay_function: DecayFunction) -> Self {
        Self {
            memory_id: memory_id.into(),
            laid_at,
            initial_strength: 1.0,
            lifetime_h,
            decay_function,
            captured: false,
        }
    }

    /// Current tag strength; captured tags stop decaying (frozen at the
    /// strength they had at capture time, tracked by the caller).
    pub fn strength_at(&self, now: DateTime<Utc>) -> f64 {
        if self.captured {
            return self.initial_strength;
        }
        let t = (now - self.laid_at).num_seconds() as f64 / 3600.0;
        self.initial_strength * self.decay_function.strength_at(t.max(0.0), self.lifetime_h)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.captured && self.strength_at(now) >= TAG_ACTIVE_FLOOR
    }
}

/// Asymmetric capture window around a PRP event (spec §4.7).
#[derive(Debug, Clone, Copy)]
pub struct CaptureWindow {
    pub backward_h: f64,
    pub forward_h: f64,
}

impl Default for CaptureWindow {
    fn default() -> Self {
        Self { backward_h: 9.0, forward_h: 2.0 }
    }
}

impl CaptureWindow {
    /// Normalized distance in `[0,1]` (0 at the event, 1 at the window
    /// edge), or `None` if the tag lies outside the window. `tag_time` may
    /// be before (backward) or after (forward) `event_time`.
    pub fn normalized_distance(&self, tag_time: DateTime<Utc>, event_time: DateTime<Utc>) -> Option<f64> {
        let delta_h = (tag_time - event_time).num_seconds() as f64 / 3600.0;
        if delta_h < 0.0 {
            let back = -delta_h;
            if back > self.backward_h || self.backward_h <= 0.0 {
                return None;
            }
            Some(back / self.backward_h)
        } else {
            if delta_h > self.forward_h || self.forward_h <= 0.0 {
                if delta_h == 0.0 {
                    return Some(0.0);
                }
                return None;
            }
            Some(delta_h / self.forward_h)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedMemory {
    pub memory_id: String,
    pub event_id: String,
    pub temporal_distance_h: f64,
    pub probability: f64,
    pub strength_at_capture: f64,
    pub consolidated_importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceCluster {
    pub event_id: String,
    pub memory_ids: Vec<String>,
    pub average_importance: f64,
    pub temporal_span_h: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureResult {
    pub captured: Vec<CapturedMemory>,
    pub cluster: Option<ImportanceCluster>,
}

/// Owner-exclusive synaptic tagging system (spec §5): the "one active tag
/// per memory" invariant requires mutex-scoped replace at the caller.
#[derive(Debug, Default)]
pub struct SynapticTaggingSystem {
    tags: HashMap<String, SynapticTag>,
    clusters: Vec<ImportanceCluster>,
}

impl SynapticTaggingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays a tag at encoding time, replacing any existing non-captured tag
    /// for this memory.
    pub fn tag(&mut self, memory_id: impl Into<String>, laid_at: DateTime<Utc>, lifetime_h: f64, decay_function: DecayFunction) {
        let memory_id = memory_id.into();
        self.tags.insert(memory_id.clone(), SynapticTag::new(memory_id, laid_at, lifetime_h, decay_function));
    }

    pub fn tag_for(&self, memory_id: &str) -> Option<&SynapticTag> {
        self.tags.get(memory_id)
    }

    /// Applies a PRP event against every active tag (`tag_strength >= 0.3`),
    /// within `window`. A tag captures if `score = tag_strength*probability*
    /// event.strength >= 0.3`. Emits an `ImportanceCluster` when 2+ tags
    /// capture from the same event.
    pub fn apply_event(&mut self, event: &ImportanceEvent, window: CaptureWindow) -> CaptureResult {
        if !event.fires() {
            return CaptureResult::default();
        }

        let mut captured = Vec::new();
        for tag in self.tags.values_mut() {
            if tag.captured {
                continue;
            }
            let tag_strength = tag.strength_at(event.timestamp);
            if tag_strength < TAG_ACTIVE_FLOOR {
                continue;
            }
            let Some(distance) = window.normalized_distance(tag.laid_at, event.timestamp) else {
                continue;
            };
            let probability = event.event_type.decay_probability(distance);
            let score = tag_strength * probability * event.strength;
            if score >= CAPTURE_SCORE_THRESHOLD {
                let consolidated_importance = (0.6 * score + 0.4 * event.strength).min(1.0);
                tag.captured = true;
                tag.initial_strength = tag_strength;
                let temporal_distance_h = (event.timestamp - tag.laid_at).num_seconds() as f64 / 3600.0;
                captured.push(CapturedMemory {
                    memory_id: tag.memory_id.clone(),
                    event_id: event.id.clone(),
                    temporal_distance_h,
                    probability,
                    strength_at_capture: tag_strength,
                    consolidated_importance,
                });
            }
        }

        let cluster = if captured.len() >= 2 {
            let average_importance = captured.iter().map(|c| c.consolidated_importance).sum::<f64>() / captured.len() as f64;
            let min_d = captured.iter().map(|c| c.temporal_distance_h).fold(f64::INFINITY, f64::min);
            let max_d = captured.iter().map(|c| c.temporal_distance_h).fold(f64::NEG_INFINITY, f64::max);
            let cluster = ImportanceCluster {
                event_id: event.id.clone(),
                memory_ids: captured.iter().map(|c| c.memory_id.clone()).collect(),
                average_importance,
                temporal_span_h: (max_d - min_d).abs(),
            };
            self.clusters.push(cluster.clone());
            while self.clusters.len() > MAX_CLUSTERS {
                self.clusters.remove(0);
            }
            Some(cluster)
        } else {
            None
        };

        CaptureResult { captured, cluster }
    }

    pub fn clusters(&self) -> &[ImportanceCluster] {
        &self.clusters
    }
}

impl ImportanceEventType {
    fn decay_probability(&self, normalized_distance: f64) -> f64 {
        // radius multiplier widens the effective window before the
        // per-event decay function is applied, per the §4.7 table.
        let (_, radius) = self.base_strength_and_radius();
        let scaled = (normalized_distance / radius).clamp(0.0, 1.0);
        DecayFunction::Linear.strength_at(scaled, 1.0)
    }
}

/// Tool-level `trigger_importance` strength boosts (spec §4.7), applied
/// directly to node fields when invoked from the tool surface.
#[derive(Debug, Clone, Copy)]
pub struct TriggerBoost {
    pub retention_delta: f64,
    pub stability_multiplier: f64,
}

pub fn trigger_boost_for(event_type: &str) -> Option<TriggerBoost> {
    let (delta, k) = match event_type {
        "breakthrough" => (0.30, 2.0),
        "deadline_met" => (0.20, 1.5),
        "user_feedback" => (0.25, 1.8),
        "repeated_access" => (0.15, 1.3),
        "explicit_mark" => (0.35, 2.5),
        "emotional" => (0.20, 1.6),
        "novel_connection" => (0.25, 1.7),
        _ => return None,
    };
    Some(TriggerBoost { retention_delta: delta, stability_multiplier: k })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_decay_near_zero_at_lifetime_end() {
        let f = DecayFunction::Exponential;
        assert!((f.strength_at(0.0, 12.0) - 1.0).abs() < 1e-9);
        assert!(f.strength_at(12.0, 12.0) <= 0.011);
    }

    #[test]
    fn event_below_prp_threshold_does_not_fire() {
        let event = ImportanceEvent::new(ImportanceEventType::CrossReference, 0.5, Utc::now());
        assert!(!event.fires());
    }

    #[test]
    fn capture_window_scenario_s4() {
        let t0 = Utc::now();
        let mut system = SynapticTaggingSystem::new();
        system.tag("m", t0, 12.0, DecayFunction::Exponential);

        let event_in = ImportanceEvent::new(ImportanceEventType::NoveltySpike, 0.9, t0 + Duration::hours(3));
        let result = system.apply_event(&event_in, CaptureWindow::default());
        assert_eq!(result.captured.len(), 1);
        assert!(result.captured[0].consolidated_importance > 0.0);
        assert!(system.tag_for("m").unwrap().captured);
    }

    #[test]
    fn capture_window_rejects_event_outside_window() {
        let t0 = Utc::now();
        let mut system = SynapticTaggingSystem::new();
        system.tag("m", t0, 12.0, DecayFunction::Exponential);

        let event_out = ImportanceEvent::new(ImportanceEventType::NoveltySpike, 0.9, t0 + Duration::hours(10));
        let result = system.apply_event(&event_out, CaptureWindow::default());
        assert!(result.captured.is_empty());
    }

    #[test]
    fn two_captures_emit_cluster() {
        let t0 = Utc::now();
        let mut system = SynapticTaggingSystem::new();
        system.tag("a", t0, 12.0, DecayFunction::Exponential);
        system.tag("b", t0, 12.0, DecayFunction::Exponential);

        let event = ImportanceEvent::new(ImportanceEventType::UserFlag, 1.0, t0 + Duration::hours(1));
        let result = system.apply_event(&event, CaptureWindow::default());
        assert_eq!(result.captured.len(), 2);
        assert!(result.cluster.is_some());
    }

    #[test]
    fn trigger_boost_table_matches_spec() {
        let b = trigger_boost_for("breakthrough").unwrap();
        assert_eq!(b.retention_delta, 0.30);
        assert_eq!(b.stability_multiplier, 2.0);
        assert!(trigger_boost_for("unknown").is_none());
    }
}
