//! Memory State Machine (spec §4.6)
//!
//! Memories exist on a continuum of accessibility rather than simply
//! "remembered" or "forgotten": Active, Dormant, Silent, Unavailable.
//! Implements time-based decay, cue-triggered reactivation, competition
//! between similar memories (retrieval-induced forgetting), and an
//! accessibility score blending state, recency, and access frequency.
//!
//! - Bjork, R. A., & Bjork, E. L. (1992). A new theory of disuse.
//! - Anderson, M. C., Bjork, R. A., & Bjork, E. L. (1994). Remembering can
//!   cause forgetting.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const ACCESSIBILITY_ACTIVE: f64 = 1.0;
pub const ACCESSIBILITY_DORMANT: f64 = 0.7;
pub const ACCESSIBILITY_SILENT: f64 = 0.3;
pub const ACCESSIBILITY_UNAVAILABLE: f64 = 0.05;

pub const DEFAULT_ACTIVE_DECAY_HOURS: i64 = 4;
pub const DEFAULT_DORMANT_DECAY_DAYS: i64 = 30;
pub const COMPETITION_SIMILARITY_THRESHOLD: f64 = 0.6;
const CUE_REACTIVATION_THRESHOLD: f64 = 0.8;
const MAX_COMPETITION_HISTORY: usize = 100;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryState {
    Active,
    Dormant,
    Silent,
    Unavailable,
}

impl MemoryState {
    pub fn accessibility_multiplier(&self) -> f64 {
        match self {
            MemoryState::Active => ACCESSIBILITY_ACTIVE,
            MemoryState::Dormant => ACCESSIBILITY_DORMANT,
            MemoryState::Silent => ACCESSIBILITY_SILENT,
            MemoryState::Unavailable => ACCESSIBILITY_UNAVAILABLE,
        }
    }

    /// State from `retention_strength`, for catalogue queries (spec §4.6,
    /// §8 property 9: piecewise constant at thresholds 0.1, 0.4, 0.7).
    pub fn from_retention(retention_strength: f64) -> Self {
        if retention_strength >= 0.7 {
            MemoryState::Active
        } else if retention_strength >= 0.4 {
            MemoryState::Dormant
        } else if retention_strength >= 0.1 {
            MemoryState::Silent
        } else {
            MemoryState::Unavailable
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTransitionReason {
    TimeDecay,
    Access,
    CueReactivation,
    CompetitionLoss,
    CompetitionWin,
    SuppressionExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub node_id: String,
    pub from: MemoryState,
    pub to: MemoryState,
    pub reason: StateTransitionReason,
    pub timestamp: DateTime<Utc>,
}

/// Per-node lifecycle tracked by `StateUpdateService`.
#[derive(Debug, Clone)]
pub struct MemoryLifecycle {
    pub node_id: String,
    pub state: MemoryState,
    pub last_access: DateTime<Utc>,
    pub access_count: i64,
    pub suppression_until: Option<DateTime<Utc>>,
}

impl MemoryLifecycle {
    pub fn new(node_id: impl Into<String>, state: MemoryState, last_access: DateTime<Utc>, access_count: i64) -> Self {
        Self {
            node_id: node_id.into(),
            state,
            last_access,
            access_count,
            suppression_until: None,
        }
    }

    /// Time-based decay, independent of the retention-derived state: Active
    /// -> Dormant after 4h of inactivity; Dormant -> Silent after 30 days.
    /// Silent/Unavailable do not further decay by time; Unavailable decays
    /// only via `expire_suppression`.
    pub fn apply_time_decay(&mut self, now: DateTime<Utc>) -> Option<StateTransition> {
        let since = now - self.last_access;
        let (next, threshold_hit) = match self.state {
            MemoryState::Active if since >= Duration::hours(DEFAULT_ACTIVE_DECAY_HOURS) => (MemoryState::Dormant, true),
            MemoryState::Dormant if since >= Duration::days(DEFAULT_DORMANT_DECAY_DAYS) => (MemoryState::Silent, true),
            _ => (self.state, false),
        };
        if threshold_hit {
            let from = self.state;
            self.state = next;
            Some(StateTransition { node_id: self.node_id.clone(), from, to: next, reason: StateTransitionReason::TimeDecay, timestamp: now })
        } else {
            None
        }
    }

    /// Expires suppression once `suppression_until` has passed, moving the
    /// node to Silent (reason `SuppressionExpired`).
    pub fn expire_suppression(&mut self, now: DateTime<Utc>) -> Option<StateTransition> {
        if self.state == MemoryState::Unavailable {
            if let Some(until) = self.suppression_until {
                if now >= until {
                    self.suppression_until = None;
                    self.state = MemoryState::Silent;
                    return Some(StateTransition {
                        node_id: self.node_id.clone(),
                        from: MemoryState::Unavailable,
                        to: MemoryState::Silent,
                        reason: StateTransitionReason::SuppressionExpired,
                        timestamp: now,
                    });
                }
            }
        }
        None
    }

    /// Any access transitions the node to Active and clears suppression.
    pub fn record_access(&mut self, now: DateTime<Utc>) -> StateTransition {
        let from = self.state;
        self.state = MemoryState::Active;
        self.suppression_until = None;
        self.last_access = now;
        self.access_count += 1;
        StateTransition { node_id: self.node_id.clone(), from, to: MemoryState::Active, reason: StateTransitionReason::Access, timestamp: now }
    }

    /// A Silent memory can advance to Dormant when a cue of strength >= 0.8
    /// is presented.
    pub fn apply_cue(&mut self, cue_strength: f64, now: DateTime<Utc>) -> Option<StateTransition> {
        if self.state == MemoryState::Silent && cue_strength >= CUE_REACTIVATION_THRESHOLD {
            let from = self.state;
            self.state = MemoryState::Dormant;
            return Some(StateTransition { node_id: self.node_id.clone(), from, to: MemoryState::Dormant, reason: StateTransitionReason::CueReactivation, timestamp: now });
        }
        None
    }

    /// Transitions to Unavailable with `suppression_until = now + hours`.
    pub fn suppress(&mut self, hours: i64, now: DateTime<Utc>) -> StateTransition {
        let from = self.state;
        self.state = MemoryState::Unavailable;
        self.suppression_until = Some(now + Duration::hours(hours));
        StateTransition { node_id: self.node_id.clone(), from, to: MemoryState::Unavailable, reason: StateTransitionReason::CompetitionLoss, timestamp: now }
    }

    /// `acc = state_mult * (0.6 + 0.3*exp(-hours_since/24) + 0.1*min(0.3, log10(access_count+1)*0.1))`.
    pub fn accessibility_score(&self, now: DateTime<Utc>) -> f64 {
        let hours_since = (now - self.last_access).num_seconds() as f64 / 3600.0;
        let recency = 0.3 * (-hours_since.max(0.0) / 24.0).exp();
        let frequency = 0.1 * (((self.access_count as f64 + 1.0).log10() * 0.1).min(0.3));
        (self.state.accessibility_multiplier() * (0.6 + recency + frequency)).clamp(0.0, 1.0)
    }
}

// ============================================================================
// COMPETITION (Retrieval-Induced Forgetting)
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompetitionCandidate {
    pub node_id: String,
    pub similarity: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionEvent {
    pub winner: String,
    pub losers: Vec<String>,
    pub max_similarity: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionResult {
    pub winner: String,
    pub losers: Vec<String>,
}

/// Tracks competition history and runs the competition rule (spec §4.6).
#[derive(Debug, Default)]
pub struct CompetitionManager {
    history: VecDeque<CompetitionEvent>,
}

impl CompetitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters candidates to `similarity >= 0.6`, scores each by
    /// `similarity*strength`; the highest wins. `target` identifies which
    /// memory triggered the competition but does not exempt it from losing:
    /// a target competing against stronger neighbors is suppressed along
    /// with every other loser (spec §8 scenario S5). Returns `None` if no
    /// candidate qualifies.
    pub fn compete(&mut self, _target: &str, candidates: &[CompetitionCandidate], now: DateTime<Utc>) -> Option<CompetitionResult> {
        let eligible: Vec<&CompetitionCandidate> =
            candidates.iter().filter(|c| c.similarity >= COMPETITION_SIMILARITY_THRESHOLD).collect();
        if eligible.is_empty() {
            return None;
        }

        let winner = eligible
            .iter()
            .max_by(|a, b| (a.similarity * a.strength).partial_cmp(&(b.similarity * b.strength)).unwrap_or(std::cmp::Ordering::Equal))?;
        let max_similarity = eligible.iter().map(|c| c.similarity).fold(0.0_f64, f64::max);
        let losers: Vec<String> = eligible.iter().filter(|c| c.node_id != winner.node_id).map(|c| c.node_id.clone()).collect();

        self.history.push_back(CompetitionEvent {
            winner: winner.node_id.clone(),
            losers: losers.clone(),
            max_similarity,
            timestamp: now,
        });
        while self.history.len() > MAX_COMPETITION_HISTORY {
            self.history.pop_front();
        }

        Some(CompetitionResult { winner: winner.node_id.clone(), losers })
    }

    /// Losers for a given node within the last `hours`.
    pub fn recently_lost(&self, node_id: &str, hours: i64, now: DateTime<Utc>) -> bool {
        let cutoff = now - Duration::hours(hours);
        self.history.iter().any(|e| e.timestamp >= cutoff && e.losers.iter().any(|l| l == node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_from_retention_is_piecewise_constant() {
        assert_eq!(MemoryState::from_retention(0.9), MemoryState::Active);
        assert_eq!(MemoryState::from_retention(0.7), MemoryState::Active);
        assert_eq!(MemoryState::from_retention(0.69), MemoryState::Dormant);
        assert_eq!(MemoryState::from_retention(0.4), MemoryState::Dormant);
        assert_eq!(MemoryState::from_retention(0.39), MemoryState::Silent);
        assert_eq!(MemoryState::from_retention(0.1), MemoryState::Silent);
        assert_eq!(MemoryState::from_retention(0.09), MemoryState::Unavailable);
    }

    #[test]
    fn accessibility_multipliers_match_table() {
        assert_eq!(MemoryState::Active.accessibility_multiplier(), 1.0);
        assert_eq!(MemoryState::Dormant.accessibility_multiplier(), 0.7);
        assert_eq!(MemoryState::Silent.accessibility_multiplier(), 0.3);
        assert_eq!(MemoryState::Unavailable.accessibility_multiplier(), 0.05);
    }

    #[test]
    fn active_decays_to_dormant_after_4h() {
        let now = Utc::now();
        let mut lifecycle = MemoryLifecycle::new("a", MemoryState::Active, now - Duration::hours(5), 1);
        let transition = lifecycle.apply_time_decay(now).unwrap();
        assert_eq!(transition.to, MemoryState::Dormant);
    }

    #[test]
    fn access_reactivates_and_clears_suppression() {
        let now = Utc::now();
        let mut lifecycle = MemoryLifecycle::new("a", MemoryState::Unavailable, now - Duration::hours(1), 0);
        lifecycle.suppression_until = Some(now + Duration::hours(1));
        let transition = lifecycle.record_access(now);
        assert_eq!(transition.to, MemoryState::Active);
        assert!(lifecycle.suppression_until.is_none());
    }

    #[test]
    fn strong_cue_reactivates_silent_to_dormant() {
        let now = Utc::now();
        let mut lifecycle = MemoryLifecycle::new("a", MemoryState::Silent, now, 0);
        assert!(lifecycle.apply_cue(0.79, now).is_none());
        let transition = lifecycle.apply_cue(0.8, now).unwrap();
        assert_eq!(transition.to, MemoryState::Dormant);
    }

    #[test]
    fn competition_matches_spec_scenario_s5() {
        let now = Utc::now();
        let mut mgr = CompetitionManager::new();
        let candidates = vec![
            CompetitionCandidate { node_id: "a".into(), similarity: 0.95, strength: 0.9 },
            CompetitionCandidate { node_id: "b".into(), similarity: 0.92, strength: 0.5 },
            CompetitionCandidate { node_id: "c".into(), similarity: 0.91, strength: 0.9 },
        ];
        let result = mgr.compete("c", &candidates, now).unwrap();
        assert_eq!(result.winner, "a");
        assert!(result.losers.contains(&"b".to_string()));
        assert!(result.losers.contains(&"c".to_string()), "a losing target is suppressed along with other losers");
        assert!(!result.losers.contains(&"a".to_string()));
    }

    #[test]
    fn suppression_expires_to_silent() {
        let now = Utc::now();
        let mut lifecycle = MemoryLifecycle::new("a", MemoryState::Unavailable, now, 0);
        lifecycle.suppression_until = Some(now - Duration::seconds(1));
        let transition = lifecycle.expire_suppression(now).unwrap();
        assert_eq!(transition.to, MemoryState::Silent);
        assert_eq!(transition.reason, StateTransitionReason::SuppressionExpired);
    }

    #[test]
    fn accessibility_score_is_clamped() {
        let now = Utc::now();
        let lifecycle = MemoryLifecycle::new("a", MemoryState::Active, now, 1000);
        let score = lifecycle.accessibility_score(now);
        assert!(score <= 1.0 && score > 0.0);
    }
}
