//! FSRS-6 scheduler (spec §4.2)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    fuzz_interval, initial_difficulty_with_weights, initial_stability_with_weights,
    next_difficulty_with_weights, next_forget_stability_with_weights,
    next_interval_with_decay, next_recall_stability_with_weights, retrievability_with_decay,
    DECAY, DEFAULT_RETENTION, FSRS6_WEIGHTS,
};
use crate::memory::SchedulingState;

/// A review grade (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Backward-compatible alias used alongside `SchedulingState`.
pub type LearningState = SchedulingState;

/// The 21 tunable FSRS-6 parameters plus desired retention and decay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FSRSParameters {
    pub weights: [f64; 21],
    pub desired_retention: f64,
    pub decay: f64,
}

impl Default for FSRSParameters {
    fn default() -> Self {
        Self {
            weights: FSRS6_WEIGHTS,
            desired_retention: DEFAULT_RETENTION,
            decay: DECAY,
        }
    }
}

/// Minimal state a scheduler needs to produce the next review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FSRSState {
    pub stability: f64,
    pub difficulty: f64,
    pub state: SchedulingState,
    pub last_review: Option<DateTime<Utc>>,
}

/// Outcome of `FSRSScheduler::review`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub state: SchedulingState,
    pub stability: f64,
    pub difficulty: f64,
    pub last_review: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    pub interval_days: f64,
    pub is_lapse: bool,
    pub is_graduation: bool,
}

/// All four grades' `{interval, next_review}` without mutating state (§4.2 preview).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResults {
    pub again: ReviewResult,
    pub hard: ReviewResult,
    pub good: ReviewResult,
    pub easy: ReviewResult,
}

/// Stateless FSRS-6 scheduler. Holds only parameters; card state is passed in
/// and returned explicitly so callers (the Store) own persistence.
#[derive(Debug, Clone)]
pub struct FSRSScheduler {
    params: FSRSParameters,
}

impl Default for FSRSScheduler {
    fn default() -> Self {
        Self::new(FSRSParameters::default())
    }
}

impl FSRSScheduler {
    pub fn new(params: FSRSParameters) -> Self {
        Self { params }
    }

    /// The state a brand-new card starts in after its very first review.
    pub fn first_review(&self, grade: Rating, now: DateTime<Utc>) -> ReviewResult {
        let w = &self.params.weights;
        let stability = initial_stability_with_weights(grade.as_i32(), w);
        let difficulty = initial_difficulty_with_weights(grade.as_i32(), w);
        let is_lapse = matches!(grade, Rating::Again);
        let state = if is_lapse {
            SchedulingState::Learning
        } else {
            SchedulingState::Review
        };
        let interval = next_interval_with_decay(stability, self.params.desired_retention, self.params.decay);
        ReviewResult {
            state,
            stability,
            difficulty,
            last_review: now,
            next_review: now + chrono::Duration::seconds((interval * 86_400.0) as i64),
            interval_days: interval,
            is_lapse,
            is_graduation: !is_lapse,
        }
    }

    /// Review a card already in the `Review`/`Relearning`/`Learning` state.
    pub fn review(&self, card: &FSRSState, grade: Rating, now: DateTime<Utc>) -> ReviewResult {
        if card.state == SchedulingState::New || card.last_review.is_none() {
            return self.first_review(grade, now);
        }
        let w = &self.params.weights;
        let last_review = card.last_review.unwrap();
        let elapsed_days = (now - last_review).num_seconds() as f64 / 86_400.0;
        let r = retrievability_with_decay(elapsed_days.max(0.0), card.stability, self.params.decay);

        let is_lapse = matches!(grade, Rating::Again);
        let (next_stability, next_state, is_graduation) = if is_lapse {
            let s = next_forget_stability_with_weights(card.difficulty, card.stability, r, w);
            (s, SchedulingState::Relearning, false)
        } else {
            let s = next_recall_stability_with_weights(card.difficulty, card.stability, r, grade.as_i32(), w);
            let was_not_review = card.state != SchedulingState::Review;
            (s, SchedulingState::Review, was_not_review)
        };

        let next_difficulty = next_difficulty_with_weights(card.difficulty, grade.as_i32(), w);
        let interval = next_interval_with_decay(next_stability, self.params.desired_retention, self.params.decay);

        ReviewResult {
            state: next_state,
            stability: next_stability,
            difficulty: next_difficulty,
            last_review: now,
            next_review: now + chrono::Duration::seconds((interval * 86_400.0) as i64),
            interval_days: interval,
            is_lapse,
            is_graduation,
        }
    }

    /// Preview all four grades without mutating the card (§4.2).
    pub fn preview(&self, card: &FSRSState, now: DateTime<Utc>) -> PreviewResults {
        PreviewResults {
            again: self.review(card, Rating::Again, now),
            hard: self.review(card, Rating::Hard, now),
            good: self.review(card, Rating::Good, now),
            easy: self.review(card, Rating::Easy, now),
        }
    }

    /// Interval with optional +/-5% fuzz applied using a caller-supplied seed
    /// in `[0,1)` (keeps this function suspension-free per §5).
    pub fn fuzzed_interval(&self, stability: f64, unit_seed: f64) -> f64 {
        let base = next_interval_with_decay(stability, self.params.desired_retention, self.params.decay);
        fuzz_interval(base, unit_seed)
    }
}
