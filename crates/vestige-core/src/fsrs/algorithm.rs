//! FSRS-6 core formulas (spec §4.2)
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki

/// Desired-retrievability decay exponent.
pub const DECAY: f64 = -0.5;

/// Derived so that `R = 0.9` when `t = S`: `FACTOR = 0.9^(1/DECAY) - 1`.
pub const FACTOR: f64 = 19.0 / 81.0;

pub const MIN_STABILITY: f64 = 0.001;
pub const MAX_STABILITY: f64 = 36500.0;
pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

pub const DEFAULT_RETENTION: f64 = 0.9;

/// The 21 FSRS-6 weights. Values are the published open-spaced-repetition
/// defaults; personalized optimization is out of scope (`FSRSOptimizer`
/// trains on review logs - not part of this crate).
pub const FSRS6_WEIGHTS: [f64; 21] = [
    0.2172, 1.1771, 3.2602, 16.1507, 7.0114, 0.57, 2.0966, 0.0069, 1.5261, 0.112, 1.0178, 1.849,
    0.1133, 0.3127, 2.2934, 0.2191, 3.0004, 0.7536, 0.3332, 0.1437, 0.2,
];

/// Retrievability `R(t, S)` (spec §4.2).
pub fn retrievability(t_days: f64, stability: f64) -> f64 {
    retrievability_with_decay(t_days, stability, DECAY)
}

pub fn retrievability_with_decay(t_days: f64, stability: f64, decay: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let t = t_days.max(0.0);
    (1.0 + FACTOR * t / stability).powf(decay)
}

/// Interval (days) for a desired retention `dr` given stability `s` (spec §4.2).
pub fn next_interval(stability: f64, desired_retention: f64) -> f64 {
    next_interval_with_decay(stability, desired_retention, DECAY)
}

pub fn next_interval_with_decay(stability: f64, desired_retention: f64, decay: f64) -> f64 {
    let dr = desired_retention.clamp(0.01, 0.99);
    let interval = (stability / FACTOR) * (dr.powf(1.0 / decay) - 1.0);
    interval.max(1.0)
}

/// Apply up to +/-5% fuzz to an interval, deterministic on the seed passed
/// by the caller (no internal RNG - keeps math paths suspension-free per §5).
pub fn fuzz_interval(interval_days: f64, unit_seed: f64) -> f64 {
    let fuzz = (unit_seed.clamp(0.0, 1.0) - 0.5) * 0.1;
    (interval_days * (1.0 + fuzz)).max(1.0)
}

pub fn initial_stability(grade: i32) -> f64 {
    initial_stability_with_weights(grade, &FSRS6_WEIGHTS)
}

pub fn initial_stability_with_weights(grade: i32, w: &[f64; 21]) -> f64 {
    let idx = ((grade - 1).clamp(0, 3)) as usize;
    w[idx].clamp(MIN_STABILITY, MAX_STABILITY)
}

pub fn initial_difficulty(grade: i32) -> f64 {
    initial_difficulty_with_weights(grade, &FSRS6_WEIGHTS)
}

pub fn initial_difficulty_with_weights(grade: i32, w: &[f64; 21]) -> f64 {
    let d0 = w[4] - (grade as f64 - 3.0) * w[5];
    d0.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Difficulty mean-reverts toward the "easy" anchor on every review.
pub fn next_difficulty(difficulty: f64, grade: i32) -> f64 {
    next_difficulty_with_weights(difficulty, grade, &FSRS6_WEIGHTS)
}

pub fn next_difficulty_with_weights(difficulty: f64, grade: i32, w: &[f64; 21]) -> f64 {
    let delta_d = -w[6] * (grade as f64 - 3.0);
    let d_prime = difficulty + delta_d * ((10.0 - difficulty) / 9.0);
    let d_easy = initial_difficulty_with_weights(4, w);
    let reverted = w[7] * d_easy + (1.0 - w[7]) * d_prime;
    reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Stability growth on a successful review (grade >= 2).
pub fn next_recall_stability(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    grade: i32,
) -> f64 {
    next_recall_stability_with_weights(difficulty, stability, retrievability, grade, &FSRS6_WEIGHTS)
}

pub fn next_recall_stability_with_weights(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    grade: i32,
    w: &[f64; 21],
) -> f64 {
    let hard_penalty = if grade == 2 { w[15] } else { 1.0 };
    let easy_bonus = if grade == 4 { w[16] } else { 1.0 };
    let growth = (w[8]).exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * (((1.0 - retrievability) * w[10]).exp() - 1.0)
        * hard_penalty
        * easy_bonus;
    (stability * (1.0 + growth)).clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Stability after a lapse (grade == 1, "Again").
pub fn next_forget_stability(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    next_forget_stability_with_weights(difficulty, stability, retrievability, &FSRS6_WEIGHTS)
}

pub fn next_forget_stability_with_weights(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    w: &[f64; 21],
) -> f64 {
    let s_min = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * ((1.0 - retrievability) * w[14]).exp();
    s_min.min(stability).clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Same-day re-review stability update (FSRS-6's `S^(-w19)` term).
pub fn same_day_stability(stability: f64, grade: i32) -> f64 {
    same_day_stability_with_weights(stability, grade, &FSRS6_WEIGHTS)
}

pub fn same_day_stability_with_weights(stability: f64, grade: i32, w: &[f64; 21]) -> f64 {
    let sign = if grade >= 3 { 1.0 } else { -1.0 };
    let delta = sign * stability.powf(-w[19]) * w[17] * w[18].exp();
    (stability + delta).clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Sentiment protects retention during decay (consolidation, §4.3) - not part
/// of the review-time stability update but shares the same weight table idiom.
pub fn apply_sentiment_boost(value: f64, sentiment_intensity: f64) -> f64 {
    let protection = 1.0 - 0.3 * sentiment_intensity.clamp(0.0, 1.0);
    value * protection + (1.0 - protection)
}
