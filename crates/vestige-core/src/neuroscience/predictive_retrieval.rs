//! Predictive Retrieval (spec §4.10)
//!
//! Friston's (2010) Free Energy Principle applied to memory: rather than
//! waiting to be queried, the system maintains a running model of what the
//! user is likely to need next, from interest tracking, temporal-of-day
//! patterns, the current session, and co-access history.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

const INTEREST_LEARNING_RATE: f64 = 0.1;
const INTEREST_DAILY_DECAY: f64 = 0.98;
const INTEREST_DROP_FLOOR: f64 = 0.01;
const MAX_QUERY_HISTORY: usize = 500;
const MAX_CO_ACCESS_TARGETS: usize = 20;
const PREDICTION_MIN_CONFIDENCE: f64 = 0.2;
const SESSION_TIMEOUT_MINUTES: i64 = 30;
const CO_ACCESS_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedMemory {
    pub memory_id: String,
    pub confidence: f64,
    pub reason: PredictionReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionReason {
    Interest { topic: String },
    Temporal,
    Session,
    CoAccess { trigger_memory: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordedQuery {
    query: String,
    tags: Vec<String>,
    accessed_ids: Vec<String>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
struct TemporalBuckets {
    by_hour: HashMap<u32, HashMap<String, f64>>,
    by_weekday: HashMap<Weekday, HashMap<String, f64>>,
    by_month: HashMap<u32, HashMap<String, f64>>,
}

/// Owner-exclusive per spec §5: external tools call this sequentially.
pub struct PredictiveRetriever {
    interests: HashMap<String, f64>,
    query_history: VecDeque<RecordedQuery>,
    co_access: HashMap<String, VecDeque<String>>,
    session_ids: HashSet<String>,
    session_last_activity: Option<DateTime<Utc>>,
    temporal: TemporalBuckets,
    last_decay_day: Option<chrono::NaiveDate>,
}

impl Default for PredictiveRetriever {
    fn default() -> Self {
        Self {
            interests: HashMap::new(),
            query_history: VecDeque::new(),
            co_access: HashMap::new(),
            session_ids: HashSet::new(),
            session_last_activity: None,
            temporal: TemporalBuckets::default(),
            last_decay_day: None,
        }
    }
}

impl PredictiveRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize_topic(topic: &str) -> String {
        topic.trim().to_lowercase()
    }

    fn ema_update(&mut self, topic: &str, new_value: f64) {
        let key = Self::normalize_topic(topic);
        let entry = self.interests.entry(key).or_insert(0.0);
        *entry = (*entry * (1.0 - INTEREST_LEARNING_RATE) + new_value * INTEREST_LEARNING_RATE).clamp(0.0, 1.0);
    }

    pub fn interest(&self, topic: &str) -> f64 {
        self.interests.get(&Self::normalize_topic(topic)).copied().unwrap_or(0.0)
    }

    /// Sorted by weight descending.
    pub fn interests_sorted(&self) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = self.interests.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    /// Multiplies all weights by 0.98, drops entries below 0.01. Applied at
    /// most once per calendar day (idempotent within the same day).
    pub fn apply_daily_decay(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.last_decay_day == Some(today) {
            return;
        }
        self.last_decay_day = Some(today);
        self.interests.retain(|_, w| {
            *w *= INTEREST_DAILY_DECAY;
            *w >= INTEREST_DROP_FLOOR
        });
    }

    fn touch_session(&mut self, now: DateTime<Utc>) {
        let expired = self
            .session_last_activity
            .map(|t| now - t >= Duration::minutes(SESSION_TIMEOUT_MINUTES))
            .unwrap_or(true);
        if expired {
            self.session_ids.clear();
        }
        self.session_last_activity = Some(now);
    }

    /// `recordQuery(q, tags, accessed_ids, satisfaction=0.8)`.
    pub fn record_query(&mut self, query: &str, tags: &[String], accessed_ids: &[String], satisfaction: f64, now: DateTime<Utc>) {
        for tag in tags {
            self.ema_update(tag, satisfaction);
        }
        self.query_history.push_back(RecordedQuery {
            query: query.to_string(),
            tags: tags.to_vec(),
            accessed_ids: accessed_ids.to_vec(),
            timestamp: now,
        });
        while self.query_history.len() > MAX_QUERY_HISTORY {
            self.query_history.pop_front();
        }
        self.touch_session(now);
        if accessed_ids.len() >= 2 {
            self.record_co_access(accessed_ids);
        }
    }

    /// `recordMemoryAccess(id, tags)`.
    pub fn record_memory_access(&mut self, id: &str, tags: &[String], now: DateTime<Utc>) {
        self.touch_session(now);
        self.session_ids.insert(id.to_string());
        for tag in tags {
            self.ema_update(tag, 0.5);
        }

        let hour_bucket = self.temporal.by_hour.entry(now.hour()).or_default();
        for tag in tags {
            *hour_bucket.entry(Self::normalize_topic(tag)).or_insert(0.0) += 1.0;
        }
        let day_bucket = self.temporal.by_weekday.entry(now.weekday()).or_default();
        for tag in tags {
            *day_bucket.entry(Self::normalize_topic(tag)).or_insert(0.0) += 1.0;
        }
        let month_bucket = self.temporal.by_month.entry(now.month()).or_default();
        for tag in tags {
            *month_bucket.entry(Self::normalize_topic(tag)).or_insert(0.0) += 1.0;
        }
    }

    fn record_co_access(&mut self, ids: &[String]) {
        for i in 0..ids.len() {
            for j in 0..ids.len() {
                if i == j {
                    continue;
                }
                let targets = self.co_access.entry(ids[i].clone()).or_default();
                if !targets.contains(&ids[j]) {
                    targets.push_back(ids[j].clone());
                    while targets.len() > MAX_CO_ACCESS_TARGETS {
                        targets.pop_front();
                    }
                }
            }
        }
    }

    /// Merges candidates from interests, temporal patterns, the current
    /// session, and co-access of the last accessed memory; max-confidence
    /// merge by id, filtered to `>= 0.2`, truncated to `limit`.
    pub fn predict(&self, limit: usize, now: DateTime<Utc>, tags_of: impl Fn(&str) -> Vec<String>, candidate_ids: &[String]) -> Vec<PredictedMemory> {
        let mut by_id: HashMap<String, PredictedMemory> = HashMap::new();

        let merge = |by_id: &mut HashMap<String, PredictedMemory>, id: &str, confidence: f64, reason: PredictionReason| {
            let better = by_id.get(id).is_none_or(|existing| confidence > existing.confidence);
            if better {
                by_id.insert(id.to_string(), PredictedMemory { memory_id: id.to_string(), confidence, reason });
            }
        };

        for id in candidate_ids {
            let tags = tags_of(id);
            if let Some(top_topic) = tags.iter().max_by(|a, b| self.interest(a).partial_cmp(&self.interest(b)).unwrap_or(std::cmp::Ordering::Equal)) {
                let w = self.interest(top_topic);
                if w > 0.0 {
                    merge(&mut by_id, id, w, PredictionReason::Interest { topic: top_topic.clone() });
                }
            }

            let hour_bucket = self.temporal.by_hour.get(&now.hour());
            if let Some(bucket) = hour_bucket {
                let total: f64 = bucket.values().sum::<f64>().max(1.0);
                let temporal_score = tags.iter().map(|t| bucket.get(&Self::normalize_topic(t)).copied().unwrap_or(0.0)).sum::<f64>() / total;
                if temporal_score > 0.0 {
                    merge(&mut by_id, id, temporal_score.min(1.0), PredictionReason::Temporal);
                }
            }

            if self.session_ids.contains(id) {
                merge(&mut by_id, id, 0.9, PredictionReason::Session);
            }
        }

        if let Some(last) = self.session_ids.iter().last() {
            if let Some(targets) = self.co_access.get(last) {
                for target in targets {
                    merge(&mut by_id, target, CO_ACCESS_CONFIDENCE, PredictionReason::CoAccess { trigger_memory: last.clone() });
                }
            }
        }

        let mut out: Vec<PredictedMemory> = by_id.into_values().filter(|p| p.confidence >= PREDICTION_MIN_CONFIDENCE).collect();
        out.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        out.truncate(limit);
        out
    }

    /// `novelty = 1 - mean(interest(t) for t in tags)`; empty tags -> 1.0.
    pub fn novelty(&self, tags: &[String]) -> f64 {
        if tags.is_empty() {
            return 1.0;
        }
        let mean = tags.iter().map(|t| self.interest(t)).sum::<f64>() / tags.len() as f64;
        (1.0 - mean).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_update_moves_toward_new_value() {
        let mut r = PredictiveRetriever::new();
        let now = Utc::now();
        r.record_query("q", &["rust".into()], &[], 1.0, now);
        assert!((r.interest("rust") - 0.1).abs() < 1e-9);
        r.record_query("q", &["rust".into()], &[], 1.0, now);
        assert!((r.interest("rust") - 0.19).abs() < 1e-9);
    }

    #[test]
    fn daily_decay_drops_small_weights() {
        let mut r = PredictiveRetriever::new();
        let now = Utc::now();
        r.interests.insert("x".into(), 0.005);
        r.interests.insert("y".into(), 0.5);
        r.apply_daily_decay(now);
        assert!(!r.interests.contains_key("x"));
        assert!(r.interests.contains_key("y"));
    }

    #[test]
    fn daily_decay_applies_once_per_day() {
        let mut r = PredictiveRetriever::new();
        let now = Utc::now();
        r.interests.insert("y".into(), 1.0);
        r.apply_daily_decay(now);
        r.apply_daily_decay(now);
        assert!((r.interests["y"] - INTEREST_DAILY_DECAY).abs() < 1e-9);
    }

    #[test]
    fn co_access_is_bidirectional() {
        let mut r = PredictiveRetriever::new();
        let now = Utc::now();
        r.record_query("q", &[], &["a".into(), "b".into()], 0.8, now);
        assert!(r.co_access.get("a").unwrap().contains(&"b".to_string()));
        assert!(r.co_access.get("b").unwrap().contains(&"a".to_string()));
    }

    #[test]
    fn novelty_is_one_for_empty_tags() {
        let r = PredictiveRetriever::new();
        assert_eq!(r.novelty(&[]), 1.0);
    }

    #[test]
    fn predictions_filtered_below_min_confidence() {
        let r = PredictiveRetriever::new();
        let now = Utc::now();
        let preds = r.predict(10, now, |_| vec![], &["a".into()]);
        assert!(preds.is_empty());
    }
}
