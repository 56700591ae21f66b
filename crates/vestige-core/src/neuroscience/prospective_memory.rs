//! Prospective Memory (spec §4.11)
//!
//! Einstein & McDaniel's (1990) distinction between retrospective memory
//! ("remember what") and prospective memory ("remember to do X when Y
//! happens"). Intentions are tracked separately from knowledge nodes and
//! move through a lifecycle of their own: active, snoozed, triggered,
//! fulfilled, cancelled, expired.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_SNOOZE_MINUTES: i64 = 30;
const ESCALATION_DEADLINE_HOURS: i64 = 2;
const ESCALATION_REMINDER_COUNT: u32 = 3;

#[derive(Debug, Error)]
pub enum ProspectiveMemoryError {
    #[error("intention not found: {0}")]
    NotFound(String),
    #[error("invalid trigger: {0}")]
    InvalidTrigger(String),
}

pub type Result<T> = std::result::Result<T, ProspectiveMemoryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    fn escalate(self) -> Priority {
        match self {
            Priority::Low => Priority::Normal,
            Priority::Normal => Priority::High,
            Priority::High | Priority::Urgent => Priority::Urgent,
        }
    }

    /// `retention_strength = priority / 4` for tool-level node encoding.
    pub fn as_retention_fraction(self) -> f64 {
        match self {
            Priority::Low => 0.25,
            Priority::Normal => 0.5,
            Priority::High => 0.75,
            Priority::Urgent => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPattern {
    Exact(String),
    Contains(String),
    Regex(String),
    AnyOf(Vec<String>),
    AllOf(Vec<String>),
}

impl TriggerPattern {
    pub fn matches(&self, haystack: &str) -> bool {
        let lower = haystack.to_lowercase();
        match self {
            TriggerPattern::Exact(s) => lower == s.to_lowercase(),
            TriggerPattern::Contains(s) => lower.contains(&s.to_lowercase()),
            TriggerPattern::Regex(pattern) => regex::Regex::new(pattern).map(|re| re.is_match(haystack)).unwrap_or(false),
            TriggerPattern::AnyOf(options) => options.iter().any(|o| lower.contains(&o.to_lowercase())),
            TriggerPattern::AllOf(options) => options.iter().all(|o| lower.contains(&o.to_lowercase())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPattern {
    InCodebase(String),
    FilePattern(String),
    TopicActive(String),
    UserMode(String),
    Composite(Vec<ContextPattern>),
}

impl ContextPattern {
    pub fn matches(&self, ctx: &TriggerContext) -> bool {
        match self {
            ContextPattern::InCodebase(name) => ctx.project_name.as_deref() == Some(name.as_str()),
            ContextPattern::FilePattern(glob) => ctx.active_file.as_deref().map(|f| glob_match(glob, f)).unwrap_or(false),
            ContextPattern::TopicActive(topic) => ctx.active_topics.iter().any(|t| t.eq_ignore_ascii_case(topic)),
            ContextPattern::UserMode(mode) => ctx.user_mode.as_deref() == Some(mode.as_str()),
            ContextPattern::Composite(parts) => parts.iter().all(|p| p.matches(ctx)),
        }
    }
}

fn glob_match(glob: &str, path: &str) -> bool {
    if let Some(suffix) = glob.strip_prefix('*') {
        path.ends_with(suffix)
    } else if let Some(prefix) = glob.strip_suffix('*') {
        path.starts_with(prefix)
    } else {
        path == glob
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    EveryHour,
    Daily,
    Weekly,
    Monthly,
    Custom { minutes: i64 },
}

impl RecurrencePattern {
    fn next_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RecurrencePattern::EveryHour => from + Duration::hours(1),
            RecurrencePattern::Daily => from + Duration::days(1),
            RecurrencePattern::Weekly => from + Duration::weeks(1),
            RecurrencePattern::Monthly => from + Duration::days(30),
            RecurrencePattern::Custom { minutes } => from + Duration::minutes(*minutes),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionTrigger {
    TimeBased { at: DateTime<Utc> },
    DurationBased { after_minutes: i64 },
    EventBased { condition: String, pattern: TriggerPattern },
    ContextBased { context_match: ContextPattern },
    Recurring { pattern: RecurrencePattern, until: Option<DateTime<Utc>> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionStatus {
    Active,
    Snoozed,
    Triggered,
    Fulfilled,
    Cancelled,
    Expired,
}

#[derive(Debug, Default, Clone)]
pub struct TriggerContext {
    pub text: String,
    pub project_name: Option<String>,
    pub active_file: Option<String>,
    pub active_topics: Vec<String>,
    pub user_mode: Option<String>,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intention {
    pub id: String,
    pub description: String,
    pub trigger: IntentionTrigger,
    pub priority: Priority,
    pub status: IntentionStatus,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub reminder_count: u32,
    pub last_reminded_at: Option<DateTime<Utc>>,
}

impl Intention {
    pub fn new(description: impl Into<String>, trigger: IntentionTrigger, priority: Priority) -> Self {
        let now = Utc::now();
        let deadline = match &trigger {
            IntentionTrigger::TimeBased { at } => Some(*at),
            IntentionTrigger::DurationBased { after_minutes } => Some(now + Duration::minutes(*after_minutes)),
            _ => None,
        };
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            trigger,
            priority,
            status: IntentionStatus::Active,
            created_at: now,
            deadline,
            snoozed_until: None,
            reminder_count: 0,
            last_reminded_at: None,
        }
    }

    fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            IntentionStatus::Snoozed => self.snoozed_until.map(|t| now >= t).unwrap_or(true),
            IntentionStatus::Active => true,
            _ => false,
        }
    }

    fn trigger_matches(&self, ctx: &TriggerContext, now: DateTime<Utc>) -> bool {
        match &self.trigger {
            IntentionTrigger::TimeBased { at } => now >= *at,
            IntentionTrigger::DurationBased { .. } => self.deadline.map(|d| now >= d).unwrap_or(false),
            IntentionTrigger::EventBased { pattern, .. } => pattern.matches(&ctx.text),
            IntentionTrigger::ContextBased { context_match } => context_match.matches(ctx),
            IntentionTrigger::Recurring { pattern: _, until } => until.map(|u| now <= u).unwrap_or(true),
        }
    }

    /// Escalates priority when the deadline is within 2 hours or after 3
    /// reminders without fulfillment.
    fn maybe_escalate(&mut self, now: DateTime<Utc>) {
        let near_deadline = self.deadline.map(|d| (d - now).num_hours() <= ESCALATION_DEADLINE_HOURS).unwrap_or(false);
        if near_deadline || self.reminder_count >= ESCALATION_REMINDER_COUNT {
            self.priority = self.priority.escalate();
        }
    }
}

/// Owner-exclusive per spec §5: the tool layer serializes access.
#[derive(Debug, Default)]
pub struct ProspectiveMemory {
    intentions: Vec<Intention>,
}

impl ProspectiveMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_intention(&mut self, intention: Intention) -> String {
        let id = intention.id.clone();
        self.intentions.push(intention);
        id
    }

    pub fn get(&self, id: &str) -> Option<&Intention> {
        self.intentions.iter().find(|i| i.id == id)
    }

    pub fn active(&self) -> Vec<&Intention> {
        self.intentions.iter().filter(|i| matches!(i.status, IntentionStatus::Active | IntentionStatus::Snoozed)).collect()
    }

    /// `snooze(id, minutes=30)`. Requires the intention to be active.
    pub fn snooze(&mut self, id: &str, minutes: Option<i64>, now: DateTime<Utc>) -> Result<()> {
        let intention = self.intentions.iter_mut().find(|i| i.id == id).ok_or_else(|| ProspectiveMemoryError::NotFound(id.to_string()))?;
        intention.status = IntentionStatus::Snoozed;
        intention.snoozed_until = Some(now + Duration::minutes(minutes.unwrap_or(DEFAULT_SNOOZE_MINUTES)));
        Ok(())
    }

    pub fn fulfill(&mut self, id: &str) -> Result<()> {
        let intention = self.intentions.iter_mut().find(|i| i.id == id).ok_or_else(|| ProspectiveMemoryError::NotFound(id.to_string()))?;
        intention.status = IntentionStatus::Fulfilled;
        Ok(())
    }

    pub fn cancel(&mut self, id: &str) -> Result<()> {
        let intention = self.intentions.iter_mut().find(|i| i.id == id).ok_or_else(|| ProspectiveMemoryError::NotFound(id.to_string()))?;
        intention.status = IntentionStatus::Cancelled;
        Ok(())
    }

    /// Scans active/snoozed intentions against the given context, marking
    /// matches `Triggered`, recurring ones re-armed for their next
    /// occurrence, and returns the intentions that fired.
    pub fn check_triggers(&mut self, ctx: &TriggerContext) -> Vec<Intention> {
        let now = ctx.now.unwrap_or_else(Utc::now);
        let mut fired = Vec::new();
        for intention in &mut self.intentions {
            if !intention.is_due(now) {
                continue;
            }
            if intention.status == IntentionStatus::Snoozed {
                intention.status = IntentionStatus::Active;
            }
            if intention.trigger_matches(ctx, now) {
                intention.reminder_count += 1;
                intention.last_reminded_at = Some(now);
                intention.maybe_escalate(now);
                if let IntentionTrigger::Recurring { pattern, until } = &intention.trigger {
                    let next = pattern.next_after(now);
                    if until.map(|u| next <= u).unwrap_or(true) {
                        intention.deadline = Some(next);
                    } else {
                        intention.status = IntentionStatus::Expired;
                    }
                } else {
                    intention.status = IntentionStatus::Triggered;
                }
                fired.push(intention.clone());
            }
        }
        fired
    }

    /// Marks intentions with a passed deadline and no recurrence as expired.
    pub fn process_expired(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let mut expired = Vec::new();
        for intention in &mut self.intentions {
            if matches!(intention.status, IntentionStatus::Active | IntentionStatus::Snoozed) {
                if let Some(deadline) = intention.deadline {
                    if now > deadline && !matches!(intention.trigger, IntentionTrigger::Recurring { .. }) {
                        intention.status = IntentionStatus::Expired;
                        expired.push(intention.id.clone());
                    }
                }
            }
        }
        expired
    }
}

/// Minimal NLU parser for free-text intentions: parses a priority keyword
/// then tries duration, event, then time phrasing, defaulting to an
/// event-based "mentions the subject" trigger.
pub fn parse_intention(text: &str, now: DateTime<Utc>) -> Intention {
    let lower = text.to_lowercase();

    let priority = if lower.contains("urgent") || lower.contains("asap") {
        Priority::Urgent
    } else if lower.contains("important") || lower.contains("high priority") {
        Priority::High
    } else if lower.contains("low priority") || lower.contains("whenever") {
        Priority::Low
    } else {
        Priority::Normal
    };

    let trigger = parse_duration(&lower)
        .or_else(|| parse_time_phrase(&lower, now))
        .unwrap_or_else(|| IntentionTrigger::EventBased { condition: text.to_string(), pattern: TriggerPattern::Contains(keyword(&lower)) });

    Intention::new(text.trim(), trigger, priority)
}

fn parse_duration(lower: &str) -> Option<IntentionTrigger> {
    let idx = lower.find("in ")?;
    let rest = &lower[idx + 3..];
    let num: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let minutes: i64 = num.parse().ok()?;
    let unit_start = idx + 3 + num.len();
    let unit = lower[unit_start..].trim_start();
    let multiplier = if unit.starts_with("hour") {
        60
    } else if unit.starts_with("day") {
        1440
    } else if unit.starts_with("minute") || unit.starts_with("min") {
        1
    } else {
        return None;
    };
    Some(IntentionTrigger::DurationBased { after_minutes: minutes * multiplier })
}

fn parse_time_phrase(lower: &str, now: DateTime<Utc>) -> Option<IntentionTrigger> {
    if lower.contains("tomorrow") {
        return Some(IntentionTrigger::TimeBased { at: now + Duration::days(1) });
    }
    if lower.contains("next week") {
        return Some(IntentionTrigger::TimeBased { at: now + Duration::weeks(1) });
    }
    None
}

fn keyword(lower: &str) -> String {
    lower
        .split_whitespace()
        .filter(|w| w.len() > 3 && !["about", "with", "when", "remind", "remember"].contains(w))
        .next_back()
        .unwrap_or(lower)
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snooze_then_check_triggers_reactivates_after_window() {
        let mut pm = ProspectiveMemory::new();
        let now = Utc::now();
        let id = pm.create_intention(Intention::new("follow up", IntentionTrigger::EventBased { condition: "x".into(), pattern: TriggerPattern::Contains("deploy".into()) }, Priority::Normal));
        pm.snooze(&id, Some(10), now).unwrap();
        let mut ctx = TriggerContext { text: "deploy now".into(), now: Some(now + Duration::minutes(5)), ..Default::default() };
        assert!(pm.check_triggers(&ctx).is_empty());
        ctx.now = Some(now + Duration::minutes(11));
        let fired = pm.check_triggers(&ctx);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].status, IntentionStatus::Triggered);
    }

    #[test]
    fn process_expired_flags_past_deadline() {
        let mut pm = ProspectiveMemory::new();
        let now = Utc::now();
        pm.create_intention(Intention::new("report", IntentionTrigger::TimeBased { at: now - Duration::hours(1) }, Priority::Normal));
        let expired = pm.process_expired(now);
        assert_eq!(expired.len(), 1);
    }

    #[test]
    fn escalates_priority_near_deadline() {
        let now = Utc::now();
        let mut intention = Intention::new("x", IntentionTrigger::TimeBased { at: now + Duration::hours(1) }, Priority::Normal);
        intention.maybe_escalate(now);
        assert_eq!(intention.priority, Priority::High);
    }

    #[test]
    fn escalates_priority_after_repeated_reminders() {
        let now = Utc::now();
        let mut intention = Intention::new("x", IntentionTrigger::TimeBased { at: now + Duration::days(10) }, Priority::Normal);
        intention.reminder_count = 3;
        intention.maybe_escalate(now);
        assert_eq!(intention.priority, Priority::High);
    }

    #[test]
    fn context_pattern_matches_codebase() {
        let ctx = TriggerContext { project_name: Some("vestige".into()), ..Default::default() };
        assert!(ContextPattern::InCodebase("vestige".into()).matches(&ctx));
        assert!(!ContextPattern::InCodebase("other".into()).matches(&ctx));
    }

    #[test]
    fn parser_extracts_duration_trigger() {
        let now = Utc::now();
        let intention = parse_intention("remind me in 2 hours to check the build", now);
        match intention.trigger {
            IntentionTrigger::DurationBased { after_minutes } => assert_eq!(after_minutes, 120),
            other => panic!("expected duration trigger, got {other:?}"),
        }
    }

    #[test]
    fn scenario_s6_recurring_trigger_rearms() {
        let mut pm = ProspectiveMemory::new();
        let now = Utc::now();
        let id = pm.create_intention(Intention::new("standup notes", IntentionTrigger::Recurring { pattern: RecurrencePattern::Daily, until: None }, Priority::Normal));
        let fired = pm.check_triggers(&TriggerContext { now: Some(now), ..Default::default() });
        assert_eq!(fired.len(), 1);
        let intention = pm.get(&id).unwrap();
        assert_eq!(intention.status, IntentionStatus::Active);
        assert!(intention.deadline.unwrap() > now);
    }

    #[test]
    fn retention_fraction_matches_priority_over_four() {
        assert_eq!(Priority::Low.as_retention_fraction(), 0.25);
        assert_eq!(Priority::Urgent.as_retention_fraction(), 1.0);
    }
}
