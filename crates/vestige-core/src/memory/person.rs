//! Person entity (spec §3.1)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A person tracked by the memory system, linked to knowledge nodes via
/// `GraphEdge { edge_type: PersonMentioned }`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub socials: BTreeMap<String, String>,
    pub contact_frequency: f64,
    /// Clamped to `[0, 1]`.
    pub relationship_health: f64,
    #[serde(default)]
    pub shared_topics: BTreeSet<String>,
    #[serde(default)]
    pub shared_projects: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            aliases: BTreeSet::new(),
            relationship_type: None,
            organization: None,
            role: None,
            location: None,
            socials: BTreeMap::new(),
            contact_frequency: 0.0,
            relationship_health: 0.5,
            shared_topics: BTreeSet::new(),
            shared_projects: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_person_defaults() {
        let p = Person::new("Ada Lovelace");
        assert_eq!(p.relationship_health, 0.5);
        assert!(p.aliases.is_empty());
    }
}
