//! Test Data Factory
//!
//! Utilities for generating realistic test data:
//! - Memory nodes with various properties
//! - Batch generation for stress testing
//! - Pre-built scenarios for common test cases

use chrono::{Duration, Utc};
use vestige_core::{tools, IngestInput, KnowledgeNode, Rating, SourceType, Storage};

/// Factory for creating test data.
///
/// Generates realistic test data with configurable properties, for building
/// comprehensive test scenarios without hand-assembling `IngestInput` values
/// everywhere.
pub struct TestDataFactory;

/// Configuration for batch memory generation.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of memories to create.
    pub count: usize,
    /// Source type to use (None = cycle through a fixed set).
    pub source_type: Option<SourceType>,
    /// Base content prefix.
    pub content_prefix: String,
    /// Tags to apply to every created memory.
    pub tags: Vec<String>,
    /// Whether to vary sentiment intensity across the batch.
    pub with_sentiment: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 10,
            source_type: None,
            content_prefix: "Test memory".to_string(),
            tags: vec![],
            with_sentiment: false,
        }
    }
}

/// A scenario containing related test data, with IDs tagged for assertions.
#[derive(Debug)]
pub struct TestScenario {
    /// IDs of created nodes.
    pub node_ids: Vec<String>,
    /// Description of the scenario.
    pub description: String,
    /// Metadata for test assertions, e.g. `"high_stability" -> node id`.
    pub metadata: std::collections::HashMap<String, String>,
}

impl TestDataFactory {
    // ========================================================================
    // SINGLE MEMORY CREATION
    // ========================================================================

    /// Create a simple memory with content.
    pub fn create_memory(storage: &Storage, content: &str) -> Option<KnowledgeNode> {
        let input = IngestInput { content: content.to_string(), ..Default::default() };
        storage.insert_node(input).ok()
    }

    /// Create a memory with full configuration.
    pub fn create_memory_full(
        storage: &Storage,
        content: &str,
        source_type: SourceType,
        source_url: Option<&str>,
        tags: Vec<&str>,
        sentiment_intensity: f64,
    ) -> Option<KnowledgeNode> {
        let input = IngestInput {
            content: content.to_string(),
            source_type,
            source_url: source_url.map(String::from),
            sentiment_intensity,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            force_create: false,
        };
        storage.insert_node(input).ok()
    }

    /// Create an emotionally charged memory (high `|sentiment_intensity|`).
    pub fn create_emotional_memory(storage: &Storage, content: &str, intensity: f64) -> Option<KnowledgeNode> {
        let input = IngestInput {
            content: content.to_string(),
            source_type: SourceType::Event,
            sentiment_intensity: intensity,
            ..Default::default()
        };
        storage.insert_node(input).ok()
    }

    // ========================================================================
    // BATCH CREATION
    // ========================================================================

    /// Create a batch of memories using default config.
    pub fn create_batch(storage: &Storage, count: usize) -> Vec<String> {
        Self::create_batch_with_config(storage, BatchConfig { count, ..Default::default() })
    }

    /// Create a batch with custom configuration.
    pub fn create_batch_with_config(storage: &Storage, config: BatchConfig) -> Vec<String> {
        let source_types = [
            SourceType::Fact,
            SourceType::Concept,
            SourceType::Note,
            SourceType::Event,
            SourceType::Decision,
        ];
        let mut ids = Vec::with_capacity(config.count);

        for i in 0..config.count {
            let source_type = config.source_type.unwrap_or(source_types[i % source_types.len()]);

            let sentiment_intensity = if config.with_sentiment {
                ((i as f64) / (config.count.max(1) as f64) * 2.0) - 1.0
            } else {
                0.0
            };

            let input = IngestInput {
                content: format!("{} {}", config.content_prefix, i),
                source_type,
                sentiment_intensity,
                tags: config.tags.clone(),
                ..Default::default()
            };

            if let Ok(node) = storage.insert_node(input) {
                ids.push(node.id);
            }
        }

        ids
    }

    // ========================================================================
    // SCENARIO CREATION
    // ========================================================================

    /// A scenario for testing memory decay: a well-reinforced memory, a
    /// fresh low-stability one, and an emotionally charged one.
    pub fn create_decay_scenario(storage: &Storage) -> TestScenario {
        let mut ids = Vec::new();
        let mut metadata = std::collections::HashMap::new();

        if let Some(node) = Self::create_memory_full(
            storage,
            "Well-learned fact about photosynthesis",
            SourceType::Fact,
            Some("biology textbook"),
            vec!["biology", "science"],
            0.3,
        ) {
            metadata.insert("high_stability".to_string(), node.id.clone());
            ids.push(node.id);
        }

        if let Some(node) = Self::create_memory(storage, "Random fact I just learned") {
            metadata.insert("low_stability".to_string(), node.id.clone());
            ids.push(node.id);
        }

        if let Some(node) = Self::create_emotional_memory(storage, "Important life event", 0.9) {
            metadata.insert("emotional".to_string(), node.id.clone());
            ids.push(node.id);
        }

        TestScenario {
            node_ids: ids,
            description: "Decay testing scenario with varied stability".to_string(),
            metadata,
        }
    }

    /// A scenario for testing review scheduling: new / learning / reviewed /
    /// relearning cards.
    pub fn create_scheduling_scenario(storage: &Storage) -> TestScenario {
        let mut ids = Vec::new();
        let mut metadata = std::collections::HashMap::new();

        if let Some(node) = Self::create_memory(storage, "Brand new memory") {
            metadata.insert("new".to_string(), node.id.clone());
            ids.push(node.id);
        }

        if let Some(node) = Self::create_memory(storage, "Learning memory") {
            let _ = tools::review(storage, &node.id, Rating::Good);
            metadata.insert("learning".to_string(), node.id.clone());
            ids.push(node.id);
        }

        if let Some(node) = Self::create_memory(storage, "Well-reviewed memory") {
            for _ in 0..5 {
                let _ = tools::review(storage, &node.id, Rating::Good);
            }
            metadata.insert("review".to_string(), node.id.clone());
            ids.push(node.id);
        }

        if let Some(node) = Self::create_memory(storage, "Struggling memory") {
            let _ = tools::review(storage, &node.id, Rating::Good);
            let _ = tools::review(storage, &node.id, Rating::Again);
            metadata.insert("relearning".to_string(), node.id.clone());
            ids.push(node.id);
        }

        TestScenario {
            node_ids: ids,
            description: "Scheduling scenario with cards in different learning states".to_string(),
            metadata,
        }
    }

    /// A scenario for testing search: two topical clusters.
    pub fn create_search_scenario(storage: &Storage) -> TestScenario {
        let mut ids = Vec::new();
        let mut metadata = std::collections::HashMap::new();

        for content in [
            "Rust programming language uses ownership for memory safety",
            "Python is great for data science and machine learning",
            "JavaScript runs in web browsers and Node.js",
        ] {
            if let Some(node) = Self::create_memory_full(
                storage,
                content,
                SourceType::Fact,
                Some("programming docs"),
                vec!["programming", "code"],
                0.0,
            ) {
                ids.push(node.id);
            }
        }
        metadata.insert("programming_count".to_string(), "3".to_string());

        for content in [
            "Mitochondria is the powerhouse of the cell",
            "DNA contains genetic information",
            "Gravity is the force of attraction between masses",
        ] {
            if let Some(node) = Self::create_memory_full(
                storage,
                content,
                SourceType::Fact,
                Some("science textbook"),
                vec!["science"],
                0.0,
            ) {
                ids.push(node.id);
            }
        }
        metadata.insert("science_count".to_string(), "3".to_string());

        TestScenario {
            node_ids: ids,
            description: "Search scenario with categorized content".to_string(),
            metadata,
        }
    }

    /// A scenario for review-interval tests. Content only — callers that
    /// need elapsed-time effects drive `tools::review` themselves, since the
    /// factory only goes through the public ingest path.
    pub fn create_temporal_scenario(storage: &Storage) -> TestScenario {
        let now = Utc::now();
        let mut ids = Vec::new();
        let mut metadata = std::collections::HashMap::new();

        if let Some(node) = Self::create_memory(storage, "Memory created just now") {
            metadata.insert("just_now".to_string(), node.id.clone());
            ids.push(node.id);
        }

        if let Some(node) = Self::create_memory_full(
            storage,
            "Memory referencing a past event",
            SourceType::Event,
            None,
            vec!["history"],
            0.0,
        ) {
            metadata.insert("historical".to_string(), node.id.clone());
            ids.push(node.id);
        }

        let _ = now - Duration::days(30);

        TestScenario {
            node_ids: ids,
            description: "Temporal scenario for review-interval tests".to_string(),
            metadata,
        }
    }

    // ========================================================================
    // UTILITY METHODS
    // ========================================================================

    /// Generate lorem-ipsum-like content.
    pub fn lorem_content(words: usize, seed: usize) -> String {
        const WORDS: [&str; 20] = [
            "the", "memory", "learning", "knowledge", "algorithm", "data", "system", "process",
            "function", "method", "class", "object", "variable", "constant", "type", "structure",
            "pattern", "design", "architecture", "code",
        ];

        (0..words).map(|i| WORDS[(seed + i * 7) % WORDS.len()]).collect::<Vec<_>>().join(" ")
    }

    /// Generate a tag list.
    pub fn generate_tags(count: usize, seed: usize) -> Vec<String> {
        const TAGS: [&str; 10] =
            ["important", "review", "todo", "concept", "fact", "code", "note", "idea", "question", "reference"];

        (0..count).map(|i| TAGS[(seed + i) % TAGS.len()].to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::in_memory().unwrap()
    }

    #[test]
    fn test_create_memory() {
        let storage = create_test_storage();
        let node = TestDataFactory::create_memory(&storage, "test content");

        assert!(node.is_some());
        assert_eq!(node.unwrap().content, "test content");
    }

    #[test]
    fn test_create_batch() {
        let storage = create_test_storage();
        let ids = TestDataFactory::create_batch(&storage, 10);

        assert_eq!(ids.len(), 10);

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.total_nodes, 10);
    }

    #[test]
    fn test_create_decay_scenario() {
        let storage = create_test_storage();
        let scenario = TestDataFactory::create_decay_scenario(&storage);

        assert!(!scenario.node_ids.is_empty());
        assert!(scenario.metadata.contains_key("high_stability"));
        assert!(scenario.metadata.contains_key("low_stability"));
        assert!(scenario.metadata.contains_key("emotional"));
    }

    #[test]
    fn test_create_scheduling_scenario() {
        let storage = create_test_storage();
        let scenario = TestDataFactory::create_scheduling_scenario(&storage);

        assert!(!scenario.node_ids.is_empty());
        assert!(scenario.metadata.contains_key("new"));
        assert!(scenario.metadata.contains_key("learning"));
        assert!(scenario.metadata.contains_key("review"));
    }

    #[test]
    fn test_lorem_content() {
        let content = TestDataFactory::lorem_content(10, 42);
        let words: Vec<_> = content.split_whitespace().collect();

        assert_eq!(words.len(), 10);
    }

    #[test]
    fn test_generate_tags() {
        let tags = TestDataFactory::generate_tags(5, 0);

        assert_eq!(tags.len(), 5);
        assert!(tags.iter().all(|t| !t.is_empty()));
    }
}
