//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded databases with test data
//! - Database snapshots and restoration

use std::path::PathBuf;
use tempfile::TempDir;
use vestige_core::{tools, IngestInput, KnowledgeNode, Rating, SourceType, Storage};

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
pub struct TestDatabaseManager {
    /// The storage instance
    pub storage: Storage,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
    /// Snapshot data for restore operations
    snapshot: Option<Vec<KnowledgeNode>>,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory.
    ///
    /// The database is automatically deleted when the manager is dropped.
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = temp_dir.path().join("test_vestige.db");

        let storage = Storage::open_path(&db_path).expect("failed to create test storage");

        Self { storage, _temp_dir: Some(temp_dir), db_path, snapshot: None }
    }

    /// Create a test database at a specific path.
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(path: PathBuf) -> Self {
        let storage = Storage::open_path(&path).expect("failed to create test storage");

        Self { storage, _temp_dir: None, db_path: path, snapshot: None }
    }

    /// Get the database path.
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Check if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.get_stats().map(|s| s.total_nodes == 0).unwrap_or(true)
    }

    /// Get the number of nodes in the database.
    pub fn node_count(&self) -> i64 {
        self.storage.get_stats().map(|s| s.total_nodes).unwrap_or(0)
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Seed the database with a specified number of test nodes.
    pub fn seed_nodes(&mut self, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);

        for i in 0..count {
            let input = IngestInput {
                content: format!("Test memory content {i}"),
                tags: vec![format!("test-{}", i % 5)],
                ..Default::default()
            };

            if let Ok(node) = self.storage.insert_node(input) {
                ids.push(node.id);
            }
        }

        ids
    }

    /// Seed with diverse source types.
    pub fn seed_diverse(&mut self, count_per_type: usize) -> Vec<String> {
        let types = [
            SourceType::Fact,
            SourceType::Concept,
            SourceType::Event,
            SourceType::Note,
            SourceType::Decision,
        ];
        let mut ids = Vec::with_capacity(count_per_type * types.len());

        for source_type in types {
            for i in 0..count_per_type {
                let input = IngestInput {
                    content: format!("Test {source_type:?} content {i}"),
                    source_type,
                    tags: vec![format!("{source_type:?}").to_lowercase()],
                    ..Default::default()
                };

                if let Ok(node) = self.storage.insert_node(input) {
                    ids.push(node.id);
                }
            }
        }

        ids
    }

    /// Seed with nodes in various review states (new / well-learned / struggling).
    pub fn seed_with_retention_states(&mut self) -> Vec<String> {
        let mut ids = Vec::new();

        let input = IngestInput {
            content: "New memory - never reviewed".to_string(),
            tags: vec!["new".to_string()],
            ..Default::default()
        };
        if let Ok(node) = self.storage.insert_node(input) {
            ids.push(node.id);
        }

        let input = IngestInput {
            content: "Well-learned memory - reviewed multiple times".to_string(),
            tags: vec!["learned".to_string()],
            ..Default::default()
        };
        if let Ok(node) = self.storage.insert_node(input) {
            let _ = tools::review(&self.storage, &node.id, Rating::Good);
            let _ = tools::review(&self.storage, &node.id, Rating::Good);
            let _ = tools::review(&self.storage, &node.id, Rating::Easy);
            ids.push(node.id);
        }

        let input = IngestInput {
            content: "Struggling memory - has lapses".to_string(),
            tags: vec!["struggling".to_string()],
            ..Default::default()
        };
        if let Ok(node) = self.storage.insert_node(input) {
            let _ = tools::review(&self.storage, &node.id, Rating::Again);
            let _ = tools::review(&self.storage, &node.id, Rating::Hard);
            let _ = tools::review(&self.storage, &node.id, Rating::Again);
            ids.push(node.id);
        }

        ids
    }

    /// Seed with nodes carrying varied sentiment intensity.
    pub fn seed_with_sentiment(&mut self, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);

        for i in 0..count {
            let intensity = (i as f64) / (count.max(1) as f64);
            let input = IngestInput {
                content: format!("Sentiment-bearing memory {i}"),
                source_type: SourceType::Event,
                sentiment_intensity: if i % 2 == 0 { intensity } else { -intensity },
                tags: vec!["sentiment".to_string()],
                ..Default::default()
            };

            if let Ok(node) = self.storage.insert_node(input) {
                ids.push(node.id);
            }
        }

        ids
    }

    // ========================================================================
    // SNAPSHOT/RESTORE
    // ========================================================================

    /// Take a snapshot of the current database state.
    pub fn take_snapshot(&mut self) {
        let nodes = self.storage.get_all_nodes(10_000, 0).unwrap_or_default();
        self.snapshot = Some(nodes);
    }

    /// Restore from the last snapshot.
    ///
    /// Clears the database and re-inserts all nodes from the snapshot. IDs
    /// are not preserved (new UUIDs are generated).
    pub fn restore_snapshot(&mut self) -> bool {
        let Some(nodes) = self.snapshot.take() else { return false };

        self.clear();

        for node in nodes {
            let input = IngestInput {
                content: node.content,
                source_type: node.source_type,
                source_url: node.source_url,
                sentiment_intensity: node.sentiment_intensity,
                tags: node.tags,
                force_create: true,
            };
            let _ = self.storage.insert_node(input);
        }

        true
    }

    /// Check if a snapshot exists.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    // ========================================================================
    // CLEANUP
    // ========================================================================

    /// Clear all data from the database.
    pub fn clear(&mut self) {
        if let Ok(nodes) = self.storage.get_all_nodes(10_000, 0) {
            for node in nodes {
                let _ = self.storage.delete_node(&node.id);
            }
        }
    }

    /// Recreate the database at the same path (useful for migration tests).
    pub fn recreate(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
        self.storage = Storage::open_path(&self.db_path).expect("failed to recreate storage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_database_creation() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty());
        assert!(db.path().exists());
    }

    #[test]
    fn test_seed_nodes() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_nodes(10);

        assert_eq!(ids.len(), 10);
        assert_eq!(db.node_count(), 10);
    }

    #[test]
    fn test_seed_diverse() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_diverse(3);

        assert_eq!(ids.len(), 15);
        assert_eq!(db.node_count(), 15);
    }

    #[test]
    fn test_clear_database() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_nodes(5);
        assert_eq!(db.node_count(), 5);

        db.clear();
        assert!(db.is_empty());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_nodes(5);

        db.take_snapshot();
        assert!(db.has_snapshot());

        db.clear();
        assert!(db.is_empty());

        db.restore_snapshot();
        assert_eq!(db.node_count(), 5);
    }
}
