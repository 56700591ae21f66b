//! SQLite-backed Store (spec §4.1, §6.2)
//!
//! One connection guarded by a mutex: the spec's concurrency model (§5)
//! requires only a single writer, and collapsing reads onto the same
//! connection keeps in-memory and on-disk databases behaviorally identical.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::config::VestigeConfig;
use crate::memory::{
    EdgeType, GraphEdge, IngestInput, KnowledgeNode, MemoryStats, NodePatch, Person,
    SchedulingState, SourcePlatform, SourceType,
};

use super::migrations::MIGRATIONS;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("initialization failed: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// `get_database_size` result (§4.1).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSize {
    pub bytes: i64,
    pub mb: f64,
}

/// Single connection shared by readers and the writer. The spec's
/// concurrency model (§5) requires only one writer at a time; it does not
/// require parallel readers, so one serialized connection keeps the
/// in-memory and on-disk code paths identical.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub fn open(config: &VestigeConfig) -> Result<Self> {
        Self::open_path(&config.db_path)
    }

    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(())
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS vestige_schema_version (version INTEGER NOT NULL);",
        )?;
        let current: i64 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM vestige_schema_version", [], |r| {
                r.get(0)
            })
            .unwrap_or(0);
        for m in MIGRATIONS {
            if i64::from(m.version) > current {
                conn.execute_batch(m.up)?;
                conn.execute(
                    "INSERT INTO vestige_schema_version(version) VALUES (?1)",
                    params![m.version],
                )?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Runs `f` inside a SQLite transaction on the writer connection;
    /// commits on `Ok`, rolls back on `Err` (spec §4.1, §5).
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock().expect("connection lock poisoned");
        let tx = conn.transaction()?;
        let result = f(&tx);
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                let _ = tx.rollback();
                Err(e)
            }
        }
    }

    /// Executes a batch of statements atomically.
    pub fn batch(&self, statements: &[&str]) -> Result<()> {
        self.transaction(|tx| {
            for stmt in statements {
                tx.execute_batch(stmt)?;
            }
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    pub fn insert_node(&self, input: IngestInput) -> Result<KnowledgeNode> {
        if input.content.trim().is_empty() {
            return Err(StorageError::Invalid("content must not be empty".into()));
        }
        let mut node = KnowledgeNode::new(input.content);
        node.source_type = input.source_type;
        node.source_url = input.source_url;
        node.sentiment_intensity = input.sentiment_intensity.clamp(0.0, 1.0);
        node.tags = input.tags.into_iter().collect();
        self.insert_node_record(&node)?;
        Ok(node)
    }

    /// Inserts a fully-formed node as-is (used by Smart Ingest and tests that
    /// construct a node directly).
    pub fn insert_node_record(&self, node: &KnowledgeNode) -> Result<()> {
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO knowledge_nodes (
                    id, content, summary, created_at, updated_at, last_accessed_at,
                    access_count, review_count, source_type, source_platform, source_id,
                    source_url, source_chain, stability, difficulty, state, last_review,
                    next_review, reps, lapses, storage_strength, retrieval_strength,
                    retention_strength, stability_factor, sentiment_intensity, confidence,
                    is_contradicted, contradiction_ids, tags, people, concepts, events,
                    git_branch, git_commit, git_uncommitted_paths
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,
                          ?20,?21,?22,?23,?24,?25,?26,?27,?28,?29,?30,?31,?32,?33,?34,?35)",
                params![
                    node.id,
                    node.content,
                    node.summary,
                    to_rfc3339(node.created_at),
                    to_rfc3339(node.updated_at),
                    to_rfc3339(node.last_accessed_at),
                    node.access_count,
                    node.review_count,
                    node.source_type.as_str(),
                    source_platform_str(&node.source_platform),
                    node.source_id,
                    node.source_url,
                    to_json(&node.source_chain),
                    node.stability,
                    node.difficulty,
                    state_str(node.state),
                    node.last_review.map(to_rfc3339),
                    node.next_review.map(to_rfc3339),
                    node.reps,
                    node.lapses,
                    node.storage_strength,
                    node.retrieval_strength,
                    node.retention_strength,
                    node.stability_factor,
                    node.sentiment_intensity,
                    node.confidence,
                    node.is_contradicted,
                    to_json(&node.contradiction_ids),
                    to_json(&node.tags),
                    to_json(&node.people),
                    to_json(&node.concepts),
                    to_json(&node.events),
                    node.git_branch,
                    node.git_commit,
                    to_json(&node.git_uncommitted_paths),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_node(&self, id: &str) -> Result<Option<KnowledgeNode>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        conn.query_row(
            "SELECT * FROM knowledge_nodes WHERE id = ?1",
            params![id],
            row_to_node,
        )
        .optional()
        .map_err(StorageError::from)
    }

    /// `update_node_access`: single-statement bump of `access_count`/`last_accessed_at`.
    pub fn update_node_access(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let changed = conn.execute(
            "UPDATE knowledge_nodes SET access_count = access_count + 1, last_accessed_at = ?2
             WHERE id = ?1",
            params![id, to_rfc3339(Utc::now())],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn update_node_fields(&self, id: &str, patch: NodePatch) -> Result<KnowledgeNode> {
        self.transaction(|tx| {
            let mut node: KnowledgeNode = tx
                .query_row(
                    "SELECT * FROM knowledge_nodes WHERE id = ?1",
                    params![id],
                    row_to_node,
                )
                .optional()?
                .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
            patch.apply(&mut node);
            tx.execute(
                "UPDATE knowledge_nodes SET
                    content=?2, summary=?3, updated_at=?4, access_count=?5, review_count=?6,
                    source_id=?7, source_url=?8, source_chain=?9, stability=?10, difficulty=?11,
                    state=?12, last_review=?13, next_review=?14, reps=?15, lapses=?16,
                    storage_strength=?17, retrieval_strength=?18, retention_strength=?19,
                    stability_factor=?20, sentiment_intensity=?21, confidence=?22,
                    is_contradicted=?23, contradiction_ids=?24, tags=?25, people=?26,
                    concepts=?27, events=?28
                 WHERE id=?1",
                params![
                    node.id,
                    node.content,
                    node.summary,
                    to_rfc3339(node.updated_at),
                    node.access_count,
                    node.review_count,
                    node.source_id,
                    node.source_url,
                    to_json(&node.source_chain),
                    node.stability,
                    node.difficulty,
                    state_str(node.state),
                    node.last_review.map(to_rfc3339),
                    node.next_review.map(to_rfc3339),
                    node.reps,
                    node.lapses,
                    node.storage_strength,
                    node.retrieval_strength,
                    node.retention_strength,
                    node.stability_factor,
                    node.sentiment_intensity,
                    node.confidence,
                    node.is_contradicted,
                    to_json(&node.contradiction_ids),
                    to_json(&node.tags),
                    to_json(&node.people),
                    to_json(&node.concepts),
                    to_json(&node.events),
                ],
            )?;
            Ok(node)
        })
    }

    /// Cascades: embeddings, edges touching `id`, FTS row (via trigger).
    pub fn delete_node(&self, id: &str) -> Result<bool> {
        self.transaction(|tx| {
            tx.execute("DELETE FROM embeddings WHERE node_id = ?1", params![id])?;
            tx.execute(
                "DELETE FROM graph_edges WHERE from_id = ?1 OR to_id = ?1",
                params![id],
            )?;
            let changed = tx.execute("DELETE FROM knowledge_nodes WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }

    pub fn get_all_nodes(&self, limit: i64, offset: i64) -> Result<Vec<KnowledgeNode>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT * FROM knowledge_nodes ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit, offset], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_recent_nodes(&self, limit: i64, offset: i64) -> Result<Vec<KnowledgeNode>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT * FROM knowledge_nodes ORDER BY last_accessed_at DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit, offset], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_nodes(&self) -> Result<i64> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        conn.query_row("SELECT COUNT(*) FROM knowledge_nodes", [], |r| r.get(0))
            .map_err(StorageError::from)
    }

    /// Nodes ordered by `last_accessed_at asc`, for the consolidation sweep (§4.3).
    pub fn nodes_by_last_accessed_asc(&self, limit: i64) -> Result<Vec<KnowledgeNode>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn
            .prepare("SELECT * FROM knowledge_nodes ORDER BY last_accessed_at ASC LIMIT ?1")?;
        let rows = stmt
            .query_map(params![limit], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_nodes_without_embedding(&self) -> Result<i64> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        conn.query_row(
            "SELECT COUNT(*) FROM knowledge_nodes n
             WHERE NOT EXISTS (SELECT 1 FROM embeddings e WHERE e.node_id = n.id)",
            [],
            |r| r.get(0),
        )
        .map_err(StorageError::from)
    }

    // ------------------------------------------------------------------
    // Full-text / LIKE candidates (§4.1 FTS contract, consumed by search::keyword)
    // ------------------------------------------------------------------

    /// FTS5 match, returning `(node, relevance in [0,1])` ordered by relevance desc.
    pub fn fts_candidates(&self, query: &str, k: i64) -> Result<Vec<(KnowledgeNode, f32)>> {
        let sanitized = sanitize_fts5_query(query);
        if sanitized.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT n.*, bm25(knowledge_fts) as rank FROM knowledge_fts
             JOIN knowledge_nodes n ON n.id = knowledge_fts.id
             WHERE knowledge_fts MATCH ?1
             ORDER BY rank ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![sanitized, k], |row| {
            let node = row_to_node(row)?;
            let rank: f64 = row.get("rank")?;
            Ok((node, rank))
        });
        match rows {
            Ok(mapped) => {
                let collected: std::result::Result<Vec<_>, _> = mapped.collect();
                let collected = collected?;
                Ok(collected
                    .into_iter()
                    .map(|(node, rank)| (node, fts_relevance(rank)))
                    .collect())
            }
            Err(_) => Ok(Vec::new()),
        }
    }

    /// `LIKE` fallback when FTS5 is unavailable (§4.1).
    pub fn like_candidates(&self, query: &str, k: i64) -> Result<Vec<(KnowledgeNode, f32)>> {
        let pattern = format!("%{}%", query.replace('%', "").replace('_', ""));
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT * FROM knowledge_nodes
             WHERE content LIKE ?1 OR summary LIKE ?1 OR tags LIKE ?1
             ORDER BY retention_strength DESC, access_count DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![pattern, k], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(rank, node)| (node, (1.0 - 0.1 * rank as f32).max(0.0)))
            .collect())
    }

    // ------------------------------------------------------------------
    // Embeddings
    // ------------------------------------------------------------------

    pub fn save_embedding(&self, node_id: &str, vector: &[f32], model: &str) -> Result<()> {
        let bytes: Vec<u8> = vector.iter().flat_map(|f| f.to_le_bytes()).collect();
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO embeddings (node_id, embedding, model, created_at) VALUES (?1,?2,?3,?4)
                 ON CONFLICT(node_id) DO UPDATE SET embedding=excluded.embedding, model=excluded.model,
                 created_at=excluded.created_at",
                params![node_id, bytes, model, to_rfc3339(Utc::now())],
            )?;
            Ok(())
        })
    }

    pub fn get_embedding(&self, node_id: &str) -> Result<Option<Vec<f32>>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let bytes: Option<Vec<u8>> = conn
            .query_row(
                "SELECT embedding FROM embeddings WHERE node_id = ?1",
                params![node_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(bytes.map(|b| {
            b.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        }))
    }

    pub fn all_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare("SELECT node_id, embedding FROM embeddings")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((id, bytes))
        })?;
        let mut out = Vec::new();
        for r in rows {
            let (id, bytes) = r?;
            let vector = bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            out.push((id, vector));
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Idempotent on `(from, to, type)`: updates weight/metadata on conflict.
    pub fn insert_edge(&self, edge: &GraphEdge) -> Result<()> {
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO graph_edges (id, from_id, to_id, edge_type, weight, metadata, created_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)
                 ON CONFLICT(from_id, to_id, edge_type) DO UPDATE SET weight=excluded.weight,
                 metadata=excluded.metadata",
                params![
                    edge.id,
                    edge.from_id,
                    edge.to_id,
                    edge.edge_type.as_str(),
                    edge.weight,
                    edge.metadata.as_ref().map(|v| v.to_string()),
                    to_rfc3339(edge.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn edges_touching(&self, id: &str) -> Result<Vec<GraphEdge>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, from_id, to_id, edge_type, weight, metadata, created_at
             FROM graph_edges WHERE from_id = ?1 OR to_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![id], row_to_edge)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn edges_from(&self, id: &str) -> Result<Vec<GraphEdge>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, from_id, to_id, edge_type, weight, metadata, created_at
             FROM graph_edges WHERE from_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![id], row_to_edge)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // People
    // ------------------------------------------------------------------

    pub fn insert_person(&self, person: &Person) -> Result<()> {
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO people (id, name, aliases, relationship_type, organization, role,
                    location, socials, contact_frequency, relationship_health, shared_topics,
                    shared_projects, created_at, updated_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
                params![
                    person.id,
                    person.name,
                    to_json(&person.aliases),
                    person.relationship_type,
                    person.organization,
                    person.role,
                    person.location,
                    serde_json::to_string(&person.socials).unwrap_or_default(),
                    person.contact_frequency,
                    person.relationship_health,
                    to_json(&person.shared_topics),
                    to_json(&person.shared_projects),
                    to_rfc3339(person.created_at),
                    to_rfc3339(person.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_person(&self, id: &str) -> Result<Option<Person>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        conn.query_row("SELECT * FROM people WHERE id = ?1", params![id], row_to_person)
            .optional()
            .map_err(StorageError::from)
    }

    pub fn list_people(&self) -> Result<Vec<Person>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare("SELECT * FROM people ORDER BY name ASC")?;
        let rows = stmt
            .query_map([], row_to_person)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Metadata, health, stats
    // ------------------------------------------------------------------

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO vestige_metadata (key, value, updated_at) VALUES (?1,?2,?3)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
                params![key, value, to_rfc3339(Utc::now())],
            )?;
            Ok(())
        })
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        conn.query_row(
            "SELECT value FROM vestige_metadata WHERE key = ?1",
            params![key],
            |r| r.get(0),
        )
        .optional()
        .map_err(StorageError::from)
    }

    pub fn get_database_size(&self) -> Result<DatabaseSize> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |r| r.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |r| r.get(0))?;
        let bytes = page_count * page_size;
        Ok(DatabaseSize {
            bytes,
            mb: bytes as f64 / (1024.0 * 1024.0),
        })
    }

    /// Lightweight health check: integrity + presence of FTS shadow tables.
    pub fn check_health(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut warnings = Vec::new();
        let integrity: String = conn
            .query_row("PRAGMA quick_check", [], |r| r.get(0))
            .unwrap_or_else(|_| "error".to_string());
        if integrity != "ok" {
            warnings.push(format!("quick_check reported: {integrity}"));
        }
        let fts_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM knowledge_fts", [], |r| r.get(0))
            .unwrap_or(-1);
        let node_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM knowledge_nodes", [], |r| r.get(0))
            .unwrap_or(-1);
        if fts_count != node_count {
            warnings.push(format!(
                "fts row count ({fts_count}) diverges from node count ({node_count})"
            ));
        }
        Ok(warnings)
    }

    pub fn get_stats(&self) -> Result<MemoryStats> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let total_nodes: i64 = conn.query_row("SELECT COUNT(*) FROM knowledge_nodes", [], |r| r.get(0))?;
        if total_nodes == 0 {
            return Ok(MemoryStats::default());
        }
        let due: i64 = conn.query_row(
            "SELECT COUNT(*) FROM knowledge_nodes WHERE next_review IS NULL OR next_review <= ?1",
            params![to_rfc3339(Utc::now())],
            |r| r.get(0),
        )?;
        let (avg_retention, avg_storage, avg_retrieval): (f64, f64, f64) = conn.query_row(
            "SELECT AVG(retention_strength), AVG(storage_strength), AVG(retrieval_strength)
             FROM knowledge_nodes",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        let oldest: Option<String> =
            conn.query_row("SELECT MIN(created_at) FROM knowledge_nodes", [], |r| r.get(0))?;
        let newest: Option<String> =
            conn.query_row("SELECT MAX(created_at) FROM knowledge_nodes", [], |r| r.get(0))?;
        let with_embeddings: i64 =
            conn.query_row("SELECT COUNT(*) FROM embeddings", [], |r| r.get(0))?;
        Ok(MemoryStats {
            total_nodes,
            nodes_due_for_review: due,
            average_retention: avg_retention,
            average_storage_strength: avg_storage,
            average_retrieval_strength: avg_retrieval,
            oldest_memory: oldest.and_then(|s| from_rfc3339(&s)),
            newest_memory: newest.and_then(|s| from_rfc3339(&s)),
            nodes_with_embeddings: with_embeddings,
        })
    }
}

// ============================================================================
// Row mapping helpers
// ============================================================================

fn row_to_node(row: &Row) -> rusqlite::Result<KnowledgeNode> {
    Ok(KnowledgeNode {
        id: row.get("id")?,
        content: row.get("content")?,
        summary: row.get("summary")?,
        created_at: get_dt(row, "created_at")?,
        updated_at: get_dt(row, "updated_at")?,
        last_accessed_at: get_dt(row, "last_accessed_at")?,
        access_count: row.get("access_count")?,
        review_count: row.get("review_count")?,
        source_type: SourceType::parse_name(&row.get::<_, String>("source_type")?),
        source_platform: parse_source_platform(&row.get::<_, String>("source_platform")?),
        source_id: row.get("source_id")?,
        source_url: row.get("source_url")?,
        source_chain: from_json(&row.get::<_, String>("source_chain")?),
        stability: row.get("stability")?,
        difficulty: row.get("difficulty")?,
        state: parse_state(&row.get::<_, String>("state")?),
        last_review: get_opt_dt(row, "last_review")?,
        next_review: get_opt_dt(row, "next_review")?,
        reps: row.get("reps")?,
        lapses: row.get("lapses")?,
        storage_strength: row.get("storage_strength")?,
        retrieval_strength: row.get("retrieval_strength")?,
        retention_strength: row.get("retention_strength")?,
        stability_factor: row.get("stability_factor")?,
        sentiment_intensity: row.get("sentiment_intensity")?,
        confidence: row.get("confidence")?,
        is_contradicted: row.get("is_contradicted")?,
        contradiction_ids: from_json(&row.get::<_, String>("contradiction_ids")?),
        tags: from_json(&row.get::<_, String>("tags")?),
        people: from_json(&row.get::<_, String>("people")?),
        concepts: from_json(&row.get::<_, String>("concepts")?),
        events: from_json(&row.get::<_, String>("events")?),
        git_branch: row.get("git_branch")?,
        git_commit: row.get("git_commit")?,
        git_uncommitted_paths: from_json(&row.get::<_, String>("git_uncommitted_paths")?),
    })
}

fn row_to_edge(row: &Row) -> rusqlite::Result<GraphEdge> {
    let edge_type_str: String = row.get("edge_type")?;
    let metadata: Option<String> = row.get("metadata")?;
    Ok(GraphEdge {
        id: row.get("id")?,
        from_id: row.get("from_id")?,
        to_id: row.get("to_id")?,
        edge_type: EdgeType::parse_name(&edge_type_str).unwrap_or(EdgeType::RelatesTo),
        weight: row.get("weight")?,
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
        created_at: get_dt(row, "created_at")?,
    })
}

fn row_to_person(row: &Row) -> rusqlite::Result<Person> {
    let socials_str: String = row.get("socials")?;
    Ok(Person {
        id: row.get("id")?,
        name: row.get("name")?,
        aliases: from_json(&row.get::<_, String>("aliases")?),
        relationship_type: row.get("relationship_type")?,
        organization: row.get("organization")?,
        role: row.get("role")?,
        location: row.get("location")?,
        socials: serde_json::from_str(&socials_str).unwrap_or_default(),
        contact_frequency: row.get("contact_frequency")?,
        relationship_health: row.get("relationship_health")?,
        shared_topics: from_json(&row.get::<_, String>("shared_topics")?),
        shared_projects: from_json(&row.get::<_, String>("shared_projects")?),
        created_at: get_dt(row, "created_at")?,
        updated_at: get_dt(row, "updated_at")?,
    })
}

fn get_dt(row: &Row, col: &str) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(col)?;
    from_rfc3339(&s).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(0, col.to_string(), rusqlite::types::Type::Text)
    })
}

fn get_opt_dt(row: &Row, col: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(col)?;
    Ok(s.and_then(|s| from_rfc3339(&s)))
}

fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn from_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

fn from_json<T: serde::de::DeserializeOwned + Default>(s: &str) -> T {
    serde_json::from_str(s).unwrap_or_default()
}

fn state_str(state: SchedulingState) -> &'static str {
    match state {
        SchedulingState::New => "new",
        SchedulingState::Learning => "learning",
        SchedulingState::Review => "review",
        SchedulingState::Relearning => "relearning",
    }
}

fn parse_state(s: &str) -> SchedulingState {
    match s {
        "learning" => SchedulingState::Learning,
        "review" => SchedulingState::Review,
        "relearning" => SchedulingState::Relearning,
        _ => SchedulingState::New,
    }
}

fn source_platform_str(platform: &SourcePlatform) -> String {
    match platform {
        SourcePlatform::Api => "api".to_string(),
        SourcePlatform::NaturalLanguage => "natural_language".to_string(),
        SourcePlatform::Inferred => "inferred".to_string(),
        SourcePlatform::Active => "active".to_string(),
        SourcePlatform::Snoozed => "snoozed".to_string(),
        SourcePlatform::Fulfilled => "fulfilled".to_string(),
        SourcePlatform::Cancelled => "cancelled".to_string(),
        SourcePlatform::Expired => "expired".to_string(),
        SourcePlatform::Custom(s) => s.clone(),
    }
}

fn parse_source_platform(s: &str) -> SourcePlatform {
    match s {
        "api" => SourcePlatform::Api,
        "natural_language" => SourcePlatform::NaturalLanguage,
        "inferred" => SourcePlatform::Inferred,
        "active" => SourcePlatform::Active,
        "snoozed" => SourcePlatform::Snoozed,
        "fulfilled" => SourcePlatform::Fulfilled,
        "cancelled" => SourcePlatform::Cancelled,
        "expired" => SourcePlatform::Expired,
        other => SourcePlatform::Custom(other.to_string()),
    }
}

/// FTS returns negative BM25 (more negative = better); map to `[0,1]` per §4.1.
fn fts_relevance(rank: f64) -> f32 {
    (1.0 + rank / 10.0).clamp(0.0, 1.0) as f32
}

/// Strips FTS5 syntax characters a free-text query should not be able to
/// inject (quotes, `NEAR`, column filters); wraps terms for prefix matching.
pub fn sanitize_fts5_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .map(|term| format!("\"{term}\""))
        .collect::<Vec<_>>()
        .join(" ")
}
