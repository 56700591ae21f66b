//! Database migrations (spec §6.2)
//!
//! Schema migrations run once at startup (spec §5); subsequent writes
//! assume the schema is present.

/// A database migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Initial schema: knowledge nodes, embeddings, edges, people, vestige_metadata",
    up: MIGRATION_V1_UP,
}];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS knowledge_nodes (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    summary TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_accessed_at TEXT NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 0,
    review_count INTEGER NOT NULL DEFAULT 0,

    source_type TEXT NOT NULL DEFAULT 'fact',
    source_platform TEXT NOT NULL DEFAULT 'api',
    source_id TEXT,
    source_url TEXT,
    source_chain TEXT NOT NULL DEFAULT '[]',

    stability REAL NOT NULL DEFAULT 2.5,
    difficulty REAL NOT NULL DEFAULT 5.0,
    state TEXT NOT NULL DEFAULT 'new',
    last_review TEXT,
    next_review TEXT,
    reps INTEGER NOT NULL DEFAULT 0,
    lapses INTEGER NOT NULL DEFAULT 0,

    storage_strength REAL NOT NULL DEFAULT 1.0,
    retrieval_strength REAL NOT NULL DEFAULT 1.0,
    retention_strength REAL NOT NULL DEFAULT 1.0,
    stability_factor REAL NOT NULL DEFAULT 1.0,

    sentiment_intensity REAL NOT NULL DEFAULT 0.0,
    confidence REAL NOT NULL DEFAULT 1.0,
    is_contradicted INTEGER NOT NULL DEFAULT 0,
    contradiction_ids TEXT NOT NULL DEFAULT '[]',

    tags TEXT NOT NULL DEFAULT '[]',
    people TEXT NOT NULL DEFAULT '[]',
    concepts TEXT NOT NULL DEFAULT '[]',
    events TEXT NOT NULL DEFAULT '[]',

    git_branch TEXT,
    git_commit TEXT,
    git_uncommitted_paths TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_nodes_created_at ON knowledge_nodes(created_at);
CREATE INDEX IF NOT EXISTS idx_nodes_last_accessed_at ON knowledge_nodes(last_accessed_at);
CREATE INDEX IF NOT EXISTS idx_nodes_retention ON knowledge_nodes(retention_strength);
CREATE INDEX IF NOT EXISTS idx_nodes_next_review ON knowledge_nodes(next_review);
CREATE INDEX IF NOT EXISTS idx_nodes_state ON knowledge_nodes(state);

CREATE TABLE IF NOT EXISTS embeddings (
    node_id TEXT PRIMARY KEY REFERENCES knowledge_nodes(id) ON DELETE CASCADE,
    embedding BLOB NOT NULL,
    model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS graph_edges (
    id TEXT PRIMARY KEY,
    from_id TEXT NOT NULL,
    to_id TEXT NOT NULL,
    edge_type TEXT NOT NULL,
    weight REAL NOT NULL DEFAULT 1.0,
    metadata TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(from_id, to_id, edge_type)
);

CREATE INDEX IF NOT EXISTS idx_edges_from ON graph_edges(from_id);
CREATE INDEX IF NOT EXISTS idx_edges_to ON graph_edges(to_id);
CREATE INDEX IF NOT EXISTS idx_edges_type ON graph_edges(edge_type);

CREATE TABLE IF NOT EXISTS people (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    aliases TEXT NOT NULL DEFAULT '[]',
    relationship_type TEXT,
    organization TEXT,
    role TEXT,
    location TEXT,
    socials TEXT NOT NULL DEFAULT '{}',
    contact_frequency REAL NOT NULL DEFAULT 0.0,
    relationship_health REAL NOT NULL DEFAULT 0.5,
    shared_topics TEXT NOT NULL DEFAULT '[]',
    shared_projects TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vestige_metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- FTS5 virtual table mirroring (id, content, summary, tags), kept in sync by
-- triggers (spec §4.1, §6.2).
CREATE VIRTUAL TABLE IF NOT EXISTS knowledge_fts USING fts5(
    id UNINDEXED,
    content,
    summary,
    tags,
    tokenize = 'unicode61'
);

CREATE TRIGGER IF NOT EXISTS knowledge_nodes_ai AFTER INSERT ON knowledge_nodes BEGIN
    INSERT INTO knowledge_fts(id, content, summary, tags)
    VALUES (new.id, new.content, coalesce(new.summary, ''), new.tags);
END;

CREATE TRIGGER IF NOT EXISTS knowledge_nodes_ad AFTER DELETE ON knowledge_nodes BEGIN
    DELETE FROM knowledge_fts WHERE id = old.id;
END;

CREATE TRIGGER IF NOT EXISTS knowledge_nodes_au AFTER UPDATE ON knowledge_nodes BEGIN
    DELETE FROM knowledge_fts WHERE id = old.id;
    INSERT INTO knowledge_fts(id, content, summary, tags)
    VALUES (new.id, new.content, coalesce(new.summary, ''), new.tags);
END;
"#;
