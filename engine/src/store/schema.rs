//! Backing schema for both backends
//!
//! Timestamps are epoch seconds in plain integer columns so ordering and
//! range filters never depend on a backend's datetime parsing. `meta` holds
//! the JSON document the filter language's dotted paths address: TEXT under
//! SQLite, JSONB under Postgres.

/// Column list every entry SELECT uses, in `EntryRow` field order.
pub const ENTRY_COLUMNS: &str = "id, type, title, slug, content, excerpt, meta, filename, is_index, published_at, created_at, updated_at";

pub const SQLITE_SCHEMA: &str = r#"
-- =============================================================================
-- Entries
-- =============================================================================

CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    title TEXT,
    slug TEXT NOT NULL,
    content TEXT,
    excerpt TEXT,
    meta TEXT NOT NULL DEFAULT '{}',
    filename TEXT NOT NULL DEFAULT '',
    is_index INTEGER NOT NULL DEFAULT 0,
    published_at INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (type, slug)
);

CREATE INDEX IF NOT EXISTS idx_entries_type ON entries (type);
CREATE INDEX IF NOT EXISTS idx_entries_published_at ON entries (published_at);

-- =============================================================================
-- Tags
-- =============================================================================

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT,
    UNIQUE (name, type)
);

CREATE TABLE IF NOT EXISTS entry_tag (
    entry_id INTEGER NOT NULL REFERENCES entries (id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags (id) ON DELETE CASCADE,
    PRIMARY KEY (entry_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_entry_tag_tag ON entry_tag (tag_id);

-- =============================================================================
-- Images
-- =============================================================================

CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id INTEGER NOT NULL REFERENCES entries (id) ON DELETE CASCADE,
    collection TEXT NOT NULL DEFAULT 'default',
    filename TEXT NOT NULL,
    path TEXT NOT NULL,
    mime_type TEXT,
    size INTEGER NOT NULL DEFAULT 0,
    width INTEGER NOT NULL DEFAULT 0,
    height INTEGER NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0,
    custom_properties TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_images_entry ON images (entry_id, collection);
"#;

pub const POSTGRES_SCHEMA: &str = r#"
-- =============================================================================
-- Entries
-- =============================================================================

CREATE TABLE IF NOT EXISTS entries (
    id BIGSERIAL PRIMARY KEY,
    type TEXT NOT NULL,
    title TEXT,
    slug TEXT NOT NULL,
    content TEXT,
    excerpt TEXT,
    meta JSONB NOT NULL DEFAULT '{}',
    filename TEXT NOT NULL DEFAULT '',
    is_index BOOLEAN NOT NULL DEFAULT FALSE,
    published_at BIGINT,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    UNIQUE (type, slug)
);

CREATE INDEX IF NOT EXISTS idx_entries_type ON entries (type);
CREATE INDEX IF NOT EXISTS idx_entries_published_at ON entries (published_at);

-- =============================================================================
-- Tags
-- =============================================================================

CREATE TABLE IF NOT EXISTS tags (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT,
    UNIQUE (name, type)
);

CREATE TABLE IF NOT EXISTS entry_tag (
    entry_id BIGINT NOT NULL REFERENCES entries (id) ON DELETE CASCADE,
    tag_id BIGINT NOT NULL REFERENCES tags (id) ON DELETE CASCADE,
    PRIMARY KEY (entry_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_entry_tag_tag ON entry_tag (tag_id);

-- =============================================================================
-- Images
-- =============================================================================

CREATE TABLE IF NOT EXISTS images (
    id BIGSERIAL PRIMARY KEY,
    entry_id BIGINT NOT NULL REFERENCES entries (id) ON DELETE CASCADE,
    collection TEXT NOT NULL DEFAULT 'default',
    filename TEXT NOT NULL,
    path TEXT NOT NULL,
    mime_type TEXT,
    size BIGINT NOT NULL DEFAULT 0,
    width BIGINT NOT NULL DEFAULT 0,
    height BIGINT NOT NULL DEFAULT 0,
    sort_order BIGINT NOT NULL DEFAULT 0,
    custom_properties JSONB NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_images_entry ON images (entry_id, collection);
"#;
