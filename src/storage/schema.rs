//! Database schema definitions
//!
//! One row per crawled page, keyed by the canonical store key so that
//! re-inserting a URL (or a trivially different spelling of it) updates the
//! existing row.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    host TEXT NOT NULL,
    scheme TEXT NOT NULL,
    text TEXT NOT NULL,
    links TEXT NOT NULL,
    fetched_at TEXT,
    depth INTEGER NOT NULL,
    found_via TEXT,
    content_type TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_host ON pages(host);
CREATE INDEX IF NOT EXISTS idx_pages_content_type ON pages(content_type);
"#;

/// Creates the tables if they do not exist yet
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
