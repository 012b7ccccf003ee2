//! SQLite store
//!
//! The connection is opened lazily by [`Store::connect`], so a store can be
//! built from configuration before the crawl decides to use it.

use crate::state::CrawlTarget;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StoreError, StoreResult};
use crate::url::store_key;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// A page as read back from the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub key: String,
    pub url: String,
    pub host: String,
    pub scheme: String,
    pub text: Vec<String>,
    pub links: Vec<String>,
    pub fetched_at: Option<String>,
    pub depth: u32,
    pub found_via: Option<String>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite storage backend
pub struct SqliteStore {
    location: Location,
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Creates a store backed by the database file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            conn: None,
        }
    }

    /// Creates a store backed by a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: None,
        }
    }

    fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::NotConnected)
    }

    /// Total number of stored pages
    pub fn count_pages(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Page counts per content type, most common first
    pub fn count_by_content_type(&self) -> StoreResult<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT content_type, COUNT(*) AS n FROM pages
             GROUP BY content_type ORDER BY n DESC, content_type ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let counts = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Looks a page up by any spelling of its URL that maps to the same key
    pub fn get_page(&self, url: &str) -> StoreResult<Option<StoredPage>> {
        let key = store_key(url).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let row = self
            .conn()?
            .query_row(
                "SELECT key, url, host, scheme, text, links, fetched_at, depth, found_via, content_type
                 FROM pages WHERE key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, u32>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()?;

        let Some((key, url, host, scheme, text, links, fetched_at, depth, found_via, content_type)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(StoredPage {
            key,
            url,
            host,
            scheme,
            text: serde_json::from_str(&text)?,
            links: serde_json::from_str(&links)?,
            fetched_at,
            depth,
            found_via,
            content_type,
        }))
    }
}

impl Store for SqliteStore {
    fn connect(&mut self) -> StoreResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = match &self.location {
            Location::File(path) => {
                let conn = Connection::open(path)?;
                conn.execute_batch(
                    "
                    PRAGMA journal_mode = WAL;
                    PRAGMA synchronous = NORMAL;
                    PRAGMA temp_store = MEMORY;
                ",
                )?;
                conn
            }
            Location::Memory => Connection::open_in_memory()?,
        };

        initialize_schema(&conn)?;
        tracing::debug!(location = ?self.location, "store connected");
        self.conn = Some(conn);
        Ok(())
    }

    fn insert(&mut self, target: &CrawlTarget) -> StoreResult<()> {
        let key = store_key(&target.url).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let text = serde_json::to_string(&target.text)?;
        let links = serde_json::to_string(&target.links)?;
        let now = Utc::now().to_rfc3339();

        self.conn()?.execute(
            "INSERT INTO pages
                (key, url, host, scheme, text, links, fetched_at, depth, found_via, content_type, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(key) DO UPDATE SET
                url = excluded.url,
                host = excluded.host,
                scheme = excluded.scheme,
                text = excluded.text,
                links = excluded.links,
                fetched_at = excluded.fetched_at,
                depth = excluded.depth,
                found_via = excluded.found_via,
                content_type = excluded.content_type,
                stored_at = excluded.stored_at",
            params![
                key,
                target.url,
                target.host,
                target.scheme,
                text,
                links,
                target.fetched_at,
                target.depth,
                target.found_via,
                target.content_type,
                now,
            ],
        )?;
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
            tracing::debug!(location = ?self.location, "store closed");
        }
        Ok(())
    }
}
