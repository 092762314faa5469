//! Thumbnail blob store
//!
//! Screenshots are opaque encoded image bytes keyed by the UUID string a tab
//! holds. The store never owns the relationship: tabs reference keys, and
//! `clear_excluding` drops whatever no tab references any more.

use chrono::Utc;
use rusqlite::OptionalExtension;
use std::collections::HashSet;
use std::fmt;

use crate::database::Database;
use crate::Result;

/// Encoded screenshot of a page
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    data: Vec<u8>,
}

impl Thumbnail {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thumbnail").field("len", &self.data.len()).finish()
    }
}

/// Key-value store for thumbnails. Every operation is idempotent.
pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, thumbnail: &Thumbnail) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<Thumbnail>>;

    /// Removes every entry whose key is not in `keys`, returning how many were removed.
    fn clear_excluding(&self, keys: &HashSet<String>) -> Result<usize>;
}

/// `BlobStore` backed by the `thumbnails` table
#[derive(Clone)]
pub struct ThumbnailStore {
    db: Database,
}

impl ThumbnailStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl BlobStore for ThumbnailStore {
    fn put(&self, key: &str, thumbnail: &Thumbnail) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO thumbnails (key, data, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, thumbnail.as_bytes(), updated_at],
            )?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Result<Option<Thumbnail>> {
        self.db.with_connection(|conn| {
            let data: Option<Vec<u8>> = conn
                .query_row("SELECT data FROM thumbnails WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(data.map(Thumbnail::from_bytes))
        })
    }

    fn clear_excluding(&self, keys: &HashSet<String>) -> Result<usize> {
        let removed = self.db.transaction(|conn| {
            let stored: Vec<String> = {
                let mut stmt = conn.prepare("SELECT key FROM thumbnails")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.filter_map(|r| r.ok()).collect()
            };

            let mut removed = 0;
            for key in stored.iter().filter(|key| !keys.contains(*key)) {
                removed += conn.execute("DELETE FROM thumbnails WHERE key = ?1", [key])?;
            }
            Ok(removed)
        })?;

        if removed > 0 {
            tracing::debug!(removed, kept = keys.len(), "Evicted unreferenced thumbnails");
        }

        Ok(removed)
    }
}
