//! Database connection and operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL mode so thumbnail reads off the main thread do not block writers
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    pub fn remove_setting(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    /// Record a finished visit to a URL
    pub fn record_visit(&self, url: &str, title: &str) -> Result<()> {
        let visited_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            let updated = conn.execute(
                "UPDATE history
                 SET title = CASE WHEN ?1 != '' THEN ?1 ELSE title END,
                     visited_at = ?2,
                     visit_count = visit_count + 1
                 WHERE url = ?3",
                rusqlite::params![title, visited_at, url],
            )?;

            if updated == 0 {
                conn.execute(
                    "INSERT INTO history (url, title, visited_at, visit_count) VALUES (?1, ?2, ?3, 1)",
                    rusqlite::params![url, title, visited_at],
                )?;
            }
            Ok(())
        })
    }

    /// Total visits recorded for a URL, zero if never visited
    pub fn visit_count(&self, url: &str) -> Result<i64> {
        self.with_connection(|conn| {
            let count = conn
                .query_row(
                    "SELECT visit_count FROM history WHERE url = ?1",
                    [url],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(count.unwrap_or(0))
        })
    }

    pub fn clear_history(&self) -> Result<usize> {
        self.with_connection(|conn| Ok(conn.execute("DELETE FROM history", [])?))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM thumbnails", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_settings_round_trip() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_setting("blockPopups").unwrap(), None);

        db.set_setting("blockPopups", "false").unwrap();
        assert_eq!(db.get_setting("blockPopups").unwrap().as_deref(), Some("false"));

        db.remove_setting("blockPopups").unwrap();
        assert_eq!(db.get_setting("blockPopups").unwrap(), None);
    }

    #[test]
    fn test_history_visits() {
        let db = Database::open_in_memory().unwrap();

        db.record_visit("https://example.com/", "Example").unwrap();
        db.record_visit("https://example.com/", "").unwrap();
        db.record_visit("https://rust-lang.org/", "Rust").unwrap();
        assert_eq!(db.visit_count("https://example.com/").unwrap(), 2);

        assert_eq!(db.clear_history().unwrap(), 2);
        assert_eq!(db.visit_count("https://example.com/").unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("skiff.db");

        let db = Database::open(&path).unwrap();
        db.set_setting("k", "v").unwrap();
        assert!(path.exists());
    }
}
