use crate::cache::{CacheError, CacheStore, UpdateFn};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// SQLite-backed translation cache.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the cache database and its table
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Failed to open database at {}", database_path))?;

        // Other processes may hold the write lock briefly
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create translations table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Number of cached source texts
    pub fn entry_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM translations", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

impl CacheStore for Database {
    fn view(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM translations WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<(), CacheError> {
        let mut conn = self.lock()?;

        // IMMEDIATE takes the write lock before the read, so concurrent
        // writers on other connections cannot interleave
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<Vec<u8>> = tx
            .query_row(
                "SELECT value FROM translations WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        // Dropping the transaction on error rolls it back
        let next = apply(current.as_deref())?;

        tx.execute(
            "INSERT INTO translations (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, next, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cache_key;
    use crate::i18n::{LanguageTag, TaggedString};
    use tempfile::TempDir;

    // ==================== Helper Functions ====================

    /// Create a temporary database for testing
    fn create_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test_translations.db");
        let db = Database::new(db_path.to_str().unwrap()).expect("Failed to create database");
        (db, temp_dir)
    }

    fn put(db: &Database, key: &str, value: &[u8]) {
        db.update(key, &mut |_| Ok(value.to_vec()))
            .expect("Should write");
    }

    // ==================== Initialization Tests ====================

    #[test]
    fn test_database_creation() {
        let (db, _temp_dir) = create_test_db();
        assert_eq!(db.entry_count().expect("Should count"), 0);
    }

    #[test]
    fn test_invalid_database_path() {
        let result = Database::new("/non/existent/path/db.db");
        assert!(result.is_err());
    }

    #[test]
    fn test_database_reopening() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let path_str = db_path.to_str().unwrap();

        {
            let db = Database::new(path_str).expect("Failed to create database");
            put(&db, "language-abc", b"\"animal\"");
        }

        {
            let db = Database::new(path_str).expect("Failed to reopen database");
            assert_eq!(db.entry_count().unwrap(), 1, "Entry should persist");
            assert_eq!(
                db.view("language-abc").unwrap(),
                Some(b"\"animal\"".to_vec())
            );
        }
    }

    // ==================== view / update Tests ====================

    #[test]
    fn test_view_missing_key() {
        let (db, _temp_dir) = create_test_db();
        assert!(db.view("language-missing").unwrap().is_none());
    }

    #[test]
    fn test_update_overwrites_and_sets_timestamp() {
        let (db, _temp_dir) = create_test_db();

        put(&db, "k", b"one");
        put(&db, "k", b"two");

        assert_eq!(db.view("k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(db.entry_count().unwrap(), 1);

        let updated_at: String = db
            .lock()
            .unwrap()
            .query_row(
                "SELECT updated_at FROM translations WHERE key = ?1",
                params!["k"],
                |row| row.get(0),
            )
            .expect("Should have timestamp");
        assert!(chrono::DateTime::parse_from_rfc3339(&updated_at).is_ok());
    }

    #[test]
    fn test_update_receives_current_value() {
        let (db, _temp_dir) = create_test_db();
        put(&db, "k", b"before");

        let mut seen = None;
        db.update("k", &mut |current| {
            seen = current.map(|v| v.to_vec());
            Ok(b"after".to_vec())
        })
        .unwrap();

        assert_eq!(seen, Some(b"before".to_vec()));
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let (db, _temp_dir) = create_test_db();
        put(&db, "k", b"kept");

        let result = db.update("k", &mut |_| {
            Err(TaggedString::from_json("{}").unwrap_err())
        });

        assert!(matches!(result, Err(CacheError::Encoding(_))));
        assert_eq!(db.view("k").unwrap(), Some(b"kept".to_vec()));
    }

    #[test]
    fn test_stores_encoded_tagged_string() {
        let (db, _temp_dir) = create_test_db();

        let mut tms = TaggedString::und("animal");
        tms.set("Tier", LanguageTag::GERMAN, true);
        let key = cache_key("animal");
        put(&db, &key, tms.to_json().unwrap().as_bytes());

        let stored = db.view(&key).unwrap().expect("Should be cached");
        assert_eq!(TaggedString::from_slice(&stored).unwrap(), tms);
    }

    #[test]
    fn test_clones_share_connection() {
        let (db, _temp_dir) = create_test_db();
        let clone = db.clone();
        put(&clone, "k", b"v");
        assert_eq!(db.view("k").unwrap(), Some(b"v".to_vec()));
    }
}
