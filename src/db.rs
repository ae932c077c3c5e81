use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

/// Append-only set of comment ids the bot has already replied to.
pub struct DedupStore {
    connection: Connection,
}

impl DedupStore {
    /// Opens (or creates) the store at `db_path`.
    pub fn open(db_path: &Path) -> rusqlite::Result<Self> {
        Self::init(Connection::open(db_path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(connection: Connection) -> rusqlite::Result<Self> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS comments (id TEXT PRIMARY KEY);",
            [],
        )?;
        Ok(DedupStore { connection })
    }

    pub fn has_processed(&self, comment_id: &str) -> rusqlite::Result<bool> {
        let found: Option<String> = self
            .connection
            .query_row(
                "SELECT id FROM comments WHERE id = ?1;",
                params![comment_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Autocommitted, so the id is on disk before this returns.
    pub fn mark_processed(&self, comment_id: &str) -> rusqlite::Result<()> {
        self.connection.execute(
            "INSERT OR IGNORE INTO comments (id) VALUES (?1);",
            params![comment_id],
        )?;
        Ok(())
    }

    pub fn processed_count(&self) -> rusqlite::Result<i64> {
        self.connection
            .query_row("SELECT COUNT(*) FROM comments;", [], |row| row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_empty_store() -> Result<()> {
        let store = DedupStore::open_in_memory()?;
        assert!(!store.has_processed("abc123")?);
        assert_eq!(store.processed_count()?, 0);
        Ok(())
    }

    #[test]
    fn test_mark_then_check() -> Result<()> {
        let store = DedupStore::open_in_memory()?;
        store.mark_processed("abc123")?;
        assert!(store.has_processed("abc123")?);
        assert!(!store.has_processed("abc124")?);
        Ok(())
    }

    #[test]
    fn test_mark_twice_keeps_one_row() -> Result<()> {
        let store = DedupStore::open_in_memory()?;
        store.mark_processed("abc123")?;
        store.mark_processed("abc123")?;
        assert_eq!(store.processed_count()?, 1);
        Ok(())
    }

    #[test]
    fn test_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("comments.db");
        {
            let store = DedupStore::open(&db_path)?;
            store.mark_processed("abc123")?;
        }
        let store = DedupStore::open(&db_path)?;
        assert!(store.has_processed("abc123")?);
        assert_eq!(store.processed_count()?, 1);
        Ok(())
    }
}
