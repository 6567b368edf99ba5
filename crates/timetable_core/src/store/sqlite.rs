//! SQLite-backed durable store.
//!
//! # Invariants
//! - The borrowed connection must come from `db::open_db*` so the
//!   `kv_store` table exists.
//! - `set` is an upsert; `remove` of a missing key is not an error.

use super::{DurableStore, StoreError, StoreResult};
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};

/// Durable store over the `kv_store` table.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DurableStore for SqliteStore<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| key_error(key, source))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )
        .map_err(|source| key_error(key, source))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])
            .map_err(|source| key_error(key, source))?;
        Ok(())
    }
}

fn key_error(key: &str, source: rusqlite::Error) -> StoreError {
    StoreError::Db(DbError::Key {
        key: key.to_string(),
        source,
    })
}
