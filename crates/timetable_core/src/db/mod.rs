//! SQLite connection setup behind `SqliteStore`.
//!
//! # Responsibility
//! - Open file or in-memory connections and bring the `kv_store` schema up
//!   to date.
//! - Report failures with the step that failed (open, schema read,
//!   migration, key access).
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - A connection is handed out only after every pending migration ran.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// SQLite failures, tagged with the step that raised them.
#[derive(Debug)]
pub enum DbError {
    /// Connection could not be opened or configured.
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// `PRAGMA user_version` could not be read.
    SchemaRead(rusqlite::Error),
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// A `kv_store` read or write failed.
    Key {
        key: String,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => write!(f, "cannot open {mode} store: {source}"),
            Self::SchemaRead(source) => write!(f, "cannot read store schema version: {source}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "store migration {version} ({name}) failed: {source}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "store schema version {found} is newer than supported {supported}"
            ),
            Self::Key { key, source } => write!(f, "store access to key `{key}` failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Migration { source, .. }
            | Self::Key { source, .. } => Some(source),
            Self::SchemaRead(source) => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}
