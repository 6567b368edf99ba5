//! Durable key-value store port and its implementations.
//!
//! # Responsibility
//! - Define the `get`/`set`/`remove` contract histories persist through.
//! - Provide in-memory and SQLite-backed implementations.
//!
//! # Invariants
//! - The store is the arbiter of truth for staleness checks: callers re-read
//!   it before mutating and never cache its values.
//! - All methods take `&self`; implementations use interior mutability so one
//!   store can back many histories at once.

use crate::config::ConfigError;
use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key prefix for per-save timetable snapshots.
pub const SAVE_KEY_PREFIX: &str = "save";
/// Key holding the save directory's ordered id list.
pub const SAVE_IDS_KEY: &str = "saveLessonIds";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while reading or writing persisted state.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serde(serde_json::Error),
    InvalidData(String),
    Config(ConfigError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serde(err) => write!(f, "snapshot serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Config(err) => write!(f, "history not created: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serde(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Config(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ConfigError> for StoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Persistence port used by command histories and save directories.
pub trait DurableStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Builds the snapshot key for one save.
pub fn save_key(save_id: &str) -> String {
    format!("{SAVE_KEY_PREFIX}{save_id}")
}
