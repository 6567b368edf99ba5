//! Core domain logic for personal course timetables.
//! This crate owns the undo/redo command history and its persistence rules.

pub mod config;
pub mod db;
pub mod directory;
pub mod history;
pub mod logging;
pub mod model;
pub mod share;
pub mod source;
pub mod store;

pub use config::{ConfigError, DirectoryConfig, HistoryConfig};
pub use directory::{DirectoryError, SaveDirectory, DEFAULT_SAVE_NAME};
pub use history::snapshot::LessonSave;
pub use history::CommandHistory;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::lesson::{
    parse_detailed_time, DayOfWeek, DetailedTime, Lesson, LessonId, LessonRecord, Semester, Time,
};
pub use share::{decode_save, decode_share_uri, encode_save, encode_share_uri, ShareError};
pub use source::{
    parse_lesson_table, HtmlTableSource, LessonAlternatives, LessonQuery, LessonSource,
    QueryMode, SourceError, SourceResult,
};
pub use store::{DurableStore, MemoryStore, SqliteStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
