//! Lesson domain model shared by history, storage and lesson sources.
//!
//! # Responsibility
//! - Define the canonical lesson shapes persisted in timetable snapshots.
//! - Derive stable content identifiers for lesson records.
//!
//! # Invariants
//! - A lesson record identifier is derived from lesson content, never assigned.
//! - Persisted JSON field names stay camelCase for snapshot compatibility.

pub mod lesson;
