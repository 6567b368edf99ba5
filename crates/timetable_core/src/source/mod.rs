//! Lesson source contract, HTML table parsing and alternative lookup.
//!
//! # Responsibility
//! - Define the `LessonSource` port used to populate timetables.
//! - Parse the course-listing HTML table into structured lessons.
//! - Cache alternative sections of a subject per course type.
//!
//! # Invariants
//! - Sources return records whose identifiers are content-derived.
//! - Transport (HTTP, retries) lives outside this crate.

use crate::model::lesson::{LessonRecord, Semester};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod alternatives;
mod html;

pub use alternatives::LessonAlternatives;
pub use html::{parse_lesson_table, HtmlTableSource};

/// Search strategy understood by the course listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    ByName,
    ByCode,
    ByTeacher,
}

impl QueryMode {
    pub const ALL: [QueryMode; 3] = [QueryMode::ByName, QueryMode::ByCode, QueryMode::ByTeacher];

    /// Wire value of the `m` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::ByName => "keresnevre",
            Self::ByCode => "keres_kod_azon",
            Self::ByTeacher => "keres_okt",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_param() == value)
    }
}

/// One lesson query as handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonQuery {
    pub semester: Semester,
    pub keyword: String,
    pub mode: QueryMode,
}

impl LessonQuery {
    /// Query parameters in wire order: mode, semester, keyword (unescaped).
    pub fn params(&self) -> [(&'static str, String); 3] {
        [
            ("m", self.mode.as_param().to_string()),
            ("f", self.semester.to_string()),
            ("k", self.keyword.clone()),
        ]
    }
}

/// Lesson source failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Transport(String),
    Parse(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "lesson source unavailable: {message}"),
            Self::Parse(message) => write!(f, "lesson listing could not be parsed: {message}"),
        }
    }
}

impl Error for SourceError {}

pub type SourceResult<T> = Result<T, SourceError>;

/// Opaque provider of lesson records.
pub trait LessonSource {
    fn query(&self, query: &LessonQuery) -> SourceResult<Vec<LessonRecord>>;
}

#[cfg(test)]
mod tests {
    use super::{LessonQuery, QueryMode};
    use crate::model::lesson::Semester;

    #[test]
    fn query_params_use_wire_names() {
        let query = LessonQuery {
            semester: Semester::new(2024, true),
            keyword: "Analízis".to_string(),
            mode: QueryMode::ByName,
        };
        let params = query.params();
        assert_eq!(params[0], ("m", "keresnevre".to_string()));
        assert_eq!(params[1], ("f", "2024-2025-2".to_string()));
        assert_eq!(params[2], ("k", "Analízis".to_string()));
    }

    #[test]
    fn mode_params_round_trip() {
        for mode in QueryMode::ALL {
            assert_eq!(QueryMode::from_param(mode.as_param()), Some(mode));
        }
        assert_eq!(QueryMode::from_param("unknown"), None);
    }
}
