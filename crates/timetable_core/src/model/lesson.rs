//! Lesson domain model.
//!
//! # Responsibility
//! - Define `Lesson` and the identified `LessonRecord` wrapper.
//! - Parse and format day, time, semester and detailed-time values.
//!
//! # Invariants
//! - `LessonRecord::id` is the SHA-256 of the lesson's canonical JSON.
//! - Two structurally identical lessons always share one identifier.
//! - `edited` does not participate in identifier derivation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

/// Content-derived lesson identifier (lowercase hex digest).
pub type LessonId = String;

static DETAILED_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+(\d{1,2}:\d{2})-(\d{1,2}:\d{2})")
        .expect("valid detailed time regex")
});

/// Teaching weekday, encoded by the first letter of its Hungarian name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    #[serde(rename = "h")]
    Monday,
    #[serde(rename = "k")]
    Tuesday,
    #[serde(rename = "s")]
    Wednesday,
    #[serde(rename = "c")]
    Thursday,
    #[serde(rename = "p")]
    Friday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 5] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ];

    /// Returns the one-letter wire code.
    pub fn code(self) -> char {
        match self {
            Self::Monday => 'h',
            Self::Tuesday => 'k',
            Self::Wednesday => 's',
            Self::Thursday => 'c',
            Self::Friday => 'p',
        }
    }

    /// Maps a one-letter wire code back to a day.
    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|day| day.code() == code)
    }

    /// Full display name as printed by the lesson source.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Monday => "hétfő",
            Self::Tuesday => "kedd",
            Self::Wednesday => "szerda",
            Self::Thursday => "csütörtök",
            Self::Friday => "péntek",
        }
    }
}

/// Wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
}

impl Time {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Parses `H:MM` / `HH:MM`. Returns `None` for out-of-range values.
    pub fn parse(value: &str) -> Option<Self> {
        let (hour, minute) = value.trim().split_once(':')?;
        let hour = hour.parse::<u8>().ok()?;
        let minute = minute.parse::<u8>().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Minutes elapsed since midnight.
    pub fn minutes(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Academic semester: autumn (`is_spring == false`) or spring of a school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub start_year: i32,
    pub is_spring: bool,
}

impl Semester {
    pub fn new(start_year: i32, is_spring: bool) -> Self {
        Self {
            start_year,
            is_spring,
        }
    }

    /// Parses the `YYYY-YYYY-N` wire form (`N == 2` means spring).
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let start_year = parts.next()?.parse::<i32>().ok()?;
        let _end_year = parts.next()?;
        let term = parts.next()?;
        Some(Self {
            start_year,
            is_spring: term == "2",
        })
    }
}

impl Display for Semester {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.start_year,
            self.start_year + 1,
            if self.is_spring { 2 } else { 1 }
        )
    }
}

/// Structured lesson description as returned by the lesson source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub subject_name: String,
    pub subject_code: String,
    pub day: Option<DayOfWeek>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    /// Free-text schedule, e.g. `Hétfő 08:00-09:30`.
    pub detailed_time: Option<String>,
    pub semester: Option<Semester>,
    pub location: String,
    pub course_type: String,
    pub course_code: String,
    pub teacher_and_comment: String,
}

impl Default for Lesson {
    /// Blank lesson used by manual entry: Monday 08:00-09:00 practice.
    fn default() -> Self {
        Self {
            subject_name: String::new(),
            subject_code: String::new(),
            day: Some(DayOfWeek::Monday),
            start_time: Some(Time::new(8, 0)),
            end_time: Some(Time::new(9, 0)),
            detailed_time: None,
            semester: None,
            location: String::new(),
            course_type: "gyakorlat".to_string(),
            course_code: String::new(),
            teacher_and_comment: String::new(),
        }
    }
}

impl Lesson {
    /// Returns whether the lesson can be placed on a weekly grid.
    pub fn has_timetable_data(&self) -> bool {
        self.day.is_some() && self.start_time.is_some() && self.end_time.is_some()
    }

    /// Derives the content identifier for this lesson.
    pub fn content_id(&self) -> LessonId {
        // Serializing a plain struct of strings/options/numbers cannot fail.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(&canonical))
    }
}

/// Lesson plus its derived identifier; the unit stored in a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub id: LessonId,
    pub lesson: Lesson,
    /// Set when the user changed a lesson that came from the lesson source.
    #[serde(default, skip_serializing_if = "is_false")]
    pub edited: bool,
}

impl LessonRecord {
    /// Wraps a lesson, deriving its identifier from content.
    pub fn new(lesson: Lesson) -> Self {
        Self::with_edited(lesson, false)
    }

    pub fn with_edited(lesson: Lesson, edited: bool) -> Self {
        Self {
            id: lesson.content_id(),
            lesson,
            edited,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Day and times recovered from a detailed-time string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailedTime {
    pub day: Option<DayOfWeek>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
}

/// Parses `<day-prefix> <HH:MM>-<HH:MM>`.
///
/// The day is the lowercase first letter of the prefix. Strings that do not
/// carry a time range (e.g. `Nincs időpont`) yield all-`None`.
pub fn parse_detailed_time(detailed_time: Option<&str>) -> DetailedTime {
    let Some(value) = detailed_time else {
        return DetailedTime::default();
    };
    let Some(captures) = DETAILED_TIME_RE.captures(value) else {
        return DetailedTime::default();
    };

    let day = captures[1]
        .chars()
        .next()
        .and_then(|first| first.to_lowercase().next())
        .and_then(DayOfWeek::from_code);

    DetailedTime {
        day,
        start_time: Time::parse(&captures[2]),
        end_time: Time::parse(&captures[3]),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_detailed_time, DayOfWeek, Lesson, LessonRecord, Semester, Time};

    #[test]
    fn identical_lessons_share_an_identifier() {
        let first = LessonRecord::new(Lesson::default());
        let second = LessonRecord::with_edited(Lesson::default(), true);
        assert_eq!(first.id, second.id);
        assert_eq!(first.id.len(), 64);
    }

    #[test]
    fn any_field_change_changes_the_identifier() {
        let base = Lesson::default();
        let mut moved = base.clone();
        moved.location = "D-0-220".to_string();
        assert_ne!(base.content_id(), moved.content_id());
    }

    #[test]
    fn detailed_time_parses_day_and_range() {
        let parsed = parse_detailed_time(Some("Csütörtök 8:15-09:45"));
        assert_eq!(parsed.day, Some(DayOfWeek::Thursday));
        assert_eq!(parsed.start_time, Some(Time::new(8, 15)));
        assert_eq!(parsed.end_time, Some(Time::new(9, 45)));
    }

    #[test]
    fn detailed_time_without_range_is_empty() {
        assert_eq!(parse_detailed_time(Some("Nincs megadva")), Default::default());
        assert_eq!(parse_detailed_time(None), Default::default());
    }

    #[test]
    fn semester_wire_form_round_trips() {
        let semester = Semester::parse("2024-2025-2").unwrap();
        assert_eq!(semester, Semester::new(2024, true));
        assert_eq!(semester.to_string(), "2024-2025-2");
        assert_eq!(Semester::new(2023, false).to_string(), "2023-2024-1");
    }

    #[test]
    fn time_rejects_out_of_range_values() {
        assert_eq!(Time::parse("24:00"), None);
        assert_eq!(Time::parse("7:60"), None);
        assert_eq!(Time::new(7, 5).to_string(), "07:05");
        assert_eq!(Time::new(1, 30).minutes(), 90);
    }

    #[test]
    fn record_json_uses_snapshot_field_names() {
        let record = LessonRecord::new(Lesson::default());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("edited").is_none());
        assert_eq!(json["lesson"]["courseType"], "gyakorlat");
        assert_eq!(json["lesson"]["day"], "h");
    }
}
