//! Compact shareable encoding of a save.
//!
//! # Responsibility
//! - Shrink a `LessonSave` for sharing by omitting empty and re-derivable
//!   fields.
//! - Rebuild a full save (with a fresh id) from the compact form.
//! - Wrap the compact form into a percent-encoded string for share links.
//!
//! # Invariants
//! - Day/start/end are omitted only when the detailed-time string yields the
//!   same value; decoding re-derives them from that string.
//! - The encoding is lossy for lessons whose explicit time is unset while the
//!   detailed-time string carries one: decoding fills the derived value in.
//! - Decoded lesson identifiers are recomputed from content.
//! - The link form never starts with `{` (it is escaped to `%7B`), so raw
//!   compact JSON and link strings are told apart by their first byte.

use crate::history::snapshot::LessonSave;
use crate::model::lesson::{parse_detailed_time, DayOfWeek, Lesson, LessonRecord, Semester, Time};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;
use uuid::Uuid;

#[derive(Debug)]
pub enum ShareError {
    Decode(serde_json::Error),
    Encode(serde_json::Error),
    Link(FromUtf8Error),
}

impl Display for ShareError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "shared timetable is malformed: {err}"),
            Self::Encode(err) => write!(f, "timetable could not be encoded: {err}"),
            Self::Link(err) => write!(f, "share link is not valid utf-8: {err}"),
        }
    }
}

impl Error for ShareError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::Link(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedLesson {
    subject_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day: Option<DayOfWeek>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detailed_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    semester: Option<Semester>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    course_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    teacher_and_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edited: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EncodedSave {
    name: String,
    lessons: Vec<EncodedLesson>,
}

/// Encodes a save into its compact JSON form.
pub fn encode_save(save: &LessonSave) -> Result<String, ShareError> {
    let encoded = EncodedSave {
        name: save.save_name.clone(),
        lessons: save.lessons.iter().map(encode_lesson).collect(),
    };
    serde_json::to_string(&encoded).map_err(ShareError::Encode)
}

/// Decodes a compact save. The result carries a freshly generated id.
pub fn decode_save(raw: &str) -> Result<LessonSave, ShareError> {
    let encoded: EncodedSave = serde_json::from_str(raw).map_err(ShareError::Decode)?;
    Ok(LessonSave {
        id: Uuid::new_v4().to_string(),
        save_name: encoded.name,
        lessons: encoded.lessons.into_iter().map(decode_lesson).collect(),
        last_modification: 0,
    })
}

/// Encodes a save into a percent-encoded string safe to embed in a URL.
pub fn encode_share_uri(save: &LessonSave) -> Result<String, ShareError> {
    let compact = encode_save(save)?;
    Ok(urlencoding::encode(&compact).into_owned())
}

/// Decodes a share link produced by `encode_share_uri`.
///
/// Raw compact JSON is accepted as well.
pub fn decode_share_uri(raw: &str) -> Result<LessonSave, ShareError> {
    let raw = raw.trim();
    if raw.starts_with('{') {
        return decode_save(raw);
    }
    let compact = urlencoding::decode(raw).map_err(ShareError::Link)?;
    decode_save(&compact)
}

fn encode_lesson(record: &LessonRecord) -> EncodedLesson {
    let lesson = &record.lesson;
    let derived = parse_detailed_time(lesson.detailed_time.as_deref());

    EncodedLesson {
        subject_name: lesson.subject_name.clone(),
        subject_code: non_empty(&lesson.subject_code),
        day: unless_derived(lesson.day, derived.day),
        start_time: unless_derived(lesson.start_time, derived.start_time),
        end_time: unless_derived(lesson.end_time, derived.end_time),
        detailed_time: lesson.detailed_time.clone(),
        semester: lesson.semester,
        location: non_empty(&lesson.location),
        course_type: lesson.course_type.clone(),
        course_code: non_empty(&lesson.course_code),
        teacher_and_comment: non_empty(&lesson.teacher_and_comment),
        edited: record.edited.then_some(true),
    }
}

fn decode_lesson(encoded: EncodedLesson) -> LessonRecord {
    let derived = parse_detailed_time(encoded.detailed_time.as_deref());

    let lesson = Lesson {
        subject_name: encoded.subject_name,
        subject_code: encoded.subject_code.unwrap_or_default(),
        day: encoded.day.or(derived.day),
        start_time: encoded.start_time.or(derived.start_time),
        end_time: encoded.end_time.or(derived.end_time),
        detailed_time: encoded.detailed_time,
        semester: encoded.semester,
        location: encoded.location.unwrap_or_default(),
        course_type: encoded.course_type,
        course_code: encoded.course_code.unwrap_or_default(),
        teacher_and_comment: encoded.teacher_and_comment.unwrap_or_default(),
    };
    LessonRecord::with_edited(lesson, encoded.edited.unwrap_or(false))
}

/// Keeps `explicit` only when the derived value cannot reproduce it.
fn unless_derived<T: PartialEq>(explicit: Option<T>, derived: Option<T>) -> Option<T> {
    if derived.is_some() && (explicit.is_none() || explicit == derived) {
        None
    } else {
        explicit
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::{decode_save, decode_share_uri, encode_save, encode_share_uri, ShareError};
    use crate::history::snapshot::LessonSave;
    use crate::model::lesson::{DayOfWeek, Lesson, LessonRecord, Semester, Time};

    fn listed_lesson() -> Lesson {
        Lesson {
            subject_name: "Analízis".to_string(),
            subject_code: "MAT1".to_string(),
            day: Some(DayOfWeek::Wednesday),
            start_time: Some(Time::new(12, 0)),
            end_time: Some(Time::new(13, 30)),
            detailed_time: Some("Szerda 12:00-13:30".to_string()),
            semester: Some(Semester::new(2024, false)),
            location: String::new(),
            course_type: "előadás".to_string(),
            course_code: "1".to_string(),
            teacher_and_comment: String::new(),
        }
    }

    #[test]
    fn derivable_and_empty_fields_are_omitted() {
        let save = LessonSave {
            id: "x".to_string(),
            save_name: "Ősz".to_string(),
            lessons: vec![LessonRecord::new(listed_lesson())],
            last_modification: 7,
        };
        let raw = encode_save(&save).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let lesson = &json["lessons"][0];

        assert!(lesson.get("day").is_none());
        assert!(lesson.get("startTime").is_none());
        assert!(lesson.get("location").is_none());
        assert!(lesson.get("edited").is_none());
        assert_eq!(lesson["subjectCode"], "MAT1");
    }

    #[test]
    fn decoding_restores_identical_lessons_under_a_new_id() {
        let mut moved = listed_lesson();
        moved.start_time = Some(Time::new(12, 15));
        let save = LessonSave {
            id: "x".to_string(),
            save_name: "Ősz".to_string(),
            lessons: vec![
                LessonRecord::new(listed_lesson()),
                LessonRecord::with_edited(moved, true),
            ],
            last_modification: 7,
        };

        let decoded = decode_save(&encode_save(&save).unwrap()).unwrap();
        assert_ne!(decoded.id, save.id);
        assert_eq!(decoded.save_name, save.save_name);
        assert_eq!(decoded.lessons, save.lessons);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(decode_save("{not json").is_err());
    }

    #[test]
    fn share_uri_is_url_safe_and_decodes_back() {
        let save = LessonSave {
            id: "x".to_string(),
            save_name: "Tavasz 100%".to_string(),
            lessons: vec![LessonRecord::new(listed_lesson())],
            last_modification: 7,
        };

        let link = encode_share_uri(&save).unwrap();
        assert!(link
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.~%".contains(c)));

        let decoded = decode_share_uri(&link).unwrap();
        assert_eq!(decoded.save_name, save.save_name);
        assert_eq!(decoded.lessons, save.lessons);

        let from_json = decode_share_uri(&encode_save(&save).unwrap()).unwrap();
        assert_eq!(from_json.lessons, save.lessons);
    }

    #[test]
    fn share_uri_with_invalid_utf8_escape_is_an_error() {
        assert!(matches!(decode_share_uri("%FF%FE"), Err(ShareError::Link(_))));
    }
}
