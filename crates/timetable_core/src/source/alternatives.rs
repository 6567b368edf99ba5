//! Alternative sections of a subject, grouped by course type.
//!
//! # Invariants
//! - One source query per (subject code, semester); later lookups are cached.
//! - Only records whose subject code and semester match exactly are kept.

use super::{LessonQuery, LessonSource, QueryMode, SourceResult};
use crate::model::lesson::{Lesson, LessonRecord, Semester};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AlternativeKey {
    subject_code: String,
    semester: Semester,
    course_type: String,
}

/// Per-session cache of same-subject lessons from a `LessonSource`.
pub struct LessonAlternatives<'a, L: LessonSource + ?Sized> {
    source: &'a L,
    groups: HashMap<AlternativeKey, Vec<LessonRecord>>,
    queried: HashSet<(String, Semester)>,
}

impl<'a, L: LessonSource + ?Sized> LessonAlternatives<'a, L> {
    pub fn new(source: &'a L) -> Self {
        Self {
            source,
            groups: HashMap::new(),
            queried: HashSet::new(),
        }
    }

    /// Loads every section of `subject_code` in `semester`.
    pub fn add_alternatives(&mut self, subject_code: &str, semester: Semester) -> SourceResult<()> {
        let marker = (subject_code.to_string(), semester);
        if self.queried.contains(&marker) {
            return Ok(());
        }

        let records = self.source.query(&LessonQuery {
            semester,
            keyword: subject_code.to_string(),
            mode: QueryMode::ByCode,
        })?;

        for record in records.into_iter().filter(|record| {
            record.lesson.subject_code == subject_code && record.lesson.semester == Some(semester)
        }) {
            let key = AlternativeKey {
                subject_code: subject_code.to_string(),
                semester,
                course_type: record.lesson.course_type.clone(),
            };
            let group = self.groups.entry(key).or_default();
            if !group.iter().any(|existing| existing.id == record.id) {
                group.push(record);
            }
        }

        self.queried.insert(marker);
        Ok(())
    }

    /// Loads alternatives for `lesson`; lessons without a semester are skipped.
    pub fn add_alternatives_to(&mut self, lesson: &Lesson) -> SourceResult<()> {
        match lesson.semester {
            Some(semester) => self.add_alternatives(&lesson.subject_code, semester),
            None => Ok(()),
        }
    }

    /// Cached sections sharing subject code, semester and course type.
    pub fn alternatives_to(&self, lesson: &Lesson) -> Option<&[LessonRecord]> {
        let key = AlternativeKey {
            subject_code: lesson.subject_code.clone(),
            semester: lesson.semester?,
            course_type: lesson.course_type.clone(),
        };
        self.groups.get(&key).map(Vec::as_slice)
    }
}
