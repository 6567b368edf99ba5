//! Course listing HTML table parser.
//!
//! Row layout (`tbody > tr > td`):
//! 0 detailed time, 1 `SUBJECT-COURSE (type)`, 2 subject name, 3 location,
//! 4 unused, 5 teacher and comment.

use super::{LessonQuery, LessonSource, SourceError, SourceResult};
use crate::model::lesson::{parse_detailed_time, Lesson, LessonRecord, Semester};
use log::{debug, warn};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

const MIN_CELLS: usize = 6;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("valid table selector"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody > tr").expect("valid row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("valid cell selector"));

/// Parses every well-formed listing row. Short rows are skipped.
pub fn parse_lesson_table(html: &str, semester: Option<Semester>) -> Vec<Lesson> {
    lessons_in(&Html::parse_document(html), semester)
}

fn lessons_in(document: &Html, semester: Option<Semester>) -> Vec<Lesson> {
    let mut lessons = Vec::new();

    for (row_index, row) in document.select(&ROW_SELECTOR).enumerate() {
        let cells = row.select(&CELL_SELECTOR).map(cell_text).collect::<Vec<_>>();
        if cells.len() < MIN_CELLS {
            warn!(
                "event=lesson_parse module=source status=skipped row={} cells={}",
                row_index,
                cells.len()
            );
            continue;
        }
        lessons.push(parse_row(&cells, semester));
    }

    lessons
}

fn parse_row(cells: &[String], semester: Option<Semester>) -> Lesson {
    let detailed_time = Some(cells[0].clone()).filter(|value| !value.is_empty());
    let times = parse_detailed_time(detailed_time.as_deref());

    let mut code_parts = cells[1].split_whitespace();
    let full_code = code_parts.next().unwrap_or_default();
    let (subject_code, course_code) = full_code.rsplit_once('-').unwrap_or((full_code, ""));
    let course_type = code_parts
        .next()
        .unwrap_or_default()
        .trim_start_matches('(')
        .trim_end_matches(')');

    Lesson {
        subject_name: cells[2].clone(),
        subject_code: subject_code.to_string(),
        day: times.day,
        start_time: times.start_time,
        end_time: times.end_time,
        detailed_time,
        semester,
        location: cells[3].clone(),
        course_type: course_type.to_string(),
        course_code: course_code.to_string(),
        teacher_and_comment: cells[5].clone(),
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// `LessonSource` that fetches the listing page through a caller transport
/// and parses its table.
pub struct HtmlTableSource<F>
where
    F: Fn(&LessonQuery) -> Result<String, SourceError>,
{
    fetch: F,
}

impl<F> HtmlTableSource<F>
where
    F: Fn(&LessonQuery) -> Result<String, SourceError>,
{
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<F> LessonSource for HtmlTableSource<F>
where
    F: Fn(&LessonQuery) -> Result<String, SourceError>,
{
    fn query(&self, query: &LessonQuery) -> SourceResult<Vec<LessonRecord>> {
        let page = (self.fetch)(query)?;
        let document = Html::parse_document(&page);
        if document.select(&TABLE_SELECTOR).next().is_none() {
            return Err(SourceError::Parse("page has no listing table".to_string()));
        }
        let records = lessons_in(&document, Some(query.semester))
            .into_iter()
            .map(LessonRecord::new)
            .collect::<Vec<_>>();
        debug!(
            "event=lesson_query module=source status=ok mode={} semester={} results={}",
            query.mode.as_param(),
            query.semester,
            records.len()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_lesson_table, HtmlTableSource};
    use crate::model::lesson::{DayOfWeek, Semester, Time};
    use crate::source::{LessonQuery, LessonSource, QueryMode, SourceError};

    const PAGE: &str = r#"
        <table><tbody>
          <tr>
            <td>Hétfő 10:00-11:30</td>
            <td>IP-18KPROGEG-3 (gyakorlat)</td>
            <td>Programozás</td>
            <td>Déli tömb 2-124</td>
            <td>x</td>
            <td> Dr. Példa Péter </td>
          </tr>
          <tr><td>broken</td></tr>
        </tbody></table>
    "#;

    #[test]
    fn parses_row_cells_into_lesson_fields() {
        let semester = Semester::new(2024, false);
        let lessons = parse_lesson_table(PAGE, Some(semester));
        assert_eq!(lessons.len(), 1);

        let lesson = &lessons[0];
        assert_eq!(lesson.subject_code, "IP-18KPROGEG");
        assert_eq!(lesson.course_code, "3");
        assert_eq!(lesson.course_type, "gyakorlat");
        assert_eq!(lesson.subject_name, "Programozás");
        assert_eq!(lesson.location, "Déli tömb 2-124");
        assert_eq!(lesson.teacher_and_comment, "Dr. Példa Péter");
        assert_eq!(lesson.day, Some(DayOfWeek::Monday));
        assert_eq!(lesson.start_time, Some(Time::new(10, 0)));
        assert_eq!(lesson.end_time, Some(Time::new(11, 30)));
        assert_eq!(lesson.semester, Some(semester));
    }

    #[test]
    fn table_source_tags_records_with_query_semester() {
        let source = HtmlTableSource::new(|query: &LessonQuery| {
            assert_eq!(query.keyword, "IP-18KPROGEG");
            Ok(PAGE.to_string())
        });
        let query = LessonQuery {
            semester: Semester::new(2025, true),
            keyword: "IP-18KPROGEG".to_string(),
            mode: QueryMode::ByCode,
        };

        let records = source.query(&query).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lesson.semester, Some(query.semester));
        assert_eq!(records[0].id, records[0].lesson.content_id());
    }

    #[test]
    fn transport_errors_propagate() {
        let source = HtmlTableSource::new(|_: &LessonQuery| {
            Err(SourceError::Transport("offline".to_string()))
        });
        let query = LessonQuery {
            semester: Semester::new(2025, true),
            keyword: "x".to_string(),
            mode: QueryMode::ByName,
        };
        assert_eq!(
            source.query(&query).unwrap_err(),
            SourceError::Transport("offline".to_string())
        );
    }

    #[test]
    fn page_without_table_is_a_parse_error() {
        let source = HtmlTableSource::new(|_: &LessonQuery| Ok("<p>maintenance</p>".to_string()));
        let query = LessonQuery {
            semester: Semester::new(2025, false),
            keyword: "x".to_string(),
            mode: QueryMode::ByTeacher,
        };
        assert!(matches!(source.query(&query), Err(SourceError::Parse(_))));
    }
}
