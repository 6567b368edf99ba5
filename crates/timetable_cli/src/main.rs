//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `timetable_core` linkage without any UI host.
//! - Run one in-memory add/undo/redo round and print the cursor trail.

use timetable_core::{CommandHistory, Lesson, LessonRecord, MemoryStore, StoreResult};

fn main() -> StoreResult<()> {
    println!("timetable_core ping={}", timetable_core::ping());
    println!("timetable_core version={}", timetable_core::core_version());

    let store = MemoryStore::new();
    let mut history = CommandHistory::new(&store, "smoke", "Smoke test", Vec::new())?;
    let lesson = LessonRecord::new(Lesson {
        subject_name: "Smoke".to_string(),
        ..Lesson::default()
    });

    history.add(lesson)?;
    println!("after add lessons={} cursor={}", history.lessons().len(), history.cursor());
    history.undo()?;
    println!("after undo lessons={} cursor={}", history.lessons().len(), history.cursor());
    history.redo()?;
    println!("after redo lessons={} cursor={}", history.lessons().len(), history.cursor());
    Ok(())
}
