//! Reversible commands over one timetable.
//!
//! # Responsibility
//! - Define the `Command` contract (`apply` / `revert`).
//! - Provide the five command variants recorded by `CommandHistory`.
//!
//! # Invariants
//! - A command is only invoked in the stack position the history placed it,
//!   so the state it sees on `apply` equals the state it was built against.
//! - Commands never touch the stack or cursor; batch commands request a
//!   replay through the returned `Replay` and the history performs it.

use crate::model::lesson::LessonRecord;
use std::fmt::Debug;

/// Mutable timetable state commands act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimetableState {
    pub(crate) lessons: Vec<LessonRecord>,
    pub(crate) in_batch: bool,
}

impl TimetableState {
    pub(crate) fn new(lessons: Vec<LessonRecord>) -> Self {
        Self {
            lessons,
            in_batch: false,
        }
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.lessons.iter().position(|record| record.id == id)
    }

    fn insert_at(&mut self, index: usize, record: LessonRecord) {
        let index = index.min(self.lessons.len());
        self.lessons.insert(index, record);
    }

    fn push(&mut self, record: LessonRecord) {
        self.lessons.push(record);
    }

    fn remove(&mut self, id: &str) -> Option<LessonRecord> {
        let index = self.position(id)?;
        Some(self.lessons.remove(index))
    }
}

/// Follow-up the history must run after a command's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    Idle,
    /// Keep redoing while the batch flag is set.
    Forward,
    /// Keep undoing while the batch flag is set.
    Backward,
}

/// One reversible unit of mutation.
pub trait Command: Debug {
    /// Short operation name for diagnostics.
    fn name(&self) -> &'static str;
    fn apply(&self, state: &mut TimetableState) -> Replay;
    fn revert(&self, state: &mut TimetableState) -> Replay;

    fn opens_batch(&self) -> bool {
        false
    }

    fn closes_batch(&self) -> bool {
        false
    }
}

/// Appends one lesson; reverting removes it by identifier.
#[derive(Debug)]
pub struct AddCommand {
    record: LessonRecord,
}

impl AddCommand {
    /// Returns `None` when a lesson with the same identifier already exists.
    pub fn prepare(state: &TimetableState, record: LessonRecord) -> Option<Self> {
        if state.position(&record.id).is_some() {
            return None;
        }
        Some(Self { record })
    }
}

impl Command for AddCommand {
    fn name(&self) -> &'static str {
        "add"
    }

    fn apply(&self, state: &mut TimetableState) -> Replay {
        state.push(self.record.clone());
        Replay::Idle
    }

    fn revert(&self, state: &mut TimetableState) -> Replay {
        state.remove(&self.record.id);
        Replay::Idle
    }
}

/// Removes one lesson; reverting puts the exact record back where it was.
#[derive(Debug)]
pub struct RemoveCommand {
    record: LessonRecord,
    index: usize,
}

impl RemoveCommand {
    /// Returns `None` when no lesson has identifier `id`.
    pub fn prepare(state: &TimetableState, id: &str) -> Option<Self> {
        let index = state.position(id)?;
        Some(Self {
            record: state.lessons[index].clone(),
            index,
        })
    }
}

impl Command for RemoveCommand {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn apply(&self, state: &mut TimetableState) -> Replay {
        state.remove(&self.record.id);
        Replay::Idle
    }

    fn revert(&self, state: &mut TimetableState) -> Replay {
        state.insert_at(self.index, self.record.clone());
        Replay::Idle
    }
}

/// Replaces one lesson with another as a single step.
///
/// `apply` removes the old record then inserts the new one in its slot;
/// `revert` removes whatever currently carries the new identifier then puts
/// the old record back. With equal identifiers the removal on revert hits the
/// new content, so the original record is restored.
#[derive(Debug)]
pub struct UpdateCommand {
    old: LessonRecord,
    new: LessonRecord,
    index: usize,
}

impl UpdateCommand {
    /// Returns `None` when `old_id` is not present, or when `new` carries the
    /// identifier of another lesson already in the timetable.
    pub fn prepare(state: &TimetableState, old_id: &str, new: LessonRecord) -> Option<Self> {
        let index = state.position(old_id)?;
        if new.id != old_id && state.position(&new.id).is_some() {
            return None;
        }
        Some(Self {
            old: state.lessons[index].clone(),
            new,
            index,
        })
    }
}

impl Command for UpdateCommand {
    fn name(&self) -> &'static str {
        "update"
    }

    fn apply(&self, state: &mut TimetableState) -> Replay {
        state.remove(&self.old.id);
        state.insert_at(self.index, self.new.clone());
        Replay::Idle
    }

    fn revert(&self, state: &mut TimetableState) -> Replay {
        state.remove(&self.new.id);
        state.insert_at(self.index, self.old.clone());
        Replay::Idle
    }
}

/// Opens a batch. Re-applying it (redo) drains the batch's commands.
#[derive(Debug, Default)]
pub struct StartBatchCommand;

impl StartBatchCommand {
    /// Returns `None` while a batch is already open.
    pub fn prepare(state: &TimetableState) -> Option<Self> {
        (!state.in_batch).then_some(Self)
    }
}

impl Command for StartBatchCommand {
    fn name(&self) -> &'static str {
        "start_batch"
    }

    fn opens_batch(&self) -> bool {
        true
    }

    fn apply(&self, state: &mut TimetableState) -> Replay {
        state.in_batch = true;
        Replay::Forward
    }

    fn revert(&self, state: &mut TimetableState) -> Replay {
        state.in_batch = false;
        Replay::Idle
    }
}

/// Closes a batch. Reverting it (undo) unwinds the batch's commands.
#[derive(Debug, Default)]
pub struct EndBatchCommand;

impl EndBatchCommand {
    /// Returns `None` when no batch is open.
    pub fn prepare(state: &TimetableState) -> Option<Self> {
        state.in_batch.then_some(Self)
    }
}

impl Command for EndBatchCommand {
    fn name(&self) -> &'static str {
        "end_batch"
    }

    fn closes_batch(&self) -> bool {
        true
    }

    fn apply(&self, state: &mut TimetableState) -> Replay {
        state.in_batch = false;
        Replay::Idle
    }

    fn revert(&self, state: &mut TimetableState) -> Replay {
        state.in_batch = true;
        Replay::Backward
    }
}
