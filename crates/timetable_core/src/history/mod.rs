//! Transactional command history for one timetable.
//!
//! # Responsibility
//! - Serialize every lesson mutation through one apply/undo/redo protocol.
//! - Keep history memory bounded by evicting the oldest commands.
//! - Persist a full snapshot after every successful operation.
//!
//! # Invariants
//! - `0 <= cmd_idx <= stack.len()`; `[0, cmd_idx)` is applied, the rest is
//!   redoable.
//! - After a push `stack.len() < max_stack_size` (oldest steps evicted),
//!   except while the oldest step is a batch that is still open.
//! - A closed batch is evicted as one unit; its start marker never leaves
//!   the stack without its end marker.
//! - Every mutating operation first compares the in-memory lessons with the
//!   persisted snapshot and refuses on mismatch (optimistic concurrency).
//! - Refusals return `Ok(false)` and leave state untouched; only store
//!   failures surface as `Err`.
//! - Batch replay loops use the private cursor primitives, never the public
//!   entry points, so staleness checks, eviction and persistence run once per
//!   caller-visible step.

pub mod command;
pub mod snapshot;

use crate::config::HistoryConfig;
use crate::model::lesson::LessonRecord;
use crate::store::{DurableStore, StoreResult};
use command::{
    AddCommand, Command, EndBatchCommand, RemoveCommand, Replay, StartBatchCommand,
    TimetableState, UpdateCommand,
};
use log::debug;
use snapshot::{now_epoch_ms, LessonSave, SnapshotRef};

/// Why an operation was refused. Only surfaces in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Duplicate,
    Missing,
    AlreadyInBatch,
    NotInBatch,
    Stale,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate_id",
            Self::Missing => "missing_id",
            Self::AlreadyInBatch => "already_in_batch",
            Self::NotInBatch => "not_in_batch",
            Self::Stale => "stale",
        }
    }
}

/// Undo/redo engine owning one timetable's lessons.
pub struct CommandHistory<'s, S: DurableStore + ?Sized> {
    store: &'s S,
    config: HistoryConfig,
    save_id: String,
    save_name: String,
    state: TimetableState,
    stack: Vec<Box<dyn Command>>,
    cmd_idx: usize,
}

impl<'s, S: DurableStore + ?Sized> CommandHistory<'s, S> {
    /// Creates a history with default limits and persists the initial snapshot.
    pub fn new(
        store: &'s S,
        save_id: impl Into<String>,
        save_name: impl Into<String>,
        lessons: Vec<LessonRecord>,
    ) -> StoreResult<Self> {
        Self::with_config(store, save_id, save_name, lessons, HistoryConfig::default())
    }

    /// Creates a history with explicit limits and persists the initial snapshot.
    ///
    /// An invalid `config` is reported as `StoreError::Config` before anything
    /// is written.
    pub fn with_config(
        store: &'s S,
        save_id: impl Into<String>,
        save_name: impl Into<String>,
        lessons: Vec<LessonRecord>,
        config: HistoryConfig,
    ) -> StoreResult<Self> {
        config.validate()?;
        let history = Self {
            store,
            config,
            save_id: save_id.into(),
            save_name: save_name.into(),
            state: TimetableState::new(lessons),
            stack: Vec::new(),
            cmd_idx: 0,
        };
        history.persist()?;
        Ok(history)
    }

    pub fn save_id(&self) -> &str {
        &self.save_id
    }

    pub fn save_name(&self) -> &str {
        &self.save_name
    }

    /// Renames the save and persists immediately. Refused when stale.
    pub fn set_save_name(&mut self, name: impl Into<String>) -> StoreResult<bool> {
        if self.is_stale()? {
            self.log_rejection("rename", Rejection::Stale);
            return Ok(false);
        }
        self.save_name = name.into();
        self.persist()?;
        Ok(true)
    }

    /// Reads the snapshot currently persisted for this save.
    pub fn lesson_save(&self) -> StoreResult<Option<LessonSave>> {
        LessonSave::load(self.store, &self.save_id)
    }

    pub fn lessons(&self) -> &[LessonRecord] {
        &self.state.lessons
    }

    pub fn find(&self, id: &str) -> Option<&LessonRecord> {
        self.state.lessons.iter().find(|record| record.id == id)
    }

    pub fn can_undo(&self) -> bool {
        self.cmd_idx != 0
    }

    pub fn can_redo(&self) -> bool {
        self.stack.len() > self.cmd_idx
    }

    pub fn in_batch(&self) -> bool {
        self.state.in_batch
    }

    /// Number of applied commands.
    pub fn cursor(&self) -> usize {
        self.cmd_idx
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Adds a lesson. Refused on duplicate identifier or staleness.
    pub fn add(&mut self, record: LessonRecord) -> StoreResult<bool> {
        let command = AddCommand::prepare(&self.state, record)
            .map(boxed)
            .ok_or(Rejection::Duplicate);
        self.process_command("add", command)
    }

    /// Removes the lesson with `id`. Refused when absent or stale.
    pub fn remove(&mut self, id: &str) -> StoreResult<bool> {
        let command = RemoveCommand::prepare(&self.state, id)
            .map(boxed)
            .ok_or(Rejection::Missing);
        self.process_command("remove", command)
    }

    /// Replaces the lesson `old_id` with `record` as one undoable step.
    ///
    /// Refused when `old_id` is absent, when `record` would duplicate the
    /// identifier of another lesson, or when stale.
    pub fn update(&mut self, old_id: &str, record: LessonRecord) -> StoreResult<bool> {
        let rejection = if self.state.position(old_id).is_none() {
            Rejection::Missing
        } else {
            Rejection::Duplicate
        };
        let command = UpdateCommand::prepare(&self.state, old_id, record)
            .map(boxed)
            .ok_or(rejection);
        self.process_command("update", command)
    }

    /// Opens a batch; the commands until `end_batch` undo/redo as one step.
    pub fn start_batch(&mut self) -> StoreResult<bool> {
        let command = StartBatchCommand::prepare(&self.state)
            .map(boxed)
            .ok_or(Rejection::AlreadyInBatch);
        self.process_command("start_batch", command)
    }

    /// Closes the open batch.
    pub fn end_batch(&mut self) -> StoreResult<bool> {
        let command = EndBatchCommand::prepare(&self.state)
            .map(boxed)
            .ok_or(Rejection::NotInBatch);
        self.process_command("end_batch", command)
    }

    /// Reverts the last applied step.
    ///
    /// `Ok(true)` means the history was consulted and consistent, even when
    /// nothing was left to undo; compare `cursor()` to tell the cases apart.
    pub fn undo(&mut self) -> StoreResult<bool> {
        if self.is_stale()? {
            self.log_rejection("undo", Rejection::Stale);
            return Ok(false);
        }
        if let Some(replay) = self.step_undo() {
            self.replay(replay);
        }
        self.persist()?;
        Ok(true)
    }

    /// Re-applies the next redoable step. Same return contract as `undo`.
    pub fn redo(&mut self) -> StoreResult<bool> {
        if self.is_stale()? {
            self.log_rejection("redo", Rejection::Stale);
            return Ok(false);
        }
        if let Some(replay) = self.step_redo() {
            self.replay(replay);
        }
        self.persist()?;
        Ok(true)
    }

    /// Returns whether the persisted snapshot disagrees with memory.
    ///
    /// A missing snapshot counts as stale: another surface removed the save.
    pub fn is_stale(&self) -> StoreResult<bool> {
        Ok(match self.lesson_save()? {
            Some(persisted) => persisted.lessons != self.state.lessons,
            None => true,
        })
    }

    fn process_command(
        &mut self,
        op: &'static str,
        command: Result<Box<dyn Command>, Rejection>,
    ) -> StoreResult<bool> {
        let command = match command {
            Ok(command) => command,
            Err(rejection) => {
                self.log_rejection(op, rejection);
                return Ok(false);
            }
        };
        if self.is_stale()? {
            self.log_rejection(op, Rejection::Stale);
            return Ok(false);
        }

        // Linear history: a fresh command abandons the redo branch.
        self.stack.truncate(self.cmd_idx);
        let name = command.name();
        let replay = command.apply(&mut self.state);
        self.stack.push(command);
        self.cmd_idx += 1;
        self.replay(replay);
        self.evict_overflow();

        self.persist()?;
        debug!(
            "event=history_command module=history status=ok op={} save_id={} cursor={} stack_len={}",
            name,
            self.save_id,
            self.cmd_idx,
            self.stack.len()
        );
        Ok(true)
    }

    fn step_undo(&mut self) -> Option<Replay> {
        if !self.can_undo() {
            return None;
        }
        self.cmd_idx -= 1;
        Some(self.stack[self.cmd_idx].revert(&mut self.state))
    }

    fn step_redo(&mut self) -> Option<Replay> {
        if !self.can_redo() {
            return None;
        }
        let replay = self.stack[self.cmd_idx].apply(&mut self.state);
        self.cmd_idx += 1;
        Some(replay)
    }

    /// Drains the batch the last command opened or closed.
    ///
    /// Directives returned by inner steps are ignored: the outer loop is
    /// already walking in that direction while the flag stays set.
    fn replay(&mut self, replay: Replay) {
        match replay {
            Replay::Idle => {}
            Replay::Forward => {
                while self.state.in_batch && self.step_redo().is_some() {}
            }
            Replay::Backward => {
                while self.state.in_batch && self.step_undo().is_some() {}
            }
        }
    }

    fn evict_overflow(&mut self) {
        let mut evicted = 0usize;
        while self.stack.len() >= self.config.max_stack_size {
            let unit = self.oldest_step_len();
            if unit == 0 {
                break;
            }
            self.stack.drain(..unit);
            self.cmd_idx = self.cmd_idx.saturating_sub(unit);
            evicted += unit;
        }
        if evicted > 0 {
            debug!(
                "event=history_evict module=history status=ok save_id={} evicted={}",
                self.save_id, evicted
            );
        }
    }

    /// Number of commands forming the oldest undo step.
    ///
    /// Zero when the stack is empty or the oldest step is a batch whose end
    /// marker has not been pushed yet.
    fn oldest_step_len(&self) -> usize {
        match self.stack.first() {
            None => 0,
            Some(first) if first.opens_batch() => self
                .stack
                .iter()
                .position(|command| command.closes_batch())
                .map_or(0, |end| end + 1),
            Some(_) => 1,
        }
    }

    fn persist(&self) -> StoreResult<()> {
        SnapshotRef {
            id: &self.save_id,
            save_name: &self.save_name,
            lessons: &self.state.lessons,
            last_modification: now_epoch_ms(),
        }
        .write(self.store)
    }

    fn log_rejection(&self, op: &'static str, rejection: Rejection) {
        debug!(
            "event=history_command module=history status=rejected op={} save_id={} reason={}",
            op,
            self.save_id,
            rejection.as_str()
        );
    }
}

fn boxed<C: Command + 'static>(command: C) -> Box<dyn Command> {
    Box::new(command)
}

#[cfg(test)]
mod tests {
    use super::CommandHistory;
    use crate::config::HistoryConfig;
    use crate::model::lesson::{Lesson, LessonRecord};
    use crate::store::MemoryStore;

    fn record(name: &str) -> LessonRecord {
        LessonRecord::new(Lesson {
            subject_name: name.to_string(),
            ..Lesson::default()
        })
    }

    #[test]
    fn eviction_keeps_stack_below_capacity() {
        let store = MemoryStore::new();
        let config = HistoryConfig { max_stack_size: 3 };
        let mut history = CommandHistory::with_config(&store, "s", "n", vec![], config).unwrap();

        for name in ["a", "b", "c", "d"] {
            assert!(history.add(record(name)).unwrap());
        }
        assert_eq!(history.stack_len(), 2);
        assert_eq!(history.cursor(), 2);
    }

    #[test]
    fn redo_of_start_batch_replays_the_whole_batch() {
        let store = MemoryStore::new();
        let mut history = CommandHistory::new(&store, "s", "n", vec![]).unwrap();

        history.start_batch().unwrap();
        history.add(record("a")).unwrap();
        history.add(record("b")).unwrap();
        history.end_batch().unwrap();
        assert_eq!(history.cursor(), 4);

        history.undo().unwrap();
        assert_eq!(history.cursor(), 0);
        assert!(history.lessons().is_empty());
        assert!(!history.in_batch());

        history.redo().unwrap();
        assert_eq!(history.cursor(), 4);
        assert_eq!(history.lessons().len(), 2);
        assert!(!history.in_batch());
    }

    #[test]
    fn undo_inside_open_batch_steps_one_command() {
        let store = MemoryStore::new();
        let mut history = CommandHistory::new(&store, "s", "n", vec![]).unwrap();

        history.start_batch().unwrap();
        history.add(record("a")).unwrap();
        history.undo().unwrap();
        assert_eq!(history.cursor(), 1);
        assert!(history.in_batch());

        history.undo().unwrap();
        assert_eq!(history.cursor(), 0);
        assert!(!history.in_batch());
    }
}
