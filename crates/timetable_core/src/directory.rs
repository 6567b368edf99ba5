//! Save directory: a bounded, ordered set of timetables.
//!
//! # Responsibility
//! - Own one `CommandHistory` per save and track the current selection.
//! - Mirror the ordered save id list into the durable store.
//!
//! # Invariants
//! - `save_ids` and `histories` share one order; `current` indexes both.
//! - The directory is never empty after `load`, so `current` is always valid.
//! - Every operation except bootstrap creation refuses when the persisted id
//!   list differs from the in-memory one.

use crate::config::{ConfigError, DirectoryConfig};
use crate::history::snapshot::LessonSave;
use crate::history::CommandHistory;
use crate::model::lesson::LessonRecord;
use crate::share::{decode_share_uri, ShareError};
use crate::store::{save_key, DurableStore, StoreError, StoreResult, SAVE_IDS_KEY};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const DEFAULT_SAVE_NAME: &str = "New timetable";

/// Errors raised while loading a directory or importing a shared save.
#[derive(Debug)]
pub enum DirectoryError {
    Config(ConfigError),
    Store(StoreError),
    Share(ShareError),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Share(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Share(err) => Some(err),
        }
    }
}

impl From<ConfigError> for DirectoryError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for DirectoryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ShareError> for DirectoryError {
    fn from(value: ShareError) -> Self {
        Self::Share(value)
    }
}

/// Multi-timetable container handing out the current command history.
pub struct SaveDirectory<'s, S: DurableStore + ?Sized> {
    store: &'s S,
    config: DirectoryConfig,
    save_ids: Vec<String>,
    histories: Vec<CommandHistory<'s, S>>,
    current: usize,
}

impl<'s, S: DurableStore + ?Sized> SaveDirectory<'s, S> {
    /// Loads every persisted save, creating a default one when none exist.
    ///
    /// Repeated ids and ids whose snapshot is missing are dropped, and the
    /// cleaned id list is written back.
    pub fn load(store: &'s S, config: DirectoryConfig) -> Result<Self, DirectoryError> {
        config.validate()?;

        let persisted_ids: Vec<String> = match store.get(SAVE_IDS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(StoreError::from)?,
            None => Vec::new(),
        };

        let mut directory = Self {
            store,
            config,
            save_ids: Vec::with_capacity(persisted_ids.len()),
            histories: Vec::with_capacity(persisted_ids.len()),
            current: 0,
        };

        for id in persisted_ids {
            if directory.position(&id).is_some() {
                debug!("event=directory_load module=directory status=duplicate save_id={id}");
                continue;
            }
            let Some(save) = LessonSave::load(store, &id)? else {
                debug!("event=directory_load module=directory status=skipped save_id={id}");
                continue;
            };
            directory.push_history(save.id, save.save_name, save.lessons)?;
        }

        if directory.histories.is_empty() {
            // Bootstrap: no index to be stale against yet.
            directory.push_history(
                Uuid::new_v4().to_string(),
                DEFAULT_SAVE_NAME.to_string(),
                Vec::new(),
            )?;
        }
        directory.persist_index()?;

        info!(
            "event=directory_load module=directory status=ok saves={}",
            directory.save_ids.len()
        );
        Ok(directory)
    }

    pub fn max_save_count(&self) -> usize {
        self.config.max_save_count
    }

    pub fn save_ids(&self) -> &[String] {
        &self.save_ids
    }

    pub fn len(&self) -> usize {
        self.save_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.save_ids.is_empty()
    }

    pub fn save_name_for_id(&self, id: &str) -> Option<&str> {
        self.history(id).map(|history| history.save_name())
    }

    pub fn current(&self) -> &CommandHistory<'s, S> {
        &self.histories[self.current]
    }

    pub fn current_mut(&mut self) -> &mut CommandHistory<'s, S> {
        &mut self.histories[self.current]
    }

    pub fn history(&self, id: &str) -> Option<&CommandHistory<'s, S>> {
        self.position(id).map(|index| &self.histories[index])
    }

    pub fn history_mut(&mut self, id: &str) -> Option<&mut CommandHistory<'s, S>> {
        self.position(id).map(move |index| &mut self.histories[index])
    }

    /// Returns whether the persisted id list disagrees with memory.
    pub fn is_stale(&self) -> StoreResult<bool> {
        let expected = serde_json::to_string(&self.save_ids)?;
        Ok(self.store.get(SAVE_IDS_KEY)?.as_deref() != Some(expected.as_str()))
    }

    /// Creates a save and returns its id. Refused when full or stale.
    pub fn create_save(
        &mut self,
        name: Option<&str>,
        lessons: Option<Vec<LessonRecord>>,
    ) -> StoreResult<Option<String>> {
        if self.save_ids.len() >= self.config.max_save_count {
            log_rejection("create", "full");
            return Ok(None);
        }
        if self.is_stale()? {
            log_rejection("create", "stale");
            return Ok(None);
        }

        let id = Uuid::new_v4().to_string();
        self.push_history(
            id.clone(),
            name.unwrap_or(DEFAULT_SAVE_NAME).to_string(),
            lessons.unwrap_or_default(),
        )?;
        self.persist_index()?;

        info!("event=save_create module=directory status=ok save_id={id}");
        Ok(Some(id))
    }

    /// Decodes a shared timetable (link form or raw compact JSON) and stores
    /// it as a new save.
    pub fn import_shared(&mut self, raw: &str) -> Result<Option<String>, DirectoryError> {
        let save = decode_share_uri(raw)?;
        Ok(self.create_save(Some(save.save_name.as_str()), Some(save.lessons))?)
    }

    /// Selects the save with `id` as current.
    pub fn switch_save(&mut self, id: &str) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            log_rejection("switch", "unknown_id");
            return Ok(false);
        };
        if self.is_stale()? {
            log_rejection("switch", "stale");
            return Ok(false);
        }
        self.current = index;
        Ok(true)
    }

    /// Deletes a save and its snapshot.
    ///
    /// The last remaining save cannot be removed. When the current save is
    /// removed, the save that slides into its slot becomes current (wrapping
    /// to the first save when the last slot was removed).
    pub fn remove_save(&mut self, id: &str) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            log_rejection("remove", "unknown_id");
            return Ok(false);
        };
        if self.save_ids.len() == 1 {
            log_rejection("remove", "last_save");
            return Ok(false);
        }
        if self.is_stale()? {
            log_rejection("remove", "stale");
            return Ok(false);
        }

        self.save_ids.remove(index);
        self.histories.remove(index);
        self.store.remove(&save_key(id))?;

        if index < self.current {
            self.current -= 1;
        } else if index == self.current {
            self.current = index % self.save_ids.len();
        }
        self.persist_index()?;

        info!("event=save_remove module=directory status=ok save_id={id}");
        Ok(true)
    }

    /// Moves the save with `id` to `new_index`, shifting the saves between.
    pub fn move_save(&mut self, id: &str, new_index: usize) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            log_rejection("move", "unknown_id");
            return Ok(false);
        };
        if new_index >= self.save_ids.len() {
            log_rejection("move", "index_out_of_range");
            return Ok(false);
        }
        if self.is_stale()? {
            log_rejection("move", "stale");
            return Ok(false);
        }

        let current_id = self.save_ids[self.current].clone();
        let moved_id = self.save_ids.remove(index);
        self.save_ids.insert(new_index, moved_id);
        let moved_history = self.histories.remove(index);
        self.histories.insert(new_index, moved_history);
        self.current = self.position(&current_id).unwrap_or(0);
        self.persist_index()?;

        debug!(
            "event=save_move module=directory status=ok save_id={id} from={index} to={new_index}"
        );
        Ok(true)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.save_ids.iter().position(|existing| existing == id)
    }

    fn push_history(
        &mut self,
        id: String,
        name: String,
        lessons: Vec<LessonRecord>,
    ) -> StoreResult<()> {
        let history =
            CommandHistory::with_config(self.store, id.clone(), name, lessons, self.config.history)?;
        self.save_ids.push(id);
        self.histories.push(history);
        Ok(())
    }

    fn persist_index(&self) -> StoreResult<()> {
        let raw = serde_json::to_string(&self.save_ids)?;
        self.store.set(SAVE_IDS_KEY, &raw)
    }
}

fn log_rejection(op: &'static str, reason: &'static str) {
    debug!("event=directory_command module=directory status=rejected op={op} reason={reason}");
}

#[cfg(test)]
mod tests {
    use super::{SaveDirectory, DEFAULT_SAVE_NAME};
    use crate::config::DirectoryConfig;
    use crate::store::MemoryStore;

    #[test]
    fn remove_of_current_last_save_wraps_to_first() {
        let store = MemoryStore::new();
        let mut directory = SaveDirectory::load(&store, DirectoryConfig::default()).unwrap();
        let first = directory.save_ids()[0].clone();
        let second = directory.create_save(None, None).unwrap().unwrap();
        let third = directory.create_save(None, None).unwrap().unwrap();

        assert!(directory.switch_save(&third).unwrap());
        assert!(directory.remove_save(&third).unwrap());
        assert_eq!(directory.current().save_id(), first);

        assert!(directory.switch_save(&first).unwrap());
        assert!(directory.remove_save(&first).unwrap());
        assert_eq!(directory.current().save_id(), second);
        assert_eq!(directory.current().save_name(), DEFAULT_SAVE_NAME);
    }
}
