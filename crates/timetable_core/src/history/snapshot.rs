//! Persisted timetable snapshot.
//!
//! # Invariants
//! - Serialized field names are `id`, `saveName`, `lessons`,
//!   `lastModification`.
//! - A snapshot is always written whole; partial updates do not exist.

use crate::model::lesson::LessonRecord;
use crate::store::{save_key, DurableStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Owned snapshot as read back from the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSave {
    pub id: String,
    pub save_name: String,
    pub lessons: Vec<LessonRecord>,
    /// Unix epoch milliseconds of the write.
    #[serde(default)]
    pub last_modification: i64,
}

impl LessonSave {
    /// Reads and decodes the snapshot stored for `save_id`.
    ///
    /// A snapshot whose embedded id differs from `save_id` is rejected as
    /// `StoreError::InvalidData`.
    pub fn load<S: DurableStore + ?Sized>(store: &S, save_id: &str) -> StoreResult<Option<Self>> {
        let Some(raw) = store.get(&save_key(save_id))? else {
            return Ok(None);
        };
        let save: Self = serde_json::from_str(&raw)?;
        if save.id != save_id {
            return Err(StoreError::InvalidData(format!(
                "snapshot under save `{save_id}` carries id `{}`",
                save.id
            )));
        }
        Ok(Some(save))
    }
}

/// Borrowed view for writes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SnapshotRef<'a> {
    pub id: &'a str,
    pub save_name: &'a str,
    pub lessons: &'a [LessonRecord],
    pub last_modification: i64,
}

impl SnapshotRef<'_> {
    pub(crate) fn write<S: DurableStore + ?Sized>(&self, store: &S) -> StoreResult<()> {
        let raw = serde_json::to_string(self)?;
        store.set(&save_key(self.id), &raw)
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
