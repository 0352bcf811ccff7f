use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::clock::{Clock, SystemClock, local_label};
use crate::history::storage::{Storage, StorageError};
use crate::model::Node;

/// Live document written by a manual save.
pub const DOCUMENT_KEY: &str = "craftsy-doc-1";
/// Snapshot log, newest first.
pub const HISTORY_KEY: &str = "craftsy-doc-history";
/// Autosave slot, kept apart from the snapshot log.
pub const AUTOSAVE_KEY: &str = "craftsy-doc-auto";

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A named, timestamped copy of a document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    /// Milliseconds since the Unix epoch
    pub ts: u64,
    #[serde(default)]
    pub title: String,
    pub content: Node,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Bounded snapshot log plus the live-document and autosave slots, all kept
/// in one [`Storage`].
///
/// Reads are forgiving: a missing or unparseable value is treated as empty
/// (and logged), so a corrupt log never blocks editing. Writes surface their
/// errors.
#[derive(Debug)]
pub struct VersionStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    limit: usize,
}

impl<S: Storage> VersionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            clock: SystemClock,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl<S: Storage, C: Clock> VersionStore<S, C> {
    pub fn with_clock<D: Clock>(self, clock: D) -> VersionStore<S, D> {
        VersionStore {
            storage: self.storage,
            clock,
            limit: self.limit,
        }
    }

    /// Cap the log at `limit` snapshots. A limit of zero keeps one.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Record a snapshot of `content` at the head of the log, evicting the
    /// oldest entries beyond the cap.
    pub fn create(
        &mut self,
        content: &Node,
        title: Option<&str>,
    ) -> Result<Snapshot, HistoryError> {
        let ts = self.clock.now_millis();
        let snapshot = Snapshot {
            id: Uuid::new_v4().to_string(),
            ts,
            title: title
                .map(str::to_string)
                .unwrap_or_else(|| format!("Snapshot {}", local_label(ts))),
            content: content.clone(),
        };

        let mut snapshots = self.list();
        snapshots.insert(0, snapshot.clone());
        if snapshots.len() > self.limit {
            log::debug!("evicting {} snapshot(s) past the cap", snapshots.len() - self.limit);
            snapshots.truncate(self.limit);
        }
        self.write_log(&snapshots)?;
        Ok(snapshot)
    }

    /// All snapshots, newest first.
    pub fn list(&self) -> Vec<Snapshot> {
        self.read(HISTORY_KEY).unwrap_or_default()
    }

    /// The content of snapshot `id`. The log is left untouched.
    pub fn restore(&self, id: &str) -> Result<Node, HistoryError> {
        self.list()
            .into_iter()
            .find(|snapshot| snapshot.id == id)
            .map(|snapshot| snapshot.content)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))
    }

    pub fn delete(&mut self, id: &str) -> Result<(), HistoryError> {
        let mut snapshots = self.list();
        let len = snapshots.len();
        snapshots.retain(|snapshot| snapshot.id != id);
        if snapshots.len() == len {
            return Err(HistoryError::NotFound(id.to_string()));
        }
        self.write_log(&snapshots)
    }

    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.storage.remove(HISTORY_KEY)?;
        Ok(())
    }

    /// Write `content` to the autosave slot unless it already holds an
    /// identical tree. Returns whether anything was written.
    pub fn autosave(&mut self, content: &Node) -> Result<bool, HistoryError> {
        if self.load_autosave().as_ref() == Some(content) {
            return Ok(false);
        }
        let payload = serde_json::to_string(content)?;
        self.storage.set(AUTOSAVE_KEY, &payload)?;
        log::debug!("autosaved {} bytes", payload.len());
        Ok(true)
    }

    pub fn load_autosave(&self) -> Option<Node> {
        self.read(AUTOSAVE_KEY)
    }

    /// Manual save: overwrite the live document and record a snapshot of it.
    pub fn save_document(&mut self, content: &Node) -> Result<Snapshot, HistoryError> {
        self.storage
            .set(DOCUMENT_KEY, &serde_json::to_string(content)?)?;
        let title = format!("Manual Save – {}", local_label(self.clock.now_millis()));
        self.create(content, Some(&title))
    }

    pub fn load_document(&self) -> Option<Node> {
        self.read(DOCUMENT_KEY)
    }

    fn write_log(&mut self, snapshots: &[Snapshot]) -> Result<(), HistoryError> {
        self.storage.set(HISTORY_KEY, &serde_json::to_string(snapshots)?)?;
        Ok(())
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                log::warn!("failed to read `{key}`: {err}");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|err| log::warn!("ignoring corrupt `{key}`: {err}"))
            .ok()
    }
}
