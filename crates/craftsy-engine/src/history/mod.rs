//! Version history: bounded snapshot log, manual saves and autosave, kept
//! behind a key/value [`Storage`] boundary.

mod autosave;
mod clock;
mod storage;
mod store;

pub use autosave::{Autosaver, DEFAULT_AUTOSAVE_INTERVAL_MS};
pub use clock::{Clock, FixedClock, SystemClock, local_label};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{
    AUTOSAVE_KEY, DEFAULT_HISTORY_LIMIT, DOCUMENT_KEY, HISTORY_KEY, HistoryError, Snapshot,
    VersionStore,
};
