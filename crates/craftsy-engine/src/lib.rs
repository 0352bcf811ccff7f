pub mod editing;
pub mod error;
pub mod export;
pub mod history;
pub mod model;
pub mod templates;

// Re-export key types for easier usage
pub use editing::{
    Bias, BlockHandle, Cmd, Document, Mapping, OutlineEntry, Outcome, Patch, Selection,
    SlashCommand, Transaction, Transformed,
};
pub use error::EditError;
pub use history::{
    Autosaver, FileStorage, HistoryError, MemoryStorage, Snapshot, Storage, VersionStore,
};
pub use model::{Mark, MarkType, Node, NodeKind, NodeType};
