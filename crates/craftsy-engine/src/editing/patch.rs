use crate::editing::mapping::Mapping;
use crate::editing::selection::Selection;
use crate::editing::transform::Outcome;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub outcome: Outcome,
    pub version: u64,
    /// How positions of the previous revision moved
    pub mapping: Mapping,
    pub selection: Selection,
}

impl Patch {
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}
