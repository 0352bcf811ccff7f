use serde::{Deserialize, Serialize};

use crate::editing::mapping::{Bias, Mapping};

/// Anchor/head pair over document positions. A caret when both are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// The selected range, `[from, to)`.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.from()..self.to()
    }

    /// Follow both ends through an applied mapping.
    pub fn map(&self, mapping: &Mapping) -> Self {
        Self::new(
            mapping.map(self.anchor, Bias::Right),
            mapping.map(self.head, Bias::Right),
        )
    }

    /// Pull both ends inside a document of `size`.
    pub fn clamp(&self, size: usize) -> Self {
        Self::new(self.anchor.min(size), self.head.min(size))
    }
}
