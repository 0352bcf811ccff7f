//! Heading outline derived from the live tree.
//!
//! The outline is recomputed in full after every mutation. That is linear in
//! the document size, which is fine for the documents this editor targets but
//! would need incremental maintenance for very large ones.

use serde::Serialize;

use crate::model::{Node, NodeKind};

/// A heading as shown in the navigation sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    /// Position directly before the heading, valid for one revision only.
    pub position: usize,
}

/// Every heading of `doc` in document order.
pub fn outline(doc: &Node) -> Vec<OutlineEntry> {
    doc.descendants()
        .filter_map(|(node, position)| match node.kind() {
            NodeKind::Heading { level, .. } => Some(OutlineEntry {
                level: *level,
                text: node.text_content(),
                position,
            }),
            _ => None,
        })
        .collect()
}

/// Outline entries together with the document version they were built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineIndex {
    entries: Vec<OutlineEntry>,
    version: u64,
}

impl OutlineIndex {
    pub fn new(doc: &Node, version: u64) -> Self {
        let mut index = Self::default();
        index.recompute(doc, version);
        index
    }

    pub fn recompute(&mut self, doc: &Node, version: u64) -> &[OutlineEntry] {
        self.entries = outline(doc);
        self.version = version;
        log::debug!(
            "outline recomputed for version {version}: {} heading(s)",
            self.entries.len()
        );
        &self.entries
    }

    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the entries were built from an older revision than `version`.
    pub fn is_stale(&self, version: u64) -> bool {
        self.version != version
    }

    /// Navigation target of an entry.
    pub fn locate(&self, entry: &OutlineEntry) -> usize {
        entry.position
    }
}
