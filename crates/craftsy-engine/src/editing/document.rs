use crate::editing::commands::compile_command;
use crate::editing::outline::{OutlineEntry, OutlineIndex};
use crate::editing::relocation::{BlockHandle, block_handles};
use crate::editing::transform::{Outcome, Transformed};
use crate::editing::{Cmd, Patch, Selection};
use crate::error::EditError;
use crate::model::{Node, NodeType};

/// The live revision of a document and the state derived from it.
///
/// `Document` owns exactly one tree at a time. Every change goes through
/// [`Document::apply`], which either swaps in a fully validated new revision
/// or leaves everything untouched. After an applied command:
///
/// - the version counter is incremented,
/// - the selection is remapped through the command's position mapping,
/// - the outline is recomputed against the new tree.
///
/// ```rust
/// # use craftsy_engine::{Cmd, Document, Node};
/// let mut doc = Document::new();
/// let patch = doc
///     .apply(Cmd::Insert {
///         at: 0,
///         node: Node::heading(1, vec![Node::text("Intro")]),
///     })
///     .unwrap();
///
/// assert!(patch.is_applied());
/// assert_eq!(doc.outline()[0].text, "Intro");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) root: Node,
    pub(crate) selection: Selection,
    /// Incremented once per applied command
    pub(crate) version: u64,
    pub(crate) outline: OutlineIndex,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding a single empty paragraph.
    pub fn new() -> Self {
        let root = Node::doc(vec![Node::paragraph(Vec::new())]);
        let outline = OutlineIndex::new(&root, 0);
        Self {
            root,
            selection: Selection::default(),
            version: 0,
            outline,
        }
    }

    /// Adopt an existing tree after checking it against the schema.
    pub fn from_node(root: Node) -> Result<Self, EditError> {
        if root.node_type() != NodeType::Doc {
            return Err(EditError::SchemaViolation(format!(
                "expected a document, got `{}`",
                root.node_type().name()
            )));
        }
        root.validate()?;
        let outline = OutlineIndex::new(&root, 0);
        Ok(Self {
            selection: Selection::caret(root.content_size()),
            root,
            version: 0,
            outline,
        })
    }

    /// Parse a serialized tree payload.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let root: Node = serde_json::from_slice(bytes)?;
        Ok(Self::from_node(root)?)
    }

    /// The serialized tree payload.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.root)?)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.root)
    }

    /// Apply a command, replacing the live revision if it changed anything.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let Transformed {
            doc,
            mapping,
            outcome,
        } = compile_command(&self.root, &cmd).inspect_err(|err| {
            log::warn!("rejected {}: {err}", command_name(&cmd));
        })?;

        if outcome == Outcome::Applied {
            self.root = doc;
            self.version += 1;
            self.selection = self.selection.map(&mapping).clamp(self.root.content_size());
            self.outline.recompute(&self.root, self.version);
        }

        Ok(Patch {
            outcome,
            version: self.version,
            mapping,
            selection: self.selection,
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn size(&self) -> usize {
        self.root.content_size()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EditError> {
        let size = self.size();
        if selection.to() > size {
            return Err(EditError::OutOfRange {
                pos: selection.to(),
                size,
            });
        }
        self.selection = selection;
        Ok(())
    }

    pub fn outline(&self) -> &[OutlineEntry] {
        self.outline.entries()
    }

    pub fn outline_index(&self) -> &OutlineIndex {
        &self.outline
    }

    pub fn block_handles(&self) -> Vec<BlockHandle> {
        block_handles(&self.root)
    }
}

fn command_name(cmd: &Cmd) -> &'static str {
    match cmd {
        Cmd::Insert { .. } => "insert",
        Cmd::DeleteRange { .. } => "delete",
        Cmd::ReplaceRange { .. } => "replace",
        Cmd::SetAttrs { .. } => "set attributes",
        Cmd::AddMark { .. } => "add mark",
        Cmd::RemoveMark { .. } => "remove mark",
        Cmd::SetBlockType { .. } => "set block type",
        Cmd::MoveBlock { .. } => "move block",
        Cmd::Slash { .. } => "slash command",
        Cmd::SetContent { .. } => "set content",
    }
}
