use std::ops::Range;

use crate::editing::relocation::relocate_block;
use crate::editing::slash::{SlashCommand, run_slash};
use crate::editing::transform::{self, Transformed};
use crate::error::EditError;
use crate::model::{Attrs, Mark, MarkType, Node, NodeKind};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Insert {
        at: usize,
        node: Node,
    },
    DeleteRange {
        range: Range<usize>,
    },
    ReplaceRange {
        range: Range<usize>,
        node: Node,
    },
    SetAttrs {
        at: usize,
        attrs: Attrs,
    },
    AddMark {
        range: Range<usize>,
        mark: Mark,
    },
    RemoveMark {
        range: Range<usize>,
        mark: MarkType,
    },
    SetBlockType {
        at: usize,
        kind: NodeKind,
    },
    /// Drag a top-level block from one position and drop it at another
    MoveBlock {
        from: usize,
        to: usize,
    },
    Slash {
        range: Range<usize>,
        command: SlashCommand,
    },
    SetContent {
        doc: Node,
    },
}

/// Compile a command into a committed transaction against `doc`
pub(crate) fn compile_command(doc: &Node, cmd: &Cmd) -> Result<Transformed, EditError> {
    match cmd {
        Cmd::Insert { at, node } => transform::insert(doc, *at, node.clone()),
        Cmd::DeleteRange { range } => transform::delete_range(doc, range.start, range.end),
        Cmd::ReplaceRange { range, node } => {
            transform::replace_range(doc, range.start, range.end, node.clone())
        }
        Cmd::SetAttrs { at, attrs } => transform::set_attrs(doc, *at, attrs.clone()),
        Cmd::AddMark { range, mark } => {
            transform::add_mark(doc, range.start, range.end, mark.clone())
        }
        Cmd::RemoveMark { range, mark } => {
            transform::remove_mark(doc, range.start, range.end, *mark)
        }
        Cmd::SetBlockType { at, kind } => transform::set_block_type(doc, *at, kind.clone()),
        Cmd::MoveBlock { from, to } => relocate_block(doc, *from, *to),
        Cmd::Slash { range, command } => run_slash(doc, range.clone(), *command),
        Cmd::SetContent { doc: replacement } => transform::replace_doc(doc, replacement.clone()),
    }
}
