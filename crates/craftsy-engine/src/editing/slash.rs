//! Slash command catalog and execution.
//!
//! Typing `/` followed by a query offers [`slash_items`]; choosing one removes
//! the typed `/query` text and converts or extends the text block the caret
//! sits in.

use std::ops::Range;

use crate::editing::mapping::Bias;
use crate::editing::transform::{Transaction, Transformed};
use crate::error::EditError;
use crate::model::{DEFAULT_CALLOUT_EMOJI, Node, NodeKind, NodeType, TextAlign};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    Paragraph,
    Heading(u8),
    Checklist,
    BulletList,
    NumberedList,
    CodeBlock,
    Divider,
    Callout,
    Table { rows: usize, cols: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashItem {
    pub title: &'static str,
    pub command: SlashCommand,
}

pub const SLASH_ITEMS: &[SlashItem] = &[
    SlashItem {
        title: "Paragraph",
        command: SlashCommand::Paragraph,
    },
    SlashItem {
        title: "Heading 1",
        command: SlashCommand::Heading(1),
    },
    SlashItem {
        title: "Heading 2",
        command: SlashCommand::Heading(2),
    },
    SlashItem {
        title: "Checklist",
        command: SlashCommand::Checklist,
    },
    SlashItem {
        title: "Bullet List",
        command: SlashCommand::BulletList,
    },
    SlashItem {
        title: "Numbered List",
        command: SlashCommand::NumberedList,
    },
    SlashItem {
        title: "Code Block",
        command: SlashCommand::CodeBlock,
    },
    SlashItem {
        title: "Divider",
        command: SlashCommand::Divider,
    },
    SlashItem {
        title: "Callout",
        command: SlashCommand::Callout,
    },
    SlashItem {
        title: "Table (3×3)",
        command: SlashCommand::Table { rows: 3, cols: 3 },
    },
];

/// Catalog entries whose title contains `query`, ignoring case.
pub fn slash_items(query: &str) -> Vec<&'static SlashItem> {
    let query = query.to_lowercase();
    SLASH_ITEMS
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&query))
        .collect()
}

/// A table whose first row holds header cells, each cell an empty paragraph.
pub fn table(rows: usize, cols: usize) -> Node {
    let row = |header: bool| {
        Node::table_row(
            (0..cols)
                .map(|_| {
                    let content = vec![Node::paragraph(Vec::new())];
                    if header {
                        Node::table_header(content)
                    } else {
                        Node::table_cell(content)
                    }
                })
                .collect(),
        )
    };
    Node::table((0..rows).map(|index| row(index == 0)).collect())
}

/// Remove the typed `range` and run `command` on the surrounding text block.
pub fn run_slash(
    doc: &Node,
    range: Range<usize>,
    command: SlashCommand,
) -> Result<Transformed, EditError> {
    let tx = Transaction::new(doc).delete(range.start, range.end)?;
    let at = tx.mapping().map(range.start, Bias::Left);

    let (before, block) = {
        let resolved = tx.doc().resolve(at)?;
        let depth = resolved
            .textblock_depth()
            .filter(|depth| *depth > 0)
            .ok_or_else(|| EditError::NotFound(format!("no text block around position {at}")))?;
        (resolved.start(depth) - 1, resolved.node(depth).clone())
    };
    let after = before + block.node_size();

    let tx = match command {
        SlashCommand::Paragraph => {
            tx.set_block_type(before, NodeKind::default_for(NodeType::Paragraph))?
        }
        SlashCommand::Heading(level) => {
            let kind = match block.kind() {
                NodeKind::Heading { level: current, .. } if *current == level => {
                    NodeKind::default_for(NodeType::Paragraph)
                }
                _ => NodeKind::Heading {
                    level,
                    align: TextAlign::Left,
                },
            };
            tx.set_block_type(before, kind)?
        }
        SlashCommand::CodeBlock => {
            let kind = if block.node_type() == NodeType::CodeBlock {
                NodeKind::default_for(NodeType::Paragraph)
            } else {
                NodeKind::CodeBlock { language: None }
            };
            tx.set_block_type(before, kind)?
        }
        SlashCommand::Callout => tx.set_block_type(
            before,
            NodeKind::Callout {
                emoji: DEFAULT_CALLOUT_EMOJI.to_string(),
            },
        )?,
        SlashCommand::BulletList => {
            let list = Node::bullet_list(vec![Node::list_item(vec![as_paragraph(&block)])]);
            tx.insert(after, list)?.delete(before, after)?
        }
        SlashCommand::NumberedList => {
            let list = Node::ordered_list(1, vec![Node::list_item(vec![as_paragraph(&block)])]);
            tx.insert(after, list)?.delete(before, after)?
        }
        SlashCommand::Checklist => {
            let list = Node::task_list(vec![Node::task_item(false, vec![as_paragraph(&block)])]);
            tx.insert(after, list)?.delete(before, after)?
        }
        SlashCommand::Divider => place_block(tx, &block, before, after, Node::horizontal_rule())?,
        SlashCommand::Table { rows, cols } => {
            place_block(tx, &block, before, after, table(rows, cols))?
        }
    };
    tx.commit()
}

/// Paragraph holding the inline content of a text block.
fn as_paragraph(block: &Node) -> Node {
    Node::paragraph(block.content().to_vec())
}

/// Insert `node` after the text block, replacing the block when it is empty.
fn place_block(
    tx: Transaction,
    block: &Node,
    before: usize,
    after: usize,
    node: Node,
) -> Result<Transaction, EditError> {
    let tx = tx.insert(after, node)?;
    if block.content_size() == 0 {
        tx.delete(before, after)
    } else {
        Ok(tx)
    }
}
