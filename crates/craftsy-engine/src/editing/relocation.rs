//! Moving top-level blocks by drag and drop.
//!
//! The drag source and the drop point both arrive as raw positions. The
//! source is widened to the top-level block it falls in and the drop point is
//! snapped to the nearest gap between top-level blocks. The move itself is a
//! single transaction (delete, then insert) whose mapping mirrors the two
//! steps so positions inside the moved block travel with it.

use crate::editing::transform::{Transaction, Transformed};
use crate::error::EditError;
use crate::model::{Node, NodeType};

/// Drag handle descriptor for one top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    /// Position directly before the block
    pub pos: usize,
    pub size: usize,
    pub node_type: NodeType,
}

impl BlockHandle {
    /// Position directly after the block.
    pub fn end(&self) -> usize {
        self.pos + self.size
    }
}

/// One handle per top-level block, in document order.
pub fn block_handles(doc: &Node) -> Vec<BlockHandle> {
    let mut pos = 0;
    doc.content()
        .iter()
        .map(|block| {
            let handle = BlockHandle {
                pos,
                size: block.node_size(),
                node_type: block.node_type(),
            };
            pos += handle.size;
            handle
        })
        .collect()
}

/// Move the top-level block at `source_pos` to the gap nearest `drop_pos`.
///
/// Dropping a block onto itself or either of its own edges is a no-op.
pub fn relocate_block(
    doc: &Node,
    source_pos: usize,
    drop_pos: usize,
) -> Result<Transformed, EditError> {
    let (start, block) = source_block(doc, source_pos)?;
    let size = block.node_size();
    let end = start + size;
    let target = drop_target(doc, drop_pos)?;

    if (start..=end).contains(&target) {
        log::debug!("drop at {target} is within the dragged block [{start}, {end}]");
        return Transaction::new(doc).commit();
    }

    let insert_at = if target > start { target - size } else { target };
    log::debug!(
        "moving `{}` from {start} to {insert_at}",
        block.node_type().name()
    );
    Transaction::new(doc)
        .delete(start, end)?
        .insert(insert_at, block.clone())?
        .mirror(0, 1)
        .commit()
}

/// The top-level block containing `pos`, or the one starting at it.
fn source_block(doc: &Node, pos: usize) -> Result<(usize, &Node), EditError> {
    let resolved = doc.resolve(pos)?;
    if resolved.depth() > 0 {
        return Ok((resolved.start(1) - 1, resolved.node(1)));
    }
    let index = resolved.index(0);
    doc.child(index)
        .map(|block| (doc.child_offset(index), block))
        .ok_or_else(|| EditError::NotFound(format!("no block at or after position {pos}")))
}

/// The gap between top-level blocks closest to `pos`, preferring the earlier
/// one on a tie.
fn drop_target(doc: &Node, pos: usize) -> Result<usize, EditError> {
    let resolved = doc.resolve(pos)?;
    if resolved.depth() == 0 {
        return Ok(pos);
    }
    let before = resolved.start(1) - 1;
    let after = before + resolved.node(1).node_size();
    Ok(if pos - before <= after - pos {
        before
    } else {
        after
    })
}
