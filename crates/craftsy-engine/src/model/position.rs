//! Position resolution over the document tree.
//!
//! A position is an integer in `0..=doc.content_size()` addressing a gap
//! between tokens of the flattened tree. Resolution turns it into the chain
//! of ancestors that contain it.

use crate::error::EditError;
use crate::model::Node;

/// One level of a resolved position: the ancestor, the index of the child
/// the position points at, and the position where the ancestor's content
/// starts.
#[derive(Debug, Clone, Copy)]
struct Level<'a> {
    node: &'a Node,
    index: usize,
    start: usize,
}

/// A position resolved against a specific tree.
///
/// Depth 0 is the document itself; [`ResolvedPos::depth`] is the depth of the
/// innermost non-text node containing the position. On a boundary between two
/// siblings the position resolves into their common parent and
/// [`ResolvedPos::index`] refers to the following sibling.
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pos: usize,
    path: Vec<Level<'a>>,
    parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Ancestor at `depth`; clamped to the innermost one.
    pub fn node(&self, depth: usize) -> &'a Node {
        self.level(depth).node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    /// Index into the ancestor at `depth`.
    pub fn index(&self, depth: usize) -> usize {
        self.level(depth).index
    }

    /// Position where the content of the ancestor at `depth` starts.
    pub fn start(&self, depth: usize) -> usize {
        self.level(depth).start
    }

    /// Position where the content of the ancestor at `depth` ends.
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the ancestor at `depth` (which must be > 0).
    pub fn before(&self, depth: usize) -> Option<usize> {
        (depth > 0).then(|| self.start(depth) - 1)
    }

    /// Position directly after the ancestor at `depth` (which must be > 0).
    pub fn after(&self, depth: usize) -> Option<usize> {
        (depth > 0).then(|| self.end(depth) + 1)
    }

    /// Offset of the position inside its parent's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// Offset into the text node the position falls in, 0 on boundaries.
    pub fn text_offset(&self) -> usize {
        let parent = self.parent();
        let (index, child_start) = parent.find_index(self.parent_offset);
        match parent.child(index) {
            Some(child) if child.is_text() => self.parent_offset - child_start,
            _ => 0,
        }
    }

    /// The node directly after the position, or the text node the position
    /// falls inside.
    pub fn node_after(&self) -> Option<&'a Node> {
        self.parent().child(self.index(self.depth()))
    }

    /// The node directly before the position, or the text node the position
    /// falls inside.
    pub fn node_before(&self) -> Option<&'a Node> {
        let index = self.index(self.depth());
        if self.text_offset() > 0 {
            return self.parent().child(index);
        }
        index
            .checked_sub(1)
            .and_then(|index| self.parent().child(index))
    }

    /// The ancestor chain from the document down to the parent.
    pub fn path(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.path.iter().map(|level| level.node)
    }

    /// Depth of the innermost ancestor that holds inline content.
    pub fn textblock_depth(&self) -> Option<usize> {
        (0..=self.depth())
            .rev()
            .find(|&depth| self.node(depth).is_textblock())
    }

    fn level(&self, depth: usize) -> &Level<'a> {
        &self.path[depth.min(self.depth())]
    }
}

impl Node {
    /// Resolve a position against this node's content.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos<'_>, EditError> {
        let size = self.content_size();
        if pos > size {
            return Err(EditError::OutOfRange { pos, size });
        }

        let mut path = Vec::new();
        let mut node = self;
        let mut start = 0;
        let mut parent_offset = pos;
        loop {
            let (index, offset) = node.find_index(parent_offset);
            path.push(Level { node, index, start });
            let remaining = parent_offset - offset;
            if remaining == 0 {
                break;
            }
            let Some(child) = node.child(index) else {
                break;
            };
            if child.is_text() || child.is_leaf() {
                break;
            }
            node = child;
            parent_offset = remaining - 1;
            start += offset + 1;
        }

        Ok(ResolvedPos {
            pos,
            path,
            parent_offset,
        })
    }

    /// The node starting at `pos`, or the text node containing it.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut pos = pos;
        loop {
            let (index, offset) = node.find_index(pos);
            let child = node.child(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    pub(crate) fn node_at_mut(&mut self, pos: usize) -> Option<&mut Node> {
        let (index, offset) = self.find_index(pos);
        let child = self.content.get_mut(index)?;
        if offset == pos || child.is_text() {
            Some(child)
        } else {
            child.node_at_mut(pos - offset - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;
    use rstest::rstest;

    // 0 <h> 1 I n t r o 6 </h> 7 <ul> 8 <li> 9 <p> 10 o n e 13 </p> 14 </li> 15 </ul> 16 <hr> 17
    fn sample() -> Node {
        Node::doc(vec![
            Node::heading(1, vec![Node::text("Intro")]),
            Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                Node::text("one"),
            ])])]),
            Node::horizontal_rule(),
        ])
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 1, 0)]
    #[case(3, 1, 2)]
    #[case(7, 0, 7)]
    #[case(8, 1, 0)]
    #[case(9, 2, 0)]
    #[case(11, 3, 1)]
    #[case(16, 0, 16)]
    #[case(17, 0, 17)]
    fn test_resolve_depth_and_offset(
        #[case] pos: usize,
        #[case] depth: usize,
        #[case] parent_offset: usize,
    ) {
        let doc = sample();
        let resolved = doc.resolve(pos).unwrap();
        assert_eq!(resolved.depth(), depth);
        assert_eq!(resolved.parent_offset(), parent_offset);
        assert_eq!(resolved.pos(), pos);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let doc = sample();
        assert_eq!(
            doc.resolve(18).unwrap_err(),
            EditError::OutOfRange { pos: 18, size: 17 }
        );
    }

    #[test]
    fn test_boundary_resolves_to_following_sibling() {
        let doc = sample();
        let resolved = doc.resolve(7).unwrap();
        assert_eq!(resolved.index(0), 1);
        assert_eq!(
            resolved.node_after().map(Node::node_type),
            Some(NodeType::BulletList)
        );
        assert_eq!(
            resolved.node_before().map(Node::node_type),
            Some(NodeType::Heading)
        );
    }

    #[test]
    fn test_resolve_inside_text() {
        let doc = sample();
        let resolved = doc.resolve(11).unwrap();
        assert_eq!(resolved.parent().node_type(), NodeType::Paragraph);
        assert_eq!(resolved.start(3), 10);
        assert_eq!(resolved.text_offset(), 1);
        assert_eq!(resolved.node_after().and_then(Node::text_str), Some("one"));
        assert_eq!(resolved.node_before().and_then(Node::text_str), Some("one"));
        assert_eq!(resolved.textblock_depth(), Some(3));
        assert_eq!(resolved.before(1), Some(7));
        assert_eq!(resolved.after(1), Some(16));
        let path: Vec<NodeType> = resolved.path().map(Node::node_type).collect();
        assert_eq!(
            path,
            vec![
                NodeType::Doc,
                NodeType::BulletList,
                NodeType::ListItem,
                NodeType::Paragraph
            ]
        );
    }

    #[rstest]
    #[case(0, Some(NodeType::Heading))]
    #[case(1, Some(NodeType::Text))]
    #[case(4, Some(NodeType::Text))]
    #[case(6, None)]
    #[case(7, Some(NodeType::BulletList))]
    #[case(9, Some(NodeType::Paragraph))]
    #[case(16, Some(NodeType::HorizontalRule))]
    #[case(17, None)]
    fn test_node_at(#[case] pos: usize, #[case] expected: Option<NodeType>) {
        let doc = sample();
        assert_eq!(doc.node_at(pos).map(Node::node_type), expected);
    }

    #[test]
    fn test_node_at_mut_matches_node_at() {
        let mut doc = sample();
        let expected = doc.node_at(8).cloned();
        assert_eq!(doc.node_at_mut(8).map(|node| node.clone()), expected);
    }
}
