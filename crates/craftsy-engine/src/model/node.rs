use serde::{Deserialize, Serialize};

use crate::model::payload::RawNode;
use crate::model::{CellAttrs, ContentRule, Mark, NodeKind, NodeType, SchemaError, TextAlign};

/// Element of the document tree.
///
/// A node is a kind (type plus attributes) and an ordered list of children.
/// Text nodes carry their characters and marks inside [`NodeKind::Text`] and
/// never have children.
///
/// ## Sizes
///
/// Positions count tokens of the flattened tree:
/// - a text node is as long as its number of characters,
/// - any other leaf (image, rule, hard break) has size 1,
/// - a node with content has size `content_size + 2` (its open and close token).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) content: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, content: Vec<Node>) -> Self {
        Self { kind, content }
    }

    pub fn doc(content: Vec<Node>) -> Self {
        Self::new(NodeKind::Doc, content)
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::new(
            NodeKind::Paragraph {
                align: TextAlign::Left,
            },
            content,
        )
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Self::new(
            NodeKind::Heading {
                level,
                align: TextAlign::Left,
            },
            content,
        )
    }

    pub fn blockquote(content: Vec<Node>) -> Self {
        Self::new(NodeKind::Blockquote, content)
    }

    pub fn bullet_list(items: Vec<Node>) -> Self {
        Self::new(NodeKind::BulletList, items)
    }

    pub fn ordered_list(start: u32, items: Vec<Node>) -> Self {
        Self::new(NodeKind::OrderedList { start }, items)
    }

    pub fn list_item(content: Vec<Node>) -> Self {
        Self::new(NodeKind::ListItem, content)
    }

    pub fn task_list(items: Vec<Node>) -> Self {
        Self::new(NodeKind::TaskList, items)
    }

    pub fn task_item(checked: bool, content: Vec<Node>) -> Self {
        Self::new(NodeKind::TaskItem { checked }, content)
    }

    pub fn table(rows: Vec<Node>) -> Self {
        Self::new(NodeKind::Table, rows)
    }

    pub fn table_row(cells: Vec<Node>) -> Self {
        Self::new(NodeKind::TableRow, cells)
    }

    pub fn table_cell(content: Vec<Node>) -> Self {
        Self::new(NodeKind::TableCell(CellAttrs::default()), content)
    }

    pub fn table_header(content: Vec<Node>) -> Self {
        Self::new(NodeKind::TableHeader(CellAttrs::default()), content)
    }

    pub fn code_block(language: Option<&str>, code: &str) -> Self {
        let content = if code.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(code)]
        };
        Self::new(
            NodeKind::CodeBlock {
                language: language.map(str::to_string),
            },
            content,
        )
    }

    pub fn callout(emoji: &str, content: Vec<Node>) -> Self {
        Self::new(
            NodeKind::Callout {
                emoji: emoji.to_string(),
            },
            content,
        )
    }

    pub fn image(src: &str) -> Self {
        Self::new(
            NodeKind::Image {
                src: Some(src.to_string()),
                alt: None,
                title: None,
            },
            Vec::new(),
        )
    }

    pub fn horizontal_rule() -> Self {
        Self::new(NodeKind::HorizontalRule, Vec::new())
    }

    pub fn hard_break() -> Self {
        Self::new(NodeKind::HardBreak, Vec::new())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::marked_text(text, Vec::new())
    }

    pub fn marked_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self::new(
            NodeKind::Text {
                text: text.into(),
                marks,
            },
            Vec::new(),
        )
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text { .. })
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type().is_leaf()
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type().is_textblock()
    }

    /// The characters of a text node.
    pub fn text_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        match &self.kind {
            NodeKind::Text { marks, .. } => marks,
            _ => &[],
        }
    }

    pub fn node_size(&self) -> usize {
        match &self.kind {
            NodeKind::Text { text, .. } => text.chars().count(),
            _ if self.is_leaf() => 1,
            _ => self.content_size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    /// Offset of child `index` relative to the start of this node's content.
    pub fn child_offset(&self, index: usize) -> usize {
        self.content[..index.min(self.content.len())]
            .iter()
            .map(Node::node_size)
            .sum()
    }

    /// Locate the child at content offset `offset`.
    ///
    /// Returns the child index and that child's start offset. An offset on a
    /// boundary between two children points at the following child; an offset
    /// at the very end yields `child_count()`.
    pub(crate) fn find_index(&self, offset: usize) -> (usize, usize) {
        let mut cursor = 0;
        for (index, child) in self.content.iter().enumerate() {
            let end = cursor + child.node_size();
            if end > offset {
                return (index, cursor);
            }
            cursor = end;
        }
        (self.content.len(), cursor)
    }

    /// Concatenation of all descendant text.
    pub fn text_content(&self) -> String {
        if let Some(text) = self.text_str() {
            return text.to_string();
        }
        self.descendants()
            .filter_map(|(node, _)| node.text_str())
            .collect()
    }

    /// Lazy pre-order traversal of all descendants with their positions.
    ///
    /// Positions are relative to the start of this node's content, so for the
    /// document root they are document positions. The iterator can be dropped
    /// at any point to stop early, and every call starts a fresh walk.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![(self.content.iter(), 0)],
        }
    }

    /// Pre-order walk driven by a visitor that can skip subtrees or stop.
    pub fn descendants_until<F>(&self, mut visitor: F)
    where
        F: FnMut(&Node, usize) -> Visit,
    {
        walk(self, 0, &mut visitor);
    }

    /// Check the node and all its descendants against the schema.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let ty = self.node_type();
        if let NodeKind::Text { text, .. } = &self.kind {
            return if text.is_empty() {
                Err(SchemaError::EmptyText)
            } else {
                Ok(())
            };
        }
        self.kind.check_attrs()?;

        match ty.content_rule() {
            ContentRule::Leaf if !self.content.is_empty() => {
                return Err(SchemaError::LeafWithContent(ty.name()));
            }
            ContentRule::Blocks { required: true }
            | ContentRule::OneOf { required: true, .. }
                if self.content.is_empty() =>
            {
                return Err(SchemaError::MissingContent(ty.name()));
            }
            ContentRule::ParagraphThenBlocks => {
                let leads_with_paragraph = self
                    .content
                    .first()
                    .is_some_and(|first| first.node_type() == NodeType::Paragraph);
                if !leads_with_paragraph {
                    return Err(SchemaError::MissingLeadingParagraph(ty.name()));
                }
            }
            _ => {}
        }

        for child in &self.content {
            if !ty.allows_child(child.node_type()) {
                return Err(SchemaError::IllegalChild {
                    parent: ty.name(),
                    child: child.node_type().name(),
                });
            }
            if !child.marks().is_empty() && !ty.allows_marks() {
                return Err(SchemaError::MarksNotAllowed(ty.name()));
            }
            child.validate()?;
        }
        Ok(())
    }

    /// Drop empty text nodes and merge adjacent text with identical marks.
    ///
    /// Never changes the size of the tree, so positions stay valid.
    pub(crate) fn normalize(&mut self) {
        let children = std::mem::take(&mut self.content);
        let mut merged: Vec<Node> = Vec::with_capacity(children.len());
        for mut child in children {
            child.normalize();
            if let NodeKind::Text { text, marks } = &child.kind {
                if text.is_empty() {
                    continue;
                }
                if let Some(NodeKind::Text {
                    text: previous,
                    marks: previous_marks,
                }) = merged.last_mut().map(|last| &mut last.kind)
                    && previous_marks == marks
                {
                    previous.push_str(text);
                    continue;
                }
            }
            merged.push(child);
        }
        self.content = merged;
    }

    /// Split a text node at character offset `at`.
    pub(crate) fn split_text(&self, at: usize) -> (Node, Node) {
        match &self.kind {
            NodeKind::Text { text, marks } => {
                let byte = text
                    .char_indices()
                    .nth(at)
                    .map_or(text.len(), |(byte, _)| byte);
                (
                    Node::marked_text(&text[..byte], marks.clone()),
                    Node::marked_text(&text[byte..], marks.clone()),
                )
            }
            _ => (self.clone(), Node::text("")),
        }
    }
}

/// Visitor decision for [`Node::descendants_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    SkipChildren,
    Stop,
}

/// Returns false once the visitor asked to stop.
fn walk<F>(node: &Node, content_start: usize, visitor: &mut F) -> bool
where
    F: FnMut(&Node, usize) -> Visit,
{
    let mut pos = content_start;
    for child in &node.content {
        match visitor(child, pos) {
            Visit::Stop => return false,
            Visit::SkipChildren => {}
            Visit::Continue => {
                if !walk(child, pos + 1, visitor) {
                    return false;
                }
            }
        }
        pos += child.node_size();
    }
    true
}

/// Iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<(std::slice::Iter<'a, Node>, usize)>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (&'a Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (children, next_pos) = self.stack.last_mut()?;
            match children.next() {
                Some(child) => {
                    let pos = *next_pos;
                    *next_pos += child.node_size();
                    if !child.content.is_empty() {
                        self.stack.push((child.content.iter(), pos + 1));
                    }
                    return Some((child, pos));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Node {
        Node::doc(vec![
            Node::heading(1, vec![Node::text("Intro")]),
            Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                Node::text("one"),
            ])])]),
            Node::horizontal_rule(),
        ])
    }

    #[test]
    fn test_node_sizes() {
        let doc = sample();
        assert_eq!(doc.content[0].node_size(), 7);
        // list(item(paragraph("one"))) = 3 + 2 * 3
        assert_eq!(doc.content[1].node_size(), 9);
        assert_eq!(doc.content[2].node_size(), 1);
        assert_eq!(doc.content_size(), 17);
        assert_eq!(Node::text("héllo").node_size(), 5);
    }

    #[test]
    fn test_find_index_prefers_following_node() {
        let doc = sample();
        assert_eq!(doc.find_index(0), (0, 0));
        assert_eq!(doc.find_index(3), (0, 0));
        assert_eq!(doc.find_index(7), (1, 7));
        assert_eq!(doc.find_index(16), (2, 16));
        assert_eq!(doc.find_index(17), (3, 17));
    }

    #[test]
    fn test_descendants_pre_order_with_positions() {
        let doc = sample();
        let visited: Vec<(NodeType, usize)> = doc
            .descendants()
            .map(|(node, pos)| (node.node_type(), pos))
            .collect();

        assert_eq!(
            visited,
            vec![
                (NodeType::Heading, 0),
                (NodeType::Text, 1),
                (NodeType::BulletList, 7),
                (NodeType::ListItem, 8),
                (NodeType::Paragraph, 9),
                (NodeType::Text, 10),
                (NodeType::HorizontalRule, 16),
            ]
        );
    }

    #[test]
    fn test_descendants_is_restartable_and_stoppable() {
        let doc = sample();
        let first = doc.descendants().next();
        let again = doc.descendants().next();
        assert_eq!(first, again);
        assert_eq!(doc.descendants().take(2).count(), 2);
    }

    #[test]
    fn test_descendants_until_skips_and_stops() {
        let doc = sample();
        let mut seen = Vec::new();
        doc.descendants_until(|node, _| {
            seen.push(node.node_type());
            match node.node_type() {
                NodeType::Heading => Visit::SkipChildren,
                NodeType::ListItem => Visit::Stop,
                _ => Visit::Continue,
            }
        });
        assert_eq!(
            seen,
            vec![NodeType::Heading, NodeType::BulletList, NodeType::ListItem]
        );
    }

    #[test]
    fn test_text_content() {
        let doc = sample();
        assert_eq!(doc.text_content(), "Introone");
        assert_eq!(doc.content[0].text_content(), "Intro");
    }

    #[test]
    fn test_validate_rejects_illegal_children() {
        let table = Node::doc(vec![Node::table(vec![Node::paragraph(vec![])])]);
        assert_eq!(
            table.validate(),
            Err(SchemaError::IllegalChild {
                parent: "table",
                child: "paragraph"
            })
        );

        let empty_list = Node::doc(vec![Node::bullet_list(vec![])]);
        assert_eq!(
            empty_list.validate(),
            Err(SchemaError::MissingContent("bulletList"))
        );

        let item_without_paragraph = Node::doc(vec![Node::bullet_list(vec![Node::list_item(
            vec![Node::horizontal_rule()],
        )])]);
        assert_eq!(
            item_without_paragraph.validate(),
            Err(SchemaError::MissingLeadingParagraph("listItem"))
        );

        let marked_code = Node::doc(vec![Node::new(
            NodeKind::CodeBlock { language: None },
            vec![Node::marked_text("x", vec![Mark::Bold])],
        )]);
        assert_eq!(
            marked_code.validate(),
            Err(SchemaError::MarksNotAllowed("codeBlock"))
        );

        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_checks_attribute_ranges() {
        for level in [0, 7] {
            let heading = Node::doc(vec![Node::heading(level, vec![Node::text("x")])]);
            assert!(matches!(
                heading.validate(),
                Err(SchemaError::InvalidAttr { node: "heading", ref name, .. }) if name == "level"
            ));
        }
        assert!(Node::heading(6, vec![]).validate().is_ok());

        let cell = |colspan, rowspan| {
            Node::table(vec![Node::table_row(vec![Node::new(
                NodeKind::TableHeader(CellAttrs {
                    colspan,
                    rowspan,
                    colwidth: None,
                }),
                vec![Node::paragraph(vec![])],
            )])])
        };
        assert!(matches!(
            cell(0, 1).validate(),
            Err(SchemaError::InvalidAttr { ref name, .. }) if name == "colspan"
        ));
        assert!(matches!(
            cell(2, 0).validate(),
            Err(SchemaError::InvalidAttr { ref name, .. }) if name == "rowspan"
        ));
        assert!(cell(2, 3).validate().is_ok());
    }

    #[test]
    fn test_normalize_merges_text_with_same_marks() {
        let mut paragraph = Node::paragraph(vec![
            Node::text("ab"),
            Node::text(""),
            Node::text("cd"),
            Node::marked_text("ef", vec![Mark::Bold]),
            Node::marked_text("gh", vec![Mark::Bold]),
        ]);
        paragraph.normalize();
        assert_eq!(
            paragraph,
            Node::paragraph(vec![
                Node::text("abcd"),
                Node::marked_text("efgh", vec![Mark::Bold]),
            ])
        );
    }

    #[test]
    fn test_split_text_on_char_boundary() {
        let (left, right) = Node::marked_text("héllo", vec![Mark::Italic]).split_text(2);
        assert_eq!(left, Node::marked_text("hé", vec![Mark::Italic]));
        assert_eq!(right, Node::marked_text("llo", vec![Mark::Italic]));
    }
}
