//! Node types and the content rules between them.
//!
//! The schema is closed: every node kind is a variant of [`NodeKind`] with a
//! statically declared attribute record, and [`NodeType`] carries the
//! parent/child rules used by validation.

use serde_json::{Map, Value};
use thiserror::Error;

/// Attribute payload as it appears in the serialized tree (`attrs` object).
pub type Attrs = Map<String, Value>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("unknown mark type `{0}`")]
    UnknownMarkType(String),

    #[error("`{node}` has no attribute `{name}`")]
    UnknownAttr { node: &'static str, name: String },

    #[error("invalid value for `{node}.{name}`: {reason}")]
    InvalidAttr {
        node: &'static str,
        name: String,
        reason: String,
    },

    #[error("`{parent}` cannot contain `{child}`")]
    IllegalChild {
        parent: &'static str,
        child: &'static str,
    },

    #[error("`{0}` requires at least one child")]
    MissingContent(&'static str),

    #[error("`{0}` must start with a paragraph")]
    MissingLeadingParagraph(&'static str),

    #[error("text nodes must not be empty")]
    EmptyText,

    #[error("text inside `{0}` cannot carry marks")]
    MarksNotAllowed(&'static str),

    #[error("`{0}` is a leaf and cannot have content")]
    LeafWithContent(&'static str),

    #[error("text node is missing its `text` field")]
    MissingText,
}

/// Which children a node type admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// Leaf node, no children at all
    Leaf,
    /// Inline content (text and hard breaks), possibly empty
    Inline,
    /// Unmarked text only
    PlainText,
    /// Block-group children
    Blocks { required: bool },
    /// Children restricted to the listed types
    OneOf {
        types: &'static [NodeType],
        required: bool,
    },
    /// A paragraph followed by any number of blocks (list and task items)
    ParagraphThenBlocks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Root,
    Block,
    Inline,
    /// Only valid inside a specific parent (list items, rows, cells)
    Structural,
}

/// Fieldless tag for every node kind in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    TaskItem,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    CodeBlock,
    Callout,
    Image,
    HorizontalRule,
    HardBreak,
    Text,
}

impl NodeType {
    pub const ALL: [NodeType; 19] = [
        NodeType::Doc,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::Blockquote,
        NodeType::BulletList,
        NodeType::OrderedList,
        NodeType::ListItem,
        NodeType::TaskList,
        NodeType::TaskItem,
        NodeType::Table,
        NodeType::TableRow,
        NodeType::TableCell,
        NodeType::TableHeader,
        NodeType::CodeBlock,
        NodeType::Callout,
        NodeType::Image,
        NodeType::HorizontalRule,
        NodeType::HardBreak,
        NodeType::Text,
    ];

    /// Name used in the serialized payload.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::Blockquote => "blockquote",
            NodeType::BulletList => "bulletList",
            NodeType::OrderedList => "orderedList",
            NodeType::ListItem => "listItem",
            NodeType::TaskList => "taskList",
            NodeType::TaskItem => "taskItem",
            NodeType::Table => "table",
            NodeType::TableRow => "tableRow",
            NodeType::TableCell => "tableCell",
            NodeType::TableHeader => "tableHeader",
            NodeType::CodeBlock => "codeBlock",
            NodeType::Callout => "callout",
            NodeType::Image => "image",
            NodeType::HorizontalRule => "horizontalRule",
            NodeType::HardBreak => "hardBreak",
            NodeType::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SchemaError> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name() == name)
            .ok_or_else(|| SchemaError::UnknownNodeType(name.to_string()))
    }

    pub fn group(self) -> Group {
        match self {
            NodeType::Doc => Group::Root,
            NodeType::Paragraph
            | NodeType::Heading
            | NodeType::Blockquote
            | NodeType::BulletList
            | NodeType::OrderedList
            | NodeType::TaskList
            | NodeType::Table
            | NodeType::CodeBlock
            | NodeType::Callout
            | NodeType::Image
            | NodeType::HorizontalRule => Group::Block,
            NodeType::HardBreak | NodeType::Text => Group::Inline,
            NodeType::ListItem
            | NodeType::TaskItem
            | NodeType::TableRow
            | NodeType::TableCell
            | NodeType::TableHeader => Group::Structural,
        }
    }

    pub fn content_rule(self) -> ContentRule {
        const ITEMS: &[NodeType] = &[NodeType::ListItem];
        const TASKS: &[NodeType] = &[NodeType::TaskItem];
        const ROWS: &[NodeType] = &[NodeType::TableRow];
        const CELLS: &[NodeType] = &[NodeType::TableCell, NodeType::TableHeader];

        match self {
            NodeType::Doc | NodeType::Blockquote => ContentRule::Blocks { required: true },
            NodeType::TableCell | NodeType::TableHeader => ContentRule::Blocks { required: true },
            NodeType::Paragraph | NodeType::Heading | NodeType::Callout => ContentRule::Inline,
            NodeType::CodeBlock => ContentRule::PlainText,
            NodeType::BulletList | NodeType::OrderedList => ContentRule::OneOf {
                types: ITEMS,
                required: true,
            },
            NodeType::TaskList => ContentRule::OneOf {
                types: TASKS,
                required: true,
            },
            NodeType::Table => ContentRule::OneOf {
                types: ROWS,
                required: true,
            },
            NodeType::TableRow => ContentRule::OneOf {
                types: CELLS,
                required: false,
            },
            NodeType::ListItem | NodeType::TaskItem => ContentRule::ParagraphThenBlocks,
            NodeType::Image | NodeType::HorizontalRule | NodeType::HardBreak | NodeType::Text => {
                ContentRule::Leaf
            }
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self.content_rule(), ContentRule::Leaf)
    }

    pub fn is_inline(self) -> bool {
        self.group() == Group::Inline
    }

    pub fn is_block(self) -> bool {
        self.group() == Group::Block
    }

    /// Nodes whose children are inline content.
    pub fn is_textblock(self) -> bool {
        matches!(
            self.content_rule(),
            ContentRule::Inline | ContentRule::PlainText
        )
    }

    /// Whether `child` may appear somewhere in this node's content.
    ///
    /// Ordering constraints (the leading paragraph of list items) are only
    /// checked by full validation.
    pub fn allows_child(self, child: NodeType) -> bool {
        match self.content_rule() {
            ContentRule::Leaf => false,
            ContentRule::Inline => child.is_inline(),
            ContentRule::PlainText => child == NodeType::Text,
            ContentRule::Blocks { .. } | ContentRule::ParagraphThenBlocks => child.is_block(),
            ContentRule::OneOf { types, .. } => types.contains(&child),
        }
    }

    /// Whether text directly inside this node may carry marks.
    pub fn allows_marks(self) -> bool {
        matches!(self.content_rule(), ContentRule::Inline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

/// Shared attribute record of table cells and header cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAttrs {
    pub colspan: u32,
    pub rowspan: u32,
    pub colwidth: Option<Vec<u32>>,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            colwidth: None,
        }
    }
}

/// A node's type together with its attribute record.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Doc,
    Paragraph {
        align: TextAlign,
    },
    Heading {
        level: u8,
        align: TextAlign,
    },
    Blockquote,
    BulletList,
    OrderedList {
        start: u32,
    },
    ListItem,
    TaskList,
    TaskItem {
        checked: bool,
    },
    Table,
    TableRow,
    TableCell(CellAttrs),
    TableHeader(CellAttrs),
    CodeBlock {
        language: Option<String>,
    },
    Callout {
        emoji: String,
    },
    Image {
        src: Option<String>,
        alt: Option<String>,
        title: Option<String>,
    },
    HorizontalRule,
    HardBreak,
    Text {
        text: String,
        marks: Vec<crate::model::Mark>,
    },
}

pub const DEFAULT_CALLOUT_EMOJI: &str = "💡";

impl NodeKind {
    /// The attribute record of `ty` filled with defaults.
    ///
    /// Text has no default; callers build it through [`NodeKind::Text`].
    pub fn default_for(ty: NodeType) -> NodeKind {
        match ty {
            NodeType::Doc => NodeKind::Doc,
            NodeType::Paragraph => NodeKind::Paragraph {
                align: TextAlign::Left,
            },
            NodeType::Heading => NodeKind::Heading {
                level: 1,
                align: TextAlign::Left,
            },
            NodeType::Blockquote => NodeKind::Blockquote,
            NodeType::BulletList => NodeKind::BulletList,
            NodeType::OrderedList => NodeKind::OrderedList { start: 1 },
            NodeType::ListItem => NodeKind::ListItem,
            NodeType::TaskList => NodeKind::TaskList,
            NodeType::TaskItem => NodeKind::TaskItem { checked: false },
            NodeType::Table => NodeKind::Table,
            NodeType::TableRow => NodeKind::TableRow,
            NodeType::TableCell => NodeKind::TableCell(CellAttrs::default()),
            NodeType::TableHeader => NodeKind::TableHeader(CellAttrs::default()),
            NodeType::CodeBlock => NodeKind::CodeBlock { language: None },
            NodeType::Callout => NodeKind::Callout {
                emoji: DEFAULT_CALLOUT_EMOJI.to_string(),
            },
            NodeType::Image => NodeKind::Image {
                src: None,
                alt: None,
                title: None,
            },
            NodeType::HorizontalRule => NodeKind::HorizontalRule,
            NodeType::HardBreak => NodeKind::HardBreak,
            NodeType::Text => NodeKind::Text {
                text: String::new(),
                marks: Vec::new(),
            },
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Doc => NodeType::Doc,
            NodeKind::Paragraph { .. } => NodeType::Paragraph,
            NodeKind::Heading { .. } => NodeType::Heading,
            NodeKind::Blockquote => NodeType::Blockquote,
            NodeKind::BulletList => NodeType::BulletList,
            NodeKind::OrderedList { .. } => NodeType::OrderedList,
            NodeKind::ListItem => NodeType::ListItem,
            NodeKind::TaskList => NodeType::TaskList,
            NodeKind::TaskItem { .. } => NodeType::TaskItem,
            NodeKind::Table => NodeType::Table,
            NodeKind::TableRow => NodeType::TableRow,
            NodeKind::TableCell(_) => NodeType::TableCell,
            NodeKind::TableHeader(_) => NodeType::TableHeader,
            NodeKind::CodeBlock { .. } => NodeType::CodeBlock,
            NodeKind::Callout { .. } => NodeType::Callout,
            NodeKind::Image { .. } => NodeType::Image,
            NodeKind::HorizontalRule => NodeType::HorizontalRule,
            NodeKind::HardBreak => NodeType::HardBreak,
            NodeKind::Text { .. } => NodeType::Text,
        }
    }

    /// Attribute names this kind declares.
    pub fn attr_names(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Paragraph { .. } => &["textAlign"],
            NodeKind::Heading { .. } => &["level", "textAlign"],
            NodeKind::OrderedList { .. } => &["start"],
            NodeKind::TaskItem { .. } => &["checked"],
            NodeKind::TableCell(_) | NodeKind::TableHeader(_) => {
                &["colspan", "rowspan", "colwidth"]
            }
            NodeKind::CodeBlock { .. } => &["language"],
            NodeKind::Callout { .. } => &["emoji"],
            NodeKind::Image { .. } => &["src", "alt", "title"],
            _ => &[],
        }
    }

    /// The attribute record as a payload object, `None` for kinds without
    /// attributes.
    pub fn attrs(&self) -> Option<Attrs> {
        let mut attrs = Attrs::new();
        match self {
            NodeKind::Paragraph { align } => {
                attrs.insert("textAlign".into(), align.as_str().into());
            }
            NodeKind::Heading { level, align } => {
                attrs.insert("level".into(), (*level).into());
                attrs.insert("textAlign".into(), align.as_str().into());
            }
            NodeKind::OrderedList { start } => {
                attrs.insert("start".into(), (*start).into());
            }
            NodeKind::TaskItem { checked } => {
                attrs.insert("checked".into(), (*checked).into());
            }
            NodeKind::TableCell(cell) | NodeKind::TableHeader(cell) => {
                attrs.insert("colspan".into(), cell.colspan.into());
                attrs.insert("rowspan".into(), cell.rowspan.into());
                attrs.insert(
                    "colwidth".into(),
                    cell.colwidth.clone().map_or(Value::Null, Value::from),
                );
            }
            NodeKind::CodeBlock { language } => {
                attrs.insert("language".into(), optional(language));
            }
            NodeKind::Callout { emoji } => {
                attrs.insert("emoji".into(), emoji.as_str().into());
            }
            NodeKind::Image { src, alt, title } => {
                attrs.insert("src".into(), optional(src));
                attrs.insert("alt".into(), optional(alt));
                attrs.insert("title".into(), optional(title));
            }
            _ => return None,
        }
        Some(attrs)
    }

    /// Check attribute values that their types alone do not restrict.
    pub fn check_attrs(&self) -> Result<(), SchemaError> {
        let node = self.node_type().name();
        let invalid = |name: &str, reason: &str| SchemaError::InvalidAttr {
            node,
            name: name.to_string(),
            reason: reason.to_string(),
        };

        match self {
            NodeKind::Heading { level, .. } if !(1..=6).contains(level) => {
                Err(invalid("level", "expected an integer between 1 and 6"))
            }
            NodeKind::TableCell(cell) | NodeKind::TableHeader(cell) => {
                if cell.colspan < 1 {
                    Err(invalid("colspan", "expected a positive integer"))
                } else if cell.rowspan < 1 {
                    Err(invalid("rowspan", "expected a positive integer"))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Set a single attribute, rejecting unknown names and ill-typed values.
    pub fn set_attr(&mut self, name: &str, value: &Value) -> Result<(), SchemaError> {
        let node = self.node_type().name();
        let invalid = |reason: &str| SchemaError::InvalidAttr {
            node,
            name: name.to_string(),
            reason: reason.to_string(),
        };

        match (self, name) {
            (NodeKind::Paragraph { align }, "textAlign")
            | (NodeKind::Heading { align, .. }, "textAlign") => {
                *align = value
                    .as_str()
                    .and_then(TextAlign::parse)
                    .ok_or_else(|| invalid("expected left, center, right or justify"))?;
            }
            (NodeKind::Heading { level, .. }, "level") => {
                *level = value
                    .as_u64()
                    .filter(|level| (1..=6).contains(level))
                    .map(|level| level as u8)
                    .ok_or_else(|| invalid("expected an integer between 1 and 6"))?;
            }
            (NodeKind::OrderedList { start }, "start") => {
                *start = as_u32(value).ok_or_else(|| invalid("expected a non-negative integer"))?;
            }
            (NodeKind::TaskItem { checked }, "checked") => {
                *checked = value.as_bool().ok_or_else(|| invalid("expected a boolean"))?;
            }
            (NodeKind::TableCell(cell), "colspan") | (NodeKind::TableHeader(cell), "colspan") => {
                cell.colspan = as_u32(value)
                    .filter(|span| *span >= 1)
                    .ok_or_else(|| invalid("expected a positive integer"))?;
            }
            (NodeKind::TableCell(cell), "rowspan") | (NodeKind::TableHeader(cell), "rowspan") => {
                cell.rowspan = as_u32(value)
                    .filter(|span| *span >= 1)
                    .ok_or_else(|| invalid("expected a positive integer"))?;
            }
            (NodeKind::TableCell(cell), "colwidth") | (NodeKind::TableHeader(cell), "colwidth") => {
                cell.colwidth = match value {
                    Value::Null => None,
                    Value::Array(items) => Some(
                        items
                            .iter()
                            .map(as_u32)
                            .collect::<Option<Vec<_>>>()
                            .ok_or_else(|| invalid("expected an array of integers"))?,
                    ),
                    _ => return Err(invalid("expected null or an array of integers")),
                };
            }
            (NodeKind::CodeBlock { language }, "language") => {
                *language = optional_string(value).ok_or_else(|| invalid("expected a string"))?;
            }
            (NodeKind::Callout { emoji }, "emoji") => {
                *emoji = value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid("expected a string"))?;
            }
            (NodeKind::Image { src, .. }, "src") => {
                *src = optional_string(value).ok_or_else(|| invalid("expected a string"))?;
            }
            (NodeKind::Image { alt, .. }, "alt") => {
                *alt = optional_string(value).ok_or_else(|| invalid("expected a string"))?;
            }
            (NodeKind::Image { title, .. }, "title") => {
                *title = optional_string(value).ok_or_else(|| invalid("expected a string"))?;
            }
            _ => {
                return Err(SchemaError::UnknownAttr {
                    node,
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge a batch of attribute changes; nothing changes unless all apply.
    pub fn merge_attrs(&mut self, attrs: &Attrs) -> Result<(), SchemaError> {
        let mut updated = self.clone();
        for (name, value) in attrs {
            updated.set_attr(name, value)?;
        }
        *self = updated;
        Ok(())
    }

    /// Build a kind from its payload type and attributes.
    ///
    /// Attributes the kind does not declare are ignored, missing ones keep
    /// their defaults.
    pub fn from_payload(ty: NodeType, attrs: Option<&Attrs>) -> Result<NodeKind, SchemaError> {
        let mut kind = NodeKind::default_for(ty);
        if let Some(attrs) = attrs {
            for (name, value) in attrs {
                if kind.attr_names().contains(&name.as_str()) {
                    kind.set_attr(name, value)?;
                } else {
                    log::debug!("ignoring unknown attribute `{name}` on `{}`", ty.name());
                }
            }
        }
        Ok(kind)
    }
}

fn optional(value: &Option<String>) -> Value {
    value.as_deref().map_or(Value::Null, Value::from)
}

fn optional_string(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_node_type_names_round_trip() {
        for ty in NodeType::ALL {
            assert_eq!(NodeType::from_name(ty.name()), Ok(ty));
        }
        assert!(matches!(
            NodeType::from_name("marquee"),
            Err(SchemaError::UnknownNodeType(_))
        ));
    }

    #[rstest]
    #[case(NodeType::Table, NodeType::TableRow, true)]
    #[case(NodeType::Table, NodeType::Paragraph, false)]
    #[case(NodeType::TableRow, NodeType::TableHeader, true)]
    #[case(NodeType::Doc, NodeType::Text, false)]
    #[case(NodeType::Paragraph, NodeType::HardBreak, true)]
    #[case(NodeType::CodeBlock, NodeType::HardBreak, false)]
    #[case(NodeType::BulletList, NodeType::TaskItem, false)]
    #[case(NodeType::TaskItem, NodeType::TaskList, true)]
    #[case(NodeType::Image, NodeType::Text, false)]
    fn test_allows_child(#[case] parent: NodeType, #[case] child: NodeType, #[case] allowed: bool) {
        assert_eq!(parent.allows_child(child), allowed);
    }

    #[test]
    fn test_heading_level_must_be_in_range() {
        let mut kind = NodeKind::default_for(NodeType::Heading);
        assert!(kind.set_attr("level", &json!(3)).is_ok());
        assert!(matches!(
            kind.set_attr("level", &json!(7)),
            Err(SchemaError::InvalidAttr { .. })
        ));
        assert_eq!(
            kind,
            NodeKind::Heading {
                level: 3,
                align: TextAlign::Left
            }
        );
    }

    #[test]
    fn test_merge_attrs_is_all_or_nothing() {
        let mut kind = NodeKind::default_for(NodeType::TaskItem);
        let mut attrs = Attrs::new();
        attrs.insert("checked".into(), json!(true));
        attrs.insert("colour".into(), json!("red"));

        assert!(matches!(
            kind.merge_attrs(&attrs),
            Err(SchemaError::UnknownAttr { .. })
        ));
        assert_eq!(kind, NodeKind::TaskItem { checked: false });
    }

    #[test]
    fn test_from_payload_ignores_unknown_attrs() {
        let mut attrs = Attrs::new();
        attrs.insert("emoji".into(), json!("🔥"));
        attrs.insert("class".into(), json!("callout-box"));

        let kind = NodeKind::from_payload(NodeType::Callout, Some(&attrs)).unwrap();
        assert_eq!(
            kind,
            NodeKind::Callout {
                emoji: "🔥".to_string()
            }
        );
    }

    #[test]
    fn test_attrs_emits_every_declared_attribute() {
        let kind = NodeKind::default_for(NodeType::TableCell);
        let attrs = kind.attrs().unwrap();
        assert_eq!(attrs.get("colspan"), Some(&json!(1)));
        assert_eq!(attrs.get("rowspan"), Some(&json!(1)));
        assert_eq!(attrs.get("colwidth"), Some(&Value::Null));
        assert!(NodeKind::Blockquote.attrs().is_none());
    }
}
