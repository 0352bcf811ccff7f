//! Structured tree payload: `{type, attrs, content[], marks[], text}`.
//!
//! This is the format used for persistence and for the external textual
//! converters. Attributes are written in full for every kind that declares
//! them, which keeps `deserialize(serialize(tree)) == tree`.

use serde::{Deserialize, Serialize};

use crate::model::{Attrs, Mark, Node, NodeKind, NodeType, SchemaError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<RawNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<RawMark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
}

impl TryFrom<RawNode> for Node {
    type Error = SchemaError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let ty = NodeType::from_name(&raw.node_type)?;

        if ty == NodeType::Text {
            let text = raw.text.ok_or(SchemaError::MissingText)?;
            let marks = raw
                .marks
                .iter()
                .map(|mark| Mark::from_payload(&mark.mark_type, mark.attrs.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Node::marked_text(text, marks));
        }

        let kind = NodeKind::from_payload(ty, raw.attrs.as_ref())?;
        if ty.is_leaf() && !raw.content.is_empty() {
            return Err(SchemaError::LeafWithContent(ty.name()));
        }
        let content = raw
            .content
            .into_iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node::new(kind, content))
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let node_type = node.node_type().name().to_string();
        let attrs = node.kind.attrs();
        match node.kind {
            NodeKind::Text { text, marks } => RawNode {
                node_type,
                attrs: None,
                content: Vec::new(),
                marks: marks
                    .iter()
                    .map(|mark| RawMark {
                        mark_type: mark.mark_type().name().to_string(),
                        attrs: mark.attrs(),
                    })
                    .collect(),
                text: Some(text),
            },
            _ => RawNode {
                node_type,
                attrs,
                content: node.content.into_iter().map(RawNode::from).collect(),
                marks: Vec::new(),
                text: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rich_document() -> Node {
        Node::doc(vec![
            Node::heading(2, vec![Node::text("Plan")]),
            Node::paragraph(vec![
                Node::text("see "),
                Node::marked_text("docs", vec![Mark::link("https://example.com"), Mark::Bold]),
                Node::hard_break(),
                Node::marked_text("later", vec![Mark::Italic]),
            ]),
            Node::task_list(vec![Node::task_item(
                true,
                vec![Node::paragraph(vec![Node::text("ship")])],
            )]),
            Node::table(vec![Node::table_row(vec![
                Node::table_header(vec![Node::paragraph(vec![])]),
                Node::table_cell(vec![Node::paragraph(vec![Node::text("x")])]),
            ])]),
            Node::code_block(Some("rust"), "fn main() {}"),
            Node::callout("💡", vec![Node::text("note")]),
            Node::image("cat.png"),
            Node::horizontal_rule(),
        ])
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let doc = rich_document();
        let json = serde_json::to_string(&doc).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_payload_shape() {
        let doc = Node::doc(vec![Node::heading(1, vec![Node::marked_text(
            "Intro",
            vec![Mark::Bold],
        )])]);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "doc",
                "content": [{
                    "type": "heading",
                    "attrs": {"level": 1, "textAlign": "left"},
                    "content": [{"type": "text", "text": "Intro", "marks": [{"type": "bold"}]}]
                }]
            })
        );
    }

    #[test]
    fn test_missing_attrs_take_defaults() {
        let node: Node = serde_json::from_value(json!({
            "type": "heading",
            "content": [{"type": "text", "text": "Untitled"}]
        }))
        .unwrap();
        assert_eq!(node, Node::heading(1, vec![Node::text("Untitled")]));
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let result: Result<Node, _> = serde_json::from_value(json!({"type": "marquee"}));
        assert!(result.unwrap_err().to_string().contains("unknown node type"));
    }

    #[test]
    fn test_text_without_text_field_is_rejected() {
        let result: Result<Node, _> = serde_json::from_value(json!({"type": "text"}));
        assert!(result.is_err());
    }
}
