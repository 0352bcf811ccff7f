use serde_json::Value;

use crate::model::{Attrs, SchemaError};

/// Inline style annotation carried by text nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Link { href: String, target: Option<String> },
    Bold,
    Italic,
    Strike,
    Code,
}

/// Fieldless tag of a [`Mark`], used for removal and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkType {
    Link,
    Bold,
    Italic,
    Strike,
    Code,
}

impl MarkType {
    pub fn name(self) -> &'static str {
        match self {
            MarkType::Link => "link",
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Strike => "strike",
            MarkType::Code => "code",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SchemaError> {
        match name {
            "link" => Ok(MarkType::Link),
            "bold" => Ok(MarkType::Bold),
            "italic" => Ok(MarkType::Italic),
            "strike" => Ok(MarkType::Strike),
            "code" => Ok(MarkType::Code),
            other => Err(SchemaError::UnknownMarkType(other.to_string())),
        }
    }
}

impl Mark {
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Link { .. } => MarkType::Link,
            Mark::Bold => MarkType::Bold,
            Mark::Italic => MarkType::Italic,
            Mark::Strike => MarkType::Strike,
            Mark::Code => MarkType::Code,
        }
    }

    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link {
            href: href.into(),
            target: None,
        }
    }

    pub fn attrs(&self) -> Option<Attrs> {
        match self {
            Mark::Link { href, target } => {
                let mut attrs = Attrs::new();
                attrs.insert("href".into(), href.as_str().into());
                attrs.insert(
                    "target".into(),
                    target.as_deref().map_or(Value::Null, Value::from),
                );
                Some(attrs)
            }
            _ => None,
        }
    }

    pub fn from_payload(name: &str, attrs: Option<&Attrs>) -> Result<Self, SchemaError> {
        Ok(match MarkType::from_name(name)? {
            MarkType::Bold => Mark::Bold,
            MarkType::Italic => Mark::Italic,
            MarkType::Strike => Mark::Strike,
            MarkType::Code => Mark::Code,
            MarkType::Link => {
                let attr = |key: &str| attrs.and_then(|attrs| attrs.get(key));
                let href = attr("href")
                    .and_then(Value::as_str)
                    .ok_or_else(|| SchemaError::InvalidAttr {
                        node: "link",
                        name: "href".to_string(),
                        reason: "expected a string".to_string(),
                    })?
                    .to_string();
                let target = attr("target").and_then(Value::as_str).map(str::to_string);
                Mark::Link { href, target }
            }
        })
    }
}

/// Add `mark` to a mark set, replacing any mark of the same type and keeping
/// the set ordered by type.
pub fn add_to_set(marks: &mut Vec<Mark>, mark: Mark) {
    marks.retain(|existing| existing.mark_type() != mark.mark_type());
    let at = marks
        .iter()
        .position(|existing| existing.mark_type() > mark.mark_type())
        .unwrap_or(marks.len());
    marks.insert(at, mark);
}

pub fn remove_from_set(marks: &mut Vec<Mark>, mark_type: MarkType) {
    marks.retain(|existing| existing.mark_type() != mark_type);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_to_set_keeps_order_and_replaces() {
        let mut marks = vec![Mark::Italic];
        add_to_set(&mut marks, Mark::Code);
        add_to_set(&mut marks, Mark::Bold);
        add_to_set(&mut marks, Mark::link("https://a.example"));
        add_to_set(&mut marks, Mark::link("https://b.example"));

        assert_eq!(
            marks,
            vec![
                Mark::link("https://b.example"),
                Mark::Bold,
                Mark::Italic,
                Mark::Code
            ]
        );

        remove_from_set(&mut marks, MarkType::Link);
        assert_eq!(marks, vec![Mark::Bold, Mark::Italic, Mark::Code]);
    }

    #[test]
    fn test_link_requires_href() {
        assert!(Mark::from_payload("link", None).is_err());
        assert!(matches!(
            Mark::from_payload("underline", None),
            Err(SchemaError::UnknownMarkType(_))
        ));
    }
}
