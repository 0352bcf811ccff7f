//! Starter documents offered when creating a new page.

use crate::model::Node;

const MEETING_NOTES: &str = "Meeting Notes";
const BLOG_ARTICLE: &str = "Blog Article";

pub fn template_names() -> &'static [&'static str] {
    &[MEETING_NOTES, BLOG_ARTICLE]
}

/// The starter tree called `name`, if there is one.
pub fn template(name: &str) -> Option<Node> {
    match name {
        MEETING_NOTES => Some(meeting_notes()),
        BLOG_ARTICLE => Some(blog_article()),
        _ => None,
    }
}

fn meeting_notes() -> Node {
    Node::doc(vec![
        heading(1, "Meeting Notes"),
        paragraph("Date: "),
        heading(2, "Attendees"),
        bullets(""),
        heading(2, "Agenda"),
        bullets(""),
        heading(2, "Action Items"),
        bullets("[ ] Item 1"),
    ])
}

fn blog_article() -> Node {
    Node::doc(vec![
        heading(1, "Article Title"),
        paragraph("Subtitle goes here"),
        heading(2, "Introduction"),
        paragraph(""),
        heading(2, "Main Content"),
        paragraph(""),
        heading(2, "Conclusion"),
        paragraph(""),
    ])
}

fn inline(text: &str) -> Vec<Node> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(text)]
    }
}

fn heading(level: u8, text: &str) -> Node {
    Node::heading(level, inline(text))
}

fn paragraph(text: &str) -> Node {
    Node::paragraph(inline(text))
}

fn bullets(text: &str) -> Node {
    Node::bullet_list(vec![Node::list_item(vec![paragraph(text)])])
}
