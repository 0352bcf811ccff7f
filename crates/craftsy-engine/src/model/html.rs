use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{CellAttrs, Mark, Node, NodeKind, TextAlign};

impl Node {
    /// Render the tree to HTML, the same markup the editor surface produces.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Doc => self.write_children(out),
            NodeKind::Paragraph { align } => {
                self.wrap(out, &format!("p{}", align_style(*align)), "p")
            }
            NodeKind::Heading { level, align } => self.wrap(
                out,
                &format!("h{level}{}", align_style(*align)),
                &format!("h{level}"),
            ),
            NodeKind::Blockquote => self.wrap(out, "blockquote", "blockquote"),
            NodeKind::BulletList => self.wrap(out, "ul", "ul"),
            NodeKind::OrderedList { start } => {
                let open = if *start == 1 {
                    "ol".to_string()
                } else {
                    format!("ol start=\"{start}\"")
                };
                self.wrap(out, &open, "ol");
            }
            NodeKind::ListItem => self.wrap(out, "li", "li"),
            NodeKind::TaskList => self.wrap(out, "ul data-type=\"taskList\"", "ul"),
            NodeKind::TaskItem { checked } => {
                out.push_str(&format!(
                    "<li data-type=\"taskItem\" data-checked=\"{checked}\"><label><input type=\"checkbox\"{}><span></span></label><div>",
                    if *checked { " checked=\"checked\"" } else { "" }
                ));
                self.write_children(out);
                out.push_str("</div></li>");
            }
            NodeKind::Table => {
                out.push_str("<table><tbody>");
                self.write_children(out);
                out.push_str("</tbody></table>");
            }
            NodeKind::TableRow => self.wrap(out, "tr", "tr"),
            NodeKind::TableCell(cell) => self.wrap(out, &cell_open("td", cell), "td"),
            NodeKind::TableHeader(cell) => self.wrap(out, &cell_open("th", cell), "th"),
            NodeKind::CodeBlock { language } => {
                out.push_str("<pre><code");
                if let Some(language) = language {
                    out.push_str(&format!(
                        " class=\"language-{}\"",
                        encode_double_quoted_attribute(language)
                    ));
                }
                out.push('>');
                out.push_str(&encode_text(&self.text_content()));
                out.push_str("</code></pre>");
            }
            NodeKind::Callout { emoji } => {
                out.push_str(&format!(
                    "<div data-type=\"callout\" class=\"callout-box\"><span class=\"callout-emoji\">{}</span><div class=\"callout-content\">",
                    encode_text(emoji)
                ));
                self.write_children(out);
                out.push_str("</div></div>");
            }
            NodeKind::Image { src, alt, title } => {
                out.push_str("<img");
                for (name, value) in [("src", src), ("alt", alt), ("title", title)] {
                    if let Some(value) = value {
                        out.push_str(&format!(
                            " {name}=\"{}\"",
                            encode_double_quoted_attribute(value)
                        ));
                    }
                }
                out.push('>');
            }
            NodeKind::HorizontalRule => out.push_str("<hr>"),
            NodeKind::HardBreak => out.push_str("<br>"),
            NodeKind::Text { text, marks } => {
                for mark in marks {
                    out.push_str(&mark_open(mark));
                }
                out.push_str(&encode_text(text));
                for mark in marks.iter().rev() {
                    out.push_str(mark_close(mark));
                }
            }
        }
    }

    fn wrap(&self, out: &mut String, open: &str, close: &str) {
        out.push('<');
        out.push_str(open);
        out.push('>');
        self.write_children(out);
        out.push_str("</");
        out.push_str(close);
        out.push('>');
    }

    fn write_children(&self, out: &mut String) {
        for child in &self.content {
            child.write_html(out);
        }
    }
}

fn align_style(align: TextAlign) -> String {
    match align {
        TextAlign::Left => String::new(),
        other => format!(" style=\"text-align: {}\"", other.as_str()),
    }
}

fn cell_open(tag: &str, cell: &CellAttrs) -> String {
    let mut open = format!(
        "{tag} colspan=\"{}\" rowspan=\"{}\"",
        cell.colspan, cell.rowspan
    );
    if let Some(widths) = &cell.colwidth {
        let widths: Vec<String> = widths.iter().map(u32::to_string).collect();
        open.push_str(&format!(" colwidth=\"{}\"", widths.join(",")));
    }
    open
}

fn mark_open(mark: &Mark) -> String {
    match mark {
        Mark::Link { href, target } => {
            let mut open = format!("<a href=\"{}\"", encode_double_quoted_attribute(href));
            if let Some(target) = target {
                open.push_str(&format!(
                    " target=\"{}\"",
                    encode_double_quoted_attribute(target)
                ));
            }
            open.push_str(" rel=\"noopener noreferrer nofollow\">");
            open
        }
        Mark::Bold => "<strong>".to_string(),
        Mark::Italic => "<em>".to_string(),
        Mark::Strike => "<s>".to_string(),
        Mark::Code => "<code>".to_string(),
    }
}

fn mark_close(mark: &Mark) -> &'static str {
    match mark {
        Mark::Link { .. } => "</a>",
        Mark::Bold => "</strong>",
        Mark::Italic => "</em>",
        Mark::Strike => "</s>",
        Mark::Code => "</code>",
    }
}
