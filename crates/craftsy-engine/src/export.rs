//! Standalone HTML wrappers for printing and word-processor export.
//!
//! Both take already-rendered HTML fragments (see [`Node::to_html`]); turning
//! the result into a download or a PDF is left to the host.
//!
//! [`Node::to_html`]: crate::model::Node::to_html

use html_escape::encode_text;

const A4_STYLE: &str = r#"
    <style>
      @page { size: A4; margin: 20mm; }
      body { font-family: Arial, sans-serif; -webkit-print-color-adjust: exact; color: #111827; }
      .header { margin-bottom: 8px; font-size: 12px; color: #6b7280; }
      .footer { margin-top: 12px; font-size: 12px; color: #6b7280; position: fixed; bottom: 20mm; width: calc(100% - 40mm); }
      .content { width: calc(100% - 40mm); }
      pre { white-space: pre-wrap; word-wrap: break-word; }
    </style>
  "#;

/// A print-ready A4 page with a running header and a fixed footer.
pub fn a4_html(title: &str, body: &str, header: &str, footer: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title>{A4_STYLE}</head><body>\n    \
         <div class=\"header\">{header}</div>\n    \
         <div class=\"content\">{body}</div>\n    \
         <div class=\"footer\">{footer}</div>\n  \
         </body></html>",
        title = encode_text(title),
    )
}

/// Minimal page that word processors open as a `.doc` file.
pub fn word_html(body: &str, header: &str, footer: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Document</title></head>\
         <body>{header}{body}{footer}</body></html>"
    )
}
