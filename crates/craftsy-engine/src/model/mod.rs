//! Document tree model.
//!
//! - **`schema`**: the closed set of node kinds, their attributes and content rules
//! - **`mark`**: inline marks carried by text
//! - **`node`**: the immutable-by-convention tree, sizes and traversal
//! - **`position`**: resolving integer positions into ancestor paths
//! - **`payload`**: the `{type, attrs, content, marks, text}` serialized form
//! - **`html`**: rendering to editor HTML

pub mod html;
pub mod mark;
pub mod node;
pub mod payload;
pub mod position;
pub mod schema;

pub use mark::{Mark, MarkType, add_to_set, remove_from_set};
pub use node::{Descendants, Node, Visit};
pub use payload::{RawMark, RawNode};
pub use position::ResolvedPos;
pub use schema::{
    Attrs, CellAttrs, ContentRule, DEFAULT_CALLOUT_EMOJI, Group, NodeKind, NodeType, SchemaError,
    TextAlign,
};
