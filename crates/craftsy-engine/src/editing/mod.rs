/*!
 * # Editing core
 *
 * Every change to a document flows through this module:
 *
 * - **`transform`**: `Step`s applied to a working copy inside a `Transaction`,
 *   validated as a whole on commit
 * - **`mapping`**: `StepMap`/`Mapping`, how positions of the previous revision
 *   move through the applied steps
 * - **`relocation`**: drag and drop of top-level blocks, and the handle
 *   descriptors the UI draws them from
 * - **`slash`**: the `/` command catalog
 * - **`outline`**: heading index recomputed after each change
 * - **`commands`** / **`document`**: the `Cmd` enum and the `Document` that
 *   owns the live revision, its selection and its outline
 *
 * ## Usage Pattern
 *
 * ```rust
 * use craftsy_engine::editing::*;
 * use craftsy_engine::Node;
 *
 * let mut doc = Document::new();
 * doc.apply(Cmd::Insert { at: 0, node: Node::heading(1, vec![Node::text("Intro")]) }).unwrap();
 * let patch = doc.apply(Cmd::MoveBlock { from: 0, to: doc.size() }).unwrap();
 *
 * // positions held before the move are remapped, never reused as-is
 * let caret = patch.mapping.map(1, Bias::Right);
 * assert_eq!(caret, 3);
 * ```
 */

pub mod commands;
pub mod document;
pub mod mapping;
pub mod outline;
pub mod patch;
pub mod relocation;
pub mod selection;
pub mod slash;
pub mod transform;

pub use commands::Cmd;
pub use document::Document;
pub use mapping::{Bias, MapResult, Mapping, StepMap};
pub use outline::{OutlineEntry, OutlineIndex, outline};
pub use patch::Patch;
pub use relocation::{BlockHandle, block_handles, relocate_block};
pub use selection::Selection;
pub use slash::{SLASH_ITEMS, SlashCommand, SlashItem, run_slash, slash_items};
pub use transform::{Outcome, Step, Transaction, Transformed};
