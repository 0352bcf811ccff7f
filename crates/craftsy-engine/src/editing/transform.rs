//! Mutation engine: steps, transactions and the structural algorithms behind
//! them.
//!
//! A [`Transaction`] owns a working copy of the tree. Each [`Step`] is applied
//! to that copy and contributes its [`StepMap`]s to the transaction's
//! [`Mapping`]. Nothing is visible to the caller until [`Transaction::commit`]
//! has validated the whole tree, so a failed step or a failed validation
//! leaves the caller's revision exactly as it was.

use crate::editing::mapping::{Mapping, StepMap};
use crate::error::EditError;
use crate::model::{
    Attrs, ContentRule, Mark, MarkType, Node, NodeKind, NodeType, SchemaError, add_to_set,
    remove_from_set,
};

/// One atomic change to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Insert { pos: usize, node: Node },
    Delete { from: usize, to: usize },
    SetAttrs { pos: usize, attrs: Attrs },
    AddMark { from: usize, to: usize, mark: Mark },
    RemoveMark { from: usize, to: usize, mark: MarkType },
    SetBlockType { pos: usize, kind: NodeKind },
    ReplaceDoc { doc: Node },
}

impl Step {
    /// Apply the step to `doc`, producing the changed tree and the maps of the
    /// positions it moved, at least one. `doc` itself is never modified.
    pub fn apply(&self, doc: &Node) -> Result<(Node, Vec<StepMap>), EditError> {
        let size = doc.content_size();
        match self {
            Step::Insert { pos, node } => {
                check_pos(*pos, size)?;
                if node.node_type() == NodeType::Doc {
                    return Err(EditError::SchemaViolation(
                        "a document cannot be inserted into another node".to_string(),
                    ));
                }
                let mut next = doc.clone();
                insert_at(&mut next, *pos, node.clone())?;
                Ok((next, vec![StepMap::new(*pos, 0, node.node_size())]))
            }
            Step::Delete { from, to } => {
                if from == to {
                    return Ok((doc.clone(), vec![StepMap::identity()]));
                }
                check_range(*from, *to, size)?;
                let mut next = doc.clone();
                let seam = remove_range(&mut next, *from, *to);
                fill_required(&mut next);
                let maps = deletion_maps(*from, *to, seam, size, next.content_size());
                Ok((next, maps))
            }
            Step::SetAttrs { pos, attrs } => {
                check_pos(*pos, size)?;
                let mut next = doc.clone();
                let target = next.node_at_mut(*pos).ok_or_else(|| no_node_at(*pos))?;
                if target.is_text() {
                    return Err(EditError::SchemaViolation(
                        "text nodes have no attributes".to_string(),
                    ));
                }
                target.kind.merge_attrs(attrs)?;
                Ok((next, vec![StepMap::identity()]))
            }
            Step::AddMark { from, to, mark } => {
                check_range(*from, *to, size)?;
                let mut next = doc.clone();
                update_marks(&mut next, 0, *from, *to, &|marks: &mut Vec<Mark>| {
                    add_to_set(marks, mark.clone())
                });
                Ok((next, vec![StepMap::identity()]))
            }
            Step::RemoveMark { from, to, mark } => {
                check_range(*from, *to, size)?;
                let mut next = doc.clone();
                update_marks(&mut next, 0, *from, *to, &|marks: &mut Vec<Mark>| {
                    remove_from_set(marks, *mark)
                });
                Ok((next, vec![StepMap::identity()]))
            }
            Step::SetBlockType { pos, kind } => {
                check_pos(*pos, size)?;
                if !kind.node_type().is_textblock() {
                    return Err(EditError::SchemaViolation(format!(
                        "`{}` is not a text block type",
                        kind.node_type().name()
                    )));
                }
                let mut next = doc.clone();
                let target = next.node_at_mut(*pos).ok_or_else(|| no_node_at(*pos))?;
                if !target.is_textblock() {
                    return Err(EditError::SchemaViolation(format!(
                        "`{}` at {pos} is not a text block",
                        target.node_type().name()
                    )));
                }
                target.kind = kind.clone();
                fit_inline_content(target);
                Ok((next, vec![StepMap::identity()]))
            }
            Step::ReplaceDoc { doc: replacement } => {
                if replacement.node_type() != NodeType::Doc {
                    return Err(EditError::SchemaViolation(format!(
                        "expected a document, got `{}`",
                        replacement.node_type().name()
                    )));
                }
                Ok((
                    replacement.clone(),
                    vec![StepMap::new(0, size, replacement.content_size())],
                ))
            }
        }
    }
}

/// Whether a committed transaction changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    NoOp,
}

/// A committed transaction: the new revision and how positions moved.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub doc: Node,
    pub mapping: Mapping,
    pub outcome: Outcome,
}

impl Transformed {
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// A sequence of steps applied to a working copy of a revision.
#[derive(Debug, Clone)]
pub struct Transaction {
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    /// Index of the first map each step contributed
    step_maps: Vec<usize>,
    mapping: Mapping,
}

impl Transaction {
    pub fn new(doc: &Node) -> Self {
        Self {
            before: doc.clone(),
            doc: doc.clone(),
            steps: Vec::new(),
            step_maps: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// The working copy with all steps so far applied.
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn step(mut self, step: Step) -> Result<Self, EditError> {
        let (mut next, maps) = step.apply(&self.doc)?;
        next.normalize();
        self.doc = next;
        self.step_maps.push(self.mapping.len());
        for map in maps {
            self.mapping.push(map);
        }
        self.steps.push(step);
        Ok(self)
    }

    /// Mark steps `a` and `b` as removing and re-inserting the same content.
    pub fn mirror(mut self, a: usize, b: usize) -> Self {
        if let (Some(&a), Some(&b)) = (self.step_maps.get(a), self.step_maps.get(b)) {
            self.mapping.set_mirror(a, b);
        }
        self
    }

    pub fn insert(self, pos: usize, node: Node) -> Result<Self, EditError> {
        self.step(Step::Insert { pos, node })
    }

    pub fn delete(self, from: usize, to: usize) -> Result<Self, EditError> {
        self.step(Step::Delete { from, to })
    }

    pub fn set_attrs(self, pos: usize, attrs: Attrs) -> Result<Self, EditError> {
        self.step(Step::SetAttrs { pos, attrs })
    }

    pub fn add_mark(self, from: usize, to: usize, mark: Mark) -> Result<Self, EditError> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(self, from: usize, to: usize, mark: MarkType) -> Result<Self, EditError> {
        self.step(Step::RemoveMark { from, to, mark })
    }

    pub fn set_block_type(self, pos: usize, kind: NodeKind) -> Result<Self, EditError> {
        self.step(Step::SetBlockType { pos, kind })
    }

    pub fn replace_doc(self, doc: Node) -> Result<Self, EditError> {
        self.step(Step::ReplaceDoc { doc })
    }

    /// Validate the working copy and hand it out as the new revision.
    pub fn commit(self) -> Result<Transformed, EditError> {
        if let Err(err) = self.doc.validate() {
            log::warn!("rejecting transaction of {} step(s): {err}", self.steps.len());
            return Err(err.into());
        }
        let outcome = if self.doc == self.before {
            Outcome::NoOp
        } else {
            Outcome::Applied
        };
        log::debug!(
            "committed {} step(s): {outcome:?}, size {} -> {}",
            self.steps.len(),
            self.before.content_size(),
            self.doc.content_size()
        );
        Ok(Transformed {
            doc: self.doc,
            mapping: self.mapping,
            outcome,
        })
    }
}

pub fn insert(doc: &Node, pos: usize, node: Node) -> Result<Transformed, EditError> {
    Transaction::new(doc).insert(pos, node)?.commit()
}

pub fn delete_range(doc: &Node, from: usize, to: usize) -> Result<Transformed, EditError> {
    Transaction::new(doc).delete(from, to)?.commit()
}

/// Delete `[from, to)` and insert `node` where the range started.
pub fn replace_range(
    doc: &Node,
    from: usize,
    to: usize,
    node: Node,
) -> Result<Transformed, EditError> {
    Transaction::new(doc)
        .delete(from, to)?
        .insert(from, node)?
        .commit()
}

pub fn set_attrs(doc: &Node, pos: usize, attrs: Attrs) -> Result<Transformed, EditError> {
    Transaction::new(doc).set_attrs(pos, attrs)?.commit()
}

pub fn add_mark(doc: &Node, from: usize, to: usize, mark: Mark) -> Result<Transformed, EditError> {
    Transaction::new(doc).add_mark(from, to, mark)?.commit()
}

pub fn remove_mark(
    doc: &Node,
    from: usize,
    to: usize,
    mark: MarkType,
) -> Result<Transformed, EditError> {
    Transaction::new(doc).remove_mark(from, to, mark)?.commit()
}

pub fn set_block_type(doc: &Node, pos: usize, kind: NodeKind) -> Result<Transformed, EditError> {
    Transaction::new(doc).set_block_type(pos, kind)?.commit()
}

pub fn replace_doc(doc: &Node, replacement: Node) -> Result<Transformed, EditError> {
    Transaction::new(doc).replace_doc(replacement)?.commit()
}

fn check_pos(pos: usize, size: usize) -> Result<(), EditError> {
    if pos > size {
        return Err(EditError::OutOfRange { pos, size });
    }
    Ok(())
}

fn check_range(from: usize, to: usize, size: usize) -> Result<(), EditError> {
    if from > to {
        return Err(EditError::OutOfRange { pos: from, size });
    }
    check_pos(to, size)
}

fn no_node_at(pos: usize) -> EditError {
    EditError::NotFound(format!("no node at position {pos}"))
}

/// How the two sides of a deletion were reconnected.
///
/// `created` boundary tokens reappear at the cut itself: nodes that were cut
/// open but could not be joined get their lost tokens back. When text is
/// pulled across levels, the boundary tokens that follow the pulled content
/// change too; `trail` describes that replacement with `start` measured from
/// where the pulled content begins after the cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Seam {
    created: usize,
    trail: Option<StepMap>,
}

impl Seam {
    fn created(created: usize) -> Self {
        Self {
            created,
            trail: None,
        }
    }

    fn pulled(pulled: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            created: 0,
            trail: Some(StepMap::new(pulled, old_size, new_size)),
        }
    }
}

/// Maps of a deletion of `[from, to)` that turned a tree of `old_size` into
/// one of `new_size`: the removed range itself, then the boundary tokens
/// rewritten after pulled content. Empty paragraphs added to emptied
/// containers count as created at the cut.
fn deletion_maps(
    from: usize,
    to: usize,
    seam: Seam,
    old_size: usize,
    new_size: usize,
) -> Vec<StepMap> {
    let removed = to - from;
    let (trail_old, trail_new) = seam
        .trail
        .map_or((0, 0), |trail| (trail.old_size, trail.new_size));
    let kept = old_size - removed - trail_old + trail_new + seam.created;

    let Some(filled) = new_size.checked_sub(kept) else {
        log::warn!("deletion of [{from}, {to}) lost {} extra token(s)", kept - new_size);
        return vec![StepMap::new(from, old_size.saturating_sub(new_size), 0)];
    };
    let created = seam.created + filled;
    let mut maps = vec![StepMap::new(from, removed, created)];
    if let Some(trail) = seam.trail.filter(|trail| !trail.is_identity()) {
        maps.push(StepMap::new(
            from + created + trail.start,
            trail.old_size,
            trail.new_size,
        ));
    }
    maps
}

fn insert_at(parent: &mut Node, offset: usize, node: Node) -> Result<(), EditError> {
    let (index, child_start) = parent.find_index(offset);
    let inside_text = offset > child_start && parent.content.get(index).is_some_and(Node::is_text);

    if offset == child_start || inside_text {
        if !parent.node_type().allows_child(node.node_type()) {
            return Err(SchemaError::IllegalChild {
                parent: parent.node_type().name(),
                child: node.node_type().name(),
            }
            .into());
        }
        if inside_text {
            let (left, right) = parent.content[index].split_text(offset - child_start);
            parent.content.splice(index..=index, [left, node, right]);
        } else {
            parent.content.insert(index, node);
        }
        return Ok(());
    }

    match parent.content.get_mut(index) {
        Some(child) => insert_at(child, offset - child_start - 1, node),
        None => Err(EditError::OutOfRange {
            pos: offset,
            size: parent.content_size(),
        }),
    }
}

/// Remove content offsets `[from, to)` of `node`.
fn remove_range(node: &mut Node, from: usize, to: usize) -> Seam {
    let (i, i_start) = node.find_index(from);
    let (j, j_start) = node.find_index(to);

    if i == j
        && let Some(child) = node.content.get_mut(i)
        && !child.is_text()
        && from > i_start
        && to < i_start + child.node_size()
    {
        return remove_range(child, from - i_start - 1, to - i_start - 1);
    }

    let children = std::mem::take(&mut node.content);
    let left = (i < children.len() && from > i_start)
        .then(|| cut_tail(&children[i], from - i_start));
    let right = (j < children.len() && to > j_start)
        .then(|| cut_head(&children[j], to - j_start));
    let rest = if right.is_some() { j + 1 } else { j };

    let mut content = Vec::with_capacity(children.len());
    let mut tail = Vec::new();
    for (k, child) in children.into_iter().enumerate() {
        if k < i {
            content.push(child);
        } else if k >= rest {
            tail.push(child);
        }
    }
    let seam = match (left, right) {
        (Some((l, l_open)), Some((r, r_open))) => {
            let (joined, seam) = join(l, l_open, r, r_open);
            content.extend(joined);
            seam
        }
        (Some((l, l_open)), None) => {
            content.push(l);
            Seam::created(l_open)
        }
        (None, Some((r, r_open))) => {
            content.push(r);
            Seam::created(r_open)
        }
        (None, None) => Seam::default(),
    };
    content.extend(tail);
    node.content = content;
    seam
}

/// The part of `node` before `offset` (measured from before the node), and
/// how many nodes along its right edge lost their closing token.
fn cut_tail(node: &Node, offset: usize) -> (Node, usize) {
    if node.is_text() {
        return (node.split_text(offset).0, 0);
    }
    let inner = offset - 1;
    let (k, k_start) = node.find_index(inner);
    let mut content = node.content[..k].to_vec();
    let mut open = 1;
    if let Some(child) = node.content.get(k)
        && inner > k_start
    {
        let (part, part_open) = cut_tail(child, inner - k_start);
        content.push(part);
        open += part_open;
    }
    (Node::new(node.kind.clone(), content), open)
}

/// The part of `node` from `offset` on, and how many nodes along its left
/// edge lost their opening token.
fn cut_head(node: &Node, offset: usize) -> (Node, usize) {
    if node.is_text() {
        return (node.split_text(offset).1, 0);
    }
    let inner = offset - 1;
    let (k, k_start) = node.find_index(inner);
    let mut content = Vec::new();
    let mut open = 1;
    let mut rest = k;
    if let Some(child) = node.content.get(k)
        && inner > k_start
    {
        let (part, part_open) = cut_head(child, inner - k_start);
        content.push(part);
        open += part_open;
        rest = k + 1;
    }
    content.extend(node.content[rest.min(node.content.len())..].iter().cloned());
    (Node::new(node.kind.clone(), content), open)
}

fn joinable(left: &Node, right: &Node) -> bool {
    left.node_type() == right.node_type() || (left.is_textblock() && right.is_textblock())
}

/// Reconnect the two sides of a cut. Open nodes of compatible types merge,
/// and text blocks at different depths have the right-hand text pulled into
/// the left-hand block.
fn join(left: Node, left_open: usize, right: Node, right_open: usize) -> (Vec<Node>, Seam) {
    if left_open == 0 || right_open == 0 {
        return (vec![left, right], Seam::created(left_open + right_open));
    }

    if joinable(&left, &right) {
        let Node {
            kind,
            content: mut merged,
        } = left;
        let mut incoming = right.content.into_iter();
        // one side may be cut deeper than the other; its inner nodes stay whole
        let mut seam = Seam::created((left_open - 1) + (right_open - 1));
        if left_open > 1
            && right_open > 1
            && let Some(last) = merged.pop()
        {
            match incoming.next() {
                Some(first) => {
                    let (inner, inner_seam) = join(last, left_open - 1, first, right_open - 1);
                    merged.extend(inner);
                    seam = inner_seam;
                }
                None => {
                    merged.push(last);
                    seam = Seam::created(left_open - 1);
                }
            }
        }
        merged.extend(incoming);
        let mut joined = Node::new(kind, merged);
        fit_inline_content(&mut joined);
        return (vec![joined], seam);
    }

    let mut left = left;
    let mut right = right;
    if right.is_textblock() {
        if let Some((target, depth)) = open_textblock_mut(&mut left, left_open) {
            // the right block's closing token gives way to those of the left side
            let pulled = right.content_size();
            target.content.append(&mut right.content);
            fit_inline_content(target);
            return (vec![left], Seam::pulled(pulled, 1, depth));
        }
    } else if left.is_textblock()
        && let Some((block, above, emptied)) = take_open_textblock(&mut right, right_open)
    {
        let pulled = block.content_size();
        left.content.extend(block.content);
        fit_inline_content(&mut left);
        // after the pulled block's closing token, emptied containers lose
        // their closing tokens and the surviving ones open again
        let (joined, emptied) = if right.content.is_empty() {
            (vec![left], emptied + 1)
        } else {
            (vec![left, right], emptied)
        };
        return (joined, Seam::pulled(pulled + 1, emptied, above - emptied));
    }
    (vec![left, right], Seam::created(left_open + right_open))
}

/// The innermost text block along the open right edge of `node`, with the
/// number of levels from `node` down to it.
fn open_textblock_mut(node: &mut Node, open: usize) -> Option<(&mut Node, usize)> {
    if open == 0 {
        return None;
    }
    if node.is_textblock() {
        return Some((node, 1));
    }
    let last = node.content.last_mut()?;
    open_textblock_mut(last, open - 1).map(|(target, depth)| (target, depth + 1))
}

/// Detach the first text block along the open left edge of `node`, dropping
/// descendants emptied by it. Returns the block, the number of containers
/// above it (`node` included) and how many of the descendants were dropped.
fn take_open_textblock(node: &mut Node, open: usize) -> Option<(Node, usize, usize)> {
    if open < 2 || node.content.is_empty() {
        return None;
    }
    if node.content[0].is_textblock() {
        return Some((node.content.remove(0), 1, 0));
    }
    let (taken, above, mut emptied) = take_open_textblock(&mut node.content[0], open - 1)?;
    if node.content[0].content.is_empty() {
        node.content.remove(0);
        emptied += 1;
    }
    Some((taken, above + 1, emptied))
}

/// Give emptied containers that require blocks an empty paragraph.
fn fill_required(node: &mut Node) {
    for child in &mut node.content {
        fill_required(child);
    }
    if node.content.is_empty()
        && matches!(
            node.node_type().content_rule(),
            ContentRule::Blocks { required: true }
        )
    {
        node.content.push(Node::paragraph(Vec::new()));
    }
}

/// Adapt inline children to what a text block accepts. Code blocks hold
/// unmarked text only, so marks are dropped and hard breaks become newlines.
fn fit_inline_content(node: &mut Node) {
    if node.node_type() != NodeType::CodeBlock {
        return;
    }
    for child in &mut node.content {
        if child.node_type() == NodeType::HardBreak {
            *child = Node::text("\n");
        } else if let NodeKind::Text { marks, .. } = &mut child.kind {
            marks.clear();
        }
    }
}

fn update_marks<F>(node: &mut Node, content_start: usize, from: usize, to: usize, update: &F)
where
    F: Fn(&mut Vec<Mark>),
{
    let allows_marks = node.node_type().allows_marks();
    let mut pos = content_start;
    for mut child in std::mem::take(&mut node.content) {
        let end = pos + child.node_size();
        let overlaps = end > from && pos < to;
        if overlaps && child.is_text() && allows_marks {
            let (head, rest) = child.split_text(from.saturating_sub(pos));
            let (mut middle, tail) = rest.split_text(to.min(end) - pos.max(from));
            if let NodeKind::Text { marks, .. } = &mut middle.kind {
                update(marks);
            }
            node.content.extend([head, middle, tail]);
        } else {
            if overlaps && !child.is_leaf() {
                update_marks(&mut child, pos + 1, from, to, update);
            }
            node.content.push(child);
        }
        pos = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::mapping::{Bias, MapResult};
    use crate::model::TextAlign;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // 0 <p> 1 h e l l o 6 </p> 7 <p> 8 w o r l d 13 </p> 14
    fn two_paragraphs() -> Node {
        Node::doc(vec![
            Node::paragraph(vec![Node::text("hello")]),
            Node::paragraph(vec![Node::text("world")]),
        ])
    }

    fn attrs(value: serde_json::Value) -> Attrs {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_insert_block_between_paragraphs() {
        let heading = Node::heading(1, vec![Node::text("Hi")]);
        let result = insert(&two_paragraphs(), 7, heading).unwrap();
        assert_eq!(result.outcome, Outcome::Applied);
        assert_eq!(
            result.doc,
            Node::doc(vec![
                Node::paragraph(vec![Node::text("hello")]),
                Node::heading(1, vec![Node::text("Hi")]),
                Node::paragraph(vec![Node::text("world")]),
            ])
        );
        assert_eq!(result.mapping.map(9, Bias::Right), 13);
        assert_eq!(result.mapping.map(3, Bias::Right), 3);
    }

    #[test]
    fn test_insert_inline_splits_text() {
        let result = insert(&two_paragraphs(), 3, Node::hard_break()).unwrap();
        assert_eq!(
            result.doc.content()[0],
            Node::paragraph(vec![Node::text("he"), Node::hard_break(), Node::text("llo")])
        );
    }

    #[test]
    fn test_insert_rejects_illegal_parent() {
        let err = insert(&two_paragraphs(), 3, Node::paragraph(vec![])).unwrap_err();
        assert!(matches!(err, EditError::SchemaViolation(_)));

        let table = Node::doc(vec![Node::table(vec![Node::table_row(vec![
            Node::table_cell(vec![Node::paragraph(vec![])]),
        ])])]);
        let err = insert(&table, 1, Node::paragraph(vec![])).unwrap_err();
        assert_eq!(
            err,
            EditError::SchemaViolation("`table` cannot contain `paragraph`".to_string())
        );
    }

    #[test]
    fn test_insert_rejects_heading_level_out_of_range() {
        for level in [0, 7] {
            let err = insert(&two_paragraphs(), 7, Node::heading(level, vec![])).unwrap_err();
            assert_eq!(
                err,
                EditError::SchemaViolation(
                    "invalid value for `heading.level`: expected an integer between 1 and 6"
                        .to_string()
                )
            );
        }
    }

    #[test]
    fn test_insert_out_of_range() {
        let err = insert(&two_paragraphs(), 15, Node::horizontal_rule()).unwrap_err();
        assert_eq!(err, EditError::OutOfRange { pos: 15, size: 14 });
    }

    #[test]
    fn test_delete_inside_text() {
        let result = delete_range(&two_paragraphs(), 2, 4).unwrap();
        assert_eq!(
            result.doc.content()[0],
            Node::paragraph(vec![Node::text("hlo")])
        );
        assert_eq!(result.mapping.map(10, Bias::Right), 8);
    }

    #[test]
    fn test_delete_across_paragraphs_joins_them() {
        let result = delete_range(&two_paragraphs(), 3, 10).unwrap();
        assert_eq!(
            result.doc,
            Node::doc(vec![Node::paragraph(vec![Node::text("herld")])])
        );
        assert_eq!(result.mapping.maps(), &[StepMap::new(3, 7, 0)]);
        // before the final "d"
        assert_eq!(result.mapping.map(12, Bias::Right), 5);
    }

    #[test]
    fn test_delete_from_paragraph_into_list_pulls_text_up() {
        // 0 <p> 1 a b 3 </p> 4 <ul> 5 <li> 6 <p> 7 c d 9 </p> 10 </li> 11 </ul> 12
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::text("ab")]),
            Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                Node::text("cd"),
            ])])]),
        ]);
        let result = delete_range(&doc, 2, 8).unwrap();
        assert_eq!(
            result.doc,
            Node::doc(vec![Node::paragraph(vec![Node::text("ad")])])
        );
        assert_eq!(result.mapping.map(12, Bias::Right), 4);
        assert_eq!(
            result.mapping.maps(),
            &[StepMap::new(2, 6, 0), StepMap::new(4, 2, 0)]
        );
    }

    #[test]
    fn test_delete_into_list_keeps_pulled_text_positions() {
        // 0 <p> 1 a b 3 </p> 4 <ul> 5 <li> 6 <p> 7 c d 9 </p> 10 </li> 11 </ul> 12
        // becomes 0 <p> 1 a d 3 </p> 4
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::text("ab")]),
            Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                Node::text("cd"),
            ])])]),
        ]);
        let result = delete_range(&doc, 2, 8).unwrap();
        let expected = [
            (0, 0, false),
            (1, 1, false),
            (2, 2, false),
            (3, 2, true),
            (4, 2, true),
            (5, 2, true),
            (6, 2, true),
            (7, 2, true),
            (8, 2, false),
            (9, 3, false),
            (10, 4, false),
            (11, 4, true),
            (12, 4, false),
        ];
        for (old, pos, deleted) in expected {
            assert_eq!(
                result.mapping.map_result(old, Bias::Right),
                MapResult { pos, deleted },
                "position {old}"
            );
        }
    }

    #[test]
    fn test_delete_out_of_list_pulls_text_into_item() {
        // 0 <ul> 1 <li> 2 <p> 3 a b 5 </p> 6 </li> 7 </ul> 8 <p> 9 c d 11 </p> 12
        // becomes 0 <ul> 1 <li> 2 <p> 3 a d 5 </p> 6 </li> 7 </ul> 8
        let doc = Node::doc(vec![
            Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                Node::text("ab"),
            ])])]),
            Node::paragraph(vec![Node::text("cd")]),
        ]);
        let result = delete_range(&doc, 4, 10).unwrap();
        assert_eq!(
            result.doc,
            Node::doc(vec![Node::bullet_list(vec![Node::list_item(vec![
                Node::paragraph(vec![Node::text("ad")])
            ])])])
        );
        assert_eq!(
            result.mapping.maps(),
            &[StepMap::new(4, 6, 0), StepMap::new(5, 1, 3)]
        );
        assert_eq!(result.mapping.map(10, Bias::Right), 4);
        assert_eq!(result.mapping.map(11, Bias::Right), 5);
        assert_eq!(result.mapping.map(12, Bias::Right), 8);
    }

    #[test]
    fn test_delete_into_longer_item_reopens_it() {
        // the item keeps its second paragraph, so the list and item open again
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::text("ab")]),
            Node::bullet_list(vec![Node::list_item(vec![
                Node::paragraph(vec![Node::text("cd")]),
                Node::paragraph(vec![Node::text("ef")]),
            ])]),
        ]);
        let result = delete_range(&doc, 2, 8).unwrap();
        assert_eq!(
            result.doc,
            Node::doc(vec![
                Node::paragraph(vec![Node::text("ad")]),
                Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                    Node::text("ef"),
                ])])]),
            ])
        );
        // "e" sits at 11 before and at 7 after
        assert_eq!(result.mapping.map(11, Bias::Right), 7);
        assert_eq!(result.mapping.map(9, Bias::Right), 3);
        assert_eq!(result.mapping.map(16, Bias::Right), 12);
    }

    #[test]
    fn test_delete_whole_document_leaves_empty_paragraph() {
        let result = delete_range(&two_paragraphs(), 0, 14).unwrap();
        assert_eq!(result.doc, Node::doc(vec![Node::paragraph(vec![])]));
    }

    #[test]
    fn test_zero_length_delete_is_noop_even_out_of_bounds() {
        let doc = two_paragraphs();
        let result = delete_range(&doc, 5, 5).unwrap();
        assert_eq!(result.outcome, Outcome::NoOp);
        assert_eq!(result.doc, doc);
        assert_eq!(delete_range(&doc, 40, 40).unwrap().outcome, Outcome::NoOp);
    }

    #[test]
    fn test_delete_invalid_ranges() {
        let doc = two_paragraphs();
        assert_eq!(
            delete_range(&doc, 6, 2).unwrap_err(),
            EditError::OutOfRange { pos: 6, size: 14 }
        );
        assert_eq!(
            delete_range(&doc, 2, 20).unwrap_err(),
            EditError::OutOfRange { pos: 20, size: 14 }
        );
    }

    #[test]
    fn test_set_attrs() {
        let doc = Node::doc(vec![Node::heading(1, vec![Node::text("Intro")])]);
        let result = set_attrs(&doc, 0, attrs(json!({"level": 3}))).unwrap();
        assert_eq!(
            result.doc,
            Node::doc(vec![Node::heading(3, vec![Node::text("Intro")])])
        );

        assert!(matches!(
            set_attrs(&doc, 7, attrs(json!({"level": 2}))),
            Err(EditError::NotFound(_))
        ));
        assert!(matches!(
            set_attrs(&doc, 2, attrs(json!({"level": 2}))),
            Err(EditError::SchemaViolation(_))
        ));
        assert!(matches!(
            set_attrs(&doc, 0, attrs(json!({"colour": "red"}))),
            Err(EditError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_add_and_remove_mark() {
        let result = add_mark(&two_paragraphs(), 2, 4, Mark::Bold).unwrap();
        assert_eq!(
            result.doc.content()[0],
            Node::paragraph(vec![
                Node::text("h"),
                Node::marked_text("el", vec![Mark::Bold]),
                Node::text("lo"),
            ])
        );
        assert!(result.mapping.is_identity());

        let removed = remove_mark(&result.doc, 0, 14, MarkType::Bold).unwrap();
        assert_eq!(removed.doc, two_paragraphs());
    }

    #[test]
    fn test_marks_are_not_applied_inside_code() {
        let doc = Node::doc(vec![Node::code_block(None, "let x = 1;")]);
        let result = add_mark(&doc, 1, 5, Mark::Italic).unwrap();
        assert_eq!(result.outcome, Outcome::NoOp);
    }

    #[test]
    fn test_set_block_type_to_code_strips_inline_formatting() {
        let doc = Node::doc(vec![Node::paragraph(vec![
            Node::text("a"),
            Node::marked_text("b", vec![Mark::Bold]),
            Node::hard_break(),
            Node::text("c"),
        ])]);
        let result = set_block_type(&doc, 0, NodeKind::CodeBlock { language: None }).unwrap();
        assert_eq!(result.doc, Node::doc(vec![Node::code_block(None, "ab\nc")]));
        assert_eq!(result.doc.content_size(), doc.content_size());
    }

    #[test]
    fn test_set_block_type_requires_text_blocks() {
        let doc = Node::doc(vec![Node::horizontal_rule()]);
        assert!(matches!(
            set_block_type(&doc, 0, NodeKind::default_for(NodeType::Heading)),
            Err(EditError::SchemaViolation(_))
        ));
        assert!(matches!(
            set_block_type(&two_paragraphs(), 0, NodeKind::Blockquote),
            Err(EditError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_set_block_type_rejects_heading_level_out_of_range() {
        for level in [0, 7] {
            let kind = NodeKind::Heading {
                level,
                align: TextAlign::Left,
            };
            assert!(matches!(
                set_block_type(&two_paragraphs(), 0, kind),
                Err(EditError::SchemaViolation(_))
            ));
        }
    }

    #[test]
    fn test_replace_range() {
        let result = replace_range(&two_paragraphs(), 1, 6, Node::text("bye")).unwrap();
        assert_eq!(
            result.doc.content()[0],
            Node::paragraph(vec![Node::text("bye")])
        );
        assert_eq!(result.mapping.len(), 2);
        assert_eq!(result.mapping.map(9, Bias::Right), 7);
    }

    #[test]
    fn test_failed_commit_discards_every_step() {
        let doc = two_paragraphs();
        // an empty bullet list is not a valid document fragment
        let result = Transaction::new(&doc)
            .insert(0, Node::horizontal_rule())
            .and_then(|tx| tx.insert(0, Node::bullet_list(vec![])))
            .and_then(Transaction::commit);
        assert!(matches!(result, Err(EditError::SchemaViolation(_))));
        assert_eq!(doc, two_paragraphs());
    }

    #[test]
    fn test_replace_doc() {
        let replacement = Node::doc(vec![Node::horizontal_rule()]);
        let result = replace_doc(&two_paragraphs(), replacement.clone()).unwrap();
        assert_eq!(result.doc, replacement);
        assert_eq!(result.mapping.maps(), &[StepMap::new(0, 14, 1)]);
        assert!(replace_doc(&two_paragraphs(), Node::paragraph(vec![])).is_err());
    }
}
