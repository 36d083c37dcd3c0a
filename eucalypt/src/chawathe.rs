//! Chawathe edit script generation algorithm.
//!
//! Generates an edit script (INSERT, DELETE, UPDATE, MOVE) from a node matching.
//! Based on "Change Detection in Hierarchically Structured Information" (Chawathe et al., 1996).
//!
//! The update, insert, align and move phases share one breadth-first walk of
//! the new tree; deletes follow in a post-order walk of the working tree.
//! Every operation is applied to the working tree as soon as it is emitted,
//! so later positions are computed against the mutated tree.

use crate::{debug, trace};
use core::fmt;

use crate::error::DiffError;
use crate::matching::Matching;
use crate::position::{InOrder, detached_position, find_pos};
use crate::tree::{Label, Scalar, Tree};
use indextree::NodeId;

/// An edit operation in the diff.
///
/// Node ids refer to the working (old) tree. Positions are 0-based child
/// indices in the parent's child list at the time the operation is applied.
#[derive(Clone, PartialEq)]
pub enum EditOp {
    /// Insert a new leaf node.
    Insert {
        /// The freshly allocated node
        node: NodeId,
        /// Its label
        label: Label,
        /// The parent it is attached to
        parent: NodeId,
        /// Position among siblings
        position: usize,
    },

    /// Delete a node that has no remaining children.
    Delete {
        /// The node being deleted
        node: NodeId,
    },

    /// Overwrite the value of a node.
    Update {
        /// The node being updated
        node: NodeId,
        /// The new value
        value: Option<Scalar>,
    },

    /// Detach a node (with its subtree) and reattach it elsewhere.
    Move {
        /// The node being moved
        node: NodeId,
        /// New parent
        parent: NodeId,
        /// Position among the new parent's children once the node is detached
        position: usize,
    },
}

impl EditOp {
    /// The node this operation acts on.
    pub fn node(&self) -> NodeId {
        match self {
            EditOp::Insert { node, .. }
            | EditOp::Delete { node }
            | EditOp::Update { node, .. }
            | EditOp::Move { node, .. } => *node,
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOp::Insert {
                node,
                label,
                parent,
                position,
            } => write!(
                f,
                "Insert(a:{} {} @{} under a:{})",
                usize::from(*node),
                label,
                position,
                usize::from(*parent)
            ),
            EditOp::Delete { node } => write!(f, "Delete(a:{})", usize::from(*node)),
            EditOp::Update { node, value } => match value {
                Some(value) => write!(f, "Update(a:{} → {})", usize::from(*node), value),
                None => write!(f, "Update(a:{} → none)", usize::from(*node)),
            },
            EditOp::Move {
                node,
                parent,
                position,
            } => write!(
                f,
                "Move(a:{} @{} under a:{})",
                usize::from(*node),
                position,
                usize::from(*parent)
            ),
        }
    }
}

impl fmt::Debug for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse Display implementation for Debug
        fmt::Display::fmt(self, f)
    }
}

/// Wrapper for collecting edit operations with automatic tracing.
struct Ops {
    inner: Vec<EditOp>,
}

impl Ops {
    fn new() -> Self {
        Self { inner: Vec::new() }
    }

    fn push(&mut self, op: EditOp) {
        debug!(%op, "emit");
        self.inner.push(op);
    }

    fn into_inner(self) -> Vec<EditOp> {
        self.inner
    }
}

/// Generate an edit script from a matching between two trees.
///
/// `before` is mutated into a tree isomorphic to `after`. The roots must
/// already be matched to each other. Returns the script together with the
/// total matching between the mutated `before` and `after`.
pub fn generate_edit_script(
    before: &mut Tree,
    after: &Tree,
    matching: Matching,
) -> Result<(Vec<EditOp>, Matching), DiffError> {
    trace!(matched_pairs = matching.len(), "generate_edit_script start");
    if !matching.has_pair(before.root, after.root) {
        return Err(DiffError::invariant("roots are not matched to each other"));
    }

    let mut generator = ScriptGenerator {
        before,
        after,
        initial: matching.clone(),
        matching,
        in_order: InOrder::default(),
        ops: Ops::new(),
    };

    for x in after.iter() {
        generator.visit(x)?;
    }
    debug!(ops = generator.ops.inner.len(), "after breadth-first pass");

    generator.delete_unmatched()?;

    let ScriptGenerator {
        before,
        matching,
        ops,
        ..
    } = generator;
    if !matching.is_total(before, after) {
        return Err(DiffError::invariant("final matching is not total"));
    }

    let ops = ops.into_inner();
    debug!(total_ops = ops.len(), "generate_edit_script done");
    Ok((ops, matching))
}

/// Mutable state of one script generation run.
pub(crate) struct ScriptGenerator<'a> {
    /// The working tree, mutated as operations are emitted
    pub(crate) before: &'a mut Tree,
    /// The target tree
    pub(crate) after: &'a Tree,
    /// The matching as computed before generation started
    pub(crate) initial: Matching,
    /// The matching being extended to a total one
    pub(crate) matching: Matching,
    pub(crate) in_order: InOrder,
    ops: Ops,
}

impl ScriptGenerator<'_> {
    /// Handle one node of the new tree, in breadth-first order.
    fn visit(&mut self, x: NodeId) -> Result<(), DiffError> {
        let w = match self.matching.get_a(x) {
            Some(w) => {
                self.update_and_move(w, x)?;
                w
            }
            None => self.insert(x)?,
        };
        self.align_children(w, x)
    }

    /// Create a partner for the unmatched node `x` under its parent's partner.
    fn insert(&mut self, x: NodeId) -> Result<NodeId, DiffError> {
        let y = self
            .after
            .parent(x)
            .ok_or_else(|| DiffError::invariant(format!("unmatched root b:{}", usize::from(x))))?;
        let z = self.partner_of_after(y)?;
        let position = find_pos(self.before, self.after, &self.matching, &self.in_order, x)?;

        let label = self.after.label(x).clone();
        let w = self.before.new_node(label.clone());
        self.emit(EditOp::Insert {
            node: w,
            label,
            parent: z,
            position,
        })?;
        self.matching.add(w, x);
        self.in_order.mark(x);
        Ok(w)
    }

    /// Bring the value of `w` in line with `x`, and move `w` if its parent is
    /// not the partner of `x`'s parent.
    fn update_and_move(&mut self, w: NodeId, x: NodeId) -> Result<(), DiffError> {
        let value = self.after.value(x);
        if self.before.value(w) != value {
            let value = value.cloned();
            self.emit(EditOp::Update { node: w, value })?;
        }

        let Some(y) = self.after.parent(x) else {
            return Ok(());
        };
        let in_place = self
            .before
            .parent(w)
            .is_some_and(|v| self.matching.has_pair(v, y));
        if !in_place {
            let z = self.partner_of_after(y)?;
            let position = find_pos(self.before, self.after, &self.matching, &self.in_order, x)?;
            self.emit_move(w, z, position)?;
            self.in_order.mark(x);
        }
        Ok(())
    }

    /// Delete every node of the working tree left without a partner.
    ///
    /// Post-order, so children go before their parents.
    fn delete_unmatched(&mut self) -> Result<(), DiffError> {
        let order: Vec<NodeId> = self.before.post_order().collect();
        for w in order {
            if !self.matching.contains_a(w) {
                self.emit(EditOp::Delete { node: w })?;
            }
        }
        Ok(())
    }

    /// Emit a move whose position was computed with `node` still attached.
    pub(crate) fn emit_move(
        &mut self,
        node: NodeId,
        parent: NodeId,
        position: usize,
    ) -> Result<(), DiffError> {
        let position = detached_position(self.before, node, parent, position);
        self.emit(EditOp::Move {
            node,
            parent,
            position,
        })
    }

    /// Apply an operation to the working tree and record it.
    fn emit(&mut self, op: EditOp) -> Result<(), DiffError> {
        self.before.apply(&op)?;
        self.ops.push(op);
        Ok(())
    }

    fn partner_of_after(&self, b: NodeId) -> Result<NodeId, DiffError> {
        self.matching
            .get_a(b)
            .ok_or_else(|| DiffError::invariant(format!("b:{} has no partner", usize::from(b))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(kind: &str, values: &[&str]) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new(Label::new(kind));
        let ids = values
            .iter()
            .map(|&v| tree.add_child(tree.root, Label::with_value("string", v)))
            .collect();
        (tree, ids)
    }

    #[test]
    fn test_empty_script_for_total_matching() {
        let (mut before, a_ids) = strings("array", &["a", "b"]);
        let (after, b_ids) = strings("array", &["a", "b"]);
        let mut matching = Matching::new();
        matching.add(before.root, after.root);
        matching.add(a_ids[0], b_ids[0]);
        matching.add(a_ids[1], b_ids[1]);

        let (ops, total) = generate_edit_script(&mut before, &after, matching).unwrap();
        assert!(ops.is_empty());
        assert_eq!(total.len(), 3);
    }

    #[test]
    fn test_unmatched_roots_are_rejected() {
        let (mut before, _) = strings("array", &[]);
        let (after, _) = strings("array", &[]);
        let err = generate_edit_script(&mut before, &after, Matching::new()).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_inserts_deletes_and_updates() {
        // [a, b] -> [a2, c] with only a matched to a2
        let (mut before, a_ids) = strings("array", &["a", "b"]);
        let (after, b_ids) = strings("array", &["a2", "c"]);
        let mut matching = Matching::new();
        matching.add(before.root, after.root);
        matching.add(a_ids[0], b_ids[0]);

        let (ops, total) = generate_edit_script(&mut before, &after, matching).unwrap();
        assert_eq!(ops.len(), 3, "{ops:?}");
        assert!(matches!(
            &ops[0],
            EditOp::Update { node, value: Some(Scalar::String(s)) }
                if *node == a_ids[0] && s == "a2"
        ));
        assert!(matches!(
            &ops[1],
            EditOp::Insert { parent, position: 1, label, .. }
                if *parent == before.root && label.value == Some(Scalar::from("c"))
        ));
        assert!(matches!(&ops[2], EditOp::Delete { node } if *node == a_ids[1]));
        assert!(before.is_isomorphic(&after));
        assert!(total.is_total(&before, &after));
    }

    #[test]
    fn test_reparenting_move() {
        // root -> [p -> [a], q] becomes root -> [p, q -> [a]]
        let mut before = Tree::new(Label::new("root"));
        let p1 = before.add_child(before.root, Label::new("p"));
        let a1 = before.add_child(p1, Label::with_value("leaf", "a"));
        let q1 = before.add_child(before.root, Label::new("q"));

        let mut after = Tree::new(Label::new("root"));
        let p2 = after.add_child(after.root, Label::new("p"));
        let q2 = after.add_child(after.root, Label::new("q"));
        let a2 = after.add_child(q2, Label::with_value("leaf", "a"));

        let mut matching = Matching::new();
        matching.add(before.root, after.root);
        matching.add(p1, p2);
        matching.add(q1, q2);
        matching.add(a1, a2);

        let (ops, _) = generate_edit_script(&mut before, &after, matching).unwrap();
        assert_eq!(ops.len(), 1, "{ops:?}");
        assert!(matches!(
            ops[0],
            EditOp::Move { node, parent, position: 0 } if node == a1 && parent == q1
        ));
        assert!(before.is_isomorphic(&after));
    }

    #[test]
    fn test_display() {
        let op = EditOp::Delete {
            node: Tree::new(Label::new("x")).root,
        };
        assert_eq!(op.to_string(), "Delete(a:1)");
        assert_eq!(format!("{op:?}"), "Delete(a:1)");
    }
}
