//! Target positions for inserts and moves.

use indextree::NodeId;
use rapidhash::RapidHashSet as HashSet;

use crate::error::DiffError;
use crate::matching::Matching;
use crate::tree::Tree;

/// "In order" marks on nodes of the new tree.
///
/// A node is in order once its partner has been placed relative to its
/// in-order siblings. Working tree positions are read off the tree itself,
/// so only this side needs marks.
#[derive(Debug, Default)]
pub(crate) struct InOrder {
    after: HashSet<NodeId>,
}

impl InOrder {
    /// Mark a node of the new tree as in order.
    pub(crate) fn mark(&mut self, b: NodeId) {
        self.after.insert(b);
    }

    /// Whether a node of the new tree is marked.
    pub(crate) fn is_marked(&self, b: NodeId) -> bool {
        self.after.contains(&b)
    }

    /// Mark every child of `x` out of order.
    pub(crate) fn clear_children(&mut self, after: &Tree, x: NodeId) {
        for child in after.children(x) {
            self.after.remove(&child);
        }
    }
}

/// Where the partner of `x` belongs among the current children of the
/// partner of `x`'s parent.
///
/// Zero when no left sibling of `x` is in order. Otherwise one past the
/// current index of the partner of the nearest in-order left sibling.
pub(crate) fn find_pos(
    before: &Tree,
    after: &Tree,
    matching: &Matching,
    in_order: &InOrder,
    x: NodeId,
) -> Result<usize, DiffError> {
    let Some(y) = after.parent(x) else {
        return Ok(0);
    };

    let nearest_left = after
        .children(y)
        .take_while(|&sibling| sibling != x)
        .filter(|&sibling| in_order.is_marked(sibling))
        .last();
    let Some(v) = nearest_left else {
        return Ok(0);
    };

    let u = matching.get_a(v).ok_or_else(|| {
        DiffError::invariant(format!(
            "in-order sibling {} has no partner",
            usize::from(v)
        ))
    })?;
    if before.parent(u).is_none() {
        return Err(DiffError::invariant(format!(
            "partner {} of in-order sibling is detached",
            usize::from(u)
        )));
    }
    Ok(before.position(u) + 1)
}

/// Adjust a position computed with `node` still in place to the index it
/// must take once detached from its current parent.
pub(crate) fn detached_position(
    tree: &Tree,
    node: NodeId,
    parent: NodeId,
    position: usize,
) -> usize {
    if tree.parent(node) == Some(parent) && tree.position(node) < position {
        position - 1
    } else {
        position
    }
}
