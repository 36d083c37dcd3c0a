//! Applying edit operations to a tree.
//!
//! [`Tree::apply`] is the mutation engine used while a script is generated;
//! [`Tree::replay`] runs a finished script against a fresh copy of the old
//! tree.

use crate::trace;

use indextree::NodeId;
use rapidhash::RapidHashMap as HashMap;

use crate::Diff;
use crate::chawathe::EditOp;
use crate::error::DiffError;
use crate::tree::Tree;

impl Tree {
    /// Apply one edit operation in place.
    ///
    /// - `Insert` attaches a detached node at `position <= child_count(parent)`
    /// - `Delete` detaches a node that has a parent and no children; the node
    ///   stays in the arena
    /// - `Update` overwrites the node's value
    /// - `Move` detaches the node with its subtree, then inserts it under the
    ///   new parent at `position` (counted without the node itself)
    pub fn apply(&mut self, op: &EditOp) -> Result<(), DiffError> {
        trace!(%op, "apply");
        match op {
            EditOp::Insert {
                node,
                parent,
                position,
                ..
            } => {
                self.ensure_live(*node)?;
                self.ensure_live(*parent)?;
                if self.parent(*node).is_some() || *node == self.root {
                    return Err(DiffError::invariant(format!(
                        "insert of a:{} which is already attached",
                        usize::from(*node)
                    )));
                }
                self.insert_at(*parent, *position, *node)
            }
            EditOp::Delete { node } => {
                self.ensure_live(*node)?;
                if self.parent(*node).is_none() {
                    return Err(DiffError::invariant(format!(
                        "delete of a:{} which has no parent",
                        usize::from(*node)
                    )));
                }
                if !self.is_leaf(*node) {
                    return Err(DiffError::invariant(format!(
                        "delete of a:{} which still has children",
                        usize::from(*node)
                    )));
                }
                node.detach(&mut self.arena);
                Ok(())
            }
            EditOp::Update { node, value } => {
                self.ensure_live(*node)?;
                self.set_value(*node, value.clone());
                Ok(())
            }
            EditOp::Move {
                node,
                parent,
                position,
            } => {
                self.ensure_live(*node)?;
                self.ensure_live(*parent)?;
                if self.parent(*node).is_none() {
                    return Err(DiffError::invariant(format!(
                        "move of a:{} which has no parent",
                        usize::from(*node)
                    )));
                }
                if self.is_descendant_of(*parent, *node) {
                    return Err(DiffError::invariant(format!(
                        "move of a:{} under its own descendant a:{}",
                        usize::from(*node),
                        usize::from(*parent)
                    )));
                }
                node.detach(&mut self.arena);
                self.insert_at(*parent, *position, *node)
            }
        }
    }

    /// Replay `diff`'s script on a copy of this tree.
    ///
    /// `self` must be the old tree the diff was computed from. Inserted
    /// nodes are allocated in the copy and script ids are translated to
    /// them. Synthetic roots are added and removed again, so the result is
    /// isomorphic to the new tree as it was passed in.
    pub fn replay(&self, diff: &Diff) -> Result<Tree, DiffError> {
        let mut tree = self.clone();
        let mut ids: HashMap<NodeId, NodeId> = HashMap::default();
        if diff.used_synthetic_roots {
            let wrapper = tree.wrap_in_synthetic_root()?;
            ids.insert(diff.before.root, wrapper);
        }
        let resolve =
            |ids: &HashMap<NodeId, NodeId>, id: NodeId| ids.get(&id).copied().unwrap_or(id);

        for op in &diff.script {
            let local = match op {
                EditOp::Insert {
                    node,
                    label,
                    parent,
                    position,
                } => {
                    let fresh = tree.new_node(label.clone());
                    ids.insert(*node, fresh);
                    EditOp::Insert {
                        node: fresh,
                        label: label.clone(),
                        parent: resolve(&ids, *parent),
                        position: *position,
                    }
                }
                EditOp::Delete { node } => EditOp::Delete {
                    node: resolve(&ids, *node),
                },
                EditOp::Update { node, value } => EditOp::Update {
                    node: resolve(&ids, *node),
                    value: value.clone(),
                },
                EditOp::Move {
                    node,
                    parent,
                    position,
                } => EditOp::Move {
                    node: resolve(&ids, *node),
                    parent: resolve(&ids, *parent),
                    position: *position,
                },
            };
            tree.apply(&local)?;
        }

        if diff.used_synthetic_roots {
            tree.unwrap_synthetic_root()?;
        }
        Ok(tree)
    }

    /// Make the only child of a synthetic root the root again.
    fn unwrap_synthetic_root(&mut self) -> Result<(), DiffError> {
        let wrapper = self.root;
        if !self.label(wrapper).is_synthetic_root() {
            return Err(DiffError::invariant("root is not synthetic"));
        }
        let children: Vec<NodeId> = self.children(wrapper).collect();
        let &[inner] = children.as_slice() else {
            return Err(DiffError::invariant(
                "synthetic root does not have exactly one child",
            ));
        };
        inner.detach(&mut self.arena);
        self.root = inner;
        Ok(())
    }

    fn ensure_live(&self, id: NodeId) -> Result<(), DiffError> {
        match self.arena.get(id) {
            Some(node) if !node.is_removed() => Ok(()),
            _ => Err(DiffError::invariant(format!(
                "a:{} is not a node of this tree",
                usize::from(id)
            ))),
        }
    }

    /// Insert `node` as the `position`-th child of `parent`.
    fn insert_at(
        &mut self,
        parent: NodeId,
        position: usize,
        node: NodeId,
    ) -> Result<(), DiffError> {
        let count = self.child_count(parent);
        if position > count {
            return Err(DiffError::invariant(format!(
                "position {position} is past the {count} children of a:{}",
                usize::from(parent)
            )));
        }
        let next_sibling = parent.children(&self.arena).nth(position);
        match next_sibling {
            Some(next_sibling) => next_sibling.checked_insert_before(node, &mut self.arena)?,
            None => parent.checked_append(node, &mut self.arena)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Label, Scalar};

    fn sample() -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new(Label::new("array"));
        let ids = ["a", "b", "c"]
            .into_iter()
            .map(|v| tree.add_child(tree.root, Label::with_value("string", v)))
            .collect();
        (tree, ids)
    }

    fn values(tree: &Tree) -> Vec<String> {
        tree.children(tree.root)
            .map(|id| tree.value(id).map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_insert_at_positions() {
        let (mut tree, _) = sample();
        for (position, value) in [(0, "x"), (4, "z"), (2, "y")] {
            let label = Label::with_value("string", value);
            let node = tree.new_node(label.clone());
            tree.apply(&EditOp::Insert {
                node,
                label,
                parent: tree.root,
                position,
            })
            .unwrap();
        }
        let expected = ["\"x\"", "\"a\"", "\"y\"", "\"b\"", "\"c\"", "\"z\""];
        assert_eq!(values(&tree), expected);
    }

    #[test]
    fn test_insert_past_end_fails() {
        let (mut tree, _) = sample();
        let label = Label::new("null");
        let node = tree.new_node(label.clone());
        let err = tree
            .apply(&EditOp::Insert {
                node,
                label,
                parent: tree.root,
                position: 5,
            })
            .unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_move_position_counts_without_the_node() {
        let (mut tree, ids) = sample();
        tree.apply(&EditOp::Move {
            node: ids[0],
            parent: tree.root,
            position: 2,
        })
        .unwrap();
        assert_eq!(values(&tree), ["\"b\"", "\"c\"", "\"a\""]);
    }

    #[test]
    fn test_move_into_own_subtree_fails() {
        let mut tree = Tree::new(Label::new("object"));
        let outer = tree.add_child(tree.root, Label::new("array"));
        let inner = tree.add_child(outer, Label::new("array"));
        let err = tree
            .apply(&EditOp::Move {
                node: outer,
                parent: inner,
                position: 0,
            })
            .unwrap_err();
        assert!(err.is_internal());
        assert_eq!(tree.parent(outer), Some(tree.root));
    }

    #[test]
    fn test_move_root_fails() {
        let (mut tree, ids) = sample();
        let root = tree.root;
        let err = tree
            .apply(&EditOp::Move {
                node: root,
                parent: ids[0],
                position: 0,
            })
            .unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_delete_requires_leaf_with_parent() {
        let mut tree = Tree::new(Label::new("object"));
        let key = tree.add_child(tree.root, Label::with_value("key", "k"));
        let value = tree.add_child(key, Label::with_value("number", 1.0));

        assert!(tree.apply(&EditOp::Delete { node: key }).is_err());
        let root = tree.root;
        assert!(tree.apply(&EditOp::Delete { node: root }).is_err());

        tree.apply(&EditOp::Delete { node: value }).unwrap();
        tree.apply(&EditOp::Delete { node: key }).unwrap();
        assert!(tree.is_leaf(tree.root));
        assert!(tree.apply(&EditOp::Delete { node: key }).is_err());
    }

    #[test]
    fn test_update_overwrites_value() {
        let (mut tree, ids) = sample();
        tree.apply(&EditOp::Update {
            node: ids[1],
            value: Some(Scalar::from(true)),
        })
        .unwrap();
        assert_eq!(tree.value(ids[1]), Some(&Scalar::Bool(true)));
    }
}
