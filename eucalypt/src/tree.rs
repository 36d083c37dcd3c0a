//! Arena-backed ordered labeled trees.
//!
//! Nodes live in an [`indextree::Arena`]; a node's identity is its
//! [`NodeId`], so matchings and edit operations refer to nodes by id and
//! never alias the tree itself. Parent links are arena links rather than
//! owning pointers.

use core::fmt;
use std::collections::VecDeque;

use compact_str::CompactString;
use indextree::{Arena, NodeEdge, NodeId};

use crate::error::DiffError;

/// Kind reserved for the wrapper roots added when the real roots don't match.
pub const SYNTHETIC_ROOT_KIND: &str = "#root";

/// A comparable scalar carried by a leaf (or by a `key`/`index` node).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A boolean
    Bool(bool),
    /// A number
    Number(f64),
    /// A string
    String(CompactString),
}

impl Scalar {
    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(CompactString::from(value))
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(CompactString::from(value))
    }
}

impl From<CompactString> for Scalar {
    fn from(value: CompactString) -> Self {
        Scalar::String(value)
    }
}

/// A node label: a type tag plus an optional scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Type tag, e.g. `object`, `key`, `string`
    pub kind: CompactString,
    /// Scalar value, if any
    pub value: Option<Scalar>,
}

impl Label {
    /// A label without a value.
    pub fn new(kind: impl Into<CompactString>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
        }
    }

    /// A label carrying a value.
    pub fn with_value(kind: impl Into<CompactString>, value: impl Into<Scalar>) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value.into()),
        }
    }

    /// The label given to wrapper roots.
    pub fn synthetic_root() -> Self {
        Self::new(SYNTHETIC_ROOT_KIND)
    }

    /// Whether this is a wrapper-root label.
    pub fn is_synthetic_root(&self) -> bool {
        self.kind == SYNTHETIC_ROOT_KIND
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.kind, value),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// An ordered labeled tree.
#[derive(Debug, Clone)]
pub struct Tree {
    /// All nodes, including detached ones
    pub arena: Arena<Label>,
    /// The root node
    pub root: NodeId,
}

impl Tree {
    /// Create a tree with a single root node.
    pub fn new(root: Label) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(root);
        Self { arena, root }
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new child under `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, label: Label) -> NodeId {
        let child = self.arena.new_node(label);
        parent.append(child, &mut self.arena);
        child
    }

    /// Allocate a detached node.
    pub(crate) fn new_node(&mut self, label: Label) -> NodeId {
        self.arena.new_node(label)
    }

    /// The label of a node.
    #[inline]
    pub fn label(&self, id: NodeId) -> &Label {
        self.arena[id].get()
    }

    /// The type tag of a node.
    #[inline]
    pub fn kind(&self, id: NodeId) -> &str {
        self.label(id).kind.as_str()
    }

    /// The scalar value of a node.
    #[inline]
    pub fn value(&self, id: NodeId) -> Option<&Scalar> {
        self.label(id).value.as_ref()
    }

    /// Overwrite the scalar value of a node.
    pub(crate) fn set_value(&mut self, id: NodeId, value: Option<Scalar>) {
        self.arena[id].get_mut().value = value;
    }

    /// The parent of a node, `None` for the root and for detached nodes.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Children of a node, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Number of children of a node.
    pub fn child_count(&self, id: NodeId) -> usize {
        id.children(&self.arena).count()
    }

    /// Whether a node has no children.
    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.arena[id].first_child().is_none()
    }

    /// Index of a node among its parent's children (0 for the root).
    pub fn position(&self, id: NodeId) -> usize {
        match self.parent(id) {
            Some(parent) => parent
                .children(&self.arena)
                .position(|sibling| sibling == id)
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.root.descendants(&self.arena).count()
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        id.ancestors(&self.arena).any(|a| a == ancestor)
    }

    /// Breadth-first iteration from the root.
    pub fn iter(&self) -> BreadthFirst<'_> {
        BreadthFirst {
            arena: &self.arena,
            queue: VecDeque::from([self.root]),
        }
    }

    /// Post-order iteration from the root (children before parents).
    pub fn post_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.post_order_from(self.root)
    }

    /// Post-order iteration of the subtree rooted at `id`.
    pub fn post_order_from(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.traverse(&self.arena).filter_map(|edge| match edge {
            NodeEdge::End(node) => Some(node),
            NodeEdge::Start(_) => None,
        })
    }

    /// Leaf descendants of `id` (including `id` itself if it is a leaf).
    pub fn leaves(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
            .filter(|&node| self.arena[node].first_child().is_none())
    }

    /// Structural equality: same labels, same shape, same child order.
    pub fn is_isomorphic(&self, other: &Tree) -> bool {
        self.subtree_isomorphic(self.root, other, other.root)
    }

    /// Structural equality of two subtrees.
    pub fn subtree_isomorphic(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let mut stack = vec![(id, other_id)];
        while let Some((a, b)) = stack.pop() {
            if self.label(a) != other.label(b) {
                return false;
            }
            let a_children: Vec<_> = self.children(a).collect();
            let b_children: Vec<_> = other.children(b).collect();
            if a_children.len() != b_children.len() {
                return false;
            }
            stack.extend(a_children.into_iter().zip(b_children));
        }
        true
    }

    /// Make a fresh synthetic root the parent of the current root.
    pub(crate) fn wrap_in_synthetic_root(&mut self) -> Result<NodeId, DiffError> {
        let wrapper = self.arena.new_node(Label::synthetic_root());
        wrapper.checked_append(self.root, &mut self.arena)?;
        self.root = wrapper;
        Ok(wrapper)
    }

    /// Check the shape the diff algorithm relies on.
    ///
    /// Numbers must be finite so that every value compares equal to itself.
    pub fn validate(&self) -> Result<(), DiffError> {
        if self.arena.get(self.root).is_none() || self.root.is_removed(&self.arena) {
            return Err(DiffError::malformed("root node is not in the arena"));
        }
        if self.parent(self.root).is_some() {
            return Err(DiffError::malformed("root node has a parent"));
        }
        for id in self.root.descendants(&self.arena) {
            if self.kind(id).is_empty() {
                return Err(DiffError::malformed(format!(
                    "node {} has an empty label kind",
                    usize::from(id)
                )));
            }
            if matches!(self.value(id), Some(Scalar::Number(n)) if !n.is_finite()) {
                return Err(DiffError::malformed(format!(
                    "node {} carries a non-finite number",
                    usize::from(id)
                )));
            }
        }
        Ok(())
    }
}

/// Breadth-first traversal of a [`Tree`].
pub struct BreadthFirst<'a> {
    arena: &'a Arena<Label>,
    queue: VecDeque<NodeId>,
}

impl Iterator for BreadthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        self.queue.extend(id.children(self.arena));
        Some(id)
    }
}
