//! Heuristic node matching.
//!
//! Runs up to three passes:
//! 1. Leaves: pair same-kinded leaves whose values are similar enough
//! 2. Branches: pair same-kinded internal nodes that share enough matched leaves
//! 3. Sibling recovery: under an already matched parent pair, pair the
//!    remaining children that line up by kind and position

use crate::{debug, trace};

use crate::error::DiffError;
use crate::similarity::{StringSimilarity, leaf_similarity};
use crate::tree::Tree;
use indextree::NodeId;
use rapidhash::{RapidHashMap as HashMap, RapidHashSet as HashSet};

/// A bidirectional mapping between nodes in two trees.
/// Uses Vec for O(1) lookups indexed by NodeId.
#[derive(Debug, Clone)]
pub struct Matching {
    /// Map from tree A node to tree B node (indexed by A's NodeId)
    a_to_b: Vec<Option<NodeId>>,
    /// Map from tree B node to tree A node (indexed by B's NodeId)
    b_to_a: Vec<Option<NodeId>>,
    /// All matched pairs, in the order they were added
    pairs: Vec<(NodeId, NodeId)>,
}

impl Default for Matching {
    fn default() -> Self {
        Self::new()
    }
}

impl Matching {
    /// Create a new empty matching.
    pub fn new() -> Self {
        Self {
            a_to_b: Vec::new(),
            b_to_a: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Add a match between two nodes.
    ///
    /// Both nodes must currently be unmatched.
    #[inline]
    pub fn add(&mut self, a: NodeId, b: NodeId) {
        let a_idx = usize::from(a);
        let b_idx = usize::from(b);

        if a_idx >= self.a_to_b.len() {
            self.a_to_b.resize(a_idx + 1, None);
        }
        if b_idx >= self.b_to_a.len() {
            self.b_to_a.resize(b_idx + 1, None);
        }

        debug_assert!(self.a_to_b[a_idx].is_none() && self.b_to_a[b_idx].is_none());
        self.a_to_b[a_idx] = Some(b);
        self.b_to_a[b_idx] = Some(a);
        self.pairs.push((a, b));
    }

    /// Check if a node from tree A is matched.
    #[inline(always)]
    pub fn contains_a(&self, a: NodeId) -> bool {
        self.get_b(a).is_some()
    }

    /// Check if a node from tree B is matched.
    #[inline(always)]
    pub fn contains_b(&self, b: NodeId) -> bool {
        self.get_a(b).is_some()
    }

    /// Get the match for a node from tree A.
    #[inline(always)]
    pub fn get_b(&self, a: NodeId) -> Option<NodeId> {
        self.a_to_b.get(usize::from(a)).copied().flatten()
    }

    /// Get the match for a node from tree B.
    #[inline(always)]
    pub fn get_a(&self, b: NodeId) -> Option<NodeId> {
        self.b_to_a.get(usize::from(b)).copied().flatten()
    }

    /// Whether `(a, b)` is one of the pairs.
    #[inline]
    pub fn has_pair(&self, a: NodeId, b: NodeId) -> bool {
        self.get_b(a) == Some(b)
    }

    /// Get all matched pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.pairs.iter().copied()
    }

    /// Get the number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no matches.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Whether every node reachable in either tree has a partner.
    pub fn is_total(&self, tree_a: &Tree, tree_b: &Tree) -> bool {
        tree_a.iter().all(|a| self.contains_a(a)) && tree_b.iter().all(|b| self.contains_b(b))
    }
}

/// Configuration for the matching algorithm.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum leaf similarity for the leaf pass, in `[0.5, 1.0]`.
    pub leaf_threshold: f64,

    /// Minimum share of common matched leaves for the branch pass, in `[0.0, 1.0]`.
    pub branch_threshold: f64,

    /// Run the sibling recovery pass after the branch pass.
    pub recover_siblings: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            leaf_threshold: 0.8,
            branch_threshold: 0.5,
            recover_siblings: true,
        }
    }
}

impl MatchingConfig {
    /// Reject thresholds outside their domains.
    pub fn validate(&self) -> Result<(), DiffError> {
        if !(0.5..=1.0).contains(&self.leaf_threshold) {
            return Err(DiffError::InvalidConfiguration {
                name: "leaf_threshold",
                value: self.leaf_threshold,
                expected: "a number in [0.5, 1.0]",
            });
        }
        if !(0.0..=1.0).contains(&self.branch_threshold) {
            return Err(DiffError::InvalidConfiguration {
                name: "branch_threshold",
                value: self.branch_threshold,
                expected: "a number in [0.0, 1.0]",
            });
        }
        Ok(())
    }
}

/// Compute a (partial) matching between two trees.
///
/// Iteration is post-order on both sides and the first acceptable candidate
/// wins, so the result only depends on the trees and the configuration.
pub fn compute_matching<S>(
    tree_a: &Tree,
    tree_b: &Tree,
    config: &MatchingConfig,
    strings: &S,
) -> Matching
where
    S: StringSimilarity + ?Sized,
{
    debug!(
        nodes_a = tree_a.node_count(),
        nodes_b = tree_b.node_count(),
        "compute_matching start"
    );
    let mut matching = Matching::new();

    leaf_phase(tree_a, tree_b, &mut matching, config, strings);
    debug!(matched = matching.len(), "after leaf_phase");

    branch_phase(tree_a, tree_b, &mut matching, config);
    debug!(matched = matching.len(), "after branch_phase");

    if config.recover_siblings {
        recovery_phase(tree_a, tree_b, &mut matching);
        debug!(matched = matching.len(), "after recovery_phase");
    }

    matching
}

/// Phase 1: pair unmatched leaves of equal kind and similar value.
fn leaf_phase<S>(
    tree_a: &Tree,
    tree_b: &Tree,
    matching: &mut Matching,
    config: &MatchingConfig,
    strings: &S,
) where
    S: StringSimilarity + ?Sized,
{
    let leaves_b: Vec<NodeId> = tree_b
        .post_order()
        .filter(|&b_id| tree_b.is_leaf(b_id))
        .collect();

    for a_id in tree_a.post_order() {
        if !tree_a.is_leaf(a_id) || matching.contains_a(a_id) {
            continue;
        }
        let a_kind = tree_a.kind(a_id);
        let a_value = tree_a.value(a_id);

        for &b_id in &leaves_b {
            if matching.contains_b(b_id) || tree_b.kind(b_id) != a_kind {
                continue;
            }
            let score = leaf_similarity(a_value, tree_b.value(b_id), strings);
            trace!(
                a = usize::from(a_id),
                b = usize::from(b_id),
                a_kind,
                score,
                "leaf_phase: score"
            );
            if score >= config.leaf_threshold {
                trace!(
                    a = usize::from(a_id),
                    b = usize::from(b_id),
                    "leaf_phase: match"
                );
                matching.add(a_id, b_id);
                break;
            }
        }
    }
}

/// Leaf sets of internal nodes, computed on first use.
struct LeafSets<'a> {
    tree: &'a Tree,
    cache: HashMap<NodeId, HashSet<NodeId>>,
}

impl<'a> LeafSets<'a> {
    fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            cache: HashMap::default(),
        }
    }

    fn get_or_compute(&mut self, node_id: NodeId) -> &HashSet<NodeId> {
        let tree = self.tree;
        self.cache
            .entry(node_id)
            .or_insert_with(|| tree.leaves(node_id).collect())
    }
}

/// Phase 2: pair unmatched internal nodes of equal kind whose leaves are
/// largely matched to each other.
fn branch_phase(tree_a: &Tree, tree_b: &Tree, matching: &mut Matching, config: &MatchingConfig) {
    let mut leaves_a = LeafSets::new(tree_a);
    let mut leaves_b = LeafSets::new(tree_b);
    let branches_b: Vec<NodeId> = tree_b
        .post_order()
        .filter(|&b| !tree_b.is_leaf(b))
        .collect();

    for a_id in tree_a.post_order() {
        if tree_a.is_leaf(a_id) || matching.contains_a(a_id) {
            continue;
        }
        let a_kind = tree_a.kind(a_id);

        for &b_id in &branches_b {
            if matching.contains_b(b_id) || tree_b.kind(b_id) != a_kind {
                continue;
            }
            let score = branch_similarity(a_id, b_id, matching, &mut leaves_a, &mut leaves_b);
            trace!(
                a = usize::from(a_id),
                b = usize::from(b_id),
                a_kind,
                score,
                "branch_phase: score"
            );
            if score >= config.branch_threshold {
                trace!(
                    a = usize::from(a_id),
                    b = usize::from(b_id),
                    "branch_phase: match"
                );
                matching.add(a_id, b_id);
                break;
            }
        }
    }
}

/// Matched leaf pairs shared by both subtrees, over the larger leaf count.
fn branch_similarity(
    a_id: NodeId,
    b_id: NodeId,
    matching: &Matching,
    leaves_a: &mut LeafSets<'_>,
    leaves_b: &mut LeafSets<'_>,
) -> f64 {
    let desc_a = leaves_a.get_or_compute(a_id);
    let desc_b = leaves_b.get_or_compute(b_id);

    let common = desc_a
        .iter()
        .filter(|&&a| matching.get_b(a).is_some_and(|b| desc_b.contains(&b)))
        .count();
    let max = desc_a.len().max(desc_b.len());

    if max == 0 {
        0.0
    } else {
        common as f64 / max as f64
    }
}

/// Phase 3: sibling recovery.
///
/// Pairs still-unmatched roots of the same kind, then walks tree A breadth
/// first: an unmatched node whose parent is matched takes the unmatched
/// child of the parent's partner with the same kind, arity and position,
/// or the only such candidate of that kind and arity.
fn recovery_phase(tree_a: &Tree, tree_b: &Tree, matching: &mut Matching) {
    let (root_a, root_b) = (tree_a.root(), tree_b.root());
    if !matching.contains_a(root_a)
        && !matching.contains_b(root_b)
        && tree_a.kind(root_a) == tree_b.kind(root_b)
    {
        trace!(
            a = usize::from(root_a),
            b = usize::from(root_b),
            "recovery: root kind match"
        );
        matching.add(root_a, root_b);
    }

    for a_id in tree_a.iter() {
        if matching.contains_a(a_id) {
            continue;
        }
        let Some(parent_b) = tree_a.parent(a_id).and_then(|p| matching.get_b(p)) else {
            continue;
        };

        let a_kind = tree_a.kind(a_id);
        let a_leaf = tree_a.is_leaf(a_id);
        let candidates: Vec<NodeId> = tree_b
            .children(parent_b)
            .filter(|&b_id| {
                !matching.contains_b(b_id)
                    && tree_b.kind(b_id) == a_kind
                    && tree_b.is_leaf(b_id) == a_leaf
            })
            .collect();

        let a_pos = tree_a.position(a_id);
        let best = candidates
            .iter()
            .copied()
            .find(|&b_id| tree_b.position(b_id) == a_pos)
            .or(match candidates.as_slice() {
                [only] => Some(*only),
                _ => None,
            });

        if let Some(b_id) = best {
            trace!(
                a = usize::from(a_id),
                b = usize::from(b_id),
                a_kind,
                pos = a_pos,
                "recovery: sibling match"
            );
            matching.add(a_id, b_id);
        }
    }
}
