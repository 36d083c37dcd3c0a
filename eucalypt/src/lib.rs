//! # Eucalypt
//!
//! Change detection for ordered labeled trees, after Chawathe et al.,
//! "Change Detection in Hierarchically Structured Information" (SIGMOD 1996).
//!
//! Named for the gum trees whose leaves are the only thing a koala eats.
//!
//! ## Algorithm Overview
//!
//! 1. **Matching**: pair leaves by kind and value similarity, then internal
//!    nodes by the share of matched leaves they have in common, then recover
//!    leftover siblings under matched parents
//! 2. **Root normalization**: wrap both trees in synthetic roots when their
//!    roots did not match
//! 3. **Edit script generation**: one breadth-first walk of the new tree
//!    emits UPDATE, INSERT and MOVE operations, aligning children with an LCS
//!    as it goes; a post-order walk of the old tree emits DELETE operations
//!
//! Every operation is applied to a working copy of the old tree as soon as it
//! is emitted, so each script can be replayed in order against the old tree.
//!
//! ## Usage
//!
//! ```
//! use eucalypt::{Label, MatchingConfig, Tree, diff_trees};
//!
//! let mut before = Tree::new(Label::new("array"));
//! before.add_child(before.root, Label::with_value("string", "a"));
//!
//! let mut after = Tree::new(Label::new("array"));
//! after.add_child(after.root, Label::with_value("string", "a"));
//! after.add_child(after.root, Label::with_value("string", "b"));
//!
//! let diff = diff_trees(&before, &after, &MatchingConfig::default()).unwrap();
//! assert_eq!(diff.script.len(), 1);
//!
//! let replayed = before.replay(&diff).unwrap();
//! assert!(replayed.is_isomorphic(&after));
//! ```

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

pub use indextree;

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

mod align;
mod apply;
mod chawathe;
mod error;
/// Node matching
pub mod matching;
mod position;
mod roots;
/// Scalar similarity
pub mod similarity;
/// Tree representation
pub mod tree;

pub use chawathe::{EditOp, generate_edit_script};
pub use error::DiffError;
pub use matching::{Matching, MatchingConfig, compute_matching};
pub use roots::normalize_roots;
pub use similarity::{DiceCoefficient, StringSimilarity};
pub use tree::{Label, SYNTHETIC_ROOT_KIND, Scalar, Tree};

/// The result of diffing two trees.
#[derive(Debug, Clone)]
pub struct Diff {
    /// Operations that turn the old tree into the new one, in order.
    pub script: Vec<EditOp>,
    /// Total matching between `before` and `after`.
    pub matching: Matching,
    /// Whether both trees were wrapped in synthetic roots.
    pub used_synthetic_roots: bool,
    /// The old tree with the script applied. Script node ids refer to it.
    pub before: Tree,
    /// The new tree, wrapped when `used_synthetic_roots` is set.
    pub after: Tree,
}

/// Compute a diff between two trees.
///
/// Uses [`DiceCoefficient`] to compare string values.
///
/// # Example
///
/// ```
/// use eucalypt::{EditOp, Label, MatchingConfig, Tree, diff_trees};
///
/// let mut before = Tree::new(Label::new("object"));
/// let key = before.add_child(before.root, Label::with_value("key", "name"));
/// before.add_child(key, Label::with_value("string", "koala"));
///
/// let mut after = Tree::new(Label::new("object"));
/// let key = after.add_child(after.root, Label::with_value("key", "name"));
/// after.add_child(key, Label::with_value("string", "koalas"));
///
/// let diff = diff_trees(&before, &after, &MatchingConfig::default()).unwrap();
/// assert!(matches!(diff.script[..], [EditOp::Update { .. }]));
/// ```
pub fn diff_trees(before: &Tree, after: &Tree, config: &MatchingConfig) -> Result<Diff, DiffError> {
    diff_trees_with(before, after, config, &DiceCoefficient)
}

/// Like [`diff_trees`], with a caller-provided string similarity.
pub fn diff_trees_with<S>(
    before: &Tree,
    after: &Tree,
    config: &MatchingConfig,
    strings: &S,
) -> Result<Diff, DiffError>
where
    S: StringSimilarity + ?Sized,
{
    config.validate()?;
    before.validate()?;
    after.validate()?;

    let matching = compute_matching(before, after, config, strings);

    let mut before = before.clone();
    let mut after = after.clone();
    let mut matching = matching;
    let used_synthetic_roots = normalize_roots(&mut before, &mut after, &mut matching)?;

    let (script, matching) = generate_edit_script(&mut before, &after, matching)?;
    debug!(
        ops = script.len(),
        matched = matching.len(),
        used_synthetic_roots,
        "diff_trees done"
    );

    Ok(Diff {
        script,
        matching,
        used_synthetic_roots,
        before,
        after,
    })
}
