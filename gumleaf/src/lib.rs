//! JSON diffing based on eucalypt.
//!
//! gumleaf provides:
//! - **Encoding**: `serde_json::Value` to labeled trees (`object`, `array`,
//!   `key`, `index`, `string`, `number`, `boolean`, `null`)
//! - **Decoding**: labeled trees back to JSON
//! - **Diffing**: edit scripts between two documents, replayable on the old one
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//!
//! let old = json!({"name": "koala", "tags": ["gum", "leaf"]});
//! let new = json!({"name": "koala", "tags": ["gum", "leaf", "tree"]});
//!
//! let diff = gumleaf::diff_json(&old, &new).unwrap();
//! assert_eq!(diff.script().len(), 2); // the new index and its string
//!
//! let patched = gumleaf::apply_diff(&old, &diff).unwrap();
//! assert_eq!(patched, new);
//! ```

#![warn(missing_docs)]

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

mod decode;
mod encode;
mod error;

pub use decode::decode;
pub use encode::{ARRAY, BOOLEAN, INDEX, KEY, NULL, NUMBER, OBJECT, STRING, encode};
pub use error::JsonError;

pub use eucalypt::{Diff, EditOp, MatchingConfig};

use eucalypt::Tree;
use serde_json::Value;

/// A diff between two JSON documents.
#[derive(Debug, Clone)]
pub struct JsonDiff {
    diff: Diff,
    old: Tree,
}

impl JsonDiff {
    /// The edit script, in application order.
    pub fn script(&self) -> &[EditOp] {
        &self.diff.script
    }

    /// Whether the two documents had unmatched roots.
    pub fn used_synthetic_roots(&self) -> bool {
        self.diff.used_synthetic_roots
    }

    /// The underlying tree diff.
    pub fn tree_diff(&self) -> &Diff {
        &self.diff
    }

    /// Replay the script on `old`, which must be the document the diff was
    /// computed from.
    pub fn apply(&self, old: &Value) -> Result<Value, JsonError> {
        let tree = encode(old);
        if !tree.is_isomorphic(&self.old) {
            return Err(JsonError::Replay);
        }
        let replayed = tree.replay(&self.diff)?;
        trace!(nodes = replayed.node_count(), "replayed");
        decode(&replayed)
    }
}

/// Diff two JSON documents with the default matching configuration.
pub fn diff_json(old: &Value, new: &Value) -> Result<JsonDiff, JsonError> {
    diff_json_with(old, new, &MatchingConfig::default())
}

/// Diff two JSON documents.
pub fn diff_json_with(
    old: &Value,
    new: &Value,
    config: &MatchingConfig,
) -> Result<JsonDiff, JsonError> {
    let old_tree = encode(old);
    let new_tree = encode(new);
    let diff = eucalypt::diff_trees(&old_tree, &new_tree, config)?;
    debug!(
        old_nodes = old_tree.node_count(),
        new_nodes = new_tree.node_count(),
        ops = diff.script.len(),
        "diff_json"
    );
    Ok(JsonDiff {
        diff,
        old: old_tree,
    })
}

/// Apply `diff` to `old`, producing the new document.
pub fn apply_diff(old: &Value, diff: &JsonDiff) -> Result<Value, JsonError> {
    diff.apply(old)
}
