//! Error types for JSON diffing.

use eucalypt::DiffError;

/// Errors from diffing, decoding or replaying JSON documents.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// The tree diff itself failed.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// A node kind that has no JSON meaning at this place.
    #[error("unexpected `{kind}` node {context}")]
    UnexpectedKind {
        /// The kind found
        kind: String,
        /// Where it was found
        context: &'static str,
    },

    /// A node whose kind needs a value of a specific type lacks it.
    #[error("`{kind}` node has no usable value")]
    MissingValue {
        /// The node's kind
        kind: String,
    },

    /// An object entry without exactly one value.
    #[error("key `{key}` has {children} children, expected 1")]
    KeyArity {
        /// The key name
        key: String,
        /// How many children it has
        children: usize,
    },

    /// An array slot without exactly one element.
    #[error("index {index} has {children} children, expected 1")]
    IndexArity {
        /// Position of the slot in the array
        index: usize,
        /// How many children it has
        children: usize,
    },

    /// The document handed to `apply` is not the one the diff was made from.
    #[error("document does not match the one the diff was computed from")]
    Replay,
}
