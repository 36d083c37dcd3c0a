//! Errors reported by a diff run.

/// Errors that abort a diff (or a replay) before any result is returned.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A threshold is outside its documented domain.
    #[error("invalid configuration: {name} = {value} (expected {expected})")]
    InvalidConfiguration {
        /// Name of the offending option
        name: &'static str,
        /// The rejected value
        value: f64,
        /// Human-readable domain
        expected: &'static str,
    },

    /// An input tree does not have the shape the algorithm requires.
    #[error("malformed tree: {reason}")]
    MalformedTree {
        /// What is wrong with the tree
        reason: String,
    },

    /// A bookkeeping check failed while generating or applying a script.
    ///
    /// This points at a bug in matching or alignment, never at bad input.
    #[error("internal invariant violated: {reason}")]
    InternalInvariantViolation {
        /// Which check failed
        reason: String,
    },

    /// The arena refused a structural mutation.
    #[error("internal invariant violated: arena rejected mutation: {0}")]
    Arena(#[from] indextree::NodeError),
}

impl DiffError {
    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        DiffError::InternalInvariantViolation {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DiffError::MalformedTree {
            reason: reason.into(),
        }
    }

    /// Whether this error indicates a bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DiffError::InternalInvariantViolation { .. } | DiffError::Arena(_)
        )
    }
}
