//! Root normalization: make sure generation starts from a matched root pair.

use crate::debug;

use crate::error::DiffError;
use crate::matching::Matching;
use crate::tree::Tree;

/// Wrap both trees in synthetic roots unless their roots are matched to
/// each other. Returns whether the wrappers were added.
///
/// The wrapper pair is added to `matching`; the old roots keep whatever
/// partners they had.
pub fn normalize_roots(
    before: &mut Tree,
    after: &mut Tree,
    matching: &mut Matching,
) -> Result<bool, DiffError> {
    if matching.has_pair(before.root, after.root) {
        return Ok(false);
    }

    let x = before.wrap_in_synthetic_root()?;
    let y = after.wrap_in_synthetic_root()?;
    debug!(
        a = usize::from(x),
        b = usize::from(y),
        "roots not matched, wrapped in synthetic roots"
    );
    matching.add(x, y);
    Ok(true)
}
