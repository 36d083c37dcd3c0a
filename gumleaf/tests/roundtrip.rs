//! Roundtrip tests for JSON diff using datatest-stable.
//!
//! Each test case is a file in `tests/roundtrip-cases/` with format:
//! ```
//! <old JSON>
//! ===
//! <new JSON>
//! ```
//!
//! The test verifies: apply(old, diff(old, new)) == new, and that the
//! matching left behind by the diff is total.

use serde_json::Value;
use std::path::Path;

fn run_roundtrip_test(path: &Path) -> datatest_stable::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let parts: Vec<&str> = content.split("\n===\n").collect();

    if parts.len() != 2 {
        return Err(format!(
            "Test file must have exactly one '===' separator, found {} parts",
            parts.len()
        )
        .into());
    }

    let old: Value = serde_json::from_str(parts[0].trim())?;
    let new: Value = serde_json::from_str(parts[1].trim())?;

    let diff = gumleaf::diff_json(&old, &new).map_err(|e| format!("diff failed: {e}"))?;

    let tree_diff = diff.tree_diff();
    if !tree_diff
        .matching
        .is_total(&tree_diff.before, &tree_diff.after)
    {
        return Err(format!("matching is not total for {}", path.display()).into());
    }

    let result = gumleaf::apply_diff(&old, &diff).map_err(|e| format!("apply failed: {e}"))?;
    let expected = gumleaf::decode(&gumleaf::encode(&new))?;

    if result != expected {
        return Err(format!(
            "Roundtrip failed!\nOld: {old}\nNew: {new}\n\
             Result: {result}\nExpected: {expected}\nScript: {:?}",
            diff.script()
        )
        .into());
    }

    Ok(())
}

datatest_stable::harness! {
    { test = run_roundtrip_test, root = "tests/roundtrip-cases", pattern = r".*\.json$" },
}
