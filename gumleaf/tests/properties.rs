//! Behavioral properties of JSON diffs.

use gumleaf::{EditOp, JsonDiff, apply_diff, diff_json, encode};
use serde_json::{Value, json};

fn roundtrip(old: &Value, new: &Value) -> JsonDiff {
    let diff = diff_json(old, new).unwrap();
    let patched = apply_diff(old, &diff).unwrap();
    assert_eq!(&patched, new, "script: {:?}", diff.script());
    diff
}

fn count(diff: &JsonDiff, pred: impl Fn(&EditOp) -> bool) -> usize {
    diff.script().iter().filter(|op| pred(op)).count()
}

fn documents() -> Vec<(Value, Value)> {
    vec![
        (json!({"a": 1}), json!({"a": 1, "b": [true, false]})),
        (json!([1, 2, 3, 4, 5]), json!([5, 4, 3, 2, 1])),
        (
            json!({"list": ["x", "y", "z"]}),
            json!({"list": ["z"], "other": ["x", "y"]}),
        ),
        (
            json!({"a": {"b": {"c": "deep"}}}),
            json!({"c": {"b": {"a": "deep"}}}),
        ),
        (json!([[1, 2], [3, 4]]), json!([[3, 4], [1, 2], []])),
        (json!("text"), json!({"text": "text"})),
        (json!(null), json!([null])),
        (
            json!({"k": [{"id": 1}, {"id": 2}]}),
            json!({"k": [{"id": 2, "new": true}]}),
        ),
    ]
}

#[test]
fn test_identity_yields_empty_script_and_positional_matching() {
    for (old, _) in documents() {
        let diff = roundtrip(&old, &old);
        assert!(diff.script().is_empty(), "{old}: {:?}", diff.script());

        let tree = diff.tree_diff();
        for (a, b) in tree.before.iter().zip(tree.after.iter()) {
            assert!(tree.matching.has_pair(a, b), "{old}");
        }
    }
}

#[test]
fn test_scripts_roundtrip_both_ways() {
    for (old, new) in documents() {
        roundtrip(&old, &new);
        roundtrip(&new, &old);
    }
}

#[test]
fn test_final_matching_is_total() {
    for (old, new) in documents() {
        let diff = roundtrip(&old, &new);
        let tree = diff.tree_diff();
        assert!(
            tree.matching.is_total(&tree.before, &tree.after),
            "{old} -> {new}"
        );
        assert!(tree.before.is_isomorphic(&tree.after));
    }
}

#[test]
fn test_single_value_change_is_one_update() {
    let old = json!({"a": 1, "b": 2, "c": 3});
    let new = json!({"a": 1, "b": 2, "c": 4});
    let diff = roundtrip(&old, &new);

    let tree = encode(&old);
    let key_c = tree.children(tree.root).nth(2).unwrap();
    let value_c = tree.children(key_c).next().unwrap();
    assert_eq!(
        diff.script(),
        [EditOp::Update {
            node: value_c,
            value: Some(4.0.into()),
        }]
    );
}

#[test]
fn test_pure_append_is_inserts_only() {
    let diff = roundtrip(&json!(["a", "b"]), &json!(["a", "b", "c", "d"]));
    assert_eq!(diff.script().len(), 4);
    assert_eq!(count(&diff, |op| matches!(op, EditOp::Insert { .. })), 4);

    let index_positions: Vec<usize> = diff
        .script()
        .iter()
        .filter_map(|op| match op {
            EditOp::Insert {
                label, position, ..
            } if label.kind == gumleaf::INDEX => Some(*position),
            _ => None,
        })
        .collect();
    assert_eq!(index_positions, [2, 3]);
}

#[test]
fn test_swap_is_one_move_plus_index_updates() {
    let diff = roundtrip(&json!(["a", "b"]), &json!(["b", "a"]));
    assert_eq!(count(&diff, |op| matches!(op, EditOp::Move { .. })), 1);
    assert_eq!(count(&diff, |op| matches!(op, EditOp::Update { .. })), 2);
    assert_eq!(diff.script().len(), 3);
}

#[test]
fn test_type_change_uses_synthetic_roots() {
    let old = json!(["a", "b"]);
    let diff = roundtrip(&old, &json!({"x": "a", "y": "b"}));
    assert!(diff.used_synthetic_roots());
    assert_eq!(count(&diff, |op| matches!(op, EditOp::Update { .. })), 0);

    let old_root = encode(&old).root;
    assert!(diff.script().contains(&EditOp::Delete { node: old_root }));
}

#[test]
fn test_deletes_are_leaf_first() {
    for (old, new) in documents() {
        let diff = roundtrip(&old, &new);
        let original = encode(&old);
        let tree = diff.tree_diff();

        let deleted: Vec<_> = diff
            .script()
            .iter()
            .enumerate()
            .filter_map(|(i, op)| match op {
                EditOp::Delete { node } => Some((i, *node)),
                _ => None,
            })
            .collect();

        for &(i, node) in &deleted {
            // detached, and nothing was attached to it afterwards
            assert!(tree.before.parent(node).is_none());
            assert!(tree.before.is_leaf(node));

            // deleted children went first
            if original.arena.get(node).is_some() {
                for child in original.children(node) {
                    if let Some(&(j, _)) = deleted.iter().find(|&&(_, n)| n == child) {
                        assert!(j < i, "{old} -> {new}: child deleted after parent");
                    }
                }
            }
        }
    }
}
