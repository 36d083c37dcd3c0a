//! Labeled trees back to JSON values.

use eucalypt::indextree::NodeId;
use eucalypt::{Scalar, Tree};
use serde_json::{Map, Number, Value};

use crate::JsonError;
use crate::encode::{ARRAY, BOOLEAN, INDEX, KEY, NULL, NUMBER, OBJECT, STRING};

/// Decode a tree produced by [`encode`](crate::encode) (or a replayed
/// diff of such a tree) back into a JSON value.
///
/// Array elements are taken in child order; the values of `index` nodes are
/// not consulted. Integral numbers that fit an `i64` decode as integers.
pub fn decode(tree: &Tree) -> Result<Value, JsonError> {
    decode_node(tree, tree.root)
}

fn decode_node(tree: &Tree, id: NodeId) -> Result<Value, JsonError> {
    let kind = tree.kind(id);
    match kind {
        OBJECT => {
            let mut map = Map::new();
            for key in tree.children(id) {
                expect_kind(tree, key, KEY, "in an object")?;
                let name = match tree.value(key) {
                    Some(Scalar::String(name)) => name.to_string(),
                    _ => return Err(missing_value(KEY)),
                };
                let entry = only_child(tree, key).ok_or_else(|| JsonError::KeyArity {
                    key: name.clone(),
                    children: tree.child_count(key),
                })?;
                map.insert(name, decode_node(tree, entry)?);
            }
            Ok(Value::Object(map))
        }
        ARRAY => {
            let mut items = Vec::new();
            for (i, index) in tree.children(id).enumerate() {
                expect_kind(tree, index, INDEX, "in an array")?;
                let element = only_child(tree, index).ok_or_else(|| JsonError::IndexArity {
                    index: i,
                    children: tree.child_count(index),
                })?;
                items.push(decode_node(tree, element)?);
            }
            Ok(Value::Array(items))
        }
        STRING => match tree.value(id) {
            Some(Scalar::String(s)) => Ok(Value::String(s.to_string())),
            _ => Err(missing_value(STRING)),
        },
        NUMBER => match tree.value(id) {
            Some(Scalar::Number(n)) => number(*n).ok_or_else(|| missing_value(NUMBER)),
            _ => Err(missing_value(NUMBER)),
        },
        BOOLEAN => match tree.value(id) {
            Some(Scalar::Bool(b)) => Ok(Value::Bool(*b)),
            _ => Err(missing_value(BOOLEAN)),
        },
        NULL => Ok(Value::Null),
        other => Err(JsonError::UnexpectedKind {
            kind: other.to_string(),
            context: "as a JSON value",
        }),
    }
}

fn number(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        return Some(Value::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number)
}

fn only_child(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let mut children = tree.children(id);
    match (children.next(), children.next()) {
        (Some(child), None) => Some(child),
        _ => None,
    }
}

fn expect_kind(
    tree: &Tree,
    id: NodeId,
    expected: &'static str,
    context: &'static str,
) -> Result<(), JsonError> {
    match tree.kind(id) {
        kind if kind == expected => Ok(()),
        kind => Err(JsonError::UnexpectedKind {
            kind: kind.to_string(),
            context,
        }),
    }
}

fn missing_value(kind: &str) -> JsonError {
    JsonError::MissingValue {
        kind: kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;
    use eucalypt::Label;
    use serde_json::json;

    #[test]
    fn test_decode_inverts_encode() {
        let value = json!({
            "name": "gumleaf",
            "tags": ["json", "diff"],
            "stars": 3,
            "ratio": 0.25,
            "nested": {"ok": true, "none": null},
            "empty": []
        });
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_negative_and_large_integers() {
        for value in [json!(-7), json!(0), json!(1_000_000_000_000i64)] {
            assert_eq!(decode(&encode(&value)).unwrap(), value);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let tree = Tree::new(Label::new("paragraph"));
        assert!(matches!(
            decode(&tree),
            Err(JsonError::UnexpectedKind { kind, .. }) if kind == "paragraph"
        ));
    }

    #[test]
    fn test_key_with_two_children_is_rejected() {
        let mut tree = Tree::new(Label::new(OBJECT));
        let key = tree.add_child(tree.root, Label::with_value(KEY, "k"));
        tree.add_child(key, Label::new(NULL));
        tree.add_child(key, Label::new(NULL));
        assert!(matches!(
            decode(&tree),
            Err(JsonError::KeyArity { children: 2, .. })
        ));
    }

    #[test]
    fn test_index_without_child_is_rejected() {
        let mut tree = Tree::new(Label::new(ARRAY));
        tree.add_child(tree.root, Label::with_value(INDEX, 0usize));
        assert!(matches!(
            decode(&tree),
            Err(JsonError::IndexArity {
                index: 0,
                children: 0,
            })
        ));
    }

    #[test]
    fn test_string_without_value_is_rejected() {
        let tree = Tree::new(Label::new(STRING));
        assert!(matches!(decode(&tree), Err(JsonError::MissingValue { .. })));
    }
}
