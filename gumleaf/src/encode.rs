//! JSON values to labeled trees.

use eucalypt::indextree::NodeId;
use eucalypt::{Label, Tree};
use serde_json::Value;

/// Kind of the root of an encoded object.
pub const OBJECT: &str = "object";
/// Kind of the root of an encoded array.
pub const ARRAY: &str = "array";
/// An object entry; its value is the key name and its only child the entry value.
pub const KEY: &str = "key";
/// An array slot; its value is the numeric index and its only child the element.
pub const INDEX: &str = "index";
/// A string leaf.
pub const STRING: &str = "string";
/// A number leaf.
pub const NUMBER: &str = "number";
/// A boolean leaf.
pub const BOOLEAN: &str = "boolean";
/// A null leaf, without a value.
pub const NULL: &str = "null";

/// Encode a JSON value as a labeled tree.
///
/// Objects become `object` nodes with one `key` child per entry (in map
/// order), arrays become `array` nodes with one `index` child per element.
/// Numbers are stored as `f64`.
pub fn encode(value: &Value) -> Tree {
    let mut tree = Tree::new(label_for(value));
    let root = tree.root;
    encode_children(&mut tree, root, value);
    tree
}

fn encode_children(tree: &mut Tree, parent: NodeId, value: &Value) {
    match value {
        Value::Object(map) => {
            for (name, entry) in map {
                let key = tree.add_child(parent, Label::with_value(KEY, name.as_str()));
                encode_entry(tree, key, entry);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let index = tree.add_child(parent, Label::with_value(INDEX, i));
                encode_entry(tree, index, item);
            }
        }
        _ => {}
    }
}

fn encode_entry(tree: &mut Tree, parent: NodeId, value: &Value) {
    let node = tree.add_child(parent, label_for(value));
    encode_children(tree, node, value);
}

fn label_for(value: &Value) -> Label {
    match value {
        Value::Null => Label::new(NULL),
        Value::Bool(b) => Label::with_value(BOOLEAN, *b),
        Value::Number(n) => Label::with_value(NUMBER, n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Label::with_value(STRING, s.as_str()),
        Value::Array(_) => Label::new(ARRAY),
        Value::Object(_) => Label::new(OBJECT),
    }
}
