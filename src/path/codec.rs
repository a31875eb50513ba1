//! Encoding, merging, reading and extracting values at a [`Path`].
//!
//! All traversals are total: a missing member, an out-of-range index or a
//! type mismatch yields `None` instead of an error.

use super::{Path, Step};
use serde_json::{Map, Value};

/// Build the minimal tree whose leaf at `path` is `value`.
///
/// Index steps produce arrays of length `N + 1` padded with `Null`.
pub fn encode(path: &Path, value: Value) -> Value {
    path.steps()
        .iter()
        .rev()
        .fold(value, |inner, step| match step {
            Step::Key(key) => {
                let mut map = Map::new();
                map.insert(key.clone(), inner);
                Value::Object(map)
            }
            Step::Index(index) => {
                let mut items = vec![Value::Null; index + 1];
                items[*index] = inner;
                Value::Array(items)
            }
        })
}

/// Deep-merge `appendix` into `source`.
///
/// - scalars and `Null` replace the source;
/// - arrays merge slot by slot when the source is an array, otherwise win
///   outright; a `Null` appendix slot is padding and keeps the source slot;
/// - objects merge member by member, a non-object source counts as empty;
///   the `""` member merges its value into the current level.
pub fn merge(source: Value, appendix: Value) -> Value {
    match appendix {
        Value::Array(items) => match source {
            Value::Array(existing) => Value::Array(merge_arrays(existing, items)),
            _ => Value::Array(items),
        },
        Value::Object(members) => {
            let mut current = match source {
                Value::Object(map) => Value::Object(map),
                _ => Value::Object(Map::new()),
            };
            for (key, value) in members {
                if key.is_empty() {
                    current = merge(current, value);
                    continue;
                }
                if !current.is_object() {
                    current = Value::Object(Map::new());
                }
                if let Value::Object(map) = &mut current {
                    let previous = map.remove(&key).unwrap_or(Value::Null);
                    map.insert(key, merge(previous, value));
                }
            }
            current
        }
        scalar => scalar,
    }
}

fn merge_arrays(existing: Vec<Value>, appendix: Vec<Value>) -> Vec<Value> {
    let len = existing.len().max(appendix.len());
    let mut existing = existing.into_iter();
    let mut appendix = appendix.into_iter();

    (0..len)
        .map(|_| {
            let source = existing.next().unwrap_or(Value::Null);
            match appendix.next() {
                None | Some(Value::Null) => source,
                Some(value) => merge(source, value),
            }
        })
        .collect()
}

/// Read the value at `path`, or `None` when any step is missing.
pub fn read_at<'a>(source: &'a Value, path: &Path) -> Option<&'a Value> {
    path.steps()
        .iter()
        .try_fold(source, |node, step| match step {
            Step::Key(key) => node.as_object()?.get(key),
            Step::Index(index) => node.as_array()?.get(*index),
        })
}

/// Mutable counterpart of [`read_at`].
pub fn value_at_mut<'a>(source: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    path.steps()
        .iter()
        .try_fold(source, |node, step| match step {
            Step::Key(key) => node.as_object_mut()?.get_mut(key),
            Step::Index(index) => node.as_array_mut()?.get_mut(*index),
        })
}

/// Remove the value at `path` from a copy of `source`.
///
/// Returns the remaining tree and the removed value. Array leaves are
/// removed from their array rather than nulled; extracting the root leaves
/// `Null` behind.
pub fn extract_at(source: &Value, path: &Path) -> (Value, Option<Value>) {
    let mut remaining = source.clone();
    let removed = take_at(&mut remaining, path.steps());
    (remaining, removed)
}

/// In-place variant of [`extract_at`].
pub fn take_at(node: &mut Value, steps: &[Step]) -> Option<Value> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(std::mem::take(node));
    };

    match step {
        Step::Key(key) => {
            let map = node.as_object_mut()?;
            if rest.is_empty() {
                map.remove(key)
            } else {
                take_at(map.get_mut(key)?, rest)
            }
        }
        Step::Index(index) => {
            let items = node.as_array_mut()?;
            if *index >= items.len() {
                return None;
            }
            if rest.is_empty() {
                Some(items.remove(*index))
            } else {
                take_at(&mut items[*index], rest)
            }
        }
    }
}

/// Encode `value` at `path` and merge it into `tree`.
pub fn assign(tree: Value, path: &Path, value: Value) -> Value {
    merge(tree, encode(path, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(expr: &str) -> Path {
        Path::parse(expr, ".")
    }

    #[test]
    fn test_encode_nested_object() {
        assert_eq!(
            encode(&p("object.message"), json!("hey")),
            json!({"object": {"message": "hey"}})
        );
    }

    #[test]
    fn test_encode_indexed() {
        assert_eq!(
            encode(&p("blah[2].foo"), json!("42")),
            json!({"blah": [null, null, {"foo": "42"}]})
        );
        assert_eq!(encode(&p("[1]"), json!(true)), json!([null, true]));
    }

    #[test]
    fn test_encode_root() {
        assert_eq!(encode(&p("."), json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_merge_scalar_replaces() {
        assert_eq!(merge(json!({"a": 1}), json!("x")), json!("x"));
        assert_eq!(merge(json!({"a": 1}), Value::Null), Value::Null);
        assert_eq!(merge(json!([1, 2]), json!(false)), json!(false));
    }

    #[test]
    fn test_merge_array_into_non_array() {
        assert_eq!(merge(json!({"a": 1}), json!([1])), json!([1]));
        assert_eq!(merge(Value::Null, json!([null, "sup"])), json!([null, "sup"]));
    }

    #[test]
    fn test_merge_arrays_slotwise() {
        let merged = merge(
            json!([{"bleh": "huh?"}]),
            json!([null, null, {"foo": "42"}]),
        );
        assert_eq!(merged, json!([{"bleh": "huh?"}, null, {"foo": "42"}]));

        let merged = merge(json!([{"a": 1}, 2]), json!([{"b": 2}]));
        assert_eq!(merged, json!([{"a": 1, "b": 2}, 2]));
    }

    #[test]
    fn test_merge_object_into_scalar() {
        assert_eq!(merge(json!("str"), json!({"a": 1})), json!({"a": 1}));
        assert_eq!(merge(Value::Null, json!({"a": {"b": 1}})), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_merge_objects_deep() {
        let merged = merge(
            json!({"object": {"message": "hey"}, "foo": "bar"}),
            json!({"object": {"slice": [null, "sup"]}}),
        );
        assert_eq!(
            merged,
            json!({"object": {"message": "hey", "slice": [null, "sup"]}, "foo": "bar"})
        );
    }

    #[test]
    fn test_merge_empty_key_merges_at_current_level() {
        let merged = merge(json!({"a": 1}), json!({"": {"b": 2}}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));

        let merged = merge(json!({"a": 1}), json!({"": [1, 2]}));
        assert_eq!(merged, json!([1, 2]));
    }

    #[test]
    fn test_read_at() {
        let tree = json!({"blah": [{"bleh": "huh?"}], "foo": "bar"});
        assert_eq!(read_at(&tree, &p("foo")), Some(&json!("bar")));
        assert_eq!(read_at(&tree, &p("blah[0].bleh")), Some(&json!("huh?")));
        assert_eq!(read_at(&tree, &p(".")), Some(&tree));
    }

    #[test]
    fn test_read_at_absent() {
        let tree = json!({"blah": [{"bleh": "huh?"}], "foo": "bar"});
        assert_eq!(read_at(&tree, &p("missing")), None);
        assert_eq!(read_at(&tree, &p("blah[3]")), None);
        assert_eq!(read_at(&tree, &p("foo.deeper")), None);
        assert_eq!(read_at(&tree, &p("foo[0]")), None);
    }

    #[test]
    fn test_value_at_mut_replaces_in_place() {
        let mut tree = json!({"list": ["a", "null"]});
        if let Some(slot) = value_at_mut(&mut tree, &p("list[1]")) {
            *slot = Value::Null;
        }
        assert_eq!(tree, json!({"list": ["a", null]}));
        assert!(value_at_mut(&mut tree, &p("list[5]")).is_none());
    }

    #[test]
    fn test_extract_at_object_member() {
        let tree = json!({"key1": "value1", "object": {"key2": "value2"}});
        let (remaining, removed) = extract_at(&tree, &p("object.key2"));

        assert_eq!(removed, Some(json!("value2")));
        assert_eq!(remaining, json!({"key1": "value1", "object": {}}));
        // source untouched
        assert_eq!(tree["object"]["key2"], json!("value2"));
    }

    #[test]
    fn test_extract_at_compacts_arrays() {
        let tree = json!({"list": ["a", "b", "c"]});
        let (remaining, removed) = extract_at(&tree, &p("list[1]"));

        assert_eq!(removed, Some(json!("b")));
        assert_eq!(remaining, json!({"list": ["a", "c"]}));
    }

    #[test]
    fn test_extract_at_inside_array_element() {
        let tree = json!({"list": [{"id": 1, "name": "x"}]});
        let (remaining, removed) = extract_at(&tree, &p("list[0].name"));

        assert_eq!(removed, Some(json!("x")));
        assert_eq!(remaining, json!({"list": [{"id": 1}]}));
    }

    #[test]
    fn test_extract_at_root() {
        let tree = json!([{"key1": "value1"}]);
        let (remaining, removed) = extract_at(&tree, &p("."));

        assert_eq!(removed, Some(tree.clone()));
        assert_eq!(remaining, Value::Null);
    }

    #[test]
    fn test_extract_at_absent() {
        let tree = json!({"a": {"b": 1}});
        let (remaining, removed) = extract_at(&tree, &p("a.c"));
        assert_eq!(removed, None);
        assert_eq!(remaining, tree);

        let (_, removed) = extract_at(&tree, &p("a[0]"));
        assert_eq!(removed, None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn scalar() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i32>().prop_map(|n| json!(n)),
                "[a-z]{0,8}".prop_map(Value::String),
            ]
        }

        fn segment() -> impl Strategy<Value = String> {
            "[a-z]{1,6}"
        }

        proptest! {
            #[test]
            fn test_disjoint_merges_commute(
                first in segment(),
                second in segment(),
                tail_a in prop::collection::vec(segment(), 0..3),
                tail_b in prop::collection::vec(segment(), 0..3),
                a in scalar(),
                b in scalar(),
            ) {
                prop_assume!(first != second);

                let path_a = Path::parse(&std::iter::once(first).chain(tail_a).collect::<Vec<_>>().join("."), ".");
                let path_b = Path::parse(&std::iter::once(second).chain(tail_b).collect::<Vec<_>>().join("."), ".");
                let base = json!({"untouched": true});

                let ab = merge(merge(base.clone(), encode(&path_a, a.clone())), encode(&path_b, b.clone()));
                let ba = merge(merge(base, encode(&path_b, b)), encode(&path_a, a));

                prop_assert_eq!(ab, ba);
            }

            #[test]
            fn test_encoded_value_reads_back(
                segments in prop::collection::vec(segment(), 1..4),
                index in prop::option::of(0usize..4),
                value in scalar(),
            ) {
                let mut expr = segments.join(".");
                if let Some(i) = index {
                    expr.push_str(&format!("[{}]", i));
                }
                let path = Path::parse(&expr, ".");
                let tree = encode(&path, value.clone());

                prop_assert_eq!(read_at(&tree, &path), Some(&value));
            }

            #[test]
            fn test_extract_then_absent_for_object_paths(
                segments in prop::collection::vec(segment(), 1..4),
                value in scalar(),
            ) {
                let path = Path::parse(&segments.join("."), ".");
                let tree = encode(&path, value.clone());

                let (remaining, removed) = extract_at(&tree, &path);
                prop_assert_eq!(removed, Some(value));
                prop_assert_eq!(read_at(&remaining, &path), None);
            }
        }
    }
}
