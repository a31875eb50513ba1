//! Add: assign a value at a path.
//!
//! The configured value is a template. Every variable stored for the event
//! whose name occurs in the template is substituted:
//!
//! - a template that is exactly a variable name yields the stored value
//!   itself (objects and arrays included);
//! - an occurrence inside an unescaped `( … )` group makes the group
//!   conditional: it is unwrapped when the variable is defined and removed
//!   entirely when it is not;
//! - any other occurrence is replaced by the value's text.
//!
//! Substitution is plain substring search. A variable named `$id` also
//! rewrites the `$id` inside `$identifier`; longer names are substituted
//! first to limit that.

use super::{render, resolve_variable};
use crate::error::Result;
use crate::path::{self, Path};
use crate::pipeline::transformer::Transformer;
use crate::storage::SharedStorage;
use crate::types::{OperationKind, PathSpec};
use serde_json::Value;

/// Add transformer
#[derive(Debug)]
pub struct Add {
    path: Path,
    template: String,
    storage: SharedStorage,
}

impl Add {
    pub fn new(spec: &PathSpec, storage: SharedStorage) -> Result<Self> {
        let path = Path::parse(&spec.key, &spec.separator);
        path.ensure_encodable()?;

        Ok(Self {
            path,
            template: spec.value.clone(),
            storage,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the template against the variables stored for `event_id`.
    pub fn compose_value(&self, event_id: &str) -> Value {
        let mut names = self.storage.list_keys(event_id);
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let variables: Vec<(String, Option<Value>)> = names
            .into_iter()
            .map(|name| {
                let value = resolve_variable(&self.storage, event_id, &name);
                (name, value)
            })
            .collect();

        interpolate(&self.template, &variables)
    }
}

impl Transformer for Add {
    fn operation(&self) -> OperationKind {
        OperationKind::Add
    }

    fn transform(&self, event_id: &str, tree: &Value) -> Result<Value> {
        let value = self.compose_value(event_id);
        Ok(path::assign(tree.clone(), &self.path, value))
    }
}

/// Substitute `variables` into `template`, in the given order.
///
/// `None` marks an undefined variable.
pub fn interpolate(template: &str, variables: &[(String, Option<Value>)]) -> Value {
    let mut result = template.to_string();

    for (name, stored) in variables {
        if name.is_empty() {
            continue;
        }

        if result == *name {
            return stored.clone().unwrap_or_else(|| Value::String(name.clone()));
        }

        let rendered = stored.as_ref().map(render).unwrap_or_else(|| name.clone());

        // text before `cursor` is final for this variable
        let mut cursor = 0;
        while let Some(offset) = result[cursor..].find(name.as_str()) {
            let at = cursor + offset;
            let end = at + name.len();

            match conditional_group(&result, at, end) {
                None => {
                    result.replace_range(at..end, &rendered);
                    cursor = at + rendered.len();
                }
                Some((open, close)) if stored.is_some() => {
                    let unwrapped = format!(
                        "{}{}{}",
                        &result[open + 1..at],
                        rendered,
                        &result[end..close]
                    );
                    result.replace_range(open..=close, &unwrapped);
                    cursor = open + unwrapped.len();
                }
                Some((open, close)) => {
                    result.replace_range(open..=close, "");
                    cursor = open;
                }
            }
        }
    }

    Value::String(result)
}

/// Locate the `( … )` group around the occurrence `at..end`, if any.
///
/// The nearest `(` at or before the occurrence and the nearest `)` at or
/// after it form the group; a backslash before either bracket disables it.
fn conditional_group(text: &str, at: usize, end: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let open = bytes[..=at].iter().rposition(|&b| b == b'(')?;
    let close = at + bytes[at..].iter().position(|&b| b == b')')?;

    let escaped = |index: usize| index > 0 && bytes[index - 1] == b'\\';
    if escaped(open) || escaped(close) {
        return None;
    }
    if open < at && close >= end {
        Some((open, close))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use serde_json::json;

    fn vars(pairs: &[(&str, Option<Value>)]) -> Vec<(String, Option<Value>)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn add(key: &str, value: &str, storage: SharedStorage) -> Add {
        Add::new(&PathSpec::new(key, value), storage).unwrap()
    }

    #[test]
    fn test_literal_value() {
        let storage = Storage::shared();
        let tree = json!({"foo": "bar"});

        let result = add("message", "Hello World!", storage).transform("evt", &tree).unwrap();
        assert_eq!(result, json!({"foo": "bar", "message": "Hello World!"}));
    }

    #[test]
    fn test_overwrite_and_create_intermediate() {
        let storage = Storage::shared();
        let tree = json!({"foo": "bar", "blah": [{"bleh": "huh?"}]});

        let result = add("blah[2].foo", "42", storage.clone()).transform("evt", &tree).unwrap();
        let result = add("foo", "baz", storage).transform("evt", &result).unwrap();
        assert_eq!(
            result,
            json!({"foo": "baz", "blah": [{"bleh": "huh?"}, null, {"foo": "42"}]})
        );
    }

    #[test]
    fn test_exact_variable_is_typed() {
        let storage = Storage::shared();
        storage.set("evt", "$body", json!([{"key1": "value1"}]));

        let result = add("body", "$body", storage).transform("evt", &Value::Null).unwrap();
        assert_eq!(result, json!({"body": [{"key1": "value1"}]}));
    }

    #[test]
    fn test_variables_scoped_to_event() {
        let storage = Storage::shared();
        storage.set("other", "$v", json!("leak"));

        let result = add("id", "$v", storage).transform("evt", &json!({})).unwrap();
        assert_eq!(result, json!({"id": "$v"}));
    }

    #[test]
    fn test_textual_interpolation() {
        let value = interpolate(
            "Hello, $name! You are $age.",
            &vars(&[("$name", Some(json!("John"))), ("$age", Some(json!(42)))]),
        );
        assert_eq!(value, json!("Hello, John! You are 42."));
    }

    #[test]
    fn test_conditional_group_defined() {
        let value = interpolate(
            "$name(.$surname)",
            &vars(&[("$surname", Some(json!("Doe"))), ("$name", Some(json!("John")))]),
        );
        assert_eq!(value, json!("John.Doe"));
    }

    #[test]
    fn test_conditional_group_undefined() {
        let value = interpolate(
            "$name(.$surname)",
            &vars(&[("$surname", None), ("$name", Some(json!("John")))]),
        );
        assert_eq!(value, json!("John"));
    }

    #[test]
    fn test_conditional_groups_with_repeated_variable() {
        let value = interpolate(
            "($day)(/$month)(/$year)/$year",
            &vars(&[
                ("$month", Some(json!("01"))),
                ("$year", Some(json!("1970"))),
                ("$day", Some(json!("01"))),
            ]),
        );
        assert_eq!(value, json!("01/01/1970/1970"));
    }

    #[test]
    fn test_escaped_brackets_are_literal() {
        let value = interpolate("\\($v)", &vars(&[("$v", Some(json!("x")))]));
        assert_eq!(value, json!("\\(x)"));
    }

    #[test]
    fn test_undefined_variable_left_in_place() {
        let value = interpolate("id-$v", &vars(&[("$v", None)]));
        assert_eq!(value, json!("id-$v"));
    }

    #[test]
    fn test_substring_names_are_substituted() {
        // `$id` is also found inside `$identifier`
        let value = interpolate("$identifier", &vars(&[("$id", Some(json!("7")))]));
        assert_eq!(value, json!("7entifier"));
    }

    #[test]
    fn test_longest_name_wins() {
        let storage = Storage::shared();
        storage.set("evt", "$id", json!("short"));
        storage.set("evt", "$identifier", json!("long"));

        let result = add("out", "$identifier/$id", storage).transform("evt", &json!({})).unwrap();
        assert_eq!(result, json!({"out": "long/short"}));
    }

    #[test]
    fn test_rejects_oversized_index() {
        for key in ["a[18446744073709551615]", "a[1000000000000].b"] {
            let err = Add::new(&PathSpec::new(key, "x"), Storage::shared()).unwrap_err();
            assert!(err.is_configuration(), "{}", key);
        }
    }

    #[test]
    fn test_idempotent_literal_add() {
        let storage = Storage::shared();
        let op = add("object.slice[1]", "sup", storage);
        let tree = json!({"object": {"message": "hey"}});

        let once = op.transform("evt", &tree).unwrap();
        let twice = op.transform("evt", &once).unwrap();
        assert_eq!(once, twice);
    }
}
