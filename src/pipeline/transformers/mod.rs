//! Built-in transformer implementations.

pub mod add;
pub mod delete;
pub mod parse;
pub mod shift;
pub mod store;

pub use add::{interpolate, Add};
pub use delete::Delete;
pub use parse::{Parse, ParseFormat};
pub use shift::{Shift, SHIFT_DELIMITER};
pub use store::Store;

use crate::storage::Storage;
use serde_json::Value;

/// Look up a variable, treating a stored `Null` as undefined.
pub(crate) fn resolve_variable(storage: &Storage, event_id: &str, name: &str) -> Option<Value> {
    if name.is_empty() {
        return None;
    }
    storage
        .get(event_id, name)
        .filter(|value| !value.is_null())
}

/// Textual comparison of a scalar against a filter string.
///
/// Strings compare exactly, numbers by their shortest decimal rendering and
/// booleans as `true`/`false`. Objects, arrays and `Null` never match.
pub(crate) fn scalar_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => {
            let rendered = if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            };
            rendered == expected
        }
        Value::Bool(b) => expected == if *b { "true" } else { "false" },
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Text used when a stored value is spliced into a string.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
