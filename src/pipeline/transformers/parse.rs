//! Parse: decode a string leaf holding serialized data.

use super::kind_of;
use crate::error::{Result, TransformError};
use crate::path::{self, Path};
use crate::pipeline::transformer::Transformer;
use crate::types::{OperationKind, PathSpec};
use serde_json::Value;
use std::str::FromStr;

/// Formats a string leaf can be parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFormat {
    Json,
}

impl FromStr for ParseFormat {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("json") {
            Ok(ParseFormat::Json)
        } else {
            Err(TransformError::UnsupportedParseFormat(s.to_string()))
        }
    }
}

/// Parse transformer
#[derive(Debug)]
pub struct Parse {
    path: Path,
    format: ParseFormat,
}

impl Parse {
    pub fn new(spec: &PathSpec) -> Result<Self> {
        Ok(Self {
            path: Path::parse(&spec.key, &spec.separator),
            format: spec.value.parse()?,
        })
    }

    pub fn format(&self) -> ParseFormat {
        self.format
    }

    fn fail(&self, message: impl Into<String>) -> TransformError {
        TransformError::operation(OperationKind::Parse, self.path.to_string(), message)
    }
}

impl Transformer for Parse {
    fn operation(&self) -> OperationKind {
        OperationKind::Parse
    }

    fn transform(&self, _event_id: &str, tree: &Value) -> Result<Value> {
        let mut output = tree.clone();
        let Some(slot) = path::value_at_mut(&mut output, &self.path) else {
            return Ok(output);
        };

        let parsed = match (self.format, &*slot) {
            (ParseFormat::Json, Value::String(text)) => serde_json::from_str::<Value>(text)
                .map_err(|e| self.fail(format!("invalid JSON: {}", e)))?,
            (_, other) => {
                return Err(self.fail(format!("expected a string, found {}", kind_of(other))))
            }
        };
        *slot = parsed;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(key: &str) -> Parse {
        Parse::new(&PathSpec::new(key, "json")).unwrap()
    }

    #[test]
    fn test_format_case_insensitive() {
        assert_eq!("JSON".parse::<ParseFormat>().unwrap(), ParseFormat::Json);
        assert_eq!("Json".parse::<ParseFormat>().unwrap(), ParseFormat::Json);
        let err = Parse::new(&PathSpec::new("a", "jnos")).unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedParseFormat(f) if f == "jnos"));
    }

    #[test]
    fn test_parse_nested_leaf() {
        let tree = json!({
            "key1": "value1",
            "key2": [{"key3": "value3", "strJSON": "{\"foo\":123,\"bar\":\"value2\",\"baz\":[\"one\",\"two\",\"three\"]}"}],
        });

        let result = parse("key2[0].strJSON").transform("evt", &tree).unwrap();
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"key1":"value1","key2":[{"key3":"value3","strJSON":{"bar":"value2","baz":["one","two","three"],"foo":123}}]}"#
        );
    }

    #[test]
    fn test_parse_root_string() {
        let tree = json!("[1,2]");
        assert_eq!(parse(".").transform("evt", &tree).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_parse_missing_is_noop() {
        let tree = json!({"a": "{}"});
        assert_eq!(parse("b").transform("evt", &tree).unwrap(), tree);
    }

    #[test]
    fn test_parse_non_string_leaf() {
        let err = parse("a").transform("evt", &json!({"a": 1})).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Operation { operation: OperationKind::Parse, .. }
        ));
        assert!(err.to_string().contains("expected a string, found number"));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse("a").transform("evt", &json!({"a": "{nope"})).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }
}
