//! Path expressions addressing locations inside a JSON tree.
//!
//! A path is `segment (SEP segment)*` where each segment is an identifier
//! optionally followed by one or more `[N]` array indices. Empty segments are
//! skipped, so both `""` and `"."` address the root of the tree.
//!
//! ```text
//! "blah[2].foo"  ->  [Key("blah"), Index(2), Key("foo")]
//! "[0].id"       ->  [Index(0), Key("id")]
//! "."            ->  []            (root)
//! ```
//!
//! The codec operations built on top of [`Path`] live in [`codec`].

pub mod codec;

pub use codec::{assign, encode, extract_at, merge, read_at, value_at_mut};

use crate::error::{Result, TransformError};
use std::fmt;

/// Largest array index a path may write to
pub const MAX_ARRAY_INDEX: usize = 65_535;

/// One traversal step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Descend into an object member
    Key(String),
    /// Descend into an array slot
    Index(usize),
}

/// A parsed path expression
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    /// The root of the tree
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `expr` using `separator` between segments.
    ///
    /// Parsing is total: text that does not form a valid `[N]` suffix is
    /// kept as part of the member name.
    pub fn parse(expr: &str, separator: &str) -> Self {
        let separator = if separator.is_empty() {
            crate::types::DEFAULT_SEPARATOR
        } else {
            separator
        };

        let mut steps = Vec::new();
        for segment in expr.split(separator).filter(|s| !s.is_empty()) {
            let (key, indices) = split_indices(segment);
            if !key.is_empty() {
                steps.push(Step::Key(key.to_string()));
            }
            steps.extend(indices.into_iter().map(Step::Index));
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Largest array index in the path, if any
    pub fn max_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Index(index) => Some(*index),
                Step::Key(_) => None,
            })
            .max()
    }

    /// Reject paths whose indices would make [`encode`] allocate
    /// unreasonably large arrays.
    pub fn ensure_encodable(&self) -> Result<()> {
        match self.max_index() {
            Some(index) if index > MAX_ARRAY_INDEX => Err(TransformError::Config(format!(
                "array index {} in path {:?} exceeds the maximum of {}",
                index,
                self.to_string(),
                MAX_ARRAY_INDEX
            ))),
            _ => Ok(()),
        }
    }
}

/// Split trailing `[N]` suffixes off a segment, returning the member name and
/// the indices in traversal order.
fn split_indices(segment: &str) -> (&str, Vec<usize>) {
    let mut rest = segment;
    let mut indices = Vec::new();

    while let Some(body) = rest.strip_suffix(']') {
        let Some(open) = body.rfind('[') else {
            break;
        };
        match body[open + 1..].parse::<usize>() {
            Ok(index) => {
                indices.push(index);
                rest = &body[..open];
            }
            Err(_) => break,
        }
    }

    indices.reverse();
    (rest, indices)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str(".");
        }
        let mut first = true;
        for step in &self.steps {
            match step {
                Step::Key(key) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Step::Index(index) => write!(f, "[{}]", index)?,
            }
            first = false;
        }
        Ok(())
    }
}
