//! CloudEvent model for the structured JSON format.
//!
//! The handler does not transform a [`CloudEvent`] directly. It works on
//! two trees:
//!
//! - the **context**, an [`EventContext`] holding the CloudEvents v1
//!   attributes plus an `Extensions` object (so extension paths read
//!   `Extensions.myext`);
//! - the **data**, the JSON payload.

use crate::error::{Result, TransformError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Only supported CloudEvents version
pub const SPEC_VERSION: &str = "1.0";

/// Content type of every payload the handler accepts
pub const APPLICATION_JSON: &str = "application/json";

/// Attribute names that cannot be used as extensions
const RESERVED_ATTRIBUTES: &[&str] = &[
    "specversion",
    "id",
    "source",
    "type",
    "datacontenttype",
    "dataschema",
    "subject",
    "time",
    "data",
    "data_base64",
];

fn default_spec_version() -> String {
    SPEC_VERSION.to_string()
}

/// A CloudEvent in structured JSON mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    #[serde(default = "default_spec_version")]
    pub specversion: String,
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Extension attributes
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl CloudEvent {
    pub fn new(id: impl Into<String>, source: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            specversion: default_spec_version(),
            id: id.into(),
            source: source.into(),
            ty: ty.into(),
            datacontenttype: Some(APPLICATION_JSON.to_string()),
            dataschema: None,
            subject: None,
            time: None,
            data: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    pub fn with_content_type(mut self, content_type: Option<&str>) -> Self {
        self.datacontenttype = content_type.map(str::to_string);
        self
    }

    /// Whether the payload can be transformed. A missing content type is
    /// treated as JSON.
    pub fn has_json_data(&self) -> bool {
        self.datacontenttype
            .as_deref()
            .map_or(true, |ct| ct.contains(APPLICATION_JSON))
    }

    /// Context tree view of the event's attributes.
    pub fn context(&self) -> EventContext {
        EventContext {
            specversion: self.specversion.clone(),
            id: self.id.clone(),
            source: self.source.clone(),
            ty: self.ty.clone(),
            datacontenttype: self.datacontenttype.clone(),
            dataschema: self.dataschema.clone(),
            subject: self.subject.clone(),
            time: self.time,
            extensions: self.extensions.clone(),
        }
    }

    /// Serialized payload, `null` when the event has none.
    pub fn data_bytes(&self) -> Result<Vec<u8>> {
        let data = self.data.as_ref().unwrap_or(&Value::Null);
        serde_json::to_vec(data).map_err(TransformError::Encode)
    }

    /// Rebuild an event from a transformed context and payload.
    ///
    /// Extensions are replaced wholesale by the context's `Extensions`
    /// object and the payload is always labelled as JSON.
    pub fn from_parts(context: EventContext, data: Option<Value>) -> Result<Self> {
        context.validate()?;
        Ok(Self {
            specversion: context.specversion,
            id: context.id,
            source: context.source,
            ty: context.ty,
            datacontenttype: Some(APPLICATION_JSON.to_string()),
            dataschema: context.dataschema,
            subject: context.subject,
            time: context.time,
            data,
            extensions: context
                .extensions
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect(),
        })
    }
}

/// Event attributes as seen by the context pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub specversion: String,
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(
        rename = "Extensions",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub extensions: BTreeMap<String, Value>,
}

impl EventContext {
    /// Check the required attributes and extension names/values.
    pub fn validate(&self) -> Result<()> {
        if self.specversion != SPEC_VERSION {
            return Err(TransformError::InvalidEvent(format!(
                "unsupported specversion {:?}",
                self.specversion
            )));
        }
        for (attribute, value) in [("id", &self.id), ("source", &self.source), ("type", &self.ty)] {
            if value.is_empty() {
                return Err(TransformError::InvalidEvent(format!(
                    "attribute {:?} must not be empty",
                    attribute
                )));
            }
        }
        for (name, value) in &self.extensions {
            validate_extension(name, value)?;
        }
        Ok(())
    }
}

fn validate_extension(name: &str, value: &Value) -> Result<()> {
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !valid_name || RESERVED_ATTRIBUTES.contains(&name) {
        return Err(TransformError::InvalidEvent(format!(
            "invalid extension name {:?}",
            name
        )));
    }
    if value.is_object() || value.is_array() {
        return Err(TransformError::InvalidEvent(format!(
            "extension {:?} must be a scalar",
            name
        )));
    }
    Ok(())
}
