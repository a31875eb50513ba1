//! Test data builders for creating test objects

use ce_transform::CloudEvent;
use serde_json::Value;

/// Builder for creating test CloudEvents
pub struct EventBuilder {
    id: String,
    source: String,
    ty: String,
    content_type: Option<String>,
    data: Option<Value>,
    extensions: Vec<(String, Value)>,
}

impl EventBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            source: "test".to_string(),
            ty: "test".to_string(),
            content_type: Some("application/json".to_string()),
            data: None,
            extensions: Vec::new(),
        }
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn event_type(mut self, ty: &str) -> Self {
        self.ty = ty.to_string();
        self
    }

    pub fn content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self
    }

    /// Payload given as JSON text
    pub fn data(mut self, json: &str) -> Self {
        self.data = Some(serde_json::from_str(json).expect("invalid JSON payload in test"));
        self
    }

    pub fn extension(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.extensions.push((name.to_string(), value.into()));
        self
    }

    pub fn build(self) -> CloudEvent {
        let mut event = CloudEvent::new(self.id, self.source, self.ty)
            .with_content_type(self.content_type.as_deref());
        event.data = self.data;
        for (name, value) in self.extensions {
            event = event.with_extension(name, value);
        }
        event
    }
}
