//! Output side of the adapter.

use crate::error::{Result, TransformError};
use crate::event::CloudEvent;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

#[cfg(test)]
use mockall::automock;

/// Destination for transformed events
///
/// Called concurrently from every worker thread.
#[cfg_attr(test, automock)]
pub trait EventSink: Send + Sync {
    fn send(&self, event: &CloudEvent) -> Result<()>;
}

/// Writes events as newline-delimited JSON
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn send(&self, event: &CloudEvent) -> Result<()> {
        let mut line = serde_json::to_vec(event).map_err(TransformError::Encode)?;
        line.push(b'\n');

        // whole line under one lock
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_writer_sink_ndjson() {
        let sink = WriterSink::new(Vec::new());
        sink.send(&CloudEvent::new("1", "s", "t").with_data(json!({"a": 1})))
            .unwrap();
        sink.send(&CloudEvent::new("2", "s", "t")).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: CloudEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(first.data, Some(json!({"a": 1})));
    }
}
