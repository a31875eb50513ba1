//! Sink helpers for adapter tests

use ce_transform::{CloudEvent, EventSink, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Sink that forwards every event into a channel
pub struct ChannelSink {
    tx: Sender<CloudEvent>,
}

impl EventSink for ChannelSink {
    fn send(&self, event: &CloudEvent) -> Result<()> {
        // a dropped receiver is not a sink failure
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}

/// Create a channel sink and the receiver observing it
pub fn channel_sink() -> (ChannelSink, Receiver<CloudEvent>) {
    let (tx, rx) = unbounded();
    (ChannelSink { tx }, rx)
}
