//! Adapter runner: reads events, transforms them on a worker pool and
//! forwards the results.
//!
//! # Architecture
//!
//! ```text
//! BufRead ──► reader ──► bounded channel ──► worker 1 ──► EventSink
//!            (NDJSON)                    ├─► worker 2 ──┤
//!                                        └─► worker N ──┘
//! ```
//!
//! Input lines are structured-mode CloudEvents, one per line. Output order
//! is not preserved once more than one worker runs.

pub mod sink;

pub use sink::{EventSink, WriterSink};

use crate::config::AdapterConfig;
use crate::error::Result;
use crate::event::CloudEvent;
use crate::handler::Handler;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fmt;
use std::io::BufRead;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters reported when the input is exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterStats {
    /// Non-blank input lines
    pub received: u64,
    /// Events forwarded without errors
    pub transformed: u64,
    /// Events forwarded with collected transformation errors
    pub partial: u64,
    /// Lines or events that were dropped
    pub rejected: u64,
}

impl AdapterStats {
    pub fn forwarded(&self) -> u64 {
        self.transformed + self.partial
    }
}

impl fmt::Display for AdapterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} transformed={} partial={} rejected={}",
            self.received, self.transformed, self.partial, self.rejected
        )
    }
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    transformed: AtomicU64,
    partial: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> AdapterStats {
        AdapterStats {
            received: self.received.load(Ordering::Relaxed),
            transformed: self.transformed.load(Ordering::Relaxed),
            partial: self.partial.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Worker pool driving a [`Handler`]
pub struct Adapter {
    handler: Arc<Handler>,
    sink: Arc<dyn EventSink>,
    workers: usize,
    queue_size: usize,
}

impl Adapter {
    pub fn new(handler: Arc<Handler>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            handler,
            sink,
            workers: 1,
            queue_size: crate::config::DEFAULT_QUEUE_SIZE,
        }
    }

    /// Build the handler and pool settings from a config.
    pub fn from_config(config: &AdapterConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        let handler = Handler::from_config(&config.transformation)?;
        Ok(Self::new(Arc::new(handler), sink)
            .with_workers(config.workers)
            .with_queue_size(config.queue_size))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size.max(1);
        self
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    /// Process every event in `reader`, returning once all workers finished.
    ///
    /// Only a read error on the input aborts the run; bad lines and
    /// rejected events are logged and counted.
    pub fn run<R: BufRead>(&self, reader: R) -> Result<AdapterStats> {
        let counters = Counters::default();
        let (tx, rx) = bounded::<CloudEvent>(self.queue_size);

        tracing::info!("Starting {} workers", self.workers);

        std::thread::scope(|scope| {
            for worker in 0..self.workers {
                let rx = rx.clone();
                let counters = &counters;
                scope.spawn(move || self.work(worker, rx, counters));
            }
            drop(rx);

            let result = self.read_events(reader, &tx, &counters);
            // closing the channel lets the workers drain and exit
            drop(tx);
            result
        })?;

        let stats = counters.snapshot();
        tracing::info!("Input exhausted: {}", stats);
        Ok(stats)
    }

    fn read_events<R: BufRead>(
        &self,
        reader: R,
        tx: &Sender<CloudEvent>,
        counters: &Counters,
    ) -> Result<()> {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            Counters::bump(&counters.received);

            match serde_json::from_str::<CloudEvent>(&line) {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        tracing::error!("All workers stopped, dropping remaining input");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Line {}: not a structured CloudEvent: {}", index + 1, e);
                    Counters::bump(&counters.rejected);
                }
            }
        }
        Ok(())
    }

    fn work(&self, worker: usize, rx: Receiver<CloudEvent>, counters: &Counters) {
        tracing::debug!("Worker {} started", worker);

        for event in rx.iter() {
            let id = event.id.clone();
            let transformed = match self.handler.transform(event) {
                Ok(transformed) => transformed,
                Err(e) => {
                    tracing::warn!("Event {} rejected: {}", id, e);
                    Counters::bump(&counters.rejected);
                    continue;
                }
            };

            if let Err(e) = self.sink.send(&transformed.event) {
                tracing::warn!("Event {}: sink failed: {}", id, e);
                Counters::bump(&counters.rejected);
            } else if transformed.is_partial() {
                Counters::bump(&counters.partial);
            } else {
                Counters::bump(&counters.transformed);
            }
        }

        tracing::debug!("Worker {} finished", worker);
    }
}
