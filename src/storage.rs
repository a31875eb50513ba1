//! Per-event variable storage shared by the context and data pipelines.
//!
//! Variables are scoped by event id so concurrently processed events never
//! see each other's values. Entries live until [`Storage::flush`] is called
//! for the event; [`EventScope`] does that automatically when dropped.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type EventVariables = HashMap<String, Value>;

/// Thread-safe two-level map `event id -> variable -> value`
#[derive(Debug, Default)]
pub struct Storage {
    events: RwLock<HashMap<String, EventVariables>>,
}

/// Storage shared between pipelines
pub type SharedStorage = Arc<Storage>;

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage wrapped for sharing between pipelines
    pub fn shared() -> SharedStorage {
        Arc::new(Self::new())
    }

    /// Store `value` as `key` for `event_id`, replacing any previous value.
    pub fn set(&self, event_id: &str, key: &str, value: Value) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events
            .entry(event_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Get a copy of the value stored as `key` for `event_id`.
    pub fn get(&self, event_id: &str, key: &str) -> Option<Value> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events.get(event_id)?.get(key).cloned()
    }

    /// Names of the variables stored for `event_id`.
    pub fn list_keys(&self, event_id: &str) -> Vec<String> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events
            .get(event_id)
            .map(|vars| vars.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids of all events that currently hold variables.
    pub fn list_event_ids(&self) -> Vec<String> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events.keys().cloned().collect()
    }

    /// Drop every variable stored for `event_id`.
    pub fn flush(&self, event_id: &str) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events.remove(event_id);
    }

    pub fn is_empty(&self) -> bool {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events.is_empty()
    }
}

/// Flushes an event's variables when dropped
#[derive(Debug)]
pub struct EventScope<'a> {
    storage: &'a Storage,
    event_id: String,
}

impl<'a> EventScope<'a> {
    pub fn new(storage: &'a Storage, event_id: impl Into<String>) -> Self {
        Self {
            storage,
            event_id: event_id.into(),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }
}

impl Drop for EventScope<'_> {
    fn drop(&mut self) {
        self.storage.flush(&self.event_id);
    }
}
