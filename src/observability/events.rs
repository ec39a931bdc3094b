//! User-facing cluster events
//!
//! Events are the signal surfaced to external consumers of the controller.
//! Each event carries a stable, coarse `reason` and a detailed message.
//! Only the outcome reporter writes events.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::logger::LogSink;

/// Event type. Only failures produce events, so every event is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventType {
    Warning,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Warning => "Warning",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single user-facing event.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterEvent {
    /// Unique event ID
    pub id: Uuid,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    pub event_type: EventType,

    /// Operation that produced the event (e.g. "AddNode")
    pub operation: String,

    /// Stable, coarse failure category
    pub reason: String,

    /// Detailed message for operators
    pub message: String,
}

impl ClusterEvent {
    /// Create a warning event.
    pub fn warning(
        operation: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: EventType::Warning,
            operation: operation.into(),
            reason: reason.into(),
            message: message.into(),
        }
    }
}

/// Event-recording sink.
pub trait EventSink: Send + Sync {
    /// Record one event. Recording must not fail the caller.
    fn record(&self, event: &ClusterEvent);
}

/// Records events as structured log lines.
pub struct LogEventSink {
    log: Arc<dyn LogSink>,
}

impl LogEventSink {
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self { log }
    }
}

impl EventSink for LogEventSink {
    fn record(&self, event: &ClusterEvent) {
        let id = event.id.to_string();
        let timestamp = event.timestamp.to_rfc3339();
        self.log.warn(
            "CLUSTER_EVENT",
            &[
                ("event_id", id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("type", event.event_type.as_str()),
                ("operation", event.operation.as_str()),
                ("reason", event.reason.as_str()),
                ("message", event.message.as_str()),
            ],
        );
    }
}

/// In-memory event sink for testing.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<ClusterEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded events.
    pub fn events(&self) -> Vec<ClusterEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &ClusterEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
