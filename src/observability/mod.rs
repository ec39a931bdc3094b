//! Observability for cluster mutations
//!
//! - Structured logging (JSON lines) through [`LogSink`]
//! - User-facing events through [`EventSink`]
//!
//! Observability failure is never fatal. Sinks swallow their own errors.

mod events;
mod logger;

pub use events::{ClusterEvent, EventSink, EventType, LogEventSink, MemoryEventSink};
pub use logger::{JsonLogSink, LogRecord, LogSink, Logger, MemoryLogSink, Severity};
