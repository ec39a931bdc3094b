//! Structured JSON logger
//!
//! - One log line = one record
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering
//!
//! Components never write to stdout directly. They log through a
//! [`LogSink`] so tests can capture records with [`MemoryLogSink`].

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSON line renderer
pub struct Logger;

impl Logger {
    /// Render one record as a JSON line.
    ///
    /// Fields are output in deterministic order (alphabetical by key).
    pub fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(256);

        output.push_str("{\"event\":");
        output.push_str(&Value::from(event).to_string());
        output.push_str(",\"severity\":");
        output.push_str(&Value::from(severity.as_str()).to_string());

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push(',');
            output.push_str(&Value::from(*key).to_string());
            output.push(':');
            output.push_str(&Value::from(*value).to_string());
        }

        output.push_str("}\n");
        output
    }

    /// Write one record to the given writer.
    ///
    /// Write failures are dropped; logging never fails the caller.
    pub fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = Self::render(severity, event, fields);
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Log to stdout, or stderr for ERROR and FATAL
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity >= Severity::Error {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }
}

/// Destination for structured log records
pub trait LogSink: Send + Sync {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]);

    fn trace(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event, fields);
    }

    fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }
}

/// Writes JSON lines to stdout/stderr
#[derive(Debug, Clone, Copy)]
pub struct JsonLogSink {
    min_severity: Severity,
}

impl JsonLogSink {
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl Default for JsonLogSink {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl LogSink for JsonLogSink {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity >= self.min_severity {
            Logger::log(severity, event, fields);
        }
    }
}

/// A captured log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub event: String,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Look up a field value by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory sink for testing.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Get captured records with the given event name.
    pub fn find(&self, event: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.event == event)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                severity,
                event: event.to_string(),
                fields: fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut buffer = Vec::new();
        Logger::log_to_writer(severity, event, fields, &mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_log_json_format() {
        let output = capture_log(Severity::Info, "ADD_NODE_STARTED", &[("backend", "process")]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "ADD_NODE_STARTED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["backend"], "process");
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let output1 = capture_log(
            Severity::Info,
            "TEST",
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let output2 = capture_log(
            Severity::Info,
            "TEST",
            &[("apple", "2"), ("mango", "3"), ("zebra", "1")],
        );

        assert_eq!(output1, output2);

        let apple_pos = output1.find("apple").unwrap();
        let zebra_pos = output1.find("zebra").unwrap();
        assert!(apple_pos < zebra_pos);
        assert!(output1.find("\"event\"").unwrap() < output1.find("\"severity\"").unwrap());
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = capture_log(
            Severity::Error,
            "TEST",
            &[("stdout", "Error: \"v_db_node0004\"\n\tline2")],
        );

        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["stdout"], "Error: \"v_db_node0004\"\n\tline2");
    }

    #[test]
    fn test_memory_sink_captures() {
        let sink = MemoryLogSink::new();
        sink.info("A", &[("k", "v")]);
        sink.error("B", &[]);

        assert_eq!(sink.len(), 2);
        let a = sink.find("A");
        assert_eq!(a[0].severity, Severity::Info);
        assert_eq!(a[0].field("k"), Some("v"));
        assert_eq!(sink.find("B")[0].severity, Severity::Error);
    }

    #[test]
    fn test_cloned_sink_shares_records() {
        let sink = MemoryLogSink::new();
        let shared: Arc<dyn LogSink> = Arc::new(sink.clone());
        shared.warn("W", &[]);
        assert_eq!(sink.find("W").len(), 1);
    }
}
