// crates/anchor-tests-core/src/events.rs
// ============================================================================
// Module: Anchor Tests Run Events
// Description: Structured run events and JSON-line sinks.
// Purpose: Emit machine-readable progress logs without a logging framework.
// Dependencies: crate::{core, runtime}, serde, serde_json
// ============================================================================

//! ## Overview
//! The execution engine records a [`RunEvent`] when a pass starts, after each
//! test finishes, on cancellation, and when the pass ends. Sinks serialize each
//! event as one JSON line. Events carry failure kinds but never request
//! headers, so credentials cannot leak into logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::failure::FailureKind;
use crate::core::identifiers::ProtocolId;
use crate::core::identifiers::TestId;
use crate::core::result::TestStatus;
use crate::runtime::engine::RunSummary;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Structured run event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A pass started.
    RunStarted {
        /// Event timestamp (milliseconds since epoch).
        timestamp_ms: u128,
        /// Target domain.
        domain: String,
        /// Selected protocols.
        protocols: Vec<ProtocolId>,
        /// Number of planned tests.
        planned: usize,
    },
    /// A test produced its result.
    TestFinished {
        /// Event timestamp (milliseconds since epoch).
        timestamp_ms: u128,
        /// Test identifier.
        test_id: TestId,
        /// Protocol identifier.
        protocol: ProtocolId,
        /// Outcome status.
        status: TestStatus,
        /// Failure kind when failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        failure_kind: Option<FailureKind>,
        /// Time spent in the test body.
        duration_ms: u128,
        /// Number of recorded network calls.
        network_calls: usize,
    },
    /// The pass was cancelled before every test ran.
    RunCancelled {
        /// Event timestamp (milliseconds since epoch).
        timestamp_ms: u128,
        /// Tests that produced a result before cancellation.
        completed: usize,
        /// Planned tests.
        planned: usize,
    },
    /// A pass ended.
    RunFinished {
        /// Event timestamp (milliseconds since epoch).
        timestamp_ms: u128,
        /// Summary counts.
        summary: RunSummary,
    },
}

/// Returns the current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

impl RunEvent {
    /// Returns the event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::TestFinished { .. } => "test_finished",
            Self::RunCancelled { .. } => "run_cancelled",
            Self::RunFinished { .. } => "run_finished",
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Receives run events.
pub trait RunEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &RunEvent);
}

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl RunEventSink for StderrEventSink {
    fn record(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl RunEventSink for FileEventSink {
    fn record(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op sink.
pub struct NoopEventSink;

impl RunEventSink for NoopEventSink {
    fn record(&self, _event: &RunEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use std::fs;

    use super::FileEventSink;
    use super::RunEvent;
    use super::RunEventSink;
    use crate::core::identifiers::ProtocolId;
    use crate::runtime::engine::RunSummary;

    #[test]
    fn file_sink_appends_tagged_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::new(&path).unwrap();
        sink.record(&RunEvent::RunStarted {
            timestamp_ms: 1,
            domain: "anchor.example".to_string(),
            protocols: vec![ProtocolId::new(1).unwrap()],
            planned: 4,
        });
        sink.record(&RunEvent::RunFinished { timestamp_ms: 2, summary: RunSummary::default() });

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> =
            contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "run_started");
        assert_eq!(lines[0]["planned"], 4);
        assert_eq!(lines[1]["event"], "run_finished");
        assert_eq!(lines[1]["summary"]["cancelled"], false);
    }
}
