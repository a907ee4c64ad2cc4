// crates/table-probe-core/src/events.rs
// ============================================================================
// Module: Probe Event Logging
// Description: Structured request events for contract verification runs.
// Purpose: Emit JSON-line logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each check that reaches the network emits one [`ProbeEvent`] through a
//! [`ProbeEventSink`]. Events carry timing and byte counts that are kept out
//! of the run summary, so summaries stay reproducible while the event log
//! remains useful for diagnosing slow or flaky targets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::contract::HttpMethod;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Check label.
    pub check: String,
    /// Method sent.
    pub method: HttpMethod,
    /// Request path (without query).
    pub path: String,
    /// Response status when a response arrived.
    pub status: Option<u16>,
    /// Check outcome label.
    pub outcome: &'static str,
    /// Failure kind label when the check failed.
    pub error_kind: Option<&'static str>,
    /// Request latency in milliseconds.
    pub latency_ms: u128,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

/// Inputs required to construct a probe event.
pub struct ProbeEventParams {
    /// Check label.
    pub check: String,
    /// Method sent.
    pub method: HttpMethod,
    /// Request path (without query).
    pub path: String,
    /// Response status when a response arrived.
    pub status: Option<u16>,
    /// Check outcome label.
    pub outcome: &'static str,
    /// Failure kind label when the check failed.
    pub error_kind: Option<&'static str>,
    /// Request latency in milliseconds.
    pub latency_ms: u128,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl ProbeEvent {
    /// Creates a new probe event stamped with the current time.
    #[must_use]
    pub fn new(params: ProbeEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "probe_request",
            timestamp_ms,
            check: params.check,
            method: params.method,
            path: params.path,
            status: params.status,
            outcome: params.outcome,
            error_kind: params.error_kind,
            latency_ms: params.latency_ms,
            response_bytes: params.response_bytes,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for probe request events.
pub trait ProbeEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &ProbeEvent);
}

/// Sink that discards events.
pub struct NoopEventSink;

impl ProbeEventSink for NoopEventSink {
    fn record(&self, _event: &ProbeEvent) {}
}

/// Sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl ProbeEventSink for StderrEventSink {
    fn record(&self, event: &ProbeEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ProbeEventSink for FileEventSink {
    fn record(&self, event: &ProbeEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}
