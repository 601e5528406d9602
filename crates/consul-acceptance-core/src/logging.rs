// crates/consul-acceptance-core/src/logging.rs
// ============================================================================
// Module: Acceptance Event Logging
// Description: Structured progress events for acceptance cases.
// Purpose: Emit JSON-lines case logs without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each step of a case emits an [`AcceptanceEvent`] to an
//! [`AcceptanceLogSink`]. Sinks serialize events as one JSON object per line so
//! CI logs can be filtered by case label or release.
//!
//! Secret material (gossip keys, ACL tokens, certificates) is never placed in
//! an event message.

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

use crate::core::ReleaseName;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Step of a case an event describes.
///
/// # Invariants
/// - Variants are stable for log filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Case scope entered.
    CaseStarted,
    /// Cluster install requested.
    ClusterCreating,
    /// Cluster reported ready.
    ClusterReady,
    /// Client configured for the release.
    ClientReady,
    /// KV entry being written.
    KvWrite,
    /// KV entry being read back.
    KvRead,
    /// Gossip key comparison started.
    KeyringCheck,
    /// Every keyring carried the expected key.
    KeyringVerified,
    /// Case completed successfully.
    CasePassed,
    /// Case aborted with an error.
    CaseFailed,
    /// Teardown started.
    TeardownStarted,
    /// Teardown completed.
    TeardownFinished,
    /// Teardown failed.
    TeardownFailed,
    /// Teardown skipped to preserve a failed release.
    TeardownSkipped,
}

impl EventKind {
    /// Returns a stable label for the event kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CaseStarted => "case_started",
            Self::ClusterCreating => "cluster_creating",
            Self::ClusterReady => "cluster_ready",
            Self::ClientReady => "client_ready",
            Self::KvWrite => "kv_write",
            Self::KvRead => "kv_read",
            Self::KeyringCheck => "keyring_check",
            Self::KeyringVerified => "keyring_verified",
            Self::CasePassed => "case_passed",
            Self::CaseFailed => "case_failed",
            Self::TeardownStarted => "teardown_started",
            Self::TeardownFinished => "teardown_finished",
            Self::TeardownFailed => "teardown_failed",
            Self::TeardownSkipped => "teardown_skipped",
        }
    }
}

/// Acceptance progress event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptanceEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Step the event describes.
    pub kind: EventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Case label when emitted inside a case.
    pub case: Option<String>,
    /// Release name when one is allocated.
    pub release: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl AcceptanceEvent {
    /// Creates an event with a consistent timestamp.
    #[must_use]
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "consul_acceptance",
            kind,
            timestamp_ms,
            case: None,
            release: None,
            message: message.into(),
        }
    }

    /// Attaches the case label.
    #[must_use]
    pub fn with_case(mut self, label: &str) -> Self {
        self.case = Some(label.to_string());
        self
    }

    /// Attaches the release name.
    #[must_use]
    pub fn with_release(mut self, release: &ReleaseName) -> Self {
        self.release = Some(release.to_string());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for acceptance progress events.
pub trait AcceptanceLogSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &AcceptanceEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrLogSink;

impl AcceptanceLogSink for StderrLogSink {
    fn record(&self, event: &AcceptanceEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileLogSink {
    /// Opens the log file in append mode.
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

impl AcceptanceLogSink for FileLogSink {
    fn record(&self, event: &AcceptanceEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that forwards every event to each inner sink.
pub struct FanoutLogSink {
    /// Downstream sinks, in recording order.
    sinks: Vec<Box<dyn AcceptanceLogSink>>,
}

impl FanoutLogSink {
    /// Creates a fan-out over `sinks`.
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn AcceptanceLogSink>>) -> Self {
        Self {
            sinks,
        }
    }
}

impl AcceptanceLogSink for FanoutLogSink {
    fn record(&self, event: &AcceptanceEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

/// No-op sink.
pub struct NoopLogSink;

impl AcceptanceLogSink for NoopLogSink {
    fn record(&self, _event: &AcceptanceEvent) {}
}
