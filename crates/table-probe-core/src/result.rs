// crates/table-probe-core/src/result.rs
// ============================================================================
// Module: Check Results
// Description: Check outcomes, failure taxonomy, and run summaries.
// Purpose: Record each check once and aggregate a deterministic run verdict.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every check produces exactly one [`CheckResult`]. Results are terminal:
//! fields are private and only readable through accessors, so nothing can
//! rewrite an outcome after the fact. A [`RunRecorder`] accumulates results in
//! execution order and is consumed into a [`RunSummary`].
//!
//! ## Invariants
//! - Summaries contain no timing data; identical runs serialize identically.
//! - The run fails only when a critical check has a failed outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::contract::EndpointId;
use crate::contract::HttpMethod;

// ============================================================================
// SECTION: Failure Taxonomy
// ============================================================================

/// Reasons a check can fail.
///
/// # Invariants
/// - Variants are stable for rendering, event labels, and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckFailure {
    /// Connection failure, timeout, oversized or non-JSON body.
    #[error("transport error: {detail}")]
    TransportError {
        /// Transport-level detail.
        detail: String,
    },
    /// JSON decoded but the expected key is missing or mistyped.
    #[error("shape mismatch on `{key}`: {detail}")]
    ShapeMismatch {
        /// Key under inspection.
        key: String,
        /// What was wrong with it.
        detail: String,
    },
    /// Status outside the expected set.
    #[error("unexpected status {actual} (expected {})", status_list(expected))]
    UnexpectedStatus {
        /// Accepted statuses.
        expected: Vec<u16>,
        /// Observed status.
        actual: u16,
    },
}

impl CheckFailure {
    /// Returns a stable label for the failure kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TransportError {
                ..
            } => "transport_error",
            Self::ShapeMismatch {
                ..
            } => "shape_mismatch",
            Self::UnexpectedStatus {
                ..
            } => "unexpected_status",
        }
    }
}

/// Formats a status list as `400` or `404|500`.
fn status_list(statuses: &[u16]) -> String {
    statuses.iter().map(u16::to_string).collect::<Vec<_>>().join("|")
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Terminal outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "failure")]
pub enum CheckOutcome {
    /// Contract held.
    #[serde(rename = "pass")]
    Passed,
    /// Contract deviated in a tolerated way.
    #[serde(rename = "warn")]
    Warned,
    /// Check did not run.
    #[serde(rename = "skip")]
    Skipped,
    /// Contract broken.
    #[serde(rename = "fail")]
    Failed(CheckFailure),
}

impl CheckOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "pass",
            Self::Warned => "warn",
            Self::Skipped => "skip",
            Self::Failed(_) => "fail",
        }
    }

    /// Returns the failure when the outcome is failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&CheckFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Body Shape
// ============================================================================

/// Coarse structure of a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyShape {
    /// Zero-length body.
    Empty,
    /// Body was not valid JSON.
    NotJson,
    /// JSON object with its top-level keys (sorted).
    Object {
        /// Top-level keys.
        keys: Vec<String>,
    },
    /// JSON array with its length.
    Array {
        /// Element count.
        len: usize,
    },
    /// JSON scalar or null.
    Scalar,
}

impl BodyShape {
    /// Classifies raw response bytes.
    #[must_use]
    pub fn of_bytes(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::Empty;
        }
        serde_json::from_slice::<Value>(body).map_or(Self::NotJson, |value| Self::of_value(&value))
    }

    /// Classifies a decoded JSON value.
    #[must_use]
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                let mut keys: Vec<String> = map.keys().cloned().collect();
                keys.sort();
                Self::Object {
                    keys,
                }
            }
            Value::Array(items) => Self::Array {
                len: items.len(),
            },
            _ => Self::Scalar,
        }
    }
}

// ============================================================================
// SECTION: Check Results
// ============================================================================

/// Identity of a check, fixed before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    /// Stable check label (for example `table-data.filter.equals`).
    label: String,
    /// Endpoint under test.
    endpoint: EndpointId,
    /// Method sent.
    method: HttpMethod,
    /// Whether a failure fails the run.
    critical: bool,
}

impl CheckTarget {
    /// Creates a check target.
    #[must_use]
    pub fn new(label: impl Into<String>, endpoint: EndpointId, method: HttpMethod) -> Self {
        Self {
            label: label.into(),
            endpoint,
            method,
            critical: false,
        }
    }

    /// Marks the check as critical.
    #[must_use]
    pub const fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Returns the check label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Produces a passing result.
    #[must_use]
    pub fn pass(self, status: u16, shape: BodyShape, message: impl Into<String>) -> CheckResult {
        self.finish(Some(status), Some(shape), CheckOutcome::Passed, message.into())
    }

    /// Produces a warning result.
    #[must_use]
    pub fn warn(
        self,
        status: Option<u16>,
        shape: Option<BodyShape>,
        message: impl Into<String>,
    ) -> CheckResult {
        self.finish(status, shape, CheckOutcome::Warned, message.into())
    }

    /// Produces a skipped result.
    #[must_use]
    pub fn skip(self, reason: impl Into<String>) -> CheckResult {
        self.finish(None, None, CheckOutcome::Skipped, reason.into())
    }

    /// Produces a failed result; the message is the failure text plus any detail.
    #[must_use]
    pub fn fail(
        self,
        status: Option<u16>,
        shape: Option<BodyShape>,
        failure: CheckFailure,
        detail: Option<String>,
    ) -> CheckResult {
        let message = match detail {
            Some(detail) if !detail.is_empty() => format!("{failure}; {detail}"),
            _ => failure.to_string(),
        };
        self.finish(status, shape, CheckOutcome::Failed(failure), message)
    }

    /// Seals the target into a terminal result.
    fn finish(
        self,
        status: Option<u16>,
        shape: Option<BodyShape>,
        outcome: CheckOutcome,
        message: String,
    ) -> CheckResult {
        CheckResult {
            label: self.label,
            endpoint: self.endpoint,
            method: self.method,
            critical: self.critical,
            status,
            shape,
            outcome,
            message,
        }
    }
}

/// Outcome of exercising one endpoint spec once.
///
/// # Invariants
/// - Immutable once constructed; a re-run produces a new result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Stable check label.
    label: String,
    /// Endpoint under test.
    endpoint: EndpointId,
    /// Method sent.
    method: HttpMethod,
    /// Whether a failure fails the run.
    critical: bool,
    /// Observed HTTP status when a response arrived.
    status: Option<u16>,
    /// Observed body shape when a response arrived.
    shape: Option<BodyShape>,
    /// Terminal outcome.
    #[serde(flatten)]
    outcome: CheckOutcome,
    /// Human-readable message.
    message: String,
}

impl CheckResult {
    /// Returns the check label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the method sent.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns whether the check is critical.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        self.critical
    }

    /// Returns the observed status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the outcome.
    #[must_use]
    pub const fn outcome(&self) -> &CheckOutcome {
        &self.outcome
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true when the outcome is failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Failed(_))
    }

    /// Returns true when this result fails the whole run.
    #[must_use]
    pub const fn fails_run(&self) -> bool {
        self.critical && self.is_failed()
    }
}

// ============================================================================
// SECTION: Run Summary
// ============================================================================

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunVerdict {
    /// Every critical check passed.
    Pass,
    /// At least one critical check failed.
    Fail,
}

/// Per-outcome result counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    /// Passed checks.
    pub passed: usize,
    /// Failed checks.
    pub failed: usize,
    /// Warned checks.
    pub warned: usize,
    /// Skipped checks.
    pub skipped: usize,
}

/// Accumulates check results in execution order.
#[derive(Debug)]
pub struct RunRecorder {
    /// Base URL the run targets.
    target: String,
    /// Results so far.
    checks: Vec<CheckResult>,
}

impl RunRecorder {
    /// Starts recording a run against `target`.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            checks: Vec::new(),
        }
    }

    /// Appends a result.
    pub fn record(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Returns the number of results recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns true when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Consumes the recorder into a summary.
    #[must_use]
    pub fn finish(self) -> RunSummary {
        let mut counts = OutcomeCounts::default();
        for check in &self.checks {
            match check.outcome() {
                CheckOutcome::Passed => counts.passed += 1,
                CheckOutcome::Warned => counts.warned += 1,
                CheckOutcome::Skipped => counts.skipped += 1,
                CheckOutcome::Failed(_) => counts.failed += 1,
            }
        }
        let verdict = if self.checks.iter().any(CheckResult::fails_run) {
            RunVerdict::Fail
        } else {
            RunVerdict::Pass
        };
        RunSummary {
            target: self.target,
            verdict,
            counts,
            checks: self.checks,
        }
    }
}

/// Aggregate of all check results for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Base URL the run targeted.
    target: String,
    /// Overall verdict.
    verdict: RunVerdict,
    /// Outcome counts.
    counts: OutcomeCounts,
    /// Results in execution order.
    checks: Vec<CheckResult>,
}

impl RunSummary {
    /// Returns the target base URL.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the verdict.
    #[must_use]
    pub const fn verdict(&self) -> RunVerdict {
        self.verdict
    }

    /// Returns true when the verdict is pass.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == RunVerdict::Pass
    }

    /// Returns outcome counts.
    #[must_use]
    pub const fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    /// Returns results in execution order.
    #[must_use]
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    /// Finds a result by label.
    #[must_use]
    pub fn check(&self, label: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|check| check.label() == label)
    }
}
