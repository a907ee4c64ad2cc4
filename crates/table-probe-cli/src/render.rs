// crates/table-probe-cli/src/render.rs
// ============================================================================
// Module: Report Rendering
// Description: Text and canonical JSON renderings of run summaries.
// Purpose: Keep every user-facing line of the CLI in one place.
// Dependencies: serde_jcs, table-probe-core, thiserror
// ============================================================================

//! ## Overview
//! Text output is one line per check followed by a summary line. JSON output
//! is the RFC 8785 canonical form of the [`RunSummary`], so byte equality of
//! two reports means equality of the runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use table_probe_core::CheckResult;
use table_probe_core::RunSummary;
use table_probe_core::RunVerdict;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Canonical JSON serialization failed.
    #[error("failed to serialize summary: {0}")]
    Serialize(String),
}

// ============================================================================
// SECTION: Text
// ============================================================================

/// Renders one check as `[TAG] label (HTTP status): message`.
#[must_use]
pub fn check_line(result: &CheckResult) -> String {
    let tag = result.outcome().as_str().to_ascii_uppercase();
    match result.status() {
        Some(status) => format!("[{tag}] {} (HTTP {status}): {}", result.label(), result.message()),
        None => format!("[{tag}] {}: {}", result.label(), result.message()),
    }
}

/// Renders the final summary line.
#[must_use]
pub fn summary_line(summary: &RunSummary) -> String {
    let counts = summary.counts();
    let verdict = match summary.verdict() {
        RunVerdict::Pass => "PASS",
        RunVerdict::Fail => "FAIL",
    };
    format!(
        "Result: {verdict} against {} ({} passed, {} failed, {} warned, {} skipped)",
        summary.target(),
        counts.passed,
        counts.failed,
        counts.warned,
        counts.skipped
    )
}

/// Renders every check line followed by the summary line.
#[must_use]
pub fn text_report(summary: &RunSummary) -> Vec<String> {
    let mut lines: Vec<String> = summary.checks().iter().map(check_line).collect();
    lines.push(summary_line(summary));
    lines
}

// ============================================================================
// SECTION: JSON
// ============================================================================

/// Serializes a summary to canonical JSON bytes with a trailing newline.
///
/// # Errors
///
/// Returns [`RenderError::Serialize`] when canonicalization fails.
pub fn canonical_json(summary: &RunSummary) -> Result<Vec<u8>, RenderError> {
    let mut bytes =
        serde_jcs::to_vec(summary).map_err(|err| RenderError::Serialize(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}
