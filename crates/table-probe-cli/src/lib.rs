// crates/table-probe-cli/src/lib.rs
// ============================================================================
// Module: Table Probe CLI Library
// Description: Shared helpers for the table-probe command-line interface.
// Purpose: Provide report rendering for the CLI binary and tests.
// Dependencies: serde_jcs, table-probe-core
// ============================================================================

//! ## Overview
//! This library module houses the report renderers. The binary entry point
//! (`src/main.rs`) imports them so text and JSON output stay consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Text and canonical JSON report rendering.
pub mod render;
