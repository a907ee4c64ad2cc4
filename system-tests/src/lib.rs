// system-tests/src/lib.rs
// ============================================================================
// Module: Table Probe System Tests Library
// Description: Shared configuration and helpers for system test scenarios.
// Purpose: Provide common utilities for Table Probe system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the Table Probe system-test
//! binaries in `system-tests/tests`. Those binaries drive the verifier and the
//! `table-probe` CLI against an in-process table-viewer stub.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
