// crates/table-probe-config/src/lib.rs
// ============================================================================
// Module: Table Probe Config Library
// Description: Canonical config model, resolution, and validation.
// Purpose: Single source of truth for table-probe.toml semantics.
// Dependencies: table-probe-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `table-probe-config` defines the configuration model for contract runs
//! and converts it into the client, catalog, and suite settings the core
//! crate consumes. Validation fails closed with a message naming the field.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
