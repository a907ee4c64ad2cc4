// crates/table-probe-core/src/lib.rs
// ============================================================================
// Module: Table Probe Core
// Description: Contract verification engine for table-viewer HTTP APIs.
// Purpose: Model endpoint contracts, run checks, and aggregate run summaries.
// Dependencies: reqwest, serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! This crate verifies a running table-viewer API against its HTTP contract:
//! listing tables, listing columns, fetching (optionally filtered) rows, and
//! rejecting bad requests. Each check yields one immutable
//! [`CheckResult`]; a [`ContractSuite`] sequences the checks and produces a
//! [`RunSummary`] whose verdict depends only on critical checks.
//! Invariants:
//! - Network and decoding errors never escape a check; they become results.
//! - Run summaries are free of timing data and serialize deterministically.
//!
//! Security posture: the server under test is untrusted; bodies are
//! size-limited and redirects are never followed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod contract;
pub mod events;
pub mod probe;
pub mod result;
pub mod suite;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ClientConfig;
pub use client::ClientError;
pub use client::ContractClient;
pub use contract::EndpointCatalog;
pub use contract::EndpointId;
pub use contract::EndpointSpec;
pub use contract::FilterType;
pub use contract::HttpMethod;
pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::ProbeEvent;
pub use events::ProbeEventSink;
pub use events::StderrEventSink;
pub use probe::FilterCase;
pub use probe::Probe;
pub use result::CheckFailure;
pub use result::CheckOutcome;
pub use result::CheckResult;
pub use result::RunSummary;
pub use result::RunVerdict;
pub use suite::ContractSuite;
pub use suite::EmptyTablesPolicy;
pub use suite::SuiteOptions;
pub use verifier::ContractVerifier;
