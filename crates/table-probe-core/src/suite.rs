// crates/table-probe-core/src/suite.rs
// ============================================================================
// Module: Contract Suite
// Description: Ordered verification pass over the table-viewer contract.
// Purpose: Sequence individual checks and aggregate them into a run summary.
// Dependencies: serde, crate::verifier, crate::probe, crate::result
// ============================================================================

//! ## Overview
//! [`ContractSuite::run`] drives one pass in a fixed order: the tables
//! listing, then the checks that need a table name (columns, data, filters),
//! then the checks that do not (missing parameters, unknown table,
//! unsupported methods). Dependent checks are recorded as skipped when no
//! table is available; independent checks always run.
//!
//! ## Invariants
//! - Checks execute sequentially; the recorder is owned by the running task.
//! - Every check label appears at most once per run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::contract::EndpointCatalog;
use crate::contract::EndpointId;
use crate::contract::HttpMethod;
use crate::contract::PARAM_TABLE;
use crate::probe::filter_cases;
use crate::probe::select_probe;
use crate::probe::table_name;
use crate::result::CheckFailure;
use crate::result::CheckResult;
use crate::result::CheckTarget;
use crate::result::RunRecorder;
use crate::result::RunSummary;
use crate::verifier::ContractVerifier;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Table name assumed not to exist on the server under test.
pub const DEFAULT_INVALID_TABLE: &str = "nonexistent_table_12345";
/// Methods sent to `/tables` that must be rejected.
pub const DEFAULT_UNSUPPORTED_METHODS: [HttpMethod; 3] =
    [HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete];
/// Label of the table-selection result recorded for an empty listing.
pub const TABLE_SELECTION_LABEL: &str = "tables.select";
/// Label of the skip result recorded when no filter checks can run.
pub const FILTER_SKIP_LABEL: &str = "table-data.filter";

// ============================================================================
// SECTION: Options
// ============================================================================

/// What an empty `/tables` listing means for the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyTablesPolicy {
    /// Record the dependent checks as skipped and keep the verdict.
    #[default]
    Pass,
    /// Record a critical failure.
    Fail,
}

/// Tunables for a suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOptions {
    /// Table name used by the unknown-table check.
    pub invalid_table: String,
    /// Methods sent to `/tables` expecting 405.
    pub unsupported_methods: Vec<HttpMethod>,
    /// Policy for an empty tables listing.
    pub empty_tables: EmptyTablesPolicy,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            invalid_table: DEFAULT_INVALID_TABLE.to_string(),
            unsupported_methods: DEFAULT_UNSUPPORTED_METHODS.to_vec(),
            empty_tables: EmptyTablesPolicy::default(),
        }
    }
}

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Full verification pass against one target.
pub struct ContractSuite {
    /// Verifier used for every check.
    verifier: ContractVerifier,
    /// Run options.
    options: SuiteOptions,
}

impl ContractSuite {
    /// Creates a suite.
    #[must_use]
    pub const fn new(verifier: ContractVerifier, options: SuiteOptions) -> Self {
        Self {
            verifier,
            options,
        }
    }

    /// Returns the verifier.
    #[must_use]
    pub const fn verifier(&self) -> &ContractVerifier {
        &self.verifier
    }

    /// Returns the run options.
    #[must_use]
    pub const fn options(&self) -> &SuiteOptions {
        &self.options
    }

    /// Runs every check in order and returns the summary.
    pub async fn run(&self) -> RunSummary {
        let mut recorder = RunRecorder::new(self.verifier.target());
        let catalog = self.verifier.catalog();

        let listing = self.verifier.verify_list_endpoint(catalog.tables(), &[]).await;
        recorder.record(listing.result);
        match listing.items {
            Some(items) => match items.first() {
                Some(entry) => {
                    self.run_table_checks(&mut recorder, &table_name(entry)).await;
                }
                None => {
                    if self.options.empty_tables == EmptyTablesPolicy::Fail {
                        recorder.record(
                            CheckTarget::new(
                                TABLE_SELECTION_LABEL,
                                EndpointId::Tables,
                                catalog.tables().method,
                            )
                            .critical(true)
                            .fail(
                                None,
                                None,
                                CheckFailure::ShapeMismatch {
                                    key: catalog.tables().key.to_string(),
                                    detail: "listing returned no tables".to_string(),
                                },
                                None,
                            ),
                        );
                    }
                    skip_dependent_checks(&mut recorder, catalog, "tables listing is empty");
                }
            },
            None => skip_dependent_checks(&mut recorder, catalog, "tables listing failed"),
        }

        self.run_independent_checks(&mut recorder).await;
        recorder.finish()
    }

    /// Runs the column, data, and filter checks for `table`.
    async fn run_table_checks(&self, recorder: &mut RunRecorder, table: &str) {
        let catalog = self.verifier.catalog();
        let params = [(PARAM_TABLE, table)];

        let columns = self.verifier.verify_list_endpoint(catalog.table_columns(), &params).await;
        recorder.record(columns.result);
        let data = self.verifier.verify_list_endpoint(catalog.table_data(), &params).await;
        recorder.record(data.result);

        let probe = match (columns.items, data.items) {
            (Some(columns), Some(rows)) => match probe_inputs(&columns, &rows) {
                Ok(sample) => select_probe(&columns, sample),
                Err(reason) => {
                    recorder.record(filter_skip(catalog, reason));
                    return;
                }
            },
            _ => {
                recorder.record(filter_skip(catalog, "columns or data listing failed"));
                return;
            }
        };
        let Some(probe) = probe else {
            recorder.record(filter_skip(catalog, "no listed column has a usable sample value"));
            return;
        };
        for case in filter_cases(&probe) {
            let result = self
                .verifier
                .verify_filtered_query(catalog.table_data(), table, &probe, &case)
                .await;
            recorder.record(result);
        }
    }

    /// Runs the checks that do not need a table name.
    async fn run_independent_checks(&self, recorder: &mut RunRecorder) {
        let catalog = self.verifier.catalog();
        for spec in [catalog.table_columns(), catalog.table_data()] {
            for param in &spec.required_params {
                recorder.record(self.verifier.verify_required_param(spec, param).await);
            }
        }
        recorder.record(
            self.verifier
                .verify_invalid_resource(catalog.table_data(), &self.options.invalid_table)
                .await,
        );
        for method in &self.options.unsupported_methods {
            recorder
                .record(self.verifier.verify_unsupported_method(catalog.tables(), *method).await);
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the sample row, or the reason filter checks cannot run.
fn probe_inputs<'a>(columns: &[Value], rows: &'a [Value]) -> Result<&'a Value, &'static str> {
    if columns.is_empty() {
        return Err("column listing is empty");
    }
    rows.first().ok_or("table has no sample rows")
}

/// Builds the single skip result standing in for all filter checks.
fn filter_skip(catalog: &EndpointCatalog, reason: &str) -> CheckResult {
    let spec = catalog.table_data();
    CheckTarget::new(FILTER_SKIP_LABEL, spec.id, spec.method).skip(reason)
}

/// Records the table-dependent checks as skipped.
fn skip_dependent_checks(recorder: &mut RunRecorder, catalog: &EndpointCatalog, reason: &str) {
    for spec in [catalog.table_columns(), catalog.table_data()] {
        recorder.record(
            CheckTarget::new(format!("{}.list", spec.id), spec.id, spec.method)
                .critical(spec.critical)
                .skip(reason),
        );
    }
    recorder.record(filter_skip(catalog, reason));
}
