// system-tests/tests/suites/failure_modes.rs
// ============================================================================
// Module: Failure Mode Tests
// Description: Contract runs against servers that break one rule each.
// Purpose: Ensure deviations map to the right outcome, failure kind, and verdict.
// Dependencies: system-tests helpers, table-probe-core
// ============================================================================

//! ## Overview
//! Each test switches the table-viewer stub into one deviation and asserts
//! the affected checks, their failure kinds, and whether the run verdict
//! flips. Only critical listing failures fail the run.

use std::time::Duration;

use helpers::artifacts::TestReporter;
use helpers::probe::build_suite;
use helpers::probe::catalog_fixture;
use helpers::probe::outcome_of;
use helpers::probe::probe_config;
use helpers::probe::probe_config_with;
use helpers::probe::run_suite;
use helpers::table_api_stub::StubBehavior;
use helpers::table_api_stub::spawn_table_api_stub;
use helpers::table_api_stub::spawn_table_api_stub_with;
use serde_json::json;
use table_probe_core::CheckOutcome;
use table_probe_core::EmptyTablesPolicy;
use table_probe_core::EndpointId;
use table_probe_core::RunSummary;
use table_probe_core::RunVerdict;

use crate::helpers;

/// Returns the failure kind recorded for `label`, if it failed.
fn failure_kind(summary: &RunSummary, label: &str) -> Option<&'static str> {
    summary.check(label)?.outcome().failure().map(|failure| failure.kind())
}

#[tokio::test(flavor = "multi_thread")]
async fn accepted_methods_fail_method_checks_only() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("accepted_methods_fail_method_checks_only")?;
    let stub = spawn_table_api_stub_with(
        catalog_fixture(),
        StubBehavior {
            accept_all_methods: true,
            ..StubBehavior::default()
        },
    )?;
    let summary = run_suite(&probe_config(stub.base_url())?, None).await?;
    reporter.artifacts().write_json("run_summary.json", &summary)?;

    for label in ["tables.method.post", "tables.method.put", "tables.method.delete"] {
        assert_eq!(failure_kind(&summary, label), Some("unexpected_status"), "{label}");
    }
    let post = summary.check("tables.method.post").ok_or("missing post check")?;
    assert_eq!(post.status(), Some(200));
    assert_eq!(summary.counts().failed, 3);
    assert_eq!(summary.verdict(), RunVerdict::Pass);

    reporter.finish(
        "pass",
        vec!["method checks failed without failing the run".to_string()],
        vec!["run_summary.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn ignored_table_param_fails_required_param_checks() -> Result<(), Box<dyn std::error::Error>>
{
    let mut reporter = TestReporter::new("ignored_table_param_fails_required_param_checks")?;
    let stub = spawn_table_api_stub_with(
        catalog_fixture(),
        StubBehavior {
            ignore_missing_table: true,
            ..StubBehavior::default()
        },
    )?;
    let summary = run_suite(&probe_config(stub.base_url())?, None).await?;
    reporter.artifacts().write_json("run_summary.json", &summary)?;

    for label in ["table-columns.missing-param.table", "table-data.missing-param.table"] {
        assert_eq!(failure_kind(&summary, label), Some("unexpected_status"), "{label}");
    }
    assert_eq!(summary.verdict(), RunVerdict::Pass);

    reporter.finish(
        "pass",
        vec!["missing table param accepted with 200".to_string()],
        vec!["run_summary.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn object_columns_fail_shape_and_skip_filters() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("object_columns_fail_shape_and_skip_filters")?;
    let stub = spawn_table_api_stub_with(
        catalog_fixture(),
        StubBehavior {
            columns_as_object: true,
            ..StubBehavior::default()
        },
    )?;
    let config = probe_config_with(stub.base_url(), |config| {
        config.checks.critical = vec![EndpointId::Tables, EndpointId::TableColumns];
    })?;
    let summary = run_suite(&config, None).await?;
    reporter.artifacts().write_json("run_summary.json", &summary)?;

    let columns = summary.check("table-columns.list").ok_or("missing columns check")?;
    assert_eq!(failure_kind(&summary, "table-columns.list"), Some("shape_mismatch"));
    assert!(columns.message().contains("expected array, got object"), "{}", columns.message());
    assert!(columns.is_critical());
    assert_eq!(outcome_of(&summary, "table-data.list"), "pass");
    let filter = summary.check("table-data.filter").ok_or("missing filter skip")?;
    assert_eq!(filter.outcome(), &CheckOutcome::Skipped);
    assert_eq!(filter.message(), "columns or data listing failed");
    assert_eq!(summary.verdict(), RunVerdict::Fail);

    reporter.finish(
        "pass",
        vec!["critical columns shape mismatch failed the run".to_string()],
        vec!["run_summary.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_filters_fail_filter_checks() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("rejected_filters_fail_filter_checks")?;
    let stub = spawn_table_api_stub_with(
        catalog_fixture(),
        StubBehavior {
            reject_filters: true,
            ..StubBehavior::default()
        },
    )?;
    let summary = run_suite(&probe_config(stub.base_url())?, None).await?;
    reporter.artifacts().write_json("run_summary.json", &summary)?;

    assert_eq!(outcome_of(&summary, "table-data.list"), "pass");
    for label in ["table-data.filter.contains", "table-data.filter.equals"] {
        assert_eq!(failure_kind(&summary, label), Some("unexpected_status"), "{label}");
    }
    assert_eq!(summary.verdict(), RunVerdict::Pass);

    reporter.finish(
        "pass",
        vec!["filter failures reported per operator".to_string()],
        vec!["run_summary.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_table_status_maps_to_pass_or_warn() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("invalid_table_status_maps_to_pass_or_warn")?;
    let mut notes = Vec::new();
    for (status, expected) in [(404, "pass"), (500, "pass"), (200, "warn"), (403, "warn")] {
        let stub = spawn_table_api_stub_with(
            catalog_fixture(),
            StubBehavior {
                invalid_table_status: Some(status),
                ..StubBehavior::default()
            },
        )?;
        let summary = run_suite(&probe_config(stub.base_url())?, None).await?;
        assert_eq!(outcome_of(&summary, "table-data.invalid-table"), expected, "status {status}");
        assert_eq!(summary.verdict(), RunVerdict::Pass);
        notes.push(format!("invalid table status {status} -> {expected}"));
    }

    reporter.finish("pass", notes, Vec::new())?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_rpc_fails_run_and_warns_ping() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("missing_rpc_fails_run_and_warns_ping")?;
    let stub = spawn_table_api_stub_with(
        catalog_fixture(),
        StubBehavior {
            missing_rpc: true,
            ..StubBehavior::default()
        },
    )?;
    let config = probe_config(stub.base_url())?;
    let suite = build_suite(&config, None)?;
    let summary = suite.run().await;
    reporter.artifacts().write_json("run_summary.json", &summary)?;

    assert_eq!(failure_kind(&summary, "tables.list"), Some("unexpected_status"));
    for label in ["table-columns.list", "table-data.list", "table-data.filter"] {
        let check = summary.check(label).ok_or("missing dependent check")?;
        assert_eq!(check.outcome(), &CheckOutcome::Skipped, "{label}");
        assert_eq!(check.message(), "tables listing failed");
    }
    assert_eq!(outcome_of(&summary, "table-data.invalid-table"), "pass");
    assert_eq!(summary.verdict(), RunVerdict::Fail);

    let ping = suite.verifier().verify_connectivity().await;
    assert_eq!(ping.label(), "tables.ping");
    assert_eq!(ping.outcome(), &CheckOutcome::Warned);
    assert_eq!(ping.status(), Some(500));

    reporter.finish(
        "pass",
        vec!["missing listing RPC is a run failure and a ping warning".to_string()],
        vec!["run_summary.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_tables_listing_times_out() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("slow_tables_listing_times_out")?;
    let stub = spawn_table_api_stub_with(
        catalog_fixture(),
        StubBehavior {
            tables_delay: Duration::from_secs(3),
            ..StubBehavior::default()
        },
    )?;
    let config = probe_config_with(stub.base_url(), |config| {
        config.target.timeout_secs = 1;
    })?;
    let summary = run_suite(&config, None).await?;
    reporter.artifacts().write_json("run_summary.json", &summary)?;

    assert_eq!(failure_kind(&summary, "tables.list"), Some("transport_error"));
    let tables = summary.check("tables.list").ok_or("missing tables check")?;
    assert_eq!(tables.status(), None);
    assert_eq!(summary.verdict(), RunVerdict::Fail);

    reporter.finish(
        "pass",
        vec!["timeout reported as transport error".to_string()],
        vec!["run_summary.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_tables_follow_configured_policy() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("empty_tables_follow_configured_policy")?;
    let stub = spawn_table_api_stub(json!({}))?;

    let lenient = run_suite(&probe_config(stub.base_url())?, None).await?;
    assert_eq!(outcome_of(&lenient, "tables.list"), "pass");
    assert!(lenient.check("tables.select").is_none());
    let columns = lenient.check("table-columns.list").ok_or("missing columns skip")?;
    assert_eq!(columns.message(), "tables listing is empty");
    assert_eq!(lenient.verdict(), RunVerdict::Pass);

    let strict_config = probe_config_with(stub.base_url(), |config| {
        config.checks.empty_tables = EmptyTablesPolicy::Fail;
    })?;
    let strict = run_suite(&strict_config, None).await?;
    assert_eq!(failure_kind(&strict, "tables.select"), Some("shape_mismatch"));
    assert_eq!(strict.verdict(), RunVerdict::Fail);

    reporter.artifacts().write_json("lenient_summary.json", &lenient)?;
    reporter.artifacts().write_json("strict_summary.json", &strict)?;
    reporter.finish(
        "pass",
        vec!["empty listing passes by default and fails under the strict policy".to_string()],
        vec!["lenient_summary.json".to_string(), "strict_summary.json".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_api_prefix_fails_tables_listing() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("wrong_api_prefix_fails_tables_listing")?;
    let stub = spawn_table_api_stub(catalog_fixture())?;
    let config = probe_config_with(stub.base_url(), |config| {
        config.target.api_prefix = "/v2".to_string();
    })?;
    let summary = run_suite(&config, None).await?;
    reporter.artifacts().write_json("run_summary.json", &summary)?;

    let tables = summary.check("tables.list").ok_or("missing tables check")?;
    assert_eq!(tables.status(), Some(404));
    assert_eq!(failure_kind(&summary, "tables.list"), Some("unexpected_status"));
    assert!(stub.requests().iter().all(|request| request.path.starts_with("/v2/")));
    assert_eq!(summary.verdict(), RunVerdict::Fail);

    reporter.finish(
        "pass",
        vec!["requests honored the configured prefix".to_string()],
        vec!["run_summary.json".to_string()],
    )?;
    Ok(())
}
