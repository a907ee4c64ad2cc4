// crates/table-probe-core/src/verifier.rs
// ============================================================================
// Module: Contract Verifier
// Description: Individual contract checks against a live table-viewer API.
// Purpose: Turn one HTTP exchange into one terminal check result.
// Dependencies: serde_json, crate::client, crate::events, crate::result
// ============================================================================

//! ## Overview
//! [`ContractVerifier`] owns the HTTP client, the endpoint catalog, and an
//! event sink. Each `verify_*` operation sends exactly one request and returns
//! exactly one [`CheckResult`]; transport and decoding errors are folded into
//! the result instead of propagating, so callers never need to unwind a run.
//!
//! Security posture: response bodies are untrusted; only short previews are
//! echoed into messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::client::ContractClient;
use crate::client::HttpExchange;
use crate::contract::EndpointCatalog;
use crate::contract::EndpointSpec;
use crate::contract::FilterType;
use crate::contract::HttpMethod;
use crate::contract::PARAM_FILTER_COLUMN;
use crate::contract::PARAM_FILTER_TYPE;
use crate::contract::PARAM_FILTER_VALUE;
use crate::contract::PARAM_TABLE;
use crate::events::ProbeEvent;
use crate::events::ProbeEventParams;
use crate::events::ProbeEventSink;
use crate::probe::FilterCase;
use crate::probe::Probe;
use crate::probe::numeric_value;
use crate::result::BodyShape;
use crate::result::CheckFailure;
use crate::result::CheckResult;
use crate::result::CheckTarget;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status expected when a required parameter is missing.
pub const MISSING_PARAM_STATUS: u16 = 400;
/// Status expected for unsupported methods.
pub const METHOD_NOT_ALLOWED_STATUS: u16 = 405;
/// Statuses accepted for an unknown table.
pub const INVALID_RESOURCE_STATUSES: [u16; 2] = [404, 500];
/// Error detail the backend reports when its `get_tables` RPC fallback is absent.
pub const MISSING_RPC_MARKER: &str = "Could not find the function public.get_tables";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of a listing check, plus the listed items when it passed.
#[derive(Debug, Clone)]
pub struct ListingCheck {
    /// Terminal check result.
    pub result: CheckResult,
    /// Decoded sequence on success.
    pub items: Option<Vec<Value>>,
}

/// Drives individual contract checks against one target.
pub struct ContractVerifier {
    /// HTTP client for the target.
    client: ContractClient,
    /// Endpoint catalog.
    catalog: EndpointCatalog,
    /// Event sink for request events.
    sink: Arc<dyn ProbeEventSink>,
}

impl ContractVerifier {
    /// Creates a verifier.
    #[must_use]
    pub fn new(
        client: ContractClient,
        catalog: EndpointCatalog,
        sink: Arc<dyn ProbeEventSink>,
    ) -> Self {
        Self {
            client,
            catalog,
            sink,
        }
    }

    /// Returns the endpoint catalog.
    #[must_use]
    pub const fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    /// Returns the target base URL.
    #[must_use]
    pub fn target(&self) -> &str {
        self.client.base_url()
    }

    // ------------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------------

    /// Sends GET to `spec.path` with `params` and expects `spec.success_status`
    /// plus a JSON object whose `spec.key` holds a sequence.
    pub async fn verify_list_endpoint(
        &self,
        spec: &EndpointSpec,
        params: &[(&str, &str)],
    ) -> ListingCheck {
        let target = CheckTarget::new(format!("{}.list", spec.id), spec.id, spec.method)
            .critical(spec.critical);
        let exchange = match self.client.send(spec.method, &spec.path, params).await {
            Ok(exchange) => exchange,
            Err(err) => {
                let result = target.fail(None, None, err.into(), None);
                return ListingCheck {
                    result: self.emit(result, &spec.path, None),
                    items: None,
                };
            }
        };
        let (result, items) = match decode_expected(&exchange, &[spec.success_status]) {
            Ok(body) => match expect_container(&body, spec) {
                Ok(items) => {
                    let message = format!("found {} {}", items.len(), spec.key);
                    (target.pass(exchange.status, BodyShape::of_value(&body), message), Some(items))
                }
                Err(failure) => (
                    target.fail(
                        Some(exchange.status),
                        Some(BodyShape::of_value(&body)),
                        failure,
                        None,
                    ),
                    None,
                ),
            },
            Err((failure, detail)) => (
                target.fail(
                    Some(exchange.status),
                    Some(BodyShape::of_bytes(&exchange.body)),
                    failure,
                    detail,
                ),
                None,
            ),
        };
        ListingCheck {
            result: self.emit(result, &spec.path, Some(&exchange)),
            items,
        }
    }

    // ------------------------------------------------------------------------
    // Error Contracts
    // ------------------------------------------------------------------------

    /// Sends GET without query parameters, so `param` is absent, and expects 400.
    pub async fn verify_required_param(&self, spec: &EndpointSpec, param: &str) -> CheckResult {
        let target =
            CheckTarget::new(format!("{}.missing-param.{param}", spec.id), spec.id, spec.method);
        if !spec.required_params.contains(&param) {
            return target.skip(format!("`{param}` is not a required parameter of {}", spec.path));
        }
        self.expect_status(target, spec.method, &spec.path, &[], &[MISSING_PARAM_STATUS], || {
            format!("returned {MISSING_PARAM_STATUS} without `{param}`")
        })
        .await
    }

    /// Sends `method` (which must differ from the spec's method) and expects 405.
    pub async fn verify_unsupported_method(
        &self,
        spec: &EndpointSpec,
        method: HttpMethod,
    ) -> CheckResult {
        let label = format!("{}.method.{}", spec.id, method.as_str().to_ascii_lowercase());
        let target = CheckTarget::new(label, spec.id, method);
        if method == spec.method {
            return target.skip(format!("{method} is the supported method of {}", spec.path));
        }
        self.expect_status(target, method, &spec.path, &[], &[METHOD_NOT_ALLOWED_STATUS], || {
            format!("{method} correctly rejected with {METHOD_NOT_ALLOWED_STATUS}")
        })
        .await
    }

    /// Sends GET naming a table that does not exist and expects 404 or 500.
    ///
    /// Any other status is a warning rather than a failure; transport errors
    /// still fail.
    pub async fn verify_invalid_resource(
        &self,
        spec: &EndpointSpec,
        bad_identifier: &str,
    ) -> CheckResult {
        let target = CheckTarget::new(format!("{}.invalid-table", spec.id), spec.id, spec.method);
        let params = [(PARAM_TABLE, bad_identifier)];
        let exchange = match self.client.send(spec.method, &spec.path, &params).await {
            Ok(exchange) => exchange,
            Err(err) => {
                let result = target.fail(None, None, err.into(), None);
                return self.emit(result, &spec.path, None);
            }
        };
        let shape = BodyShape::of_bytes(&exchange.body);
        let result = if INVALID_RESOURCE_STATUSES.contains(&exchange.status) {
            target.pass(
                exchange.status,
                shape,
                format!("unknown table `{bad_identifier}` rejected with {}", exchange.status),
            )
        } else {
            target.warn(
                Some(exchange.status),
                Some(shape),
                format!(
                    "unexpected status {} for unknown table `{bad_identifier}` (expected 404|500)",
                    exchange.status
                ),
            )
        };
        self.emit(result, &spec.path, Some(&exchange))
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    /// Sends GET with `filterColumn`, `filterValue`, and `filterType` and
    /// expects 200 plus a `data` sequence.
    ///
    /// An `equals` case built from a sampled value must return at least one
    /// row; an empty result is a shape mismatch.
    pub async fn verify_filtered_query(
        &self,
        spec: &EndpointSpec,
        table: &str,
        probe: &Probe,
        case: &FilterCase,
    ) -> CheckResult {
        let target = CheckTarget::new(
            format!("{}.filter.{}", spec.id, case.filter_type),
            spec.id,
            spec.method,
        );
        if case.filter_type.numeric_only() && numeric_value(&probe.value).is_none() {
            return target.skip(format!(
                "`{}` requires a numeric value; `{}` is not numeric",
                case.filter_type, probe.column
            ));
        }
        let params = [
            (PARAM_TABLE, table),
            (PARAM_FILTER_COLUMN, probe.column.as_str()),
            (PARAM_FILTER_VALUE, case.value.as_str()),
            (PARAM_FILTER_TYPE, case.filter_type.as_str()),
        ];
        let exchange = match self.client.send(spec.method, &spec.path, &params).await {
            Ok(exchange) => exchange,
            Err(err) => {
                let result = target.fail(None, None, err.into(), None);
                return self.emit(result, &spec.path, None);
            }
        };
        let result = match decode_expected(&exchange, &[spec.success_status]) {
            Ok(body) => {
                let shape = BodyShape::of_value(&body);
                match expect_container(&body, spec) {
                    Ok(rows) if rows.is_empty() && case.filter_type == FilterType::Equals => target
                        .fail(
                            Some(exchange.status),
                            Some(shape),
                            CheckFailure::ShapeMismatch {
                                key: spec.key.to_string(),
                                detail: format!(
                                    "equals on `{}` returned no rows for a sampled value",
                                    probe.column
                                ),
                            },
                            None,
                        ),
                    Ok(rows) => target.pass(
                        exchange.status,
                        shape,
                        format!(
                            "{} `{}` on `{}` returned {} rows",
                            case.filter_type,
                            case.value,
                            probe.column,
                            rows.len()
                        ),
                    ),
                    Err(failure) => target.fail(Some(exchange.status), Some(shape), failure, None),
                }
            }
            Err((failure, detail)) => target.fail(
                Some(exchange.status),
                Some(BodyShape::of_bytes(&exchange.body)),
                failure,
                detail,
            ),
        };
        self.emit(result, &spec.path, Some(&exchange))
    }

    // ------------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------------

    /// Issues one GET to the tables endpoint and classifies reachability.
    ///
    /// A 500 naming the missing `get_tables` RPC means the backend is reachable
    /// but its fallback query is not installed; that is a warning.
    pub async fn verify_connectivity(&self) -> CheckResult {
        let spec = self.catalog.tables();
        let target =
            CheckTarget::new(format!("{}.ping", spec.id), spec.id, spec.method).critical(true);
        let exchange = match self.client.send(spec.method, &spec.path, &[]).await {
            Ok(exchange) => exchange,
            Err(err) => {
                let result = target.fail(None, None, err.into(), None);
                return self.emit(result, &spec.path, None);
            }
        };
        let shape = BodyShape::of_bytes(&exchange.body);
        let result = match exchange.status {
            status if status == spec.success_status => {
                target.pass(status, shape, "tables endpoint reachable")
            }
            500 if mentions_missing_rpc(&exchange) => target.warn(
                Some(500),
                Some(shape),
                "backend reachable, but the get_tables RPC function does not exist",
            ),
            status => target.fail(
                Some(status),
                Some(shape),
                CheckFailure::UnexpectedStatus {
                    expected: vec![spec.success_status],
                    actual: status,
                },
                preview_detail(&exchange),
            ),
        };
        self.emit(result, &spec.path, Some(&exchange))
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Sends a request and passes when the status is in `expected`.
    async fn expect_status(
        &self,
        target: CheckTarget,
        method: HttpMethod,
        path: &str,
        params: &[(&str, &str)],
        expected: &[u16],
        pass_message: impl FnOnce() -> String,
    ) -> CheckResult {
        let exchange = match self.client.send(method, path, params).await {
            Ok(exchange) => exchange,
            Err(err) => {
                let result = target.fail(None, None, err.into(), None);
                return self.emit(result, path, None);
            }
        };
        let shape = BodyShape::of_bytes(&exchange.body);
        let result = if expected.contains(&exchange.status) {
            target.pass(exchange.status, shape, pass_message())
        } else {
            target.fail(
                Some(exchange.status),
                Some(shape),
                CheckFailure::UnexpectedStatus {
                    expected: expected.to_vec(),
                    actual: exchange.status,
                },
                None,
            )
        };
        self.emit(result, path, Some(&exchange))
    }

    /// Records the request event for a finished check and hands the result back.
    fn emit(
        &self,
        result: CheckResult,
        path: &str,
        exchange: Option<&HttpExchange>,
    ) -> CheckResult {
        let event = ProbeEvent::new(ProbeEventParams {
            check: result.label().to_string(),
            method: result.method(),
            path: path.to_string(),
            status: result.status(),
            outcome: result.outcome().as_str(),
            error_kind: result.outcome().failure().map(CheckFailure::kind),
            latency_ms: exchange.map_or(0, |exchange| exchange.latency.as_millis()),
            response_bytes: exchange.map_or(0, |exchange| exchange.body.len()),
        });
        self.sink.record(&event);
        result
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks the status against `expected` and decodes the body as JSON.
///
/// On failure returns the failure and an optional diagnostic detail.
fn decode_expected(
    exchange: &HttpExchange,
    expected: &[u16],
) -> Result<Value, (CheckFailure, Option<String>)> {
    if !expected.contains(&exchange.status) {
        return Err((
            CheckFailure::UnexpectedStatus {
                expected: expected.to_vec(),
                actual: exchange.status,
            },
            preview_detail(exchange),
        ));
    }
    exchange.json().map_err(|err| (err.into(), None))
}

/// Requires `body` to be an object whose `spec.key` holds `spec.container`.
fn expect_container(body: &Value, spec: &EndpointSpec) -> Result<Vec<Value>, CheckFailure> {
    let key = spec.key;
    let Some(object) = body.as_object() else {
        return Err(CheckFailure::ShapeMismatch {
            key: key.to_string(),
            detail: format!("expected a JSON object, got {}", json_type(body)),
        });
    };
    match object.get(key) {
        Some(value) => spec.container.items(value).cloned().ok_or_else(|| {
            CheckFailure::ShapeMismatch {
                key: key.to_string(),
                detail: format!("expected {}, got {}", spec.container.as_str(), json_type(value)),
            }
        }),
        None => Err(CheckFailure::ShapeMismatch {
            key: key.to_string(),
            detail: "key missing".to_string(),
        }),
    }
}

/// Returns a JSON type name for messages.
const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds a `body: ...` detail when the response carried a body.
fn preview_detail(exchange: &HttpExchange) -> Option<String> {
    let preview = exchange.body_preview();
    if preview.is_empty() { None } else { Some(format!("body: {preview}")) }
}

/// Returns true when a 500 body names the missing `get_tables` RPC.
fn mentions_missing_rpc(exchange: &HttpExchange) -> bool {
    exchange.json().ok().is_some_and(|body| {
        body.get("details")
            .and_then(Value::as_str)
            .is_some_and(|details| details.contains(MISSING_RPC_MARKER))
    })
}
