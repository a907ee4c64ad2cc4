// system-tests/tests/helpers/table_api_stub.rs
// ============================================================================
// Module: Table API Stub
// Description: In-process table-viewer server for system-tests.
// Purpose: Serve the table listing contract with switchable deviations.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! The stub serves `/api/tables`, `/api/table-columns`, and `/api/table-data`
//! from a fixture shaped `{ "<table>": [ { <row> }, ... ] }`. With the default
//! [`StubBehavior`] it conforms to the contract; each flag breaks one rule.
//! Requests other than readiness probes are recorded in arrival order.

use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Detail text a server returns when its listing RPC is not installed.
pub const MISSING_RPC_DETAILS: &str =
    "Could not find the function public.get_tables without parameters in the schema cache";

/// Readiness path; answered with 204 and never recorded.
pub const HEALTH_PATH: &str = "/healthz";

/// Contract deviations the stub can be switched into.
#[derive(Debug, Clone, Default)]
pub struct StubBehavior {
    /// Answer every method as if it were GET.
    pub accept_all_methods: bool,
    /// Answer 200 with an empty listing when `table` is missing.
    pub ignore_missing_table: bool,
    /// Return `columns` as an object instead of an array.
    pub columns_as_object: bool,
    /// Answer 500 to any data query carrying a filter.
    pub reject_filters: bool,
    /// Answer the tables listing with the missing-RPC 500.
    pub missing_rpc: bool,
    /// Status for unknown tables (404 when unset).
    pub invalid_table_status: Option<u16>,
    /// Delay before answering the tables listing.
    pub tables_delay: Duration,
}

/// Recorded request metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StubRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, String>,
}

#[derive(Clone)]
struct StubState {
    fixture: Arc<Value>,
    behavior: Arc<StubBehavior>,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

/// Handle for the stub server; shuts the server down on drop.
pub struct TableApiStub {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl TableApiStub {
    /// Returns the base URL (scheme, host, port).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns captured requests in arrival order.
    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }
}

impl Drop for TableApiStub {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a conforming stub serving `fixture`.
pub fn spawn_table_api_stub(fixture: Value) -> Result<TableApiStub, String> {
    spawn_table_api_stub_with(fixture, StubBehavior::default())
}

/// Spawns a stub serving `fixture` with the given deviations.
pub fn spawn_table_api_stub_with(
    fixture: Value,
    behavior: StubBehavior,
) -> Result<TableApiStub, String> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("table stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("table stub listener nonblocking failed: {err}"))?;
    let addr =
        listener.local_addr().map_err(|err| format!("table stub local addr failed: {err}"))?;
    let base_url = format!("http://{addr}");

    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        fixture: Arc::new(fixture),
        behavior: Arc::new(behavior),
        requests: Arc::clone(&requests),
    };
    let app = Router::new().fallback(handle_request).with_state(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(TableApiStub {
        base_url,
        shutdown: Some(shutdown_tx),
        join: Some(join),
        requests,
    })
}

async fn handle_request(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    if uri.path() == HEALTH_PATH {
        return StatusCode::NO_CONTENT.into_response();
    }
    if let Ok(mut entries) = state.requests.lock() {
        entries.push(StubRequest {
            method: method.as_str().to_string(),
            path: uri.path().to_string(),
            query: query.clone(),
        });
    }
    let behavior = state.behavior.as_ref();
    if method != Method::GET && !behavior.accept_all_methods {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }
    match uri.path() {
        "/api/tables" => {
            if !behavior.tables_delay.is_zero() {
                sleep(behavior.tables_delay).await;
            }
            list_tables(&state)
        }
        path @ ("/api/table-columns" | "/api/table-data") => {
            table_listing(&state, path == "/api/table-columns", &query)
        }
        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    }
}

fn list_tables(state: &StubState) -> Response {
    if state.behavior.missing_rpc {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch tables", "details": MISSING_RPC_DETAILS })),
        )
            .into_response();
    }
    let names: Vec<Value> = state
        .fixture
        .as_object()
        .map(|tables| tables.keys().map(|name| json!({ "table_name": name })).collect())
        .unwrap_or_default();
    Json(json!({ "tables": names })).into_response()
}

fn table_listing(
    state: &StubState,
    columns: bool,
    query: &BTreeMap<String, String>,
) -> Response {
    let behavior = state.behavior.as_ref();
    let Some(table) = query.get("table") else {
        if behavior.ignore_missing_table {
            let empty = if columns { json!({ "columns": [] }) } else { json!({ "data": [] }) };
            return Json(empty).into_response();
        }
        return error_response(StatusCode::BAD_REQUEST, "Table name is required");
    };
    let Some(rows) = state.fixture.get(table).and_then(Value::as_array) else {
        let status = behavior
            .invalid_table_status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::NOT_FOUND);
        return error_response(status, "Table not found");
    };
    if columns {
        let names: Vec<&String> = rows
            .first()
            .and_then(Value::as_object)
            .map(|row| row.keys().collect())
            .unwrap_or_default();
        if behavior.columns_as_object {
            let shape: serde_json::Map<String, Value> =
                names.into_iter().map(|name| (name.clone(), json!("text"))).collect();
            return Json(json!({ "columns": shape })).into_response();
        }
        let listing: Vec<Value> =
            names.into_iter().map(|name| json!({ "column_name": name })).collect();
        return Json(json!({ "columns": listing })).into_response();
    }
    let filter = (query.get("filterColumn"), query.get("filterValue"), query.get("filterType"));
    let (Some(column), Some(value), Some(filter_type)) = filter else {
        return Json(json!({ "data": rows })).into_response();
    };
    if behavior.reject_filters {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch table data");
    }
    let data: Vec<&Value> =
        rows.iter().filter(|row| row_matches(row, column, value, filter_type)).collect();
    Json(json!({ "data": data })).into_response()
}

fn row_matches(row: &Value, column: &str, value: &str, filter_type: &str) -> bool {
    let Some(cell) = row.get(column) else {
        return false;
    };
    let text = match cell {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    let number = |raw: &str| raw.trim().parse::<f64>().ok();
    match filter_type {
        "contains" => text.to_lowercase().contains(&value.to_lowercase()),
        "equals" => text == value,
        "greaterThan" => matches!((number(&text), number(value)), (Some(a), Some(b)) if a > b),
        "lessThan" => matches!((number(&text), number(value)), (Some(a), Some(b)) if a < b),
        _ => false,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
