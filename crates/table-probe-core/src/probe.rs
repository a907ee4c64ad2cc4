// crates/table-probe-core/src/probe.rs
// ============================================================================
// Module: Probe Selection
// Description: Deterministic choice of the column/value that drives filters.
// Purpose: Turn a column listing and a sample row into filter test cases.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Filter checks need a column and a value known to exist in the table. The
//! selection walks the column listing in order against the first sample row:
//! the first non-empty string value wins; failing that, the first non-null
//! value of any type; failing that, there is no probe and filter checks are
//! skipped.
//!
//! ## Invariants
//! - Selection depends only on its inputs (listing order, row contents).
//! - `greaterThan`/`lessThan` cases are produced only for numeric values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::contract::FilterType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field carrying a column name in `/table-columns` entries.
pub const COLUMN_NAME_FIELD: &str = "column_name";
/// Field carrying a table name in `/tables` entries.
pub const TABLE_NAME_FIELD: &str = "table_name";
/// Prefix length used for `contains` probes on longer strings.
const CONTAINS_PREFIX_CHARS: usize = 3;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Column and sample value chosen to drive filter checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Probe {
    /// Column name.
    pub column: String,
    /// Value sampled from the first row.
    pub value: Value,
}

/// One filter query derived from a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCase {
    /// Operator sent as `filterType`.
    pub filter_type: FilterType,
    /// Operand sent as `filterValue`.
    pub value: String,
}

// ============================================================================
// SECTION: Listing Helpers
// ============================================================================

/// Extracts a table name from a `/tables` entry.
///
/// Objects yield their `table_name` field; strings yield themselves; anything
/// else yields its JSON text.
#[must_use]
pub fn table_name(entry: &Value) -> String {
    match entry {
        Value::Object(map) => {
            map.get(TABLE_NAME_FIELD).map_or_else(|| entry.to_string(), value_text)
        }
        other => value_text(other),
    }
}

/// Extracts column names from a `/table-columns` listing, in order.
///
/// Entries may be objects with `column_name` or bare strings; other entries
/// are ignored.
#[must_use]
pub fn column_names(columns: &[Value]) -> Vec<String> {
    columns
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(map) => map.get(COLUMN_NAME_FIELD).and_then(Value::as_str),
            Value::String(name) => Some(name.as_str()),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Selects the probe column/value from a column listing and a sample row.
///
/// Returns `None` when the row is not an object or no listed column holds a
/// non-null value.
#[must_use]
pub fn select_probe(columns: &[Value], sample_row: &Value) -> Option<Probe> {
    let row = sample_row.as_object()?;
    let names = column_names(columns);
    let candidates: Vec<(&String, &Value)> =
        names.iter().filter_map(|name| row.get(name).map(|value| (name, value))).collect();

    candidates
        .iter()
        .find(|(_, value)| value.as_str().is_some_and(|text| !text.is_empty()))
        .or_else(|| candidates.iter().find(|(_, value)| !value.is_null()))
        .map(|(name, value)| Probe {
            column: (*name).clone(),
            value: (*value).clone(),
        })
}

/// Builds the filter cases for a probe, in execution order.
#[must_use]
pub fn filter_cases(probe: &Probe) -> Vec<FilterCase> {
    let text = value_text(&probe.value);
    let contains = match &probe.value {
        Value::String(value) if value.chars().count() > CONTAINS_PREFIX_CHARS => {
            value.chars().take(CONTAINS_PREFIX_CHARS).collect()
        }
        _ => text.clone(),
    };
    let mut cases = vec![
        FilterCase {
            filter_type: FilterType::Contains,
            value: contains,
        },
        FilterCase {
            filter_type: FilterType::Equals,
            value: text,
        },
    ];
    if let Some(number) = numeric_value(&probe.value) {
        cases.push(FilterCase {
            filter_type: FilterType::GreaterThan,
            value: format_number(number - 1.0),
        });
        cases.push(FilterCase {
            filter_type: FilterType::LessThan,
            value: format_number(number + 1.0),
        });
    }
    cases
}

// ============================================================================
// SECTION: Value Helpers
// ============================================================================

/// Renders a JSON value as query-string text (strings unquoted).
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Returns the numeric value of a JSON number or numeric string.
#[must_use]
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Formats a float without a trailing `.0` for integral values.
fn format_number(value: f64) -> String {
    format!("{value}")
}
