// crates/table-probe-core/src/contract.rs
// ============================================================================
// Module: Endpoint Contracts
// Description: Static descriptions of the table-viewer HTTP contract points.
// Purpose: Define endpoint specs, HTTP methods, and filter types used by checks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`EndpointSpec`] describes one HTTP contract point: where it lives, which
//! query parameters it requires, and the JSON key/container its success body
//! must carry. The [`EndpointCatalog`] bundles the three table-viewer
//! endpoints and is built once at startup.
//!
//! ## Invariants
//! - Specs are immutable after catalog construction.
//! - Paths always start with `/` and never end with `/`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default API prefix for table-viewer endpoints.
pub const DEFAULT_API_PREFIX: &str = "/api";
/// Query parameter naming the target table.
pub const PARAM_TABLE: &str = "table";
/// Query parameter naming the filtered column.
pub const PARAM_FILTER_COLUMN: &str = "filterColumn";
/// Query parameter carrying the filter operand.
pub const PARAM_FILTER_VALUE: &str = "filterValue";
/// Query parameter selecting the filter operator.
pub const PARAM_FILTER_TYPE: &str = "filterType";

// ============================================================================
// SECTION: HTTP Methods
// ============================================================================

/// HTTP methods the verifier knows how to send.
///
/// # Invariants
/// - Variants serialize as upper-case method tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns the canonical method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Endpoint Identity
// ============================================================================

/// Identifiers for the endpoints in the table-viewer contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointId {
    /// `/tables` listing.
    Tables,
    /// `/table-columns` listing.
    TableColumns,
    /// `/table-data` listing with optional filters.
    TableData,
}

impl EndpointId {
    /// All endpoint identifiers in catalog order.
    pub const ALL: [Self; 3] = [Self::Tables, Self::TableColumns, Self::TableData];

    /// Returns the stable endpoint label (also the path segment).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tables => "tables",
            Self::TableColumns => "table-columns",
            Self::TableData => "table-data",
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Filter Types
// ============================================================================

/// Filter operators accepted by `/table-data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Substring match.
    Contains,
    /// Exact match.
    Equals,
    /// Numeric strict greater-than.
    GreaterThan,
    /// Numeric strict less-than.
    LessThan,
}

impl FilterType {
    /// Returns the wire token sent as `filterType`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
        }
    }

    /// Returns true when the operator only applies to numeric operands.
    #[must_use]
    pub const fn numeric_only(self) -> bool {
        matches!(self, Self::GreaterThan | Self::LessThan)
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Endpoint Specs
// ============================================================================

/// Container type expected under a response key.
///
/// Every table-viewer listing carries a sequence; the kind is kept on the
/// spec so shape messages name what was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// JSON array.
    Sequence,
}

impl ContainerKind {
    /// Returns a short label for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequence => "array",
        }
    }

    /// Returns the items when the JSON value has this container type.
    #[must_use]
    pub fn items(self, value: &serde_json::Value) -> Option<&Vec<serde_json::Value>> {
        match self {
            Self::Sequence => value.as_array(),
        }
    }
}

/// Static description of one HTTP contract point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Endpoint identifier.
    pub id: EndpointId,
    /// Absolute request path (including the API prefix).
    pub path: String,
    /// Supported method.
    pub method: HttpMethod,
    /// Query parameters the endpoint requires.
    pub required_params: Vec<&'static str>,
    /// Status returned on success.
    pub success_status: u16,
    /// Key the success body must carry.
    pub key: &'static str,
    /// Container type expected under `key`.
    pub container: ContainerKind,
    /// Whether a failed listing check fails the run.
    pub critical: bool,
}

/// The table-viewer endpoints, built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCatalog {
    /// `/tables` spec.
    tables: EndpointSpec,
    /// `/table-columns` spec.
    table_columns: EndpointSpec,
    /// `/table-data` spec.
    table_data: EndpointSpec,
}

impl EndpointCatalog {
    /// Builds the table-viewer catalog under `api_prefix`, marking the listed
    /// endpoints critical.
    #[must_use]
    pub fn table_viewer(api_prefix: &str, critical: &[EndpointId]) -> Self {
        let prefix = normalize_prefix(api_prefix);
        let spec = |id: EndpointId, required_params: Vec<&'static str>, key: &'static str| {
            EndpointSpec {
                id,
                path: format!("{prefix}/{}", id.as_str()),
                method: HttpMethod::Get,
                required_params,
                success_status: 200,
                key,
                container: ContainerKind::Sequence,
                critical: critical.contains(&id),
            }
        };
        Self {
            tables: spec(EndpointId::Tables, Vec::new(), "tables"),
            table_columns: spec(EndpointId::TableColumns, vec![PARAM_TABLE], "columns"),
            table_data: spec(EndpointId::TableData, vec![PARAM_TABLE], "data"),
        }
    }

    /// Returns the spec for an endpoint.
    #[must_use]
    pub const fn get(&self, id: EndpointId) -> &EndpointSpec {
        match id {
            EndpointId::Tables => &self.tables,
            EndpointId::TableColumns => &self.table_columns,
            EndpointId::TableData => &self.table_data,
        }
    }

    /// Returns the `/tables` spec.
    #[must_use]
    pub const fn tables(&self) -> &EndpointSpec {
        &self.tables
    }

    /// Returns the `/table-columns` spec.
    #[must_use]
    pub const fn table_columns(&self) -> &EndpointSpec {
        &self.table_columns
    }

    /// Returns the `/table-data` spec.
    #[must_use]
    pub const fn table_data(&self) -> &EndpointSpec {
        &self.table_data
    }
}

impl Default for EndpointCatalog {
    fn default() -> Self {
        Self::table_viewer(DEFAULT_API_PREFIX, &[EndpointId::Tables])
    }
}

/// Normalizes an API prefix to `/segment` form (empty stays empty).
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}
