// crates/table-probe-config/src/config.rs
// ============================================================================
// Module: Table Probe Configuration
// Description: Configuration loading and validation for contract runs.
// Purpose: Provide strict TOML parsing with hard limits and typed defaults.
// Dependencies: table-probe-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from `table-probe.toml`, resolved from an explicit
//! path, then the `TABLE_PROBE_CONFIG` environment variable, then the default
//! filename in the working directory. Only the default file may be absent, in
//! which case every section takes its defaults. Unknown fields are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use table_probe_core::ClientConfig;
use table_probe_core::EmptyTablesPolicy;
use table_probe_core::EndpointCatalog;
use table_probe_core::EndpointId;
use table_probe_core::HttpMethod;
use table_probe_core::SuiteOptions;
use table_probe_core::client::DEFAULT_MAX_REDIRECTS;
use table_probe_core::client::MAX_RESPONSE_BYTES;
use table_probe_core::contract::DEFAULT_API_PREFIX;
use table_probe_core::suite::DEFAULT_INVALID_TABLE;
use table_probe_core::suite::DEFAULT_UNSUPPORTED_METHODS;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "table-probe.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TABLE_PROBE_CONFIG";
/// Default base URL of the server under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Maximum per-request timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;
/// Upper bound for `target.max_redirects`.
pub const MAX_REDIRECTS_LIMIT: usize = 20;
/// Upper bound for `target.max_body_bytes`.
pub const MAX_BODY_BYTES_LIMIT: usize = 64 * 1024 * 1024;
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of the invalid-table identifier.
const MAX_TABLE_NAME_LENGTH: usize = 256;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Server under test.
    #[serde(default)]
    pub target: TargetConfig,
    /// Check tunables.
    #[serde(default)]
    pub checks: ChecksConfig,
    /// Event logging.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File the config was read from, if any (not serialized).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// `[target]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Base URL (scheme, host, optional path).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefix under which the contract endpoints live.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Redirects followed per request; zero reports 3xx statuses as-is.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum accepted response body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// `[checks]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecksConfig {
    /// Table name assumed not to exist.
    #[serde(default = "default_invalid_table")]
    pub invalid_table: String,
    /// Methods sent to `/tables` expecting 405.
    #[serde(default = "default_unsupported_methods")]
    pub unsupported_methods: Vec<HttpMethod>,
    /// Endpoints whose listing failure fails the run.
    #[serde(default = "default_critical")]
    pub critical: Vec<EndpointId>,
    /// Policy for an empty tables listing.
    #[serde(default)]
    pub empty_tables: EmptyTablesPolicy,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            invalid_table: default_invalid_table(),
            unsupported_methods: default_unsupported_methods(),
            critical: default_critical(),
            empty_tables: EmptyTablesPolicy::default(),
        }
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSinkKind {
    /// Discard events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `path`.
    File,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: EventSinkKind,
    /// Event log path (file sink only).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl ProbeConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly named file is missing, or
    /// when reading, parsing, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::Io(format!("{}: {err}", resolved.display())));
            }
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.source = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target.validate()?;
        self.checks.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Derived Settings
    // ------------------------------------------------------------------------

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.target.timeout_secs)
    }

    /// Builds the HTTP client configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.target.base_url.clone());
        config.timeout = self.timeout();
        config.max_redirects = self.target.max_redirects;
        config.max_body_bytes = self.target.max_body_bytes;
        config
    }

    /// Builds the endpoint catalog.
    #[must_use]
    pub fn catalog(&self) -> EndpointCatalog {
        EndpointCatalog::table_viewer(&self.target.api_prefix, &self.checks.critical)
    }

    /// Builds the suite options.
    #[must_use]
    pub fn suite_options(&self) -> SuiteOptions {
        SuiteOptions {
            invalid_table: self.checks.invalid_table.clone(),
            unsupported_methods: self.checks.unsupported_methods.clone(),
            empty_tables: self.checks.empty_tables,
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl TargetConfig {
    /// Validates the target section.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|err| ConfigError::Invalid(format!("target.base_url is invalid: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "target.base_url must use http or https".to_string(),
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid("target.base_url must include a host".to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "target.base_url must not carry a query or fragment".to_string(),
            ));
        }
        let prefix = self.api_prefix.trim();
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(ConfigError::Invalid("target.api_prefix must start with '/'".to_string()));
        }
        if prefix.contains(['?', '#']) {
            return Err(ConfigError::Invalid(
                "target.api_prefix must be a plain path".to_string(),
            ));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "target.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        if self.max_redirects > MAX_REDIRECTS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "target.max_redirects must be at most {MAX_REDIRECTS_LIMIT}"
            )));
        }
        if !(1..=MAX_BODY_BYTES_LIMIT).contains(&self.max_body_bytes) {
            return Err(ConfigError::Invalid(format!(
                "target.max_body_bytes must be between 1 and {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }
}

impl ChecksConfig {
    /// Validates the checks section.
    fn validate(&self) -> Result<(), ConfigError> {
        let table = self.invalid_table.trim();
        if table.is_empty() {
            return Err(ConfigError::Invalid("checks.invalid_table must be non-empty".to_string()));
        }
        if table.len() > MAX_TABLE_NAME_LENGTH {
            return Err(ConfigError::Invalid("checks.invalid_table exceeds max length".to_string()));
        }
        for (index, method) in self.unsupported_methods.iter().enumerate() {
            if *method == HttpMethod::Get {
                return Err(ConfigError::Invalid(
                    "checks.unsupported_methods must not include GET".to_string(),
                ));
            }
            if self.unsupported_methods[..index].contains(method) {
                return Err(ConfigError::Invalid(format!(
                    "checks.unsupported_methods lists {method} more than once"
                )));
            }
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// Validates the logging section.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (EventSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.path is required for the file sink".to_string()))
            }
            (_, Some(path)) if path.as_os_str().is_empty() => {
                Err(ConfigError::Invalid("logging.path must be non-empty".to_string()))
            }
            (_, Some(path)) if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH => {
                Err(ConfigError::Invalid("logging.path exceeds max length".to_string()))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag is true unless the default name was used.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        if !env_path.trim().is_empty() {
            return Ok((PathBuf::from(env_path), true));
        }
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Default base URL.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default API prefix.
fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

/// Default timeout in seconds.
const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Default redirect budget.
const fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

/// Default response body limit.
const fn default_max_body_bytes() -> usize {
    MAX_RESPONSE_BYTES
}

/// Default invalid table name.
fn default_invalid_table() -> String {
    DEFAULT_INVALID_TABLE.to_string()
}

/// Default unsupported methods.
fn default_unsupported_methods() -> Vec<HttpMethod> {
    DEFAULT_UNSUPPORTED_METHODS.to_vec()
}

/// Default critical endpoints.
fn default_critical() -> Vec<EndpointId> {
    vec![EndpointId::Tables]
}
