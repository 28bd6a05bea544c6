//! Extension configuration read from the environment at load.
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `DUCKDB_RDKIT_LOG` | tracing filter directive | `warn` |
//! | `DUCKDB_RDKIT_ROW_ERRORS` | `null`, `raise` | `null` |
//! | `DUCKDB_RDKIT_REPLACE` | `replace`, `reject` | `replace` |
//!
//! The configuration is installed once per process; later loads reuse it.

use std::str::FromStr;
use std::sync::OnceLock;

use duckdb_rdkit_core::ReplacePolicy;
use tracing_subscriber::EnvFilter;

use crate::error::DuckDbError;

/// Log filter variable.
pub const LOG_ENV: &str = "DUCKDB_RDKIT_LOG";

/// Row error policy variable.
pub const ROW_ERRORS_ENV: &str = "DUCKDB_RDKIT_ROW_ERRORS";

/// Registry replacement policy variable.
pub const REPLACE_ENV: &str = "DUCKDB_RDKIT_REPLACE";

const DEFAULT_LOG_FILTER: &str = "warn";

/// What a scalar function does with rows whose native call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowErrorPolicy {
    /// Leave the row NULL and log a warning
    #[default]
    Null,
    /// Fail the statement with the first row error
    Raise,
}

impl FromStr for RowErrorPolicy {
    type Err = DuckDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "null" => Ok(RowErrorPolicy::Null),
            "raise" => Ok(RowErrorPolicy::Raise),
            other => Err(DuckDbError::Config(format!(
                "{}: expected 'null' or 'raise', got '{}'",
                ROW_ERRORS_ENV, other
            ))),
        }
    }
}

fn parse_replace_policy(s: &str) -> Result<ReplacePolicy, DuckDbError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "replace" => Ok(ReplacePolicy::Replace),
        "reject" => Ok(ReplacePolicy::Reject),
        other => Err(DuckDbError::Config(format!(
            "{}: expected 'replace' or 'reject', got '{}'",
            REPLACE_ENV, other
        ))),
    }
}

/// Extension settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionConfig {
    /// `tracing` filter directive
    pub log_filter: String,
    /// Handling of per-row native failures
    pub row_errors: RowErrorPolicy,
    /// Handling of duplicate function names
    pub replace: ReplacePolicy,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            row_errors: RowErrorPolicy::default(),
            replace: ReplacePolicy::default(),
        }
    }
}

impl ExtensionConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, DuckDbError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset and blank values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DuckDbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(filter) = get(LOG_ENV) {
            EnvFilter::try_new(&filter)
                .map_err(|e| DuckDbError::Config(format!("{}: {}", LOG_ENV, e)))?;
            config.log_filter = filter;
        }
        if let Some(policy) = get(ROW_ERRORS_ENV) {
            config.row_errors = policy.parse()?;
        }
        if let Some(policy) = get(REPLACE_ENV) {
            config.replace = parse_replace_policy(&policy)?;
        }

        Ok(config)
    }

    /// The log filter as an [`EnvFilter`].
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

static ACTIVE: OnceLock<ExtensionConfig> = OnceLock::new();

/// Install the process configuration. The first call wins.
pub fn install(config: ExtensionConfig) -> &'static ExtensionConfig {
    ACTIVE.get_or_init(|| config)
}

/// The installed configuration, or defaults if none was installed.
pub fn active() -> &'static ExtensionConfig {
    ACTIVE.get_or_init(ExtensionConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ExtensionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ExtensionConfig::default());
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.row_errors, RowErrorPolicy::Null);
        assert_eq!(config.replace, ReplacePolicy::Replace);
    }

    #[test]
    fn test_all_values() {
        let config = ExtensionConfig::from_lookup(lookup(&[
            (LOG_ENV, "duckdb_rdkit_core=debug"),
            (ROW_ERRORS_ENV, "RAISE"),
            (REPLACE_ENV, " reject "),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "duckdb_rdkit_core=debug");
        assert_eq!(config.row_errors, RowErrorPolicy::Raise);
        assert_eq!(config.replace, ReplacePolicy::Reject);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = ExtensionConfig::from_lookup(lookup(&[(ROW_ERRORS_ENV, "  ")])).unwrap();
        assert_eq!(config.row_errors, RowErrorPolicy::Null);
    }

    #[test]
    fn test_invalid_values() {
        let err = ExtensionConfig::from_lookup(lookup(&[(ROW_ERRORS_ENV, "ignore")])).unwrap_err();
        assert!(matches!(err, DuckDbError::Config(ref m) if m.contains("ignore")));

        let err = ExtensionConfig::from_lookup(lookup(&[(REPLACE_ENV, "merge")])).unwrap_err();
        assert!(matches!(err, DuckDbError::Config(_)));

        let err = ExtensionConfig::from_lookup(lookup(&[(LOG_ENV, "duckdb_rdkit=loud")])).unwrap_err();
        assert!(matches!(err, DuckDbError::Config(ref m) if m.starts_with(LOG_ENV)));
    }
}
