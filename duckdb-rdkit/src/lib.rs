//! duckdb-rdkit: DuckDB extension for cheminformatics in SQL.
//!
//! This extension registers scalar functions backed by RDKit and OpenSSL.
//! Row dispatch lives in `duckdb-rdkit-core`; this crate converts DuckDB data
//! chunks and owns the load entry point.
//!
//! ## Usage
//!
//! ```sql
//! -- Load the extension
//! LOAD 'duckdb_rdkit.duckdb_extension';
//!
//! SELECT duckdb_rdkit('Sam');
//! SELECT duckdb_rdkit_openssl_version('Michael');
//!
//! -- With the `rdkit` feature
//! SELECT mol_to_smiles('OCC'), mol_amw('CCO');
//! ```
//!
//! ## Environment
//!
//! - `DUCKDB_RDKIT_LOG` - tracing filter (default `warn`)
//! - `DUCKDB_RDKIT_ROW_ERRORS` - `null` (default) or `raise`
//! - `DUCKDB_RDKIT_REPLACE` - `replace` (default) or `reject`

mod config;
mod duckdb_schema;
mod error;
mod logging;
mod udf;
mod vector;

use std::sync::Arc;

pub use config::{ExtensionConfig, RowErrorPolicy};
pub use duckdb_rdkit_core;
pub use duckdb_schema::{scalar_signature, to_duckdb_type, type_tag};
pub use error::DuckDbError;
pub use udf::{register_all, CatalogName, RegistryScalar};

use duckdb_rdkit_core::catalog::builtin_descriptors;
use duckdb_rdkit_core::{global_registry, FunctionRegistry, NativeLibraryBridge};

// Required imports for the duckdb_entrypoint_c_api macro
use duckdb::ffi;
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;

/// Extension name.
pub const EXTENSION_NAME: &str = "duckdb_rdkit";

/// Extension version.
pub const EXTENSION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension entry point called by DuckDB when loading.
///
/// Reads the configuration, starts logging, then installs and registers every
/// scalar function.
#[duckdb_entrypoint_c_api(ext_name = "duckdb_rdkit")]
pub unsafe fn duckdb_rdkit_init(con: Connection) -> duckdb::Result<(), Box<dyn std::error::Error>> {
    let config = config::install(ExtensionConfig::from_env()?);
    logging::init(config);

    tracing::info!(
        "Loading {} v{} extension",
        EXTENSION_NAME,
        EXTENSION_VERSION
    );

    match load(&con, config) {
        Ok(count) => {
            tracing::info!(functions = count, "Registered scalar functions");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load {}", EXTENSION_NAME);
            Err(e.into())
        }
    }
}

/// Install the builtin catalog into the global registry and register it with
/// DuckDB.
pub fn load(con: &Connection, config: &ExtensionConfig) -> Result<usize, DuckDbError> {
    let registry = global_registry();
    let bridge = Arc::new(NativeLibraryBridge::linked());
    install_catalog(registry, &bridge, config)?;
    register_all(con, registry)
}

/// Install every builtin function into `registry`.
///
/// A missing native library fails with [`DuckDbError::Load`] before anything
/// is installed.
pub fn install_catalog(
    registry: &FunctionRegistry,
    bridge: &Arc<NativeLibraryBridge>,
    config: &ExtensionConfig,
) -> Result<usize, DuckDbError> {
    registry.set_policy(config.replace);
    let descriptors = builtin_descriptors(bridge).map_err(DuckDbError::Load)?;
    Ok(registry.install(descriptors)?)
}

/// Clear the global registry. Safe to call more than once.
///
/// DuckDB never calls this: duckdb-rs has no unload callback for loadable
/// extensions. It exists for hosts that embed the crate and for tests.
pub fn unload() -> usize {
    let removed = global_registry().unregister_all();
    tracing::info!(functions = removed, "Unloaded {}", EXTENSION_NAME);
    removed
}

/// Get extension metadata.
pub fn extension_info() -> (&'static str, &'static str) {
    (EXTENSION_NAME, EXTENSION_VERSION)
}

/// Result type for extension operations.
pub type DuckDbRdkitResult<T> = std::result::Result<T, DuckDbError>;
