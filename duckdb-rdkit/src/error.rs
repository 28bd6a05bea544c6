//! DuckDB-specific error types.

use duckdb_rdkit_core::{BindError, BridgeError, ChunkError, ExecutionError, RegistryError};
use thiserror::Error;

/// Errors that can occur in the DuckDB extension.
#[derive(Error, Debug)]
pub enum DuckDbError {
    #[error("Dispatch error: {0}")]
    Core(#[from] duckdb_rdkit_core::Error),

    /// A linked library is missing; the extension cannot finish loading
    #[error("Extension failed to load: {0}")]
    Load(BridgeError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),

    /// First row error of a chunk, raised under the `raise` row error policy
    #[error("{function} failed at {source}")]
    RowFailed {
        function: String,
        source: ExecutionError,
    },

    #[error("{function} panicked: {message}")]
    Panic { function: String, message: String },

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl From<BindError> for DuckDbError {
    fn from(e: BindError) -> Self {
        DuckDbError::Core(e.into())
    }
}

impl From<ChunkError> for DuckDbError {
    fn from(e: ChunkError) -> Self {
        DuckDbError::Core(e.into())
    }
}
