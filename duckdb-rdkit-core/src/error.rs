//! Error types for duckdb-rdkit-core.
//!
//! This module provides structured error types for each layer of the
//! dispatch pipeline:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`BindError`] - Call-site signature does not match a descriptor
//! - [`RegistryError`] - Function catalog lookups and registration
//! - [`BridgeError`] - Failures reported by a native library call
//! - [`ChunkError`] - Malformed columnar input or output
//!
//! [`ExecutionError`] is not part of the enum: it is a per-row record returned
//! alongside a fully produced output chunk.

use thiserror::Error;

use crate::bridge::NativeLibrary;
use crate::types::TypeTag;

/// Main error type for duckdb-rdkit-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Call-site types rejected by a function signature
    #[error("Bind error: {0}")]
    Bind(#[from] BindError),

    /// Function registry error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Native library error that could not be recovered per row
    #[error("Native library error: {0}")]
    Bridge(#[from] BridgeError),

    /// Malformed chunk
    #[error("Chunk error: {0}")]
    Chunk(#[from] ChunkError),
}

/// Errors detected when binding call-site argument types to a signature.
///
/// These surface once per statement, before any row is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// Wrong number of arguments
    #[error("{function}: expected {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// Argument type not convertible to the declared parameter type
    #[error("{function}: argument {position} has type {actual}, which cannot be converted to {expected}")]
    TypeMismatch {
        function: String,
        position: usize,
        expected: TypeTag,
        actual: TypeTag,
    },
}

/// Errors related to the function registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Name already registered and the registry forbids replacement
    #[error("Function '{name}' is already registered")]
    DuplicateNameConflict { name: String },

    /// No function registered under this name
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },
}

/// Errors reported by the native library bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The native library rejected the input or faulted while computing
    #[error("Native call failed: {detail}")]
    NativeCallFailed { detail: String },

    /// The native library was not linked or failed to initialise
    #[error("Native library {library} is not available")]
    LibraryUnavailable { library: NativeLibrary },
}

impl BridgeError {
    /// Shorthand for [`BridgeError::NativeCallFailed`].
    pub fn native(detail: impl Into<String>) -> Self {
        BridgeError::NativeCallFailed {
            detail: detail.into(),
        }
    }
}

/// Errors related to chunk shape and cell types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// Column length differs from the chunk length
    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: usize,
        expected: usize,
        actual: usize,
    },

    /// Value of one type stored into (or read as) another type
    #[error("cannot store a {actual} value in a {expected} column")]
    ValueType { expected: TypeTag, actual: TypeTag },

    /// Row index past the end of a column
    #[error("row {row} out of bounds for a column of {len} rows")]
    RowOutOfBounds { row: usize, len: usize },
}

/// A failure confined to a single row of a chunk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("row {row_index}: {message}")]
pub struct ExecutionError {
    /// Zero-based index of the failing row within the input chunk
    pub row_index: usize,
    /// Human-readable reason
    pub message: String,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
