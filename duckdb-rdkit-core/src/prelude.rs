//! Convenient re-exports for common usage.
//!
//! ```rust,no_run
//! use duckdb_rdkit_core::prelude::*;
//! ```

// Types and chunks
pub use crate::chunk::{Column, ColumnData, RowChunk, ValidityMask, Value, ValueRef};
pub use crate::types::TypeTag;

// Dispatch
pub use crate::binding::{BoundCall, FunctionDescriptor};
pub use crate::executor::{execute, ExecutionOutput};
pub use crate::registry::{global_registry, FunctionRegistry, ReplacePolicy};

// Native calls
pub use crate::bridge::{
    LinkedLibraries, NativeArg, NativeBackend, NativeFunction, NativeHandler, NativeLibrary,
    NativeLibraryBridge, NativeValue,
};

// Catalog
pub use crate::catalog::{builtin_descriptors, builtin_functions, FunctionInfo};

// Error types
pub use crate::error::{Error, ExecutionError, Result};
