//! # duckdb-rdkit-core
//!
//! Engine-agnostic dispatch layer for the duckdb-rdkit extension.
//!
//! This crate owns everything between a batch of input rows and the native
//! libraries: function signatures and binding, the function registry, the
//! row-by-row executor and the fault-isolating bridge to RDKit and OpenSSL.
//! It has no DuckDB dependency; the `duckdb-rdkit` crate converts DuckDB data
//! chunks to and from [`RowChunk`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use duckdb_rdkit_core::prelude::*;
//!
//! let bridge = Arc::new(NativeLibraryBridge::linked());
//! let registry = FunctionRegistry::default();
//! registry.install(builtin_descriptors(&bridge).unwrap()).unwrap();
//!
//! let bound = registry
//!     .lookup("duckdb_rdkit")
//!     .unwrap()
//!     .bind(&[TypeTag::Text])
//!     .unwrap();
//! let input = RowChunk::from_columns(vec![Column::text([Some("Sam"), None])]).unwrap();
//! let output = execute(&bound, &input).unwrap();
//! assert_eq!(output.column().get(0), Some(ValueRef::Text("DuckdbRdkit Sam 🐥")));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        duckdb-rdkit-core                            |
//! +---------------------------------------------------------------------+
//! |  registry   - name -> FunctionDescriptor, process-wide instance     |
//! |  binding    - FunctionDescriptor::bind -> BoundCall                 |
//! |  executor   - RowChunk in, RowChunk + per-row errors out            |
//! |  marshal    - cells <-> NativeArg / NativeValue                     |
//! |  bridge/    - NativeBackend, catch_unwind firewall, call locks      |
//! |  catalog    - the SQL functions this build provides                 |
//! |  chunk      - columnar batches with validity bitmaps                |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Crate Features
//!
//! - `rdkit` - Link RDKit and provide the molecule functions

pub mod binding;
pub mod bridge;
pub mod catalog;
pub mod chunk;
pub mod error;
pub mod executor;
pub mod marshal;
pub mod prelude;
pub mod registry;
pub mod types;

pub use binding::{BoundCall, FunctionDescriptor};
pub use bridge::{NativeFunction, NativeLibrary, NativeLibraryBridge};
pub use chunk::{Column, RowChunk, Value, ValueRef, STANDARD_VECTOR_SIZE};
pub use error::{BindError, BridgeError, ChunkError, Error, ExecutionError, RegistryError, Result};
pub use executor::{execute, ExecutionOutput};
pub use registry::{global_registry, FunctionRegistry, ReplacePolicy};
pub use types::TypeTag;
