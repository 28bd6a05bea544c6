//! One `VScalar` implementation for every registered function.
//!
//! DuckDB takes signatures from a static method, so each SQL name gets a
//! marker type and the shared [`RegistryScalar`] resolves the marker's name in
//! the global registry on every call.

use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use duckdb::core::DataChunkHandle;
use duckdb::vscalar::{ScalarFunctionSignature, VScalar};
use duckdb::vtab::arrow::WritableVector;
use duckdb_rdkit_core::bridge::panic_message;
use duckdb_rdkit_core::{execute, global_registry, ExecutionError};

use crate::config::{self, RowErrorPolicy};
use crate::duckdb_schema::scalar_signature;
use crate::error::DuckDbError;
use crate::vector::{read_chunk, write_column};

/// Compile-time handle for one SQL function name.
pub trait CatalogName: 'static {
    const NAME: &'static str;
}

/// Scalar function that dispatches through the registry entry `F::NAME`.
pub struct RegistryScalar<F: CatalogName>(PhantomData<F>);

impl<F: CatalogName> VScalar for RegistryScalar<F> {
    type State = ();

    fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match panic::catch_unwind(AssertUnwindSafe(|| unsafe { run(F::NAME, input, output) })) {
            Ok(result) => result.map_err(Into::into),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(function = F::NAME, %message, "Scalar function panicked");
                Err(Box::new(DuckDbError::Panic {
                    function: F::NAME.to_string(),
                    message,
                }))
            }
        }
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        match global_registry().lookup(F::NAME) {
            Ok(descriptor) => scalar_signature(&descriptor).into_iter().collect(),
            Err(e) => {
                tracing::error!(function = F::NAME, error = %e, "No signature available");
                Vec::new()
            }
        }
    }
}

/// Read, bind, execute, write, then apply the row error policy.
unsafe fn run(
    name: &str,
    input: &mut DataChunkHandle,
    output: &mut dyn WritableVector,
) -> Result<(), DuckDbError> {
    let descriptor = global_registry().lookup(name)?;
    let chunk = read_chunk(input)?;
    let bound = descriptor.bind(&chunk.column_types())?;
    let result = execute(&bound, &chunk)?;

    write_column(result.column(), output);
    apply_row_policy(name, result.errors, config::active().row_errors)
}

/// Log a per-chunk summary of row errors, or fail with the first one under
/// [`RowErrorPolicy::Raise`]. The output vector is complete either way.
///
/// The summary is one `warn` carrying the count and the first failure;
/// individual rows are logged at `debug`.
pub(crate) fn apply_row_policy(
    name: &str,
    errors: Vec<ExecutionError>,
    policy: RowErrorPolicy,
) -> Result<(), DuckDbError> {
    match policy {
        RowErrorPolicy::Null => {
            let Some(first) = errors.first() else {
                return Ok(());
            };
            tracing::warn!(
                function = name,
                failed_rows = errors.len(),
                first_row = first.row_index,
                first_message = %first.message,
                "Rows produced NULL after native failures"
            );
            for error in &errors {
                tracing::debug!(
                    function = name,
                    row = error.row_index,
                    message = %error.message,
                    "Row produced NULL after a native failure"
                );
            }
            Ok(())
        }
        RowErrorPolicy::Raise => match errors.into_iter().next() {
            Some(source) => Err(DuckDbError::RowFailed {
                function: name.to_string(),
                source,
            }),
            None => Ok(()),
        },
    }
}
