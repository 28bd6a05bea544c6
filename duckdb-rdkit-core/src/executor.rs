//! Chunk-at-a-time execution of a bound scalar function.
//!
//! [`execute`] turns an input [`RowChunk`] into a single-column output chunk
//! of the same length. Rows are processed in order. A row with any NULL
//! argument yields NULL without a native call; a row whose native call fails
//! yields NULL and an [`ExecutionError`]. Only problems with the chunk as a
//! whole (wrong shape, missing library) fail the call.

use crate::binding::BoundCall;
use crate::bridge::{NativeArg, NativeHandler};
use crate::chunk::{Column, RowChunk, Value};
use crate::error::{BindError, BridgeError, Error, ExecutionError, Result};
use crate::marshal::{from_native, row_arguments};
use crate::types::TypeTag;

/// Output of one [`execute`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    /// One column of the bound return type, one row per input row
    pub chunk: RowChunk,
    /// Per-row failures in increasing row order
    pub errors: Vec<ExecutionError>,
}

impl ExecutionOutput {
    /// The result column.
    pub fn column(&self) -> &Column {
        &self.chunk.columns()[0]
    }

    /// Whether every row succeeded (or was NULL).
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run `bound` over every row of `input`.
pub fn execute(bound: &BoundCall, input: &RowChunk) -> Result<ExecutionOutput> {
    check_shape(bound, input)?;

    let descriptor = bound.descriptor();
    let handler = descriptor.handler();
    let return_type = bound.return_type();
    let parameter_types = bound.parameter_types();
    let columns = input.columns();

    let mut output = Column::nulls(return_type, input.len());
    let mut errors = Vec::new();

    for row in 0..input.len() {
        let Some(args) = row_arguments(columns, row, parameter_types)? else {
            continue;
        };

        match run_row(handler, &args, return_type) {
            Ok(Some(value)) => output.set(row, value)?,
            Ok(None) => {}
            Err(RowFailure::Fatal(e)) => return Err(e.into()),
            Err(RowFailure::Row(message)) => {
                tracing::trace!(function = descriptor.name(), row, %message, "Row failed");
                errors.push(ExecutionError {
                    row_index: row,
                    message,
                });
            }
        }
    }

    Ok(ExecutionOutput {
        chunk: RowChunk::new(input.len(), vec![output])?,
        errors,
    })
}

enum RowFailure {
    /// Recovered: the row becomes NULL
    Row(String),
    /// Aborts the chunk
    Fatal(BridgeError),
}

fn run_row(
    handler: &NativeHandler,
    args: &[NativeArg<'_>],
    return_type: TypeTag,
) -> std::result::Result<Option<Value>, RowFailure> {
    let value = handler.call(args).map_err(|e| match e {
        BridgeError::NativeCallFailed { detail } => RowFailure::Row(detail),
        fatal @ BridgeError::LibraryUnavailable { .. } => RowFailure::Fatal(fatal),
    })?;
    from_native(value, return_type).map_err(|e| RowFailure::Row(e.to_string()))
}

/// The input must have exactly the bound call-site shape.
fn check_shape(bound: &BoundCall, input: &RowChunk) -> std::result::Result<(), Error> {
    let expected = bound.call_site_types();
    if input.column_count() != expected.len() {
        return Err(BindError::ArityMismatch {
            function: bound.name().to_string(),
            expected: expected.len(),
            actual: input.column_count(),
        }
        .into());
    }

    for (position, (column, &declared)) in input.columns().iter().zip(expected).enumerate() {
        if column.type_tag() != declared {
            return Err(BindError::TypeMismatch {
                function: bound.name().to_string(),
                position,
                expected: declared,
                actual: column.type_tag(),
            }
            .into());
        }
    }
    Ok(())
}
