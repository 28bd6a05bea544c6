//! Copy DuckDB data chunks into [`RowChunk`]s and results back out.

// Loop indices needed for both null checks and slice access
#![allow(clippy::needless_range_loop)]

use duckdb::core::{DataChunkHandle, FlatVector, Inserter};
use duckdb::types::DuckString;
use duckdb::vtab::arrow::WritableVector;
use duckdb_rdkit_core::chunk::{Column, ColumnData};
use duckdb_rdkit_core::{RowChunk, TypeTag};
use libduckdb_sys::duckdb_string_t;

use crate::duckdb_schema::type_tag;
use crate::error::DuckDbError;

/// Read every column of `input`.
///
/// # Safety
///
/// `input` must be a live chunk handed to a scalar function by DuckDB.
pub unsafe fn read_chunk(input: &DataChunkHandle) -> Result<RowChunk, DuckDbError> {
    let len = input.len();
    let mut columns = Vec::with_capacity(input.num_columns());

    for idx in 0..input.num_columns() {
        let vector = input.flat_vector(idx);
        let id = vector.logical_type().id();
        let tag = type_tag(id).ok_or_else(|| {
            DuckDbError::UnsupportedType(format!("column {} has type {:?}", idx, id))
        })?;
        columns.push(read_column(&vector, tag, len));
    }

    Ok(RowChunk::new(len, columns)?)
}

unsafe fn read_column(vector: &FlatVector, tag: TypeTag, len: usize) -> Column {
    let valid = |i: usize| !vector.row_is_null(i as u64);

    match tag {
        TypeTag::Text => {
            let slice = vector.as_slice_with_len::<duckdb_string_t>(len);
            Column::text((0..len).map(|i| {
                valid(i).then(|| {
                    let mut value = slice[i];
                    DuckString::new(&mut value).as_str().into_owned()
                })
            }))
        }
        TypeTag::Integer => {
            let slice = vector.as_slice_with_len::<i32>(len);
            Column::integer((0..len).map(|i| valid(i).then(|| slice[i])))
        }
        TypeTag::Double => {
            let slice = vector.as_slice_with_len::<f64>(len);
            Column::double((0..len).map(|i| valid(i).then(|| slice[i])))
        }
        TypeTag::Boolean => {
            let slice = vector.as_slice_with_len::<bool>(len);
            Column::boolean((0..len).map(|i| valid(i).then(|| slice[i])))
        }
        TypeTag::Null => Column::nulls(TypeTag::Null, len),
    }
}

/// Write `column` into the function's output vector.
///
/// # Safety
///
/// `output` must be the output vector DuckDB passed alongside the input chunk,
/// sized for at least `column.len()` rows of the column's type.
pub unsafe fn write_column(column: &Column, output: &mut dyn WritableVector) {
    let mut out = output.flat_vector();

    match column.data() {
        ColumnData::Text(values) => {
            for (i, value) in values.iter().enumerate() {
                if column.is_valid(i) {
                    out.insert(i, value.as_str());
                } else {
                    out.set_null(i);
                }
            }
        }
        ColumnData::Integer(values) => write_fixed(&mut out, column, values),
        ColumnData::Double(values) => write_fixed(&mut out, column, values),
        ColumnData::Boolean(values) => write_fixed(&mut out, column, values),
        ColumnData::Null(len) => {
            for i in 0..*len {
                out.set_null(i);
            }
        }
    }
}

unsafe fn write_fixed<T: Copy>(out: &mut FlatVector, column: &Column, values: &[T]) {
    let out_ptr = out.as_mut_ptr::<T>();
    for (i, value) in values.iter().enumerate() {
        if column.is_valid(i) {
            std::ptr::write(out_ptr.add(i), *value);
        } else {
            out.set_null(i);
        }
    }
}
