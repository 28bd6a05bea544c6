//! Conversion between chunk cells and native call values.
//!
//! Inbound, a cell becomes a [`NativeArg`] converted to the parameter's
//! declared type; NULL becomes [`NativeArg::Absent`]. Outbound, a
//! [`NativeValue`] becomes an owned [`Value`] of the declared return type.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::bridge::{NativeArg, NativeValue};
use crate::chunk::{Column, Value, ValueRef};
use crate::error::ChunkError;
use crate::types::TypeTag;

/// Argument buffer for one row; inline up to four arguments.
pub type RowArgs<'a> = SmallVec<[NativeArg<'a>; 4]>;

/// Convert the cell at `row` to a native argument of type `declared`.
///
/// Text borrows from the column. INTEGER cells widen to DOUBLE when the
/// parameter is declared DOUBLE.
pub fn to_native<'a>(
    column: &'a Column,
    row: usize,
    declared: TypeTag,
) -> Result<NativeArg<'a>, ChunkError> {
    let Some(cell) = column.get(row) else {
        return Ok(NativeArg::Absent);
    };

    match (cell, declared) {
        (ValueRef::Text(v), TypeTag::Text) => Ok(NativeArg::Text(v)),
        (ValueRef::Integer(v), TypeTag::Integer) => Ok(NativeArg::Integer(v)),
        (ValueRef::Integer(v), TypeTag::Double) => Ok(NativeArg::Double(f64::from(v))),
        (ValueRef::Double(v), TypeTag::Double) => Ok(NativeArg::Double(v)),
        (ValueRef::Boolean(v), TypeTag::Boolean) => Ok(NativeArg::Boolean(v)),
        _ => Err(ChunkError::ValueType {
            expected: declared,
            actual: column.type_tag(),
        }),
    }
}

/// Marshal every argument of `row`.
///
/// Returns `None` as soon as any argument is NULL: the row's result is NULL and
/// the native computation must be skipped.
pub fn row_arguments<'a>(
    columns: &'a [Column],
    row: usize,
    declared: &[TypeTag],
) -> Result<Option<RowArgs<'a>>, ChunkError> {
    let mut args = RowArgs::new();
    for (column, &tag) in columns.iter().zip(declared) {
        match to_native(column, row, tag)? {
            NativeArg::Absent => return Ok(None),
            arg => args.push(arg),
        }
    }
    Ok(Some(args))
}

/// Convert a native result to an owned cell of type `declared`.
///
/// `Ok(None)` means a NULL result, which is not an error. A value whose kind
/// does not fit `declared` is a marshaling failure.
pub fn from_native(value: NativeValue, declared: TypeTag) -> Result<Option<Value>, ChunkError> {
    match (value, declared) {
        (NativeValue::Null, _) | (_, TypeTag::Null) => Ok(None),
        (NativeValue::Text(s), TypeTag::Text) => Ok(Some(Value::Text(CompactString::from(s)))),
        (NativeValue::Integer(v), TypeTag::Integer) => Ok(Some(Value::Integer(v))),
        (NativeValue::Integer(v), TypeTag::Double) => Ok(Some(Value::Double(f64::from(v)))),
        (NativeValue::Double(v), TypeTag::Double) => Ok(Some(Value::Double(v))),
        (NativeValue::Boolean(v), TypeTag::Boolean) => Ok(Some(Value::Boolean(v))),
        (value, declared) => Err(ChunkError::ValueType {
            expected: declared,
            actual: value.type_tag(),
        }),
    }
}
