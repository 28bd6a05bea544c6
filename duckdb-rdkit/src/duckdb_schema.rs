//! Convert duckdb-rdkit-core type tags to DuckDB types and back.

use duckdb::core::{LogicalTypeHandle, LogicalTypeId};
use duckdb::vscalar::ScalarFunctionSignature;
use duckdb_rdkit_core::{FunctionDescriptor, TypeTag};

/// Convert a TypeTag to a DuckDB LogicalTypeHandle.
///
/// `Null` has no column type of its own; DuckDB casts NULL literals to the
/// declared parameter type before invoking the function.
pub fn to_duckdb_type(tag: TypeTag) -> Option<LogicalTypeHandle> {
    let id = match tag {
        TypeTag::Text => LogicalTypeId::Varchar,
        TypeTag::Integer => LogicalTypeId::Integer,
        TypeTag::Double => LogicalTypeId::Double,
        TypeTag::Boolean => LogicalTypeId::Boolean,
        TypeTag::Null => return None,
    };
    Some(LogicalTypeHandle::from(id))
}

/// Map a DuckDB column type to the TypeTag it is read as.
pub fn type_tag(id: LogicalTypeId) -> Option<TypeTag> {
    match id {
        LogicalTypeId::Varchar => Some(TypeTag::Text),
        LogicalTypeId::Integer => Some(TypeTag::Integer),
        LogicalTypeId::Double => Some(TypeTag::Double),
        LogicalTypeId::Boolean => Some(TypeTag::Boolean),
        _ => None,
    }
}

/// Exact DuckDB signature for a descriptor, or None if a type has no DuckDB
/// equivalent.
pub fn scalar_signature(descriptor: &FunctionDescriptor) -> Option<ScalarFunctionSignature> {
    let parameters = descriptor
        .parameter_types()
        .iter()
        .map(|tag| to_duckdb_type(*tag))
        .collect::<Option<Vec<_>>>()?;
    let return_type = to_duckdb_type(descriptor.return_type())?;
    Some(ScalarFunctionSignature::exact(parameters, return_type))
}

// Note: Unit tests for type conversion are not possible in a loadable extension
// because the DuckDB API is not initialized until the extension is loaded.
// Type conversions are exercised when the extension is loaded into DuckDB.
