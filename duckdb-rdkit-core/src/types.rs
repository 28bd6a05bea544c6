//! SQL type tags understood by the dispatch layer.

use std::fmt;

/// Types a registered function may declare for its parameters and result.
///
/// These map to:
/// - DuckDB: `VARCHAR`, `INTEGER`, `DOUBLE`, `BOOLEAN`, `NULL`
/// - Native calls: `&str`, `i32`, `f64`, `bool`, absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// UTF-8 string
    Text,

    /// Signed 32-bit integer
    Integer,

    /// 64-bit floating point
    Double,

    /// Boolean (true/false)
    Boolean,

    /// Untyped NULL literal
    Null,
}

impl TypeTag {
    /// SQL type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeTag::Text => "TEXT",
            TypeTag::Integer => "INTEGER",
            TypeTag::Double => "DOUBLE",
            TypeTag::Boolean => "BOOLEAN",
            TypeTag::Null => "NULL",
        }
    }

    /// Size in bytes for fixed-width types, None for variable-width.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeTag::Integer => Some(4),
            TypeTag::Double => Some(8),
            TypeTag::Boolean => Some(1),
            TypeTag::Null => Some(0),
            TypeTag::Text => None,
        }
    }

    /// Whether a value of this type may be passed where `target` is declared.
    ///
    /// Identical types always convert, a NULL literal converts to anything, and
    /// INTEGER widens to DOUBLE. Nothing else converts.
    pub fn is_convertible_to(&self, target: TypeTag) -> bool {
        match (*self, target) {
            (from, to) if from == to => true,
            (TypeTag::Null, _) => true,
            (TypeTag::Integer, TypeTag::Double) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
