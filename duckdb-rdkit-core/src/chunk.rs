//! Columnar row batches exchanged with the host engine.
//!
//! A [`RowChunk`] mirrors the host's data chunk layout: every column is a
//! dense array of typed values plus a validity bitmap stored in 64-bit words,
//! one bit per row, where a set bit means the row is valid and an unset bit
//! means NULL. Values at invalid rows are placeholders and never read.

use compact_str::CompactString;

use crate::error::ChunkError;
use crate::types::TypeTag;

/// Rows per chunk in DuckDB's vectorized engine.
pub const STANDARD_VECTOR_SIZE: usize = 2048;

const BITS_PER_WORD: usize = u64::BITS as usize;

/// Per-row validity bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    words: Vec<u64>,
    len: usize,
}

impl ValidityMask {
    /// All rows valid.
    pub fn all_valid(len: usize) -> Self {
        Self {
            words: vec![u64::MAX; len.div_ceil(BITS_PER_WORD)],
            len,
        }
    }

    /// All rows NULL.
    pub fn all_null(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(BITS_PER_WORD)],
            len,
        }
    }

    /// Number of rows covered by the mask.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the mask covers zero rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `row` holds a value. Rows past the end are reported invalid.
    #[inline]
    pub fn is_valid(&self, row: usize) -> bool {
        row < self.len && (self.words[row / BITS_PER_WORD] >> (row % BITS_PER_WORD)) & 1 == 1
    }

    /// Mark `row` valid or NULL.
    #[inline]
    pub fn set(&mut self, row: usize, valid: bool) {
        debug_assert!(row < self.len);
        let bit = 1u64 << (row % BITS_PER_WORD);
        let word = &mut self.words[row / BITS_PER_WORD];
        if valid {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Number of valid rows.
    pub fn count_valid(&self) -> usize {
        (0..self.len).filter(|&row| self.is_valid(row)).count()
    }

    /// Raw bitmap words, least significant bit first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

/// Borrowed view of a single non-null cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Text(&'a str),
    Integer(i32),
    Double(f64),
    Boolean(bool),
}

impl ValueRef<'_> {
    /// Copy into an owned [`Value`].
    pub fn to_owned_value(&self) -> Value {
        match *self {
            ValueRef::Text(v) => Value::Text(CompactString::from(v)),
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Double(v) => Value::Double(v),
            ValueRef::Boolean(v) => Value::Boolean(v),
        }
    }
}

/// Owned non-null cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text stored with small-string optimization (inline up to 24 bytes)
    Text(CompactString),
    Integer(i32),
    Double(f64),
    Boolean(bool),
}

impl Value {
    /// The SQL type of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Text(_) => TypeTag::Text,
            Value::Integer(_) => TypeTag::Integer,
            Value::Double(_) => TypeTag::Double,
            Value::Boolean(_) => TypeTag::Boolean,
        }
    }

    /// Try to get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Dense storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<CompactString>),
    Integer(Vec<i32>),
    Double(Vec<f64>),
    Boolean(Vec<bool>),
    /// A column of the NULL type only records its length.
    Null(usize),
}

impl ColumnData {
    /// Placeholder-filled storage of the given type.
    pub fn with_len(tag: TypeTag, len: usize) -> Self {
        match tag {
            TypeTag::Text => ColumnData::Text(vec![CompactString::default(); len]),
            TypeTag::Integer => ColumnData::Integer(vec![0; len]),
            TypeTag::Double => ColumnData::Double(vec![0.0; len]),
            TypeTag::Boolean => ColumnData::Boolean(vec![false; len]),
            TypeTag::Null => ColumnData::Null(len),
        }
    }

    /// The SQL type stored.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            ColumnData::Text(_) => TypeTag::Text,
            ColumnData::Integer(_) => TypeTag::Integer,
            ColumnData::Double(_) => TypeTag::Double,
            ColumnData::Boolean(_) => TypeTag::Boolean,
            ColumnData::Null(_) => TypeTag::Null,
        }
    }

    /// Number of rows stored.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Double(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Null(len) => *len,
        }
    }

    /// Check if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One typed column with its validity bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    data: ColumnData,
    validity: ValidityMask,
}

impl Column {
    /// Pair storage with a validity mask of the same length.
    pub fn new(data: ColumnData, validity: ValidityMask) -> Result<Self, ChunkError> {
        if data.len() != validity.len() {
            return Err(ChunkError::LengthMismatch {
                column: 0,
                expected: data.len(),
                actual: validity.len(),
            });
        }
        Ok(Self { data, validity })
    }

    /// A column of `len` NULLs of the given type.
    pub fn nulls(tag: TypeTag, len: usize) -> Self {
        Self {
            data: ColumnData::with_len(tag, len),
            validity: ValidityMask::all_null(len),
        }
    }

    /// Build a TEXT column; `None` entries are NULL.
    pub fn text<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<CompactString>,
    {
        Self::collect(values, ColumnData::Text, |v: S| v.into())
    }

    /// Build an INTEGER column; `None` entries are NULL.
    pub fn integer<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<i32>>,
    {
        Self::collect(values, ColumnData::Integer, |v| v)
    }

    /// Build a DOUBLE column; `None` entries are NULL.
    pub fn double<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        Self::collect(values, ColumnData::Double, |v| v)
    }

    /// Build a BOOLEAN column; `None` entries are NULL.
    pub fn boolean<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<bool>>,
    {
        Self::collect(values, ColumnData::Boolean, |v| v)
    }

    fn collect<I, S, T, W, C>(values: I, wrap: W, convert: C) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        T: Default,
        W: FnOnce(Vec<T>) -> ColumnData,
        C: Fn(S) -> T,
    {
        let mut dense = Vec::new();
        let mut valid = Vec::new();
        for value in values {
            valid.push(value.is_some());
            dense.push(value.map(&convert).unwrap_or_default());
        }
        let mut validity = ValidityMask::all_valid(valid.len());
        for (row, is_valid) in valid.into_iter().enumerate() {
            if !is_valid {
                validity.set(row, false);
            }
        }
        Self {
            data: wrap(dense),
            validity,
        }
    }

    /// The SQL type stored.
    pub fn type_tag(&self) -> TypeTag {
        self.data.type_tag()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the column has zero rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Dense storage.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Validity bitmap.
    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    /// Whether `row` holds a value.
    #[inline]
    pub fn is_valid(&self, row: usize) -> bool {
        self.validity.is_valid(row)
    }

    /// Read one cell; `None` for NULL or out-of-range rows.
    pub fn get(&self, row: usize) -> Option<ValueRef<'_>> {
        if !self.is_valid(row) {
            return None;
        }
        match &self.data {
            ColumnData::Text(v) => Some(ValueRef::Text(v[row].as_str())),
            ColumnData::Integer(v) => Some(ValueRef::Integer(v[row])),
            ColumnData::Double(v) => Some(ValueRef::Double(v[row])),
            ColumnData::Boolean(v) => Some(ValueRef::Boolean(v[row])),
            ColumnData::Null(_) => None,
        }
    }

    /// Mark `row` NULL.
    pub fn set_null(&mut self, row: usize) -> Result<(), ChunkError> {
        self.check_row(row)?;
        self.validity.set(row, false);
        Ok(())
    }

    /// Store a value at `row` and mark it valid. The value's type must match.
    pub fn set(&mut self, row: usize, value: Value) -> Result<(), ChunkError> {
        self.check_row(row)?;
        match (&mut self.data, value) {
            (ColumnData::Text(v), Value::Text(s)) => v[row] = s,
            (ColumnData::Integer(v), Value::Integer(n)) => v[row] = n,
            (ColumnData::Double(v), Value::Double(n)) => v[row] = n,
            (ColumnData::Boolean(v), Value::Boolean(b)) => v[row] = b,
            (data, value) => {
                return Err(ChunkError::ValueType {
                    expected: data.type_tag(),
                    actual: value.type_tag(),
                })
            }
        }
        self.validity.set(row, true);
        Ok(())
    }

    fn check_row(&self, row: usize) -> Result<(), ChunkError> {
        if row >= self.len() {
            return Err(ChunkError::RowOutOfBounds {
                row,
                len: self.len(),
            });
        }
        Ok(())
    }
}

/// A batch of rows stored column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct RowChunk {
    len: usize,
    columns: Vec<Column>,
}

impl RowChunk {
    /// Create a chunk of `len` rows. Every column must hold exactly `len` rows.
    pub fn new(len: usize, columns: Vec<Column>) -> Result<Self, ChunkError> {
        for (idx, column) in columns.iter().enumerate() {
            if column.len() != len {
                return Err(ChunkError::LengthMismatch {
                    column: idx,
                    expected: len,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { len, columns })
    }

    /// Create a chunk whose length is taken from its first column.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, ChunkError> {
        let len = columns.first().map(Column::len).unwrap_or(0);
        Self::new(len, columns)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the chunk has zero rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column by position.
    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// SQL type of every column, in order.
    pub fn column_types(&self) -> Vec<TypeTag> {
        self.columns.iter().map(Column::type_tag).collect()
    }

    /// Take ownership of the columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
