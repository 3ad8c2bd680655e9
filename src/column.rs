use std::sync::Arc;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::value::Value;

/// Column definition in the schema: an immutable `(name, type)` pair.
///
/// Names are non-empty and made only of ASCII letters and digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    name: String,
    data_type: DataType,
}

impl ColumnDef {
    /// Creates a column definition after validating its name.
    ///
    /// # Errors
    /// Returns [Error::InvalidCommand] if the name is empty or contains anything
    /// other than `[A-Za-z0-9]`.
    ///
    /// # Example
    /// ```
    /// # use tabledb::{ColumnDef, DataType};
    /// assert!(ColumnDef::new("age", DataType::Int).is_ok());
    /// assert!(ColumnDef::new("first_name", DataType::String).is_err());
    /// ```
    pub fn new(name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::invalid(format!("invalid column name {name:?}")));
        }
        Ok(Self { name, data_type })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// Physical storage for column data.
/// Each variant wraps a collection of a specific type to ensure contiguous memory
/// allocation (columnar storage).
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// Vector of 64-bit integers.
    Int(Vec<i64>),
    /// Vector of reference-counted strings.
    Str(Vec<Arc<str>>),
}

/// The values of one column of a table, stored contiguously.
#[derive(Debug, Clone)]
///
/// Fields are private: every stored value matches `data_type`, and only
/// [Column::push] and [Column::set] may write.
pub struct Column {
    name: String,
    data_type: DataType,
    data: ColumnData,
}

impl Column {
    /// Creates a new, empty column for the given definition.
    /// The underlying data storage is initialized according to the data type.
    pub fn new(def: &ColumnDef) -> Self {
        let data = match def.data_type() {
            DataType::Int => ColumnData::Int(vec![]),
            DataType::String => ColumnData::Str(vec![]),
        };
        Self {
            name: def.name().to_string(),
            data_type: def.data_type(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Read-only view of the stored values.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Converts `value` into this column's storage type.
    ///
    /// # Errors
    /// Returns [Error::TypeMismatch] if the value cannot be coerced.
    pub fn coerce(&self, value: &Value) -> Result<Value> {
        self.data_type
            .coerce(value)
            .ok_or_else(|| type_mismatch(&self.name, self.data_type, value))
    }

    /// Appends a new value to the end of the column.
    ///
    /// The value must already be coerced with [Column::coerce]; the table does
    /// this for the whole row before touching any column so a rejected row
    /// leaves every column untouched.
    ///
    /// # Example
    /// ```
    /// # use tabledb::{Column, ColumnDef, DataType, Value};
    /// let def = ColumnDef::new("age", DataType::Int).unwrap();
    /// let mut col = Column::new(&def);
    /// col.push(Value::Int(30)).unwrap();
    ///
    /// assert_eq!(col.len(), 1);
    /// assert_eq!(col.get(0), Some(Value::Int(30)));
    /// ```
    pub fn push(&mut self, value: Value) -> Result<()> {
        let value = self.coerce(&value)?;
        match (&mut self.data, value) {
            (ColumnData::Int(col), Value::Int(v)) => col.push(v),
            (ColumnData::Str(col), Value::Str(v)) => col.push(v),
            (_, value) => return Err(type_mismatch(&self.name, self.data_type, &value)),
        }
        Ok(())
    }

    /// Returns the number of rows currently stored in the column.
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int(col) => col.len(),
            ColumnData::Str(col) => col.len(),
        }
    }

    /// Returns true if there is no row in the column, else false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieves the value at the specified row index.
    ///
    /// Returns `None` if the index is out of bounds.
    pub fn get(&self, row_idx: usize) -> Option<Value> {
        match &self.data {
            ColumnData::Int(col) => col.get(row_idx).map(|v| Value::Int(*v)),
            ColumnData::Str(col) => col.get(row_idx).map(|v| Value::Str(Arc::clone(v))),
        }
    }

    /// Replaces the value at `row_idx`.
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the value's type does
    /// not match the column's data type.
    pub fn set(&mut self, row_idx: usize, value: &Value) -> Result<()> {
        if self.len() <= row_idx {
            return Err(Error::invalid(format!(
                "row index {row_idx} is out of bounds for column {:?}",
                self.name
            )));
        }
        let value = self.coerce(value)?;
        match (&mut self.data, value) {
            (ColumnData::Int(col), Value::Int(v)) => col[row_idx] = v,
            (ColumnData::Str(col), Value::Str(v)) => col[row_idx] = v,
            (_, value) => return Err(type_mismatch(&self.name, self.data_type, &value)),
        }
        Ok(())
    }

    /// Drops every row whose bit is set in `mask`, preserving the order of the
    /// remaining rows.
    ///
    /// Returns the number of rows removed.
    pub fn remove_masked(&mut self, mask: &BitSlice) -> usize {
        let before = self.len();
        let mut idx = 0;
        let mut keep = || {
            let removed = mask.get(idx).is_some_and(|bit| *bit);
            idx += 1;
            !removed
        };
        match &mut self.data {
            ColumnData::Int(col) => col.retain(|_| keep()),
            ColumnData::Str(col) => col.retain(|_| keep()),
        }
        before - self.len()
    }
}

fn type_mismatch(column: &str, expected: DataType, value: &Value) -> Error {
    Error::TypeMismatch {
        column: column.to_string(),
        expected,
        found: format!("{:?}", value),
    }
}
