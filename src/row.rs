use std::fmt;
use std::sync::Arc;

use crate::table::Schema;
use crate::value::Value;

/// A materialized row: values in schema order, addressable by column name.
///
/// Rows returned by a scan are detached copies; mutating the table afterwards
/// does not change them.
#[derive(Debug, Clone)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    /// Returns the value bound to `column`, or `None` if the schema has no
    /// such column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.schema
            .position(column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Iterates over `(column name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .columns()
            .iter()
            .map(|c| c.name())
            .zip(self.values.iter())
    }
}

/// Two rows are equal when they hold the same values in the same order.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// Renders `v1, v2, ...` in schema order.
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}
