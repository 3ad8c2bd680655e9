use crate::row::Row;
use crate::value::Value;

/// A boolean condition over a single row.
///
/// The command language only builds flat trees: a single equality, or one
/// level of `AND` or `OR` over equalities. The evaluator itself accepts any
/// nesting.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`, compared structurally (type and value).
    Equals { column: String, value: Value },
    /// True when every sub-predicate is true.
    And(Vec<Predicate>),
    /// True when at least one sub-predicate is true.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Evaluates the predicate against `row`.
    ///
    /// A column missing from the row never matches. `And`/`Or` short-circuit.
    ///
    /// # Example
    /// ```
    /// # use tabledb::{ColumnDef, DataType, Predicate, Schema, Table, Value};
    /// let schema = Schema::new(vec![ColumnDef::new("id", DataType::Int).unwrap()]).unwrap();
    /// let table = Table::new("t", schema);
    /// table.insert_row(vec![Value::Int(2)]).unwrap();
    ///
    /// let p = Predicate::Or(vec![
    ///     Predicate::equals("id", Value::Int(1)),
    ///     Predicate::equals("id", Value::Int(2)),
    /// ]);
    /// let rows = table.select(None);
    /// assert!(p.evaluate(&rows[0]));
    /// ```
    pub fn evaluate(&self, row: &Row) -> bool {
        match self {
            Self::Equals { column, value } => row.get(column) == Some(value),
            Self::And(predicates) => predicates.iter().all(|p| p.evaluate(row)),
            Self::Or(predicates) => predicates.iter().any(|p| p.evaluate(row)),
        }
    }
}
