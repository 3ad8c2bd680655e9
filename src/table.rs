use std::collections::HashMap;
use std::sync::Arc;

use bitvec::prelude::*;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::column::{Column, ColumnDef};
use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::row::Row;
use crate::value::Value;

/// Ordered, immutable list of column definitions with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Builds a schema, rejecting empty column lists and duplicate names.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::invalid("a table needs at least one column"));
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == col.name()) {
                return Err(Error::invalid(format!(
                    "duplicate column name {:?}",
                    col.name()
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Index of `name` in schema order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Columnar row storage guarded by the table lock.
struct Storage {
    columns: Vec<Column>,
    row_count: usize,
}

/// One table: an immutable schema plus its rows.
///
/// Every operation goes through a single reader/writer lock: [Table::select]
/// takes shared access, mutations take exclusive access. Rows are never
/// observed half-written.
pub struct Table {
    name: String,
    schema: Arc<Schema>,
    storage: RwLock<Storage>,
}

/// Serializable copy of a table's schema and rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableImage {
    pub name: String,
    pub schema: Schema,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        let columns = schema.columns().iter().map(Column::new).collect();
        Self {
            name: name.into(),
            schema: Arc::new(schema),
            storage: RwLock::new(Storage {
                columns,
                row_count: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows currently stored.
    pub fn row_count(&self) -> usize {
        self.storage.read().row_count
    }

    /// Appends a row, binding `values` positionally to the schema.
    ///
    /// # Errors
    /// - [Error::ArityMismatch] if the number of values differs from the
    ///   number of columns.
    /// - [Error::TypeMismatch] if a value is incompatible with its column.
    ///
    /// Nothing is stored when an error is returned.
    pub fn insert_row(&self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.schema.len() {
            return Err(Error::ArityMismatch {
                expected: self.schema.len(),
                found: values.len(),
            });
        }

        let mut storage = self.storage.write();
        // coerce the whole row first so a bad value leaves every column untouched
        let coerced = storage
            .columns
            .iter()
            .zip(&values)
            .map(|(column, value)| column.coerce(value))
            .collect::<Result<Vec<_>>>()?;

        for (column, value) in storage.columns.iter_mut().zip(coerced) {
            column.push(value)?;
        }
        storage.row_count += 1;
        Ok(())
    }

    /// Returns every row matching `predicate` (all rows when `None`), in
    /// insertion order.
    ///
    /// There is no column-list parameter: rows always carry every column in
    /// schema order, and a `SELECT` column list never narrows the output.
    /// Callers that want fewer columns pick them with [Row::get].
    pub fn select(&self, predicate: Option<&Predicate>) -> Vec<Row> {
        let storage = self.storage.read();
        (0..storage.row_count)
            .map(|idx| self.row_at(&storage, idx))
            .filter(|row| predicate.is_none_or(|p| p.evaluate(row)))
            .collect()
    }

    /// Removes every row matching `predicate` and returns how many were removed.
    pub fn delete(&self, predicate: &Predicate) -> usize {
        let mut storage = self.storage.write();

        let mut mask = bitvec![0; storage.row_count];
        for idx in 0..storage.row_count {
            if predicate.evaluate(&self.row_at(&storage, idx)) {
                mask.set(idx, true);
            }
        }

        let removed = mask.count_ones();
        if removed == 0 {
            return 0;
        }
        for column in storage.columns.iter_mut() {
            column.remove_masked(&mask);
        }
        storage.row_count -= removed;
        debug!(table = %self.name, removed, "deleted rows");
        removed
    }

    /// Overwrites the assigned columns of every row matching `predicate` and
    /// returns how many rows were updated. Unassigned columns keep their values.
    ///
    /// # Errors
    /// - [Error::UnknownColumn] if an assignment names a column not in the schema.
    /// - [Error::TypeMismatch] if an assigned value is incompatible with its column.
    ///
    /// Assignments are validated before any row is touched.
    pub fn update(
        &self,
        assignments: &HashMap<String, Value>,
        predicate: &Predicate,
    ) -> Result<usize> {
        let mut storage = self.storage.write();

        let resolved = assignments
            .iter()
            .map(|(name, value)| {
                let idx = self
                    .schema
                    .position(name)
                    .ok_or_else(|| Error::UnknownColumn(name.clone()))?;
                Ok((idx, storage.columns[idx].coerce(value)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let matching: Vec<usize> = (0..storage.row_count)
            .filter(|idx| predicate.evaluate(&self.row_at(&storage, *idx)))
            .collect();

        for (col_idx, value) in &resolved {
            let column = &mut storage.columns[*col_idx];
            for row_idx in &matching {
                column.set(*row_idx, value)?;
            }
        }
        debug!(table = %self.name, updated = matching.len(), "updated rows");
        Ok(matching.len())
    }

    /// Copies the schema and all rows under a shared lock.
    pub fn image(&self) -> TableImage {
        let rows = self
            .select(None)
            .into_iter()
            .map(Row::into_values)
            .collect();
        TableImage {
            name: self.name.clone(),
            schema: self.schema.as_ref().clone(),
            rows,
        }
    }

    /// Rebuilds a table from an image, validating the schema and every row.
    pub fn from_image(image: TableImage) -> Result<Self> {
        let columns = image
            .schema
            .columns()
            .iter()
            .map(|c| ColumnDef::new(c.name(), c.data_type()))
            .collect::<Result<Vec<_>>>()?;
        let table = Self::new(image.name, Schema::new(columns)?);
        for row in image.rows {
            table.insert_row(row)?;
        }
        Ok(table)
    }

    fn row_at(&self, storage: &Storage, idx: usize) -> Row {
        let values = storage
            .columns
            .iter()
            .filter_map(|col| col.get(idx))
            .collect();
        Row::new(Arc::clone(&self.schema), values)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::data_type::DataType;

    fn users_schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("id", DataType::Int).unwrap(),
            ColumnDef::new("name", DataType::String).unwrap(),
        ])
        .unwrap()
    }

    fn users() -> Table {
        let table = Table::new("users", users_schema());
        table
            .insert_row(vec![Value::Int(1), Value::from("Alice")])
            .unwrap();
        table
            .insert_row(vec![Value::Int(2), Value::from("Bob")])
            .unwrap();
        table
            .insert_row(vec![Value::Int(3), Value::from("Alice")])
            .unwrap();
        table
    }

    fn row_ids(rows: &[Row]) -> Vec<i64> {
        rows.iter()
            .filter_map(|row| row.get("id").and_then(Value::as_int))
            .collect()
    }

    #[test]
    fn test_schema_validation() {
        assert!(Schema::new(vec![]).is_err());

        let dup = Schema::new(vec![
            ColumnDef::new("id", DataType::Int).unwrap(),
            ColumnDef::new("id", DataType::String).unwrap(),
        ]);
        assert!(dup.is_err());

        let schema = users_schema();
        assert_eq!(schema.position("name"), Some(1));
        assert_eq!(schema.position("age"), None);
    }

    #[test]
    fn test_table_creation() {
        let table = Table::new("users", users_schema());
        assert_eq!(table.name(), "users");
        assert_eq!(table.schema().len(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_insert_and_select() {
        let table = Table::new("users", users_schema());
        table
            .insert_row(vec![Value::Int(1), Value::from("Ann")])
            .unwrap();

        let rows = table.select(None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), &[Value::Int(1), Value::from("Ann")]);
    }

    #[test]
    fn test_insert_coerces_integer_text() {
        let table = Table::new("users", users_schema());
        table
            .insert_row(vec![Value::from("42"), Value::from("Ann")])
            .unwrap();

        assert_eq!(table.select(None)[0].get("id"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_column_count_mismatch() {
        let table = Table::new("users", users_schema());

        // too many values
        let result = table.insert_row(vec![Value::Int(1), Value::from("a"), Value::Int(2)]);
        assert!(matches!(
            result,
            Err(Error::ArityMismatch {
                expected: 2,
                found: 3
            })
        ));

        // not enough values
        assert!(table.insert_row(vec![Value::Int(1)]).is_err());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_type_mismatch_leaves_table_untouched() {
        let table = Table::new("users", users_schema());

        // first column is fine, second is not
        let result = table.insert_row(vec![Value::Int(1), Value::Int(2)]);
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
        assert_eq!(table.row_count(), 0);
        assert!(table.select(None).is_empty());
    }

    #[test]
    fn test_select_with_predicate() {
        let table = users();

        let rows = table.select(Some(&Predicate::equals("name", "Alice")));
        assert_eq!(row_ids(&rows), vec![1, 3]);

        let none = table.select(Some(&Predicate::equals("name", "Zoe")));
        assert!(none.is_empty());
    }

    #[test]
    fn test_delete_counts_and_keeps_others() {
        let table = users();

        let removed = table.delete(&Predicate::equals("name", "Alice"));
        assert_eq!(removed, 2);
        assert_eq!(table.row_count(), 1);

        let rows = table.select(None);
        assert_eq!(rows[0].values(), &[Value::Int(2), Value::from("Bob")]);

        assert_eq!(table.delete(&Predicate::equals("id", Value::Int(99))), 0);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_update_named_columns_only() {
        let table = users();
        let assignments = HashMap::from([("name".to_string(), Value::from("Carol"))]);

        let updated = table
            .update(&assignments, &Predicate::equals("id", Value::Int(2)))
            .unwrap();
        assert_eq!(updated, 1);

        let rows = table.select(None);
        assert_eq!(rows[1].values(), &[Value::Int(2), Value::from("Carol")]);
        assert_eq!(rows[0].values(), &[Value::Int(1), Value::from("Alice")]);
    }

    #[test]
    fn test_update_no_match() {
        let table = users();
        let assignments = HashMap::from([("id".to_string(), Value::Int(10))]);

        let updated = table
            .update(&assignments, &Predicate::equals("id", Value::Int(404)))
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[test]
    fn test_update_rejects_bad_assignments() {
        let table = users();
        let before = table.select(None);

        let unknown = HashMap::from([("age".to_string(), Value::Int(10))]);
        let result = table.update(&unknown, &Predicate::equals("id", Value::Int(1)));
        assert!(matches!(result, Err(Error::UnknownColumn(_))));

        let mistyped = HashMap::from([
            ("name".to_string(), Value::from("Zed")),
            ("id".to_string(), Value::from("abc")),
        ]);
        let result = table.update(&mistyped, &Predicate::equals("id", Value::Int(1)));
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));

        assert_eq!(table.select(None), before);
    }

    #[test]
    fn test_image_round_trip() {
        let table = users();
        let copy = Table::from_image(table.image()).unwrap();

        assert_eq!(copy.name(), "users");
        assert_eq!(copy.schema(), table.schema());
        assert_eq!(copy.select(None), table.select(None));
    }

    #[test]
    fn test_concurrent_scans_and_inserts() {
        let table = Table::new("users", users_schema());
        let barrier = Barrier::new(3);

        thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                for i in 0..500 {
                    table
                        .insert_row(vec![Value::Int(i), Value::Str(format!("user{i}").into())])
                        .unwrap();
                }
            });
            for _ in 0..2 {
                s.spawn(|| {
                    barrier.wait();
                    for _ in 0..50 {
                        for row in table.select(None) {
                            // both columns of a row always come from the same insert
                            let id = row.get("id").and_then(Value::as_int).unwrap();
                            let name = row.get("name").and_then(Value::as_str).unwrap();
                            assert_eq!(name, format!("user{id}"));
                        }
                    }
                });
            }
        });

        assert_eq!(table.row_count(), 500);
    }

    #[test]
    fn test_select_does_not_wait_on_other_readers() {
        let table = users();
        let (tx, rx) = mpsc::channel();

        thread::scope(|s| {
            let held = table.storage.read();
            s.spawn(|| {
                tx.send(table.select(None).len()).unwrap();
            });

            // completes while this thread still holds a shared lock
            assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(3));
            drop(held);
        });
    }

    #[test]
    fn test_writer_waits_for_readers() {
        let table = users();
        let (tx, rx) = mpsc::channel();

        thread::scope(|s| {
            let held = table.storage.read();
            s.spawn(|| {
                table
                    .insert_row(vec![Value::Int(4), Value::from("Dan")])
                    .unwrap();
                tx.send(()).unwrap();
            });

            assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
            drop(held);
            assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        });

        assert_eq!(table.row_count(), 4);
    }

    proptest! {
        #[test]
        fn prop_delete_removes_exactly_matching_rows(
            ids in prop::collection::vec(0i64..5, 0..40),
            target in 0i64..5,
        ) {
            let table = Table::new("t", users_schema());
            for id in &ids {
                table.insert_row(vec![Value::Int(*id), Value::from("x")]).unwrap();
            }

            let expected = ids.iter().filter(|id| **id == target).count();
            let removed = table.delete(&Predicate::equals("id", Value::Int(target)));

            prop_assert_eq!(removed, expected);
            let kept: Vec<i64> = ids.iter().copied().filter(|id| *id != target).collect();
            prop_assert_eq!(row_ids(&table.select(None)), kept);
        }

        #[test]
        fn prop_update_counts_matching_rows(
            ids in prop::collection::vec(0i64..5, 0..40),
            target in 0i64..5,
        ) {
            let table = Table::new("t", users_schema());
            for id in &ids {
                table.insert_row(vec![Value::Int(*id), Value::from("x")]).unwrap();
            }

            let assignments = HashMap::from([("name".to_string(), Value::from("y"))]);
            let updated = table
                .update(&assignments, &Predicate::equals("id", Value::Int(target)))
                .unwrap();

            prop_assert_eq!(updated, ids.iter().filter(|id| **id == target).count());
            for row in table.select(None) {
                let expected = if row.get("id") == Some(&Value::Int(target)) { "y" } else { "x" };
                prop_assert_eq!(row.get("name"), Some(&Value::from(expected)));
            }
        }
    }
}
