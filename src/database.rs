use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::row::Row;
use crate::table::{Schema, Table, TableImage};
use crate::value::Value;

/// The catalog: a concurrent map from table name to [Table].
///
/// The map is sharded, so creating or looking up one table never waits on
/// another table's rows. A table is cloned out of the map before its own lock
/// is taken; the catalog structure and per-table locks are never held together.
#[derive(Default)]
pub struct Database {
    /// A map of table names to their respective [Table] structures.
    tables: DashMap<String, Arc<Table>>,
}

/// Serializable copy of the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseImage {
    pub tables: Vec<TableImage>,
}

impl Database {
    /// Creates a new, empty database instance.
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
        }
    }

    /// Creates a new, empty table.
    ///
    /// # Errors
    /// Returns [Error::TableExists] if a table with the same name is already
    /// registered. Check and insertion are atomic.
    ///
    /// # Example
    /// ```
    /// use tabledb::{ColumnDef, DataType, Database, Schema};
    ///
    /// let db = Database::new();
    /// let schema = Schema::new(vec![ColumnDef::new("id", DataType::Int).unwrap()]).unwrap();
    /// db.create_table("users", schema.clone()).unwrap();
    /// assert!(db.create_table("users", schema).is_err());
    /// ```
    pub fn create_table(&self, name: impl Into<String>, schema: Schema) -> Result<()> {
        let name = name.into();
        match self.tables.entry(name) {
            Entry::Occupied(entry) => Err(Error::TableExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                let table = Table::new(entry.key().clone(), schema);
                info!(table = %entry.key(), columns = table.schema().len(), "created table");
                entry.insert(Arc::new(table));
                Ok(())
            }
        }
    }

    /// Retrieves a handle to a table by name.
    pub fn get_table(&self, name: &str) -> Option<Arc<Table>> {
        // the shard guard is dropped before the caller can lock the table
        self.tables.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Inserts one row into `table`.
    pub fn insert(&self, table: &str, values: Vec<Value>) -> Result<()> {
        self.table(table)?.insert_row(values)
    }

    /// Returns the rows of `table` matching `predicate` (all rows when `None`).
    pub fn select(&self, table: &str, predicate: Option<&Predicate>) -> Result<Vec<Row>> {
        Ok(self.table(table)?.select(predicate))
    }

    /// Deletes the rows of `table` matching `predicate`, returning the count.
    pub fn delete(&self, table: &str, predicate: &Predicate) -> Result<usize> {
        Ok(self.table(table)?.delete(predicate))
    }

    /// Applies `assignments` to the rows of `table` matching `predicate`,
    /// returning the count.
    pub fn update(
        &self,
        table: &str,
        assignments: &HashMap<String, Value>,
        predicate: &Predicate,
    ) -> Result<usize> {
        self.table(table)?.update(assignments, predicate)
    }

    /// Returns the names of all tables, sorted.
    pub fn table_names(&self) -> BTreeSet<String> {
        self.tables.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Removes every table and its rows.
    pub fn clear(&self) {
        let dropped = self.tables.len();
        self.tables.clear();
        info!(dropped, "cleared all tables");
    }

    /// Copies every table into a serializable image, sorted by table name.
    ///
    /// Each table is copied under its own read lock; the image is not a
    /// point-in-time view across tables.
    pub fn image(&self) -> DatabaseImage {
        let handles: Vec<Arc<Table>> = self
            .tables
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut tables: Vec<TableImage> = handles.iter().map(|table| table.image()).collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        DatabaseImage { tables }
    }

    /// Rebuilds a catalog from an image.
    ///
    /// # Errors
    /// Fails if a table name appears twice or a row does not fit its schema.
    pub fn from_image(image: DatabaseImage) -> Result<Self> {
        let db = Self::new();
        for table_image in image.tables {
            let table = Table::from_image(table_image)?;
            match db.tables.entry(table.name().to_string()) {
                Entry::Occupied(entry) => return Err(Error::TableExists(entry.key().clone())),
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(table));
                }
            }
        }
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::column::ColumnDef;
    use crate::data_type::DataType;

    fn simple_schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("id", DataType::Int).unwrap(),
            ColumnDef::new("name", DataType::String).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_create_and_get_table() {
        let db = Database::new();

        assert!(db.create_table("users", simple_schema()).is_ok());
        assert!(db.get_table("users").is_some());
        assert!(db.contains_table("users"));
        assert!(db.get_table("posts").is_none());
    }

    #[test]
    fn test_duplicate_table_error() {
        let db = Database::new();

        db.create_table("users", simple_schema()).unwrap();
        let err = db.create_table("users", simple_schema());

        assert!(matches!(err, Err(Error::TableExists(name)) if name == "users"));
    }

    #[test]
    fn test_missing_table_errors() {
        let db = Database::new();
        let predicate = Predicate::equals("id", Value::Int(1));

        assert!(matches!(
            db.insert("ghosts", vec![Value::Int(1)]),
            Err(Error::TableNotFound(_))
        ));
        assert!(matches!(db.select("ghosts", None), Err(Error::TableNotFound(_))));
        assert!(matches!(
            db.delete("ghosts", &predicate),
            Err(Error::TableNotFound(_))
        ));
        assert!(matches!(
            db.update("ghosts", &HashMap::new(), &predicate),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_dispatch_to_table() {
        let db = Database::new();
        db.create_table("users", simple_schema()).unwrap();

        db.insert("users", vec![Value::Int(1), Value::from("Alice")])
            .unwrap();
        db.insert("users", vec![Value::Int(2), Value::from("Bob")])
            .unwrap();

        let bob = Predicate::equals("id", Value::Int(2));
        assert_eq!(db.select("users", Some(&bob)).unwrap().len(), 1);

        let assignments = HashMap::from([("name".to_string(), Value::from("Robert"))]);
        assert_eq!(db.update("users", &assignments, &bob).unwrap(), 1);
        assert_eq!(db.delete("users", &bob).unwrap(), 1);
        assert_eq!(db.select("users", None).unwrap().len(), 1);
    }

    #[test]
    fn test_table_names_and_clear() {
        let db = Database::new();
        assert!(db.table_names().is_empty());

        db.create_table("users", simple_schema()).unwrap();
        db.create_table("posts", simple_schema()).unwrap();

        let names: Vec<String> = db.table_names().into_iter().collect();
        assert_eq!(names, vec!["posts", "users"]);

        db.clear();
        assert!(db.table_names().is_empty());
        assert!(db.get_table("users").is_none());
    }

    #[test]
    fn test_concurrent_create_only_one_wins() {
        let db = Database::new();

        let successes: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| db.create_table("shared", simple_schema()).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        assert_eq!(successes, 1);
    }

    #[test]
    fn test_concurrent_distinct_tables() {
        let db = Database::new();

        thread::scope(|s| {
            for t in 0..4 {
                let db = &db;
                s.spawn(move || {
                    let name = format!("t{t}");
                    db.create_table(name.as_str(), simple_schema()).unwrap();
                    for i in 0..100 {
                        db.insert(&name, vec![Value::Int(i), Value::from("x")])
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(db.table_names().len(), 4);
        for name in db.table_names() {
            assert_eq!(db.get_table(&name).unwrap().row_count(), 100);
        }
    }

    #[test]
    fn test_image_round_trip() {
        let db = Database::new();
        db.create_table("users", simple_schema()).unwrap();
        db.create_table("empty", simple_schema()).unwrap();
        db.insert("users", vec![Value::Int(1), Value::from("Ann")])
            .unwrap();

        let image = db.image();
        assert_eq!(image.tables[0].name, "empty");

        let restored = Database::from_image(image.clone()).unwrap();
        assert_eq!(restored.table_names(), db.table_names());
        assert_eq!(restored.image(), image);
    }

    #[test]
    fn test_from_image_rejects_duplicates() {
        let db = Database::new();
        db.create_table("users", simple_schema()).unwrap();
        let mut image = db.image();
        image.tables.push(image.tables[0].clone());

        assert!(matches!(
            Database::from_image(image),
            Err(Error::TableExists(_))
        ));
    }
}
