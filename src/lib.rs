pub mod ast;
pub mod column;
pub mod config;
pub mod data_type;
pub mod database;
pub mod error;
pub mod parser;
pub mod predicate;
pub mod processor;
pub mod row;
pub mod snapshot;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use ast::{AdminCommand, Command, Projection};
pub use column::{Column, ColumnDef};
pub use config::Config;
pub use data_type::DataType;
pub use database::{Database, DatabaseImage};
pub use error::{Error, Result};
pub use parser::parse;
pub use predicate::Predicate;
pub use processor::{CommandProcessor, Response, State};
pub use row::Row;
pub use snapshot::Snapshotter;
pub use table::{Schema, Table, TableImage};
pub use value::Value;
