use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ast::{AdminCommand, Command, CommandKind};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::row::Row;

/// Lifecycle of a [CommandProcessor].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped,
}

/// The outcome of one command line, rendered with [fmt::Display].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success,
    TableExists,
    TableNotFound,
    InvalidCommand,
    /// Matching rows in scan order, one per line.
    Rows(Vec<Row>),
    NoRowsFound,
    Deleted(usize),
    NoRowsDeleted,
    Updated(usize),
    NoRowsUpdated,
    /// Table names, one per line.
    Tables(Vec<String>),
    NoTablesAvailable,
    Goodbye,
    Purged,
}

impl Response {
    /// Reduces an error to the response the line protocol shows for it.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::TableNotFound(_) => Self::TableNotFound,
            Error::TableExists(_) => Self::TableExists,
            _ => Self::InvalidCommand,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::TableExists => f.write_str("TABLE_EXISTS"),
            Self::TableNotFound => f.write_str("TABLE_NOT_FOUND"),
            Self::InvalidCommand => f.write_str("INVALID_COMMAND"),
            Self::Rows(rows) => write_lines(f, rows),
            Self::NoRowsFound => f.write_str("NO_ROWS_FOUND"),
            Self::Deleted(n) => write!(f, "DELETED {n}"),
            Self::NoRowsDeleted => f.write_str("NO_ROWS_DELETED"),
            Self::Updated(n) => write!(f, "UPDATED {n}"),
            Self::NoRowsUpdated => f.write_str("NO_ROWS_UPDATED"),
            Self::Tables(names) => write_lines(f, names),
            Self::NoTablesAvailable => f.write_str("NO_TABLES_AVAILABLE"),
            Self::Goodbye => f.write_str("Goodbye!"),
            Self::Purged => f.write_str("PURGED, Goodbye!"),
        }
    }
}

fn write_lines<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str("\n")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Turns command lines into responses against a shared [Database].
///
/// Several processors may share one database from different threads; each
/// processor tracks its own running/stopped state.
pub struct CommandProcessor {
    database: Arc<Database>,
    state: State,
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProcessor {
    /// Creates a processor over a fresh, empty database.
    pub fn new() -> Self {
        Self::with_database(Arc::new(Database::new()))
    }

    pub fn with_database(database: Arc<Database>) -> Self {
        Self {
            database,
            state: State::Running,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Processes one line and returns the rendered response.
    ///
    /// # Example
    /// ```
    /// use tabledb::CommandProcessor;
    ///
    /// let mut processor = CommandProcessor::new();
    /// assert_eq!(processor.process("CREATE_TABLE users(id INT, name STRING)"), "SUCCESS");
    /// assert_eq!(processor.process(r#"INSERT INTO users VALUES (1, "Ann")"#), "SUCCESS");
    /// assert_eq!(processor.process("SELECT * FROM users WHERE id=1"), "1, Ann");
    /// ```
    pub fn process(&mut self, line: &str) -> String {
        self.execute(line).to_string()
    }

    /// Processes one line. Never fails: every error becomes a [Response].
    pub fn execute(&mut self, line: &str) -> Response {
        let line = line.trim();
        debug!(line, "processing command");
        match self.dispatch(line) {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    Error::InvalidCommand(_) => debug!(%err, "command rejected"),
                    _ => warn!(line, %err, "command rejected"),
                }
                Response::from_error(&err)
            }
        }
    }

    fn dispatch(&mut self, line: &str) -> Result<Response> {
        if let Some(admin) = CommandKind::admin(line) {
            return Ok(self.run_admin(admin));
        }

        let kind = CommandKind::classify(line)
            .ok_or_else(|| Error::invalid("unrecognized command"))?;

        let mut parser = Parser::new(line);
        let header = parser.parse_header()?;
        if header.kind() != kind {
            return Err(Error::invalid(format!(
                "expected a {kind:?} command, found {:?}",
                header.kind()
            )));
        }

        // an unknown table wins over a malformed payload
        if let Some(table) = header.existing_table() {
            if !self.database.contains_table(table) {
                return Err(Error::TableNotFound(table.to_string()));
            }
        }

        match parser.parse_body(header)? {
            Command::CreateTable(create) => {
                self.database.create_table(create.name, create.schema)?;
                Ok(Response::Success)
            }
            Command::InsertInto(insert) => {
                self.database.insert(&insert.table, insert.values)?;
                Ok(Response::Success)
            }
            Command::Select(select) => {
                // rows always render in full, whatever the projection
                let rows = self
                    .database
                    .select(&select.table, select.predicate.as_ref())?;
                if rows.is_empty() {
                    Ok(Response::NoRowsFound)
                } else {
                    Ok(Response::Rows(rows))
                }
            }
            Command::Delete(delete) => {
                match self.database.delete(&delete.table, &delete.predicate)? {
                    0 => Ok(Response::NoRowsDeleted),
                    n => Ok(Response::Deleted(n)),
                }
            }
            Command::Update(update) => {
                match self.database.update(
                    &update.table,
                    &update.assignments,
                    &update.predicate,
                )? {
                    0 => Ok(Response::NoRowsUpdated),
                    n => Ok(Response::Updated(n)),
                }
            }
            Command::Admin(admin) => Ok(self.run_admin(admin)),
        }
    }

    fn run_admin(&mut self, admin: AdminCommand) -> Response {
        match admin {
            AdminCommand::ShowTables => {
                let names: Vec<String> = self.database.table_names().into_iter().collect();
                if names.is_empty() {
                    Response::NoTablesAvailable
                } else {
                    Response::Tables(names)
                }
            }
            AdminCommand::Exit | AdminCommand::Stop => {
                self.state = State::Stopped;
                Response::Goodbye
            }
            AdminCommand::PurgeAndStop => {
                self.database.clear();
                self.state = State::Stopped;
                info!("purged database");
                Response::Purged
            }
        }
    }
}
