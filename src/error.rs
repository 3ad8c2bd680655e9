use crate::data_type::DataType;

/// Errors raised by the parser, the storage engine and the snapshot facility.
///
/// The [CommandProcessor](crate::CommandProcessor) is the only place that turns
/// these into protocol responses; everything below it propagates them with `?`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The command text is malformed. The message is diagnostic only.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("table {0:?} not found")]
    TableNotFound(String),

    #[error("table {0:?} already exists")]
    TableExists(String),

    /// Wrong number of values for the table schema.
    #[error("expected {expected} values, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// A value cannot be stored in a column of the declared type.
    #[error("column {column:?} expects {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: String,
    },

    #[error("column {0:?} does not exist")]
    UnknownColumn(String),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidCommand(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
