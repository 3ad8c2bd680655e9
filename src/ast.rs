use std::collections::HashMap;

use crate::predicate::Predicate;
use crate::table::Schema;
use crate::value::Value;

/// A fully parsed command line.
#[derive(Debug, PartialEq)]
pub enum Command {
    CreateTable(CreateTable),
    InsertInto(InsertInto),
    Select(Select),
    Update(Update),
    Delete(Delete),
    Admin(AdminCommand),
}

/// Commands that take no arguments and never touch a single table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    ShowTables,
    Exit,
    Stop,
    PurgeAndStop,
}

#[derive(Debug, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub schema: Schema,
}

#[derive(Debug, PartialEq)]
pub struct InsertInto {
    pub table: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`: every column in schema order.
    All,
    /// Explicit column names, not checked against the schema.
    Columns(Vec<String>),
}

#[derive(Debug, PartialEq)]
pub struct Select {
    pub columns: Projection,
    pub table: String,
    pub predicate: Option<Predicate>,
}

#[derive(Debug, PartialEq)]
pub struct Update {
    pub table: String,
    /// Column to new value. A column assigned twice keeps the last value.
    pub assignments: HashMap<String, Value>,
    pub predicate: Predicate,
}

#[derive(Debug, PartialEq)]
pub struct Delete {
    pub table: String,
    pub predicate: Predicate,
}

/// The leading part of a command: its shape and target table, parsed before
/// the payload so the table can be checked first.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    CreateTable { table: String },
    InsertInto { table: String },
    Select { columns: Projection, table: String },
    Update { table: String },
    Delete { table: String },
    Admin(AdminCommand),
}

impl Header {
    /// The table an existing-table command operates on.
    ///
    /// `None` for `CREATE_TABLE` (the table must not exist yet) and for
    /// administrative commands.
    pub fn existing_table(&self) -> Option<&str> {
        match self {
            Self::InsertInto { table }
            | Self::Select { table, .. }
            | Self::Update { table }
            | Self::Delete { table } => Some(table),
            Self::CreateTable { .. } | Self::Admin(_) => None,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::CreateTable { .. } => CommandKind::CreateTable,
            Self::InsertInto { .. } => CommandKind::InsertInto,
            Self::Select { .. } => CommandKind::Select,
            Self::Update { .. } => CommandKind::Update,
            Self::Delete { .. } => CommandKind::Delete,
            Self::Admin(_) => CommandKind::Admin,
        }
    }
}

/// The shape of a line, decided from its prefix alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    CreateTable,
    InsertInto,
    Select,
    Delete,
    Update,
    Admin,
}

impl CommandKind {
    /// Classifies a table-scoped line by prefix, first match wins:
    /// `CREATE_TABLE`, `INSERT INTO`, `SELECT`, `DELETE FROM`, `UPDATE`.
    ///
    /// Administrative commands are recognized by exact match, see
    /// [CommandKind::admin].
    pub fn classify(line: &str) -> Option<Self> {
        const PREFIXES: [(&str, CommandKind); 5] = [
            ("CREATE_TABLE", CommandKind::CreateTable),
            ("INSERT INTO", CommandKind::InsertInto),
            ("SELECT", CommandKind::Select),
            ("DELETE FROM", CommandKind::Delete),
            ("UPDATE", CommandKind::Update),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|(_, kind)| *kind)
    }

    /// Matches a whole line against the administrative commands.
    pub fn admin(line: &str) -> Option<AdminCommand> {
        match line {
            "EXIT" => Some(AdminCommand::Exit),
            "STOP" => Some(AdminCommand::Stop),
            "PURGE_AND_STOP" => Some(AdminCommand::PurgeAndStop),
            "SHOW TABLES" => Some(AdminCommand::ShowTables),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(
            CommandKind::classify("CREATE_TABLE t(a INT)"),
            Some(CommandKind::CreateTable)
        );
        assert_eq!(
            CommandKind::classify("INSERT INTO t VALUES (1)"),
            Some(CommandKind::InsertInto)
        );
        assert_eq!(
            CommandKind::classify("SELECT * FROM t"),
            Some(CommandKind::Select)
        );
        assert_eq!(
            CommandKind::classify("DELETE FROM t WHERE a=1"),
            Some(CommandKind::Delete)
        );
        assert_eq!(
            CommandKind::classify("UPDATE t SET a=1 WHERE a=2"),
            Some(CommandKind::Update)
        );
        assert_eq!(CommandKind::classify("DROP TABLE t"), None);
        assert_eq!(CommandKind::classify("select * from t"), None);
        assert_eq!(CommandKind::classify("DELETE t"), None);
    }

    #[test]
    fn test_admin_is_exact() {
        assert_eq!(CommandKind::admin("EXIT"), Some(AdminCommand::Exit));
        assert_eq!(CommandKind::admin("SHOW TABLES"), Some(AdminCommand::ShowTables));
        assert_eq!(CommandKind::admin("SHOW  TABLES"), None);
        assert_eq!(CommandKind::admin("exit"), None);
        assert_eq!(CommandKind::admin("STOP NOW"), None);
    }

    #[test]
    fn test_header_table() {
        let select = Header::Select {
            columns: Projection::All,
            table: "users".into(),
        };
        assert_eq!(select.existing_table(), Some("users"));
        assert_eq!(select.kind(), CommandKind::Select);

        let create = Header::CreateTable {
            table: "users".into(),
        };
        assert_eq!(create.existing_table(), None);
        assert_eq!(Header::Admin(AdminCommand::Exit).existing_table(), None);
    }
}
