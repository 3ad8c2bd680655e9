use std::collections::HashMap;

use crate::ast::*;
use crate::column::ColumnDef;
use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::table::Schema;
use crate::tokenizer::{Token, Tokenizer};
use crate::value::Value;

/// Parses one command line into a [Command].
///
/// Every failure is reported as [Error::InvalidCommand].
///
/// # Example
/// ```
/// use tabledb::{parse, Command, Value};
///
/// let Command::InsertInto(insert) = parse(r#"INSERT INTO t VALUES ("a,b", 5)"#).unwrap() else {
///     panic!("expected an insert");
/// };
/// assert_eq!(insert.values, vec![Value::from("a,b"), Value::Int(5)]);
/// ```
pub fn parse(line: &str) -> Result<Command> {
    let mut parser = Parser::new(line);
    let header = parser.parse_header()?;
    parser.parse_body(header)
}

/// Recursive-descent parser over a lazily scanned token stream.
///
/// Parsing happens in two steps: [Parser::parse_header] reads the command
/// shape and target table, [Parser::parse_body] reads the payload. Nothing
/// after the header is scanned until the body is requested.
pub struct Parser {
    tokenizer: Tokenizer,
    peeked: Option<Token>,
}

impl Parser {
    pub fn new(line: &str) -> Self {
        Self {
            tokenizer: Tokenizer::new(line),
            peeked: None,
        }
    }

    /// Reads the command keyword(s) and the table name.
    pub fn parse_header(&mut self) -> Result<Header> {
        let header = match self.next_token()? {
            Token::CreateTable => Header::CreateTable {
                table: self.consume_word()?,
            },
            Token::Insert => {
                self.consume(Token::Into)?;
                Header::InsertInto {
                    table: self.consume_word()?,
                }
            }
            Token::Select => {
                let columns = self.parse_projection()?;
                self.consume(Token::From)?;
                Header::Select {
                    columns,
                    table: self.consume_word()?,
                }
            }
            Token::Update => Header::Update {
                table: self.consume_word()?,
            },
            Token::Delete => {
                self.consume(Token::From)?;
                Header::Delete {
                    table: self.consume_word()?,
                }
            }
            Token::Show => {
                self.consume(Token::Tables)?;
                Header::Admin(AdminCommand::ShowTables)
            }
            Token::Exit => Header::Admin(AdminCommand::Exit),
            Token::Stop => Header::Admin(AdminCommand::Stop),
            Token::PurgeAndStop => Header::Admin(AdminCommand::PurgeAndStop),
            token => return Err(Error::invalid(format!("unexpected token {token:?}"))),
        };
        Ok(header)
    }

    /// Reads the rest of the line for `header` and checks nothing follows.
    pub fn parse_body(&mut self, header: Header) -> Result<Command> {
        let command = match header {
            Header::CreateTable { table } => self.parse_create_table(table)?,
            Header::InsertInto { table } => self.parse_insert(table)?,
            Header::Select { columns, table } => self.parse_select(columns, table)?,
            Header::Update { table } => self.parse_update(table)?,
            Header::Delete { table } => self.parse_delete(table)?,
            Header::Admin(admin) => Command::Admin(admin),
        };
        self.consume(Token::Eof)?;
        Ok(command)
    }

    // --- Helpers ---

    fn peek(&mut self) -> Result<&Token> {
        if self.peeked.is_none() {
            let token = self.tokenizer.next_token()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.get_or_insert(Token::Eof))
    }

    fn next_token(&mut self) -> Result<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.tokenizer.next_token(),
        }
    }

    /// Consumes the next token if it equals `expected`.
    fn eat(&mut self, expected: &Token) -> Result<bool> {
        if self.peek()? == expected {
            self.peeked = None;
            return Ok(true);
        }
        Ok(false)
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        match self.next_token()? {
            token if token == expected => Ok(()),
            token => Err(Error::invalid(format!(
                "expected {expected:?}, found {token:?}"
            ))),
        }
    }

    /// Consumes a table or column name. Signed numbers are words to the
    /// tokenizer but never names.
    fn consume_word(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Word(word) if !word.starts_with(['-', '+']) => Ok(word),
            token => Err(Error::invalid(format!(
                "expected identifier, found {token:?}"
            ))),
        }
    }

    /// Parses a literal: quoted text is a string, anything else must be a
    /// base-10 integer.
    fn consume_literal(&mut self) -> Result<Value> {
        match self.next_token()? {
            Token::String(text) => Ok(Value::Str(text.into())),
            Token::Word(word) => word
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| Error::invalid(format!("invalid value format: {word}"))),
            token => Err(Error::invalid(format!("expected a value, found {token:?}"))),
        }
    }

    /// Parses `item (, item)*`.
    fn comma_separated<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = vec![item(self)?];
        while self.eat(&Token::Comma)? {
            items.push(item(self)?);
        }
        Ok(items)
    }

    // --- Grammar ---

    fn parse_projection(&mut self) -> Result<Projection> {
        if self.eat(&Token::Star)? {
            return Ok(Projection::All);
        }
        Ok(Projection::Columns(self.comma_separated(Self::consume_word)?))
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.consume_word()?;
        let data_type: DataType = self.consume_word()?.parse()?;
        ColumnDef::new(name, data_type)
    }

    /// `CREATE_TABLE name ( col TYPE, ... )`
    fn parse_create_table(&mut self, name: String) -> Result<Command> {
        self.consume(Token::LeftParen)?;
        let columns = self.comma_separated(Self::parse_column_def)?;
        self.consume(Token::RightParen)?;
        Ok(Command::CreateTable(CreateTable {
            name,
            schema: Schema::new(columns)?,
        }))
    }

    /// `INSERT INTO name VALUES ( v, ... )`
    fn parse_insert(&mut self, table: String) -> Result<Command> {
        self.consume(Token::Values)?;
        self.consume(Token::LeftParen)?;
        let values = self.comma_separated(Self::consume_literal)?;
        self.consume(Token::RightParen)?;
        Ok(Command::InsertInto(InsertInto { table, values }))
    }

    /// `SELECT cols FROM name [WHERE predicate]`
    fn parse_select(&mut self, columns: Projection, table: String) -> Result<Command> {
        let predicate = if self.eat(&Token::Where)? {
            Some(self.parse_predicate()?)
        } else {
            None
        };
        Ok(Command::Select(Select {
            columns,
            table,
            predicate,
        }))
    }

    /// `UPDATE name SET col=v, ... WHERE predicate`
    fn parse_update(&mut self, table: String) -> Result<Command> {
        self.consume(Token::Set)?;
        let mut assignments = HashMap::new();
        for (column, value) in self.comma_separated(Self::parse_equality_pair)? {
            // last assignment wins
            assignments.insert(column, value);
        }
        self.consume(Token::Where)?;
        let predicate = self.parse_predicate()?;
        Ok(Command::Update(Update {
            table,
            assignments,
            predicate,
        }))
    }

    /// `DELETE FROM name WHERE predicate`
    fn parse_delete(&mut self, table: String) -> Result<Command> {
        self.consume(Token::Where)?;
        let predicate = self.parse_predicate()?;
        Ok(Command::Delete(Delete { table, predicate }))
    }

    /// A single equality, or a flat chain of equalities joined only by `AND`
    /// or only by `OR`. Mixing the two or grouping is not part of the grammar.
    fn parse_predicate(&mut self) -> Result<Predicate> {
        let first = self.parse_equality()?;

        let joiner = match self.peek()? {
            Token::And => Token::And,
            Token::Or => Token::Or,
            _ => return Ok(first),
        };

        let mut predicates = vec![first];
        while self.eat(&joiner)? {
            predicates.push(self.parse_equality()?);
        }

        Ok(match joiner {
            Token::And => Predicate::And(predicates),
            _ => Predicate::Or(predicates),
        })
    }

    fn parse_equality(&mut self) -> Result<Predicate> {
        let (column, value) = self.parse_equality_pair()?;
        Ok(Predicate::Equals { column, value })
    }

    /// `column = literal`
    fn parse_equality_pair(&mut self) -> Result<(String, Value)> {
        let column = self.consume_word()?;
        self.consume(Token::Equal)?;
        let value = self.consume_literal()?;
        Ok((column, value))
    }
}
