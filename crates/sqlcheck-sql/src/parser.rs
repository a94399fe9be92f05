//! SQL parsing using datafusion-sqlparser-rs
//!
//! Turns extracted SQL text into a single statement, or a [`ParseError`]
//! carrying the offending text.

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::{Parser, ParserError};
use sqlcheck_core::DialectConfig;

use crate::statement::StatementKind;

/// SQL parser with configurable dialect
pub struct SqlParser {
    dialect: Box<dyn Dialect + Send + Sync>,
}

impl SqlParser {
    /// Create a new SQL parser with the default (MySQL) dialect
    pub fn new() -> Self {
        Self::mysql()
    }

    /// Create a SQL parser for MySQL
    pub fn mysql() -> Self {
        Self {
            dialect: Box::new(MySqlDialect {}),
        }
    }

    /// Create a SQL parser for generic SQL
    pub fn generic() -> Self {
        Self {
            dialect: Box::new(GenericDialect {}),
        }
    }

    /// Create a SQL parser for PostgreSQL
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgreSqlDialect {}),
        }
    }

    /// Create a SQL parser for SQLite
    pub fn sqlite() -> Self {
        Self {
            dialect: Box::new(SQLiteDialect {}),
        }
    }

    /// Create a parser from a dialect config
    pub fn from_dialect(dialect: DialectConfig) -> Self {
        match dialect {
            DialectConfig::Generic => Self::generic(),
            DialectConfig::MySql => Self::mysql(),
            DialectConfig::Postgres => Self::postgres(),
            DialectConfig::Sqlite => Self::sqlite(),
        }
    }

    /// Parse every statement in `sql`
    pub fn parse_all(&self, sql: &str) -> Result<Vec<Statement>, ParseError> {
        Parser::parse_sql(&*self.dialect, sql).map_err(|error| ParseError {
            sql: sql.to_string(),
            error,
        })
    }

    /// Parse SQL text into its first statement
    ///
    /// Multi-statement text is truncated to the first statement; text with
    /// no statement at all is an error.
    pub fn parse(&self, sql: &str) -> Result<ParsedStatement, ParseError> {
        let statements = self.parse_all(sql)?;
        let statement_count = statements.len();

        match statements.into_iter().next() {
            Some(statement) => Ok(ParsedStatement {
                sql: sql.to_string(),
                statement,
                statement_count,
            }),
            None => Err(ParseError {
                sql: sql.to_string(),
                error: ParserError::ParserError("no SQL statement found".to_string()),
            }),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Successfully parsed SQL with AST
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    /// Original SQL string
    pub sql: String,

    /// The first statement of the text
    pub statement: Statement,

    /// How many statements the text contained
    pub statement_count: usize,
}

impl ParsedStatement {
    /// Typed view over the statement
    pub fn kind(&self) -> StatementKind<'_> {
        StatementKind::of(&self.statement)
    }

    /// Leftmost table the statement reads or writes
    pub fn target_table(&self) -> Option<String> {
        self.kind().target_table()
    }

    /// Whether later statements were dropped
    pub fn was_truncated(&self) -> bool {
        self.statement_count > 1
    }
}

/// SQL parsing error
#[derive(Debug)]
pub struct ParseError {
    /// Offending SQL text
    pub sql: String,

    /// Parser error from sqlparser
    pub error: ParserError,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SQL parse error: {}", self.error)
    }
}

impl std::error::Error for ParseError {}
