//! SQL parsing and schema loading
//!
//! This crate handles:
//! - Parsing extracted SQL text using datafusion-sqlparser-rs
//! - Classifying statements into the shapes rules inspect
//! - Loading a table/index catalog from CREATE TABLE statements

pub mod parser;
pub mod statement;
pub mod schema_loader;

pub use parser::{SqlParser, ParsedStatement, ParseError};
pub use statement::{StatementKind, object_base_name};
pub use schema_loader::{SchemaLoader, SchemaLoadError};
