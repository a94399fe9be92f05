//! DDL loading
//!
//! Builds a [`Schema`] from the CREATE TABLE statements of a DDL file.
//! Every other statement kind is ignored.

use sqlparser::ast::{ColumnOption, CreateTable, Ident, Statement, TableConstraint};
use sqlcheck_core::{Column, Index, Schema, SchemaBuilder, SchemaError, Table, PRIMARY_INDEX_NAME};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::parser::{ParseError, SqlParser};
use crate::statement::object_base_name;

/// Loads schema definitions through a [`SqlParser`]
pub struct SchemaLoader<'a> {
    parser: &'a SqlParser,
}

impl<'a> SchemaLoader<'a> {
    /// Create a loader using the given parser's dialect
    pub fn new(parser: &'a SqlParser) -> Self {
        Self { parser }
    }

    /// Read and load a DDL file
    pub fn load_file(&self, path: &Path) -> Result<Schema, SchemaLoadError> {
        let ddl = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.load_str(&ddl)
    }

    /// Load DDL text
    pub fn load_str(&self, ddl: &str) -> Result<Schema, SchemaLoadError> {
        let statements = self.parser.parse_all(ddl)?;
        let mut builder = SchemaBuilder::new();

        for statement in &statements {
            match statement {
                Statement::CreateTable(create) => {
                    let table = table_from_create(create)?;
                    debug!(
                        table = table.name(),
                        columns = table.column_count(),
                        indexes = table.indexes().len(),
                        "loaded table definition"
                    );
                    builder.add_table(table)?;
                }
                _ => continue,
            }
        }

        Ok(builder.build())
    }
}

/// Convert one CREATE TABLE statement
fn table_from_create(create: &CreateTable) -> Result<Table, SchemaLoadError> {
    let name = object_base_name(&create.name)
        .ok_or_else(|| SchemaLoadError::UnnamedTable(create.name.to_string()))?;

    let mut table = Table::new(name);

    for column in &create.columns {
        table = table.with_column(Column::new(
            column.name.value.clone(),
            column.data_type.to_string(),
        ));

        // Inline `id INT PRIMARY KEY` / `email VARCHAR(64) UNIQUE`
        for option in &column.options {
            if let ColumnOption::Unique { is_primary, .. } = &option.option {
                let index_name = if *is_primary {
                    PRIMARY_INDEX_NAME.to_string()
                } else {
                    option
                        .name
                        .as_ref()
                        .map(|n| n.value.clone())
                        .unwrap_or_else(|| column.name.value.clone())
                };
                table = table.with_index(Index::new(
                    index_name,
                    vec![column.name.value.clone()],
                    true,
                ));
            }
        }
    }

    for constraint in &create.constraints {
        if let Some(index) = index_from_constraint(constraint) {
            table = table.with_index(index);
        }
    }

    Ok(table)
}

/// Map a table constraint to an index; foreign keys, checks and
/// fulltext/spatial indexes do not narrow B-tree lookups and are skipped
fn index_from_constraint(constraint: &TableConstraint) -> Option<Index> {
    match constraint {
        TableConstraint::PrimaryKey {
            name,
            index_name,
            columns,
            ..
        } => {
            let index_name = index_name
                .as_ref()
                .or(name.as_ref())
                .map(|n| n.value.clone())
                .unwrap_or_else(|| PRIMARY_INDEX_NAME.to_string());
            Some(Index::new(index_name, ident_values(columns), true))
        }
        TableConstraint::Unique {
            name,
            index_name,
            columns,
            ..
        } => {
            let index_name = index_name.as_ref().or(name.as_ref());
            Some(Index::new(fallback_name(index_name, columns), ident_values(columns), true))
        }
        TableConstraint::Index { name, columns, .. } => {
            Some(Index::new(fallback_name(name.as_ref(), columns), ident_values(columns), false))
        }
        _ => None,
    }
}

/// MySQL names an unnamed key after its first column
fn fallback_name(name: Option<&Ident>, columns: &[Ident]) -> String {
    name.map(|n| n.value.clone())
        .or_else(|| columns.first().map(|c| c.value.clone()))
        .unwrap_or_default()
}

fn ident_values(idents: &[Ident]) -> Vec<String> {
    idents.iter().map(|i| i.value.clone()).collect()
}

/// Schema loading errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    #[error("failed to read schema file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid schema: {0}")]
    Invalid(#[from] SchemaError),

    #[error("CREATE TABLE without a usable name: {0}")]
    UnnamedTable(String),
}
