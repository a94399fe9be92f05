//! Relational schema catalog
//!
//! A [`Schema`] is built once through [`SchemaBuilder`] and is read-only
//! afterwards. Table and column lookups are case-insensitive, matching how
//! MySQL resolves identifiers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name synthesized for a primary key declared without a name
pub const PRIMARY_INDEX_NAME: &str = "PRIMARY";

/// A column in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as declared
    pub name: String,

    /// Declared type, upper-cased (e.g. `VARCHAR(255)`)
    pub data_type: String,
}

impl Column {
    /// Create a column, normalizing the declared type
    pub fn new(name: impl Into<String>, data_type: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.as_ref().trim().to_uppercase(),
        }
    }

    /// Whether the declared type is a character type
    pub fn is_string(&self) -> bool {
        self.data_type.contains("CHAR") || self.data_type.contains("TEXT")
    }
}

/// An ordered-column index
///
/// Column order is significant: only a query constraining `columns[0]`
/// can use the index for narrowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name
    pub name: String,

    /// Indexed columns in declaration order
    pub columns: Vec<String>,

    /// Primary key or unique constraint
    pub unique: bool,
}

impl Index {
    /// Create a new index
    pub fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            unique,
        }
    }

    /// The leftmost column of the index
    pub fn leading_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    /// Render as `name(col1, col2)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.columns.join(", "))
    }
}

/// A table with its columns and indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,

    /// Keyed by lower-cased column name
    columns: HashMap<String, Column>,

    /// Column names in declaration order
    column_order: Vec<String>,

    indexes: Vec<Index>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: HashMap::new(),
            column_order: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Add a column (a redeclared column replaces the earlier one)
    pub fn with_column(mut self, column: Column) -> Self {
        let key = column.name.to_lowercase();
        if self.columns.insert(key, column.clone()).is_none() {
            self.column_order.push(column.name);
        }
        self
    }

    /// Add an index
    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Table name as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Find a column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(&name.to_lowercase())
    }

    /// Columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.column_order
            .iter()
            .filter_map(|name| self.columns.get(&name.to_lowercase()))
    }

    /// Number of declared columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Indexes in declaration order
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Check that every index is non-empty and only names declared columns
    pub fn validate(&self) -> Result<(), SchemaError> {
        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(SchemaError::EmptyIndex {
                    table: self.name.clone(),
                    index: index.name.clone(),
                });
            }

            if let Some(missing) = index.columns.iter().find(|c| self.column(c).is_none()) {
                return Err(SchemaError::UnknownIndexColumn {
                    table: self.name.clone(),
                    index: index.name.clone(),
                    column: missing.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Read-only catalog of tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Keyed by lower-cased table name
    tables: HashMap<String, Table>,
}

impl Schema {
    /// An empty schema (schema-dependent rules become no-ops)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Find a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the schema has no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Accumulates validated tables into a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: HashMap<String, Table>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a table; a later definition of the same name wins
    pub fn add_table(&mut self, table: Table) -> Result<&mut Self, SchemaError> {
        table.validate()?;
        self.tables.insert(table.name.to_lowercase(), table);
        Ok(self)
    }

    /// Finish building
    pub fn build(self) -> Schema {
        Schema {
            tables: self.tables,
        }
    }
}

/// Schema invariant violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("index '{index}' on table '{table}' has no columns")]
    EmptyIndex { table: String, index: String },

    #[error("index '{index}' on table '{table}' references undeclared column '{column}'")]
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },
}
