//! Typed view over parsed statements
//!
//! Rules only care about a handful of statement shapes. [`StatementKind`]
//! narrows the parser's open-ended `Statement` enum to those shapes so a
//! rule matches on a closed set.

use sqlparser::ast::{
    Delete, Expr, FromTable, ObjectName, Query, Select, SetExpr, Statement, TableFactor,
    TableWithJoins,
};

/// The statement shapes rules inspect
#[derive(Debug, Clone, Copy)]
pub enum StatementKind<'a> {
    /// A query whose body is a plain SELECT
    Select {
        query: &'a Query,
        select: &'a Select,
    },

    /// UPDATE
    Update {
        table: &'a TableWithJoins,
        selection: Option<&'a Expr>,
    },

    /// DELETE
    Delete {
        from: &'a [TableWithJoins],
        selection: Option<&'a Expr>,
    },

    /// INSERT
    Insert,

    /// Anything else (DDL, set operations, SHOW, ...)
    Other,
}

impl<'a> StatementKind<'a> {
    /// Classify a statement
    pub fn of(statement: &'a Statement) -> Self {
        match statement {
            Statement::Query(query) => match query.body.as_ref() {
                SetExpr::Select(select) => StatementKind::Select {
                    query: query.as_ref(),
                    select: select.as_ref(),
                },
                _ => StatementKind::Other,
            },
            Statement::Update { table, selection, .. } => StatementKind::Update {
                table,
                selection: selection.as_ref(),
            },
            Statement::Delete(delete) => Self::of_delete(delete),
            Statement::Insert(_) => StatementKind::Insert,
            _ => StatementKind::Other,
        }
    }

    fn of_delete(delete: &'a Delete) -> Self {
        let from = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };

        StatementKind::Delete {
            from: from.as_slice(),
            selection: delete.selection.as_ref(),
        }
    }

    /// Short name used in log output
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Select { .. } => "SELECT",
            StatementKind::Update { .. } => "UPDATE",
            StatementKind::Delete { .. } => "DELETE",
            StatementKind::Insert => "INSERT",
            StatementKind::Other => "OTHER",
        }
    }

    /// The WHERE clause, if the statement has one
    pub fn selection(&self) -> Option<&'a Expr> {
        match self {
            StatementKind::Select { select, .. } => select.selection.as_ref(),
            StatementKind::Update { selection, .. } | StatementKind::Delete { selection, .. } => {
                *selection
            }
            StatementKind::Insert | StatementKind::Other => None,
        }
    }

    /// The OFFSET expression of a SELECT (`LIMIT o, n` or `OFFSET o`)
    pub fn offset(&self) -> Option<&'a Expr> {
        match self {
            StatementKind::Select { query, .. } => query.offset.as_ref().map(|o| &o.value),
            _ => None,
        }
    }

    /// Leftmost table reference of the statement
    ///
    /// Only the first relation is inspected; joined tables are ignored.
    pub fn target_table(&self) -> Option<String> {
        let relation = match self {
            StatementKind::Select { select, .. } => select.from.first(),
            StatementKind::Update { table, .. } => Some(*table),
            StatementKind::Delete { from, .. } => from.first(),
            StatementKind::Insert | StatementKind::Other => None,
        }?;

        match &relation.relation {
            TableFactor::Table { name, .. } => object_base_name(name),
            _ => None,
        }
    }
}

/// Unquoted last part of a possibly qualified name (`db.users` -> `users`)
pub fn object_base_name(name: &ObjectName) -> Option<String> {
    name.0.last().map(|ident| ident.value.clone())
}
