//! Index usage rule
//!
//! Composite B-tree indexes follow the leftmost-prefix rule: an index on
//! (a, b) narrows a lookup only when `a` is constrained. A column wrapped in
//! a function call (`LOWER(email) = ...`) cannot use the index either.

use sqlcheck_core::{Issue, IssueType, Schema, Severity, SqlSegment, Table};
use sqlcheck_sql::{ParsedStatement, StatementKind};
use sqlparser::ast::{Expr, Visit, Visitor};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::ops::ControlFlow;

use super::column_name;
use crate::auditor::{Rule, RuleError};

/// WHERE clause does not constrain the leading column of any index
pub struct IndexMissRule;

impl Rule for IndexMissRule {
    fn name(&self) -> &'static str {
        "index_miss"
    }

    fn check(
        &self,
        segment: &SqlSegment,
        parsed: &ParsedStatement,
        schema: &Schema,
    ) -> Result<Vec<Issue>, RuleError> {
        let kind = parsed.kind();
        if !matches!(
            kind,
            StatementKind::Select { .. } | StatementKind::Update { .. } | StatementKind::Delete { .. }
        ) {
            return Ok(Vec::new());
        }

        let Some(selection) = kind.selection() else {
            return Ok(Vec::new());
        };
        let Some(table) = kind.target_table().and_then(|name| schema.table(&name)) else {
            return Ok(Vec::new());
        };

        let mut columns = WhereColumns::default();
        if let ControlFlow::Break(never) = selection.visit(&mut columns) {
            match never {}
        }

        if columns.referenced.is_empty() {
            return Ok(Vec::new());
        }

        if table.indexes().is_empty() {
            return Ok(vec![Issue::new(
                IssueType::NoIndexesDefined,
                Severity::Warning,
                format!("Table '{}' has no indexes defined.", table.name()),
                "Add indexes to optimize queries.",
                segment,
            )]);
        }

        if hits_index_prefix(table, &columns.bare) {
            return Ok(Vec::new());
        }

        let used: Vec<&str> = columns.referenced.iter().map(String::as_str).collect();
        let available: Vec<String> = table.indexes().iter().map(|i| i.signature()).collect();

        Ok(vec![Issue::new(
            IssueType::IndexMiss,
            Severity::Warning,
            format!(
                "Query on '{}' does not hit any index prefix. WHERE uses [{}] but available indexes are: {}",
                table.name(),
                used.join(", "),
                available.join(", ")
            ),
            "Ensure the WHERE clause filters on the leftmost column of an index.",
            segment,
        )])
    }
}

fn hits_index_prefix(table: &Table, bare: &BTreeSet<String>) -> bool {
    table
        .indexes()
        .iter()
        .filter_map(|index| index.leading_column())
        .any(|leading| bare.contains(&leading.to_lowercase()))
}

/// Column references in a WHERE clause, lower-cased
#[derive(Default)]
struct WhereColumns {
    /// Nesting depth of function calls around the current expression
    function_depth: usize,

    /// Every referenced column
    referenced: BTreeSet<String>,

    /// Columns referenced at least once outside any function call
    bare: BTreeSet<String>,
}

impl Visitor for WhereColumns {
    type Break = Infallible;

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if is_call(expr) {
            self.function_depth += 1;
        } else if let Some(name) = column_name(expr) {
            let name = name.to_lowercase();
            if self.function_depth == 0 {
                self.bare.insert(name.clone());
            }
            self.referenced.insert(name);
        }
        ControlFlow::Continue(())
    }

    fn post_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if is_call(expr) {
            self.function_depth = self.function_depth.saturating_sub(1);
        }
        ControlFlow::Continue(())
    }
}

/// Function calls, including the ones sqlparser gives their own variant
fn is_call(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Function { .. }
            | Expr::Trim { .. }
            | Expr::Substring { .. }
            | Expr::Cast { .. }
            | Expr::Ceil { .. }
            | Expr::Floor { .. }
            | Expr::Extract { .. }
            | Expr::Position { .. }
            | Expr::Overlay { .. }
            | Expr::Convert { .. }
            | Expr::AtTimeZone { .. }
    )
}
