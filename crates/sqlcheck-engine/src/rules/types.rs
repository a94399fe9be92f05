//! Type coercion rule

use sqlcheck_core::{Issue, IssueType, Schema, Severity, SqlSegment, Table};
use sqlcheck_sql::{ParsedStatement, StatementKind};
use sqlparser::ast::{visit_expressions, BinaryOperator, Expr, UnaryOperator, Value};
use std::convert::Infallible;
use std::ops::ControlFlow;

use super::column_name;
use crate::auditor::{Rule, RuleError};

/// String column compared against a numeric literal
///
/// MySQL converts the column value of every row to a number for such a
/// comparison, so an index on the column cannot be used.
pub struct ImplicitConversionRule;

impl Rule for ImplicitConversionRule {
    fn name(&self) -> &'static str {
        "implicit_conversion"
    }

    fn check(
        &self,
        segment: &SqlSegment,
        parsed: &ParsedStatement,
        schema: &Schema,
    ) -> Result<Vec<Issue>, RuleError> {
        let kind = parsed.kind();
        if !matches!(kind, StatementKind::Select { .. }) {
            return Ok(Vec::new());
        }
        let Some(table) = kind.target_table().and_then(|name| schema.table(&name)) else {
            return Ok(Vec::new());
        };

        let mut issues = Vec::new();
        let flow = visit_expressions(&parsed.statement, |expr| {
            if let Some(column) = string_column_vs_number(expr, table) {
                issues.push(Issue::new(
                    IssueType::ImplicitConversion,
                    Severity::Warning,
                    format!("String column '{}' compared with Number.", column),
                    "Quote the number to avoid implicit conversion and index invalidation (e.g., '123' instead of 123).",
                    segment,
                ));
            }
            ControlFlow::<Infallible>::Continue(())
        });
        if let ControlFlow::Break(never) = flow {
            match never {}
        }

        Ok(issues)
    }
}

/// Column name if `expr` compares a string column of `table` with a number
fn string_column_vs_number<'a>(expr: &'a Expr, table: &Table) -> Option<&'a str> {
    let Expr::BinaryOp { left, op, right } = expr else {
        return None;
    };
    if !is_comparison(op) {
        return None;
    }

    let column = match (column_name(left), column_name(right)) {
        (Some(column), None) if is_numeric_literal(right) => column,
        (None, Some(column)) if is_numeric_literal(left) => column,
        _ => return None,
    };

    table
        .column(column)
        .filter(|declared| declared.is_string())
        .map(|_| column)
}

fn is_comparison(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Spaceship
    )
}

fn is_numeric_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Value(Value::Number(_, _)) => true,
        Expr::UnaryOp {
            op: UnaryOperator::Minus | UnaryOperator::Plus,
            expr,
        } => is_numeric_literal(expr),
        Expr::Nested(inner) => is_numeric_literal(inner),
        _ => false,
    }
}
