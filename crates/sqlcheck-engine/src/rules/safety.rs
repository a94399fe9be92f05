//! Statement safety rules

use sqlcheck_core::{Issue, IssueType, Schema, Severity, SqlSegment};
use sqlcheck_sql::{ParsedStatement, StatementKind};
use sqlparser::ast::SelectItem;

use crate::auditor::{Rule, RuleError};

/// UPDATE or DELETE without a WHERE clause
pub struct NoWhereClauseRule;

impl Rule for NoWhereClauseRule {
    fn name(&self) -> &'static str {
        "no_where_clause"
    }

    fn check(
        &self,
        segment: &SqlSegment,
        parsed: &ParsedStatement,
        _schema: &Schema,
    ) -> Result<Vec<Issue>, RuleError> {
        let issue = match parsed.kind() {
            StatementKind::Update { selection: None, .. } => Issue::new(
                IssueType::UnsafeUpdate,
                Severity::Fatal,
                "UPDATE statement executed without WHERE clause (Full Table Update)",
                "Add a WHERE clause to limit the scope of the update.",
                segment,
            ),
            StatementKind::Delete { selection: None, .. } => Issue::new(
                IssueType::UnsafeDelete,
                Severity::Fatal,
                "DELETE statement executed without WHERE clause (Full Table Delete)",
                "Add a WHERE clause to limit the scope of the delete.",
                segment,
            ),
            _ => return Ok(Vec::new()),
        };

        Ok(vec![issue])
    }
}

/// Bare `*` in a SELECT projection
pub struct SelectStarRule;

impl Rule for SelectStarRule {
    fn name(&self) -> &'static str {
        "select_star"
    }

    fn check(
        &self,
        segment: &SqlSegment,
        parsed: &ParsedStatement,
        _schema: &Schema,
    ) -> Result<Vec<Issue>, RuleError> {
        let StatementKind::Select { select, .. } = parsed.kind() else {
            return Ok(Vec::new());
        };

        Ok(select
            .projection
            .iter()
            .filter(|item| matches!(item, SelectItem::Wildcard(_)))
            .map(|_| {
                Issue::new(
                    IssueType::SelectStar,
                    Severity::Suggestion,
                    "Avoid using SELECT * in production",
                    "List valid columns explicitly to reduce I/O and forward compatibility issues.",
                    segment,
                )
            })
            .collect())
    }
}
