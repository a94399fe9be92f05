//! Built-in rules
//!
//! Rule names are stable; they are what `disabled_rules` refers to.

pub mod safety;
pub mod index;
pub mod types;
pub mod performance;

pub use safety::{NoWhereClauseRule, SelectStarRule};
pub use index::IndexMissRule;
pub use types::ImplicitConversionRule;
pub use performance::{DeepPaginationRule, NegativeQueryRule};

use sqlcheck_core::Config;
use sqlparser::ast::Expr;

use crate::auditor::Rule;

/// Default rule set in registration order, minus disabled rules
pub fn default_rules(config: &Config) -> Vec<Box<dyn Rule>> {
    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(NoWhereClauseRule),
        Box::new(SelectStarRule),
        Box::new(IndexMissRule),
        Box::new(ImplicitConversionRule),
        Box::new(DeepPaginationRule::new(config.deep_pagination_threshold)),
        Box::new(NegativeQueryRule),
    ];

    rules
        .into_iter()
        .filter(|rule| !config.is_rule_disabled(rule.name()))
        .collect()
}

/// Column name of a bare or qualified column reference (`u.email` -> `email`)
pub(crate) fn column_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.as_str()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|ident| ident.value.as_str()),
        _ => None,
    }
}
