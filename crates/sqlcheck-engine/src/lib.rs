//! sqlcheck engine
//!
//! This crate implements the checking logic:
//! - Rule trait and the built-in rules
//! - The auditor that runs rules over extracted segments
//! - The end-to-end check pipeline

pub mod auditor;
pub mod rules;
pub mod pipeline;

pub use auditor::{AuditSummary, Auditor, Rule, RuleError, RuleFailure};
pub use rules::default_rules;
pub use pipeline::{load_schema, run_check, CheckError, CheckOutcome};
