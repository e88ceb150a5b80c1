//! JSON writer for result trees.
//!
//! The document is the [`PlanNodeSnapshot`] of the plan root: nested nodes
//! mirroring the plan, with upper-case kinds and results and RFC 3339
//! timestamps.

use std::io::Write;

use super::PlanNodeSnapshot;
use crate::execution::ExecutionTable;
use crate::plan::PlanNode;

/// Serialize the result tree of `plan` into `writer`.
///
/// # Examples
///
/// ```rust
/// use kumo::execution::ExecutionTable;
/// use kumo::plan::{CompileOptions, PlanCompiler};
/// use kumo::{gherkin, reporting::json};
///
/// let document = gherkin::parse("Feature: F\n  Scenario: S\n", "en").expect("valid");
/// let plan = PlanCompiler::new(CompileOptions::default())
///     .compile([("f.feature", &document)], &Default::default())
///     .expect("compiles");
/// let mut buffer = Vec::new();
/// json::write(&mut buffer, &plan, &ExecutionTable::new()).expect("serializes");
/// let output = String::from_utf8(buffer).expect("utf-8");
/// assert!(output.contains("\"status\":\"NOT_STARTED\""));
/// ```
///
/// # Errors
///
/// Returns an error when writing or serializing fails.
pub fn write<W: Write + ?Sized>(
    writer: &mut W,
    plan: &PlanNode,
    table: &ExecutionTable,
) -> serde_json::Result<()> {
    serde_json::to_writer(writer, &PlanNodeSnapshot::new(plan, table))
}

/// Serialize the result tree of `plan` into `writer`, indented.
///
/// # Errors
///
/// Returns an error when writing or serializing fails.
pub fn write_pretty<W: Write + ?Sized>(
    writer: &mut W,
    plan: &PlanNode,
    table: &ExecutionTable,
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &PlanNodeSnapshot::new(plan, table))
}

/// Produce the result tree of `plan` as a JSON string.
///
/// # Errors
///
/// Returns an error when serializing fails.
pub fn to_string(plan: &PlanNode, table: &ExecutionTable) -> serde_json::Result<String> {
    serde_json::to_string(&PlanNodeSnapshot::new(plan, table))
}
