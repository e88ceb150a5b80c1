//! Executable plan trees.
//!
//! The plan compiler lowers parsed documents into a uniform tree of
//! [`PlanNode`]s: a single `PLAN` root, one `FEATURE` per document, then
//! scenarios, backgrounds and steps. Outline rows become ordinary scenarios.
//! The tree is immutable once compiled except for property resolution, which
//! rewrites text in place before execution.

mod compiler;
mod error;
mod node;
mod outline;
pub mod tags;

pub use compiler::{CompileOptions, PlanCompiler};
pub use error::CompileError;
pub use node::{DocStringData, NodeId, NodeKind, PlanNode, StepData};
pub use tags::{TagFilter, TagFilterError};
